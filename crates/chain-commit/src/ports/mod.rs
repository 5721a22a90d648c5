//! Ports: the inbound driving API and outbound driven dependencies.

pub mod inbound;
pub mod outbound;

pub use inbound::ChainCommitApi;
pub use outbound::{
    CaseAssignment, ChainStore, NodeRegistry, RawEffect, StoreError, StoreResult,
    StoreTransaction, SystemTimeSource, Table, TimeSource,
};
