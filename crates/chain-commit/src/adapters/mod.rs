//! Adapters implementing the outbound ports.
//!
//! The in-memory store backs tests and single-node development runs; a
//! SQL or LSM-backed store plugs in behind the same [`ChainStore`]
//! contract without touching the core.
//!
//! [`ChainStore`]: crate::ports::outbound::ChainStore

pub mod memory;
pub mod registry;

pub use memory::{FailurePoint, MemoryStore};
pub use registry::StaticNodeRegistry;
