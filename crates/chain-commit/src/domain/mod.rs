//! Pure domain logic: entities, errors, and the component state machines.

pub mod entities;
pub mod errors;
pub mod identity;
pub mod mempool;
pub mod quorum;
pub mod reputation;
pub mod rollback;
pub mod utxo;
pub mod value_objects;

pub use entities::*;
pub use errors::{CommitError, CommitResult};
pub use identity::{IdentityChain, TransactionIdentitySet};
pub use mempool::TxStore;
pub use quorum::ConfirmationQuorum;
pub use reputation::ReputationTracker;
pub use rollback::{assign_rollback_ids, RollbackDraft};
pub use utxo::UtxoLedger;
pub use value_objects::*;
