//! Commit-core error taxonomy.
//!
//! Ledger-level errors (`DuplicateTransaction`, `InsufficientFunds`) are
//! recovered locally by excluding the offending transaction. Storage-level
//! errors (`CommitAborted`, `StorageTimeout`, `Storage`) always propagate
//! to the caller; no component in this core swallows a storage failure.

use crate::domain::value_objects::IdentityScope;
use shared_types::{BlockId, EcosystemId, Hash, KeyId};
use thiserror::Error;

/// Result type for commit-core operations.
pub type CommitResult<T> = Result<T, CommitError>;

/// Commit-core errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// Transaction hash already known; callers are told, never silently dropped.
    #[error("duplicate transaction {hash:?} already present in {scope}")]
    DuplicateTransaction { hash: Hash, scope: IdentityScope },

    /// A transaction tried to spend more outputs than its key holds.
    /// Excludes that single transaction from the batch, not the batch itself.
    #[error(
        "insufficient funds for (ecosystem {ecosystem}, owner {owner:?}): \
         requested {requested} inputs, {available} unspent"
    )]
    InsufficientFunds {
        ecosystem: EcosystemId,
        owner: KeyId,
        requested: u32,
        available: u32,
    },

    /// An output's consumer was already assigned. The consumer field is
    /// write-once; hitting this means a double-spend was stopped.
    #[error("output of {tx_hash:?} index {index} already spent")]
    OutputAlreadySpent { tx_hash: Hash, index: u32 },

    /// The atomic block-commit unit failed; the whole unit rolled back and
    /// the caller must retry block assembly from scratch.
    #[error("block {block_id} commit aborted during {step}: {reason}")]
    CommitAborted {
        block_id: BlockId,
        step: &'static str,
        reason: String,
    },

    /// Lock-wait or idle-transaction timeout. Retryable infrastructure
    /// error, not a protocol violation.
    #[error("storage timeout during {operation}")]
    StorageTimeout { operation: String },

    /// Mempool transaction failed validation more times than the retry
    /// ceiling. It stays visible for operator inspection.
    #[error("transaction {hash:?} exceeded attempt ceiling after {attempts} failures")]
    AttemptCeilingExceeded { hash: Hash, attempts: u32 },

    /// Any other durable-store failure.
    #[error("storage error: {reason}")]
    Storage { reason: String },
}
