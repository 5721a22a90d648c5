//! Core domain entities for the commit core.
//!
//! Ownership boundaries: TxStore owns mempool rows and the inclusion log,
//! UtxoLedger owns output records, the rollback journal owns its entries,
//! quorum/reputation own confirmation and bad-block rows. No component
//! reaches into another's rows directly.

use crate::domain::errors::CommitError;
use serde::{Deserialize, Serialize};

// Re-export shared identifier types for convenience.
pub use shared_types::{
    BlockId, EcosystemId, Hash, KeyId, NodeId, PriorityClass, Timestamp, TransactionRecord, U256,
};

/// Mempool lifecycle state.
///
/// ```text
/// [PENDING] ──begin_commit──→ [PENDING_COMMIT] ──complete──→ deleted + logged
///                                   │
///                                   └────── abort ──────→ [PENDING]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MempoolState {
    /// Available for batch selection.
    #[default]
    Pending,
    /// Selected into a block whose commit is in flight.
    PendingCommit {
        /// The block the transaction was selected into.
        block_id: BlockId,
    },
}

/// A transaction held in the mempool, with retry bookkeeping.
#[derive(Clone, Debug)]
pub struct MempoolTransaction {
    /// The wire-level record. `record.hash` is the primary identity.
    pub record: TransactionRecord,
    /// Validation failures accumulated so far.
    pub attempts: u32,
    /// Current lifecycle state.
    pub state: MempoolState,
}

impl MempoolTransaction {
    pub fn new(record: TransactionRecord) -> Self {
        Self {
            record,
            attempts: 0,
            state: MempoolState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, MempoolState::Pending)
    }

    pub fn is_pending_commit(&self) -> bool {
        matches!(self.state, MempoolState::PendingCommit { .. })
    }

    /// True once `attempts` has gone past `ceiling`: the transaction is
    /// poisoned and excluded from batches, but never deleted.
    pub fn is_poisoned(&self, ceiling: u32) -> bool {
        self.attempts > ceiling
    }
}

/// Identity of one output: the producing transaction and its output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputId {
    pub tx_hash: Hash,
    pub index: u32,
}

impl OutputId {
    pub const fn new(tx_hash: Hash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

/// The consuming side of a spent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    /// The spending transaction.
    pub tx_hash: Hash,
    /// The input slot within the spending transaction.
    pub input_index: u32,
}

/// Sharding key of the output ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub ecosystem: EcosystemId,
    pub owner: KeyId,
}

impl LedgerKey {
    pub const fn new(ecosystem: EcosystemId, owner: KeyId) -> Self {
        Self { ecosystem, owner }
    }
}

/// An unspent-transaction-output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub id: OutputId,
    pub owner: KeyId,
    pub ecosystem: EcosystemId,
    pub value: U256,
    pub asset: String,
    pub producing_contract: Option<KeyId>,
    pub producing_block: BlockId,
    /// Write-once: assigned exactly once, never cleared or reassigned.
    pub consumer: Option<Consumer>,
}

impl Output {
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.ecosystem, self.owner)
    }

    pub fn is_spent(&self) -> bool {
        self.consumer.is_some()
    }

    /// Assigns the consumer. Rejects any second assignment.
    pub fn spend(&mut self, consumer: Consumer) -> Result<(), CommitError> {
        if self.consumer.is_some() {
            return Err(CommitError::OutputAlreadySpent {
                tx_hash: self.id.tx_hash,
                index: self.id.index,
            });
        }
        self.consumer = Some(consumer);
        Ok(())
    }
}

/// One row of the per-block undo journal.
///
/// Ids are allocated contiguously per block; replaying in descending id
/// order gives correct LIFO undo. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub id: u64,
    pub block_id: BlockId,
    pub tx_hash: Hash,
    pub table_name: String,
    pub row_id: String,
    pub prior_row_json: String,
    pub prior_row_hash: Hash,
}

/// Permanent inclusion-log row. Its existence is the authoritative
/// "this hash can never be accepted again" marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionEntry {
    pub hash: Hash,
    pub block_id: BlockId,
}

/// Accumulated peer votes for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockConfirmation {
    pub block_id: BlockId,
    pub good_votes: u32,
    pub bad_votes: u32,
    pub last_update: Timestamp,
}

/// One reporter's claim that a producer emitted a bad block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadBlockReport {
    pub producer: NodeId,
    pub consumer: NodeId,
    pub block_id: BlockId,
    pub observed_at: Timestamp,
    pub deleted: bool,
}

/// Post-commit status for one transaction row, applied as part of the
/// single multi-row update statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub tx_hash: Hash,
    pub error: Option<String>,
    pub block_id: Option<BlockId>,
}
