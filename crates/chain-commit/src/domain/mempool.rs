//! TxStore: mempool of unconfirmed transactions.
//!
//! In-memory index over the durable mempool table. Three indices:
//!
//! - `by_hash`: O(1) lookup by transaction hash
//! - `by_priority`: auction-ordered set (priority, fee, age, hash)
//! - pending-commit membership via `MempoolState`
//!
//! Commit lifecycle mirrors the store transaction: `begin_commit` fences
//! the selected hashes, `complete_commit` removes them once the store
//! transaction has committed, `abort_commit` returns them to the pool.
//!
//! Transactions that keep failing validation accumulate an attempt count;
//! past the ceiling they are poisoned: excluded from every future batch
//! but kept visible for operator inspection.

use crate::domain::entities::{
    BlockId, Hash, MempoolState, MempoolTransaction, Timestamp, TransactionRecord,
};
use crate::domain::errors::{CommitError, CommitResult};
use crate::domain::identity::TransactionIdentitySet;
use crate::domain::value_objects::{IdentityScope, MempoolStatus, PrioritizedTx};
use std::collections::{BTreeSet, HashMap};

/// Mempool index. One instance per node, owned by the service.
#[derive(Debug, Default)]
pub struct TxStore {
    /// All transactions indexed by hash.
    by_hash: HashMap<Hash, MempoolTransaction>,
    /// Auction order. Only contains PENDING, non-poisoned transactions.
    by_priority: BTreeSet<PrioritizedTx>,
    /// Attempt ceiling past which a transaction is poisoned.
    attempt_ceiling: u32,
}

fn priority_key(record: &TransactionRecord) -> PrioritizedTx {
    PrioritizedTx::new(record.priority, record.fee, record.submitted_at, record.hash)
}

impl TxStore {
    pub fn new(attempt_ceiling: u32) -> Self {
        Self {
            attempt_ceiling,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&MempoolTransaction> {
        self.by_hash.get(hash)
    }

    /// Adds a transaction, rejecting duplicates within the mempool and
    /// the pending-commit set. The inclusion log is the caller's scope
    /// to check (see `IdentityChain`); the durable store's primary-key
    /// constraint remains the final authority.
    pub fn insert(&mut self, record: TransactionRecord) -> CommitResult<()> {
        if let Some(existing) = self.by_hash.get(&record.hash) {
            let scope = if existing.is_pending_commit() {
                IdentityScope::PendingCommit
            } else {
                IdentityScope::Mempool
            };
            return Err(CommitError::DuplicateTransaction {
                hash: record.hash,
                scope,
            });
        }
        self.insert_unchecked(record);
        Ok(())
    }

    /// Adds without duplicate checking. Used by the startup rebuild,
    /// where rows come from the durable mempool table itself.
    pub fn insert_unchecked(&mut self, record: TransactionRecord) {
        self.by_priority.insert(priority_key(&record));
        self.by_hash
            .insert(record.hash, MempoolTransaction::new(record));
    }

    /// Returns up to `limit` transactions in auction order: priority class
    /// descending, fee descending, submission time ascending. Poisoned and
    /// pending-commit transactions are excluded.
    pub fn select_batch(&self, limit: usize) -> Vec<TransactionRecord> {
        let mut batch = Vec::with_capacity(limit.min(self.by_priority.len()));
        for key in &self.by_priority {
            if batch.len() >= limit {
                break;
            }
            let Some(tx) = self.by_hash.get(&key.hash) else {
                continue;
            };
            if tx.is_poisoned(self.attempt_ceiling) {
                continue;
            }
            batch.push(tx.record.clone());
        }
        batch
    }

    /// Fences `hashes` for an in-flight block commit. Fenced transactions
    /// leave the auction index and cannot be selected twice.
    ///
    /// Returns the hashes actually fenced (unknown or already fenced
    /// hashes are skipped).
    pub fn begin_commit(&mut self, hashes: &[Hash], block_id: BlockId) -> Vec<Hash> {
        let mut fenced = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let Some(tx) = self.by_hash.get_mut(hash) else {
                continue;
            };
            if tx.is_pending_commit() {
                continue;
            }
            self.by_priority.remove(&priority_key(&tx.record));
            tx.state = MempoolState::PendingCommit { block_id };
            fenced.push(*hash);
        }
        fenced
    }

    /// Removes `hashes` after the store transaction committed. Part of the
    /// same logical unit as the inclusion-log insert.
    pub fn complete_commit(&mut self, hashes: &[Hash]) -> Vec<Hash> {
        let mut removed = Vec::with_capacity(hashes.len());
        for hash in hashes {
            if let Some(tx) = self.by_hash.remove(hash) {
                self.by_priority.remove(&priority_key(&tx.record));
                removed.push(tx.record.hash);
            }
        }
        removed
    }

    /// Returns fenced transactions to the pool after a failed commit.
    pub fn abort_commit(&mut self, hashes: &[Hash]) -> Vec<Hash> {
        let mut requeued = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let Some(tx) = self.by_hash.get_mut(hash) else {
                continue;
            };
            if !tx.is_pending_commit() {
                continue;
            }
            tx.state = MempoolState::Pending;
            if !tx.is_poisoned(self.attempt_ceiling) {
                self.by_priority.insert(priority_key(&tx.record));
            }
            requeued.push(*hash);
        }
        requeued
    }

    /// Records a validation failure. Past the ceiling the transaction is
    /// poisoned and the call surfaces `AttemptCeilingExceeded`; the row
    /// stays in the pool for inspection.
    pub fn record_failure(&mut self, hash: &Hash) -> CommitResult<u32> {
        let ceiling = self.attempt_ceiling;
        let Some(tx) = self.by_hash.get_mut(hash) else {
            return Err(CommitError::Storage {
                reason: format!("record_failure on unknown transaction {hash:?}"),
            });
        };
        tx.attempts += 1;
        let attempts = tx.attempts;
        if tx.is_poisoned(ceiling) {
            self.by_priority.remove(&priority_key(&tx.record));
            return Err(CommitError::AttemptCeilingExceeded { hash: *hash, attempts });
        }
        Ok(attempts)
    }

    /// Operator snapshot.
    pub fn status(&self, now: Timestamp) -> MempoolStatus {
        let mut status = MempoolStatus::default();
        for tx in self.by_hash.values() {
            if tx.is_poisoned(self.attempt_ceiling) {
                status.poisoned += 1;
            } else if tx.is_pending_commit() {
                status.pending_commit += 1;
            } else {
                status.pending += 1;
            }
            let age = now.saturating_sub(tx.record.submitted_at);
            status.oldest_age_secs = status.oldest_age_secs.max(age);
        }
        status
    }

    /// Identity view over PENDING transactions.
    pub fn mempool_scope(&self) -> MempoolScope<'_> {
        MempoolScope(self)
    }

    /// Identity view over PENDING_COMMIT transactions.
    pub fn pending_scope(&self) -> PendingCommitScope<'_> {
        PendingCommitScope(self)
    }
}

/// `TransactionIdentitySet` view over the transient mempool.
pub struct MempoolScope<'a>(&'a TxStore);

impl TransactionIdentitySet for MempoolScope<'_> {
    fn scope(&self) -> IdentityScope {
        IdentityScope::Mempool
    }
    fn contains(&self, hash: &Hash) -> CommitResult<bool> {
        Ok(self.0.by_hash.get(hash).is_some_and(|tx| tx.is_pending()))
    }
}

/// `TransactionIdentitySet` view over the pending-commit set.
pub struct PendingCommitScope<'a>(&'a TxStore);

impl TransactionIdentitySet for PendingCommitScope<'_> {
    fn scope(&self) -> IdentityScope {
        IdentityScope::PendingCommit
    }
    fn contains(&self, hash: &Hash) -> CommitResult<bool> {
        Ok(self
            .0
            .by_hash
            .get(hash)
            .is_some_and(|tx| tx.is_pending_commit()))
    }
}
