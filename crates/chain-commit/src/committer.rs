//! BlockCommitter: one block's effects as a single atomic unit.
//!
//! The unit spans the contract-state rows, the mempool, the inclusion
//! log, the rollback journal, and the per-transaction status rows.
//! Ordering inside the store transaction:
//!
//! 1. raw contract effects (skipped for the genesis/first block)
//! 2. mempool deletes for the used transactions
//! 3. inclusion-log batch insert
//! 4. rollback batch insert, ids from one base reservation
//! 5. one multi-row status update
//!
//! Any step failing aborts the whole unit; the store rolls back and no
//! partial application is observable. The caller retries block assembly
//! from scratch, since resuming mid-way is never safe.

use crate::config::CommitConfig;
use crate::domain::entities::{BlockId, Hash, InclusionEntry, StatusUpdate};
use crate::domain::errors::{CommitError, CommitResult};
use crate::domain::rollback::{assign_rollback_ids, RollbackDraft};
use crate::ports::outbound::{CaseAssignment, ChainStore, RawEffect, StoreError, Table};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one block commit needs, pre-computed by the block builder
/// and the contract VM.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    pub block_id: BlockId,
    /// Mempool transactions folded into this block.
    pub used_tx_hashes: Vec<Hash>,
    /// Permanent inclusion-log rows to insert.
    pub log_entries: Vec<InclusionEntry>,
    /// Undo journal pre-images, in mutation order.
    pub rollback_entries: Vec<RollbackDraft>,
    /// Status rows applied by the single multi-row update.
    pub status_updates: Vec<StatusUpdate>,
    /// Opaque row mutations from contract execution.
    pub raw_effects: Vec<RawEffect>,
    /// Genesis/first block: raw effects are skipped.
    pub first_block: bool,
}

/// Applies commit requests against the durable store.
pub struct BlockCommitter<S> {
    store: Arc<S>,
    config: CommitConfig,
}

impl<S: ChainStore> BlockCommitter<S> {
    pub fn new(store: Arc<S>, config: CommitConfig) -> Self {
        Self { store, config }
    }

    /// Applies the request as one store transaction.
    ///
    /// Retry-from-scratch only: on error nothing was applied.
    pub fn commit(&self, request: &CommitRequest) -> CommitResult<()> {
        let attempt = Uuid::new_v4();
        info!(
            block_id = request.block_id,
            %attempt,
            used = request.used_tx_hashes.len(),
            rollback = request.rollback_entries.len(),
            "starting block commit"
        );

        let result = self.run(request);
        match &result {
            Ok(()) => info!(block_id = request.block_id, %attempt, "block commit applied"),
            Err(err) => warn!(
                block_id = request.block_id,
                %attempt,
                error = %err,
                "block commit rolled back"
            ),
        }
        result
    }

    fn run(&self, request: &CommitRequest) -> CommitResult<()> {
        let block_id = request.block_id;
        let chunk = self.config.insert_chunk_size;
        let mut txn = self
            .store
            .begin()
            .map_err(|e| step_error(block_id, "begin", e))?;

        // Step 1: contract-produced row mutations.
        if !request.first_block {
            for effect in &request.raw_effects {
                let applied = match effect {
                    RawEffect::Put { table, key, value } => txn.upsert(*table, key, value),
                    RawEffect::Delete { table, key } => txn.delete(*table, key),
                };
                applied.map_err(|e| step_error(block_id, "raw_effects", e))?;
            }
            debug!(block_id, effects = request.raw_effects.len(), "raw effects staged");
        }

        // Step 2: drop used transactions from the durable mempool.
        for hash in &request.used_tx_hashes {
            txn.delete(Table::Mempool, hash)
                .map_err(|e| step_error(block_id, "mempool_delete", e))?;
        }

        // Step 3: permanent inclusion log.
        let log_rows = encode_rows(&request.log_entries, |entry| {
            (entry.hash.to_vec(), entry)
        })?;
        for rows in log_rows.chunks(chunk.max(1)) {
            txn.batch_insert(Table::InclusionLog, rows)
                .map_err(|e| step_error(block_id, "inclusion_log", e))?;
        }

        // Step 4: rollback journal, ids contiguous from one reservation.
        if !request.rollback_entries.is_empty() {
            let count = request.rollback_entries.len() as u64;
            let base = txn
                .reserve_ids(Table::Rollback, count)
                .map_err(|e| step_error(block_id, "rollback_ids", e))?;
            let entries =
                assign_rollback_ids(base, block_id, request.rollback_entries.clone());
            let rollback_rows = encode_rows(&entries, |entry| {
                (entry.id.to_be_bytes().to_vec(), entry)
            })?;
            for rows in rollback_rows.chunks(chunk.max(1)) {
                txn.batch_insert(Table::Rollback, rows)
                    .map_err(|e| step_error(block_id, "rollback_insert", e))?;
            }
        }

        // Step 5: one multi-row status update, chunked to bound statement size.
        let assignments = request
            .status_updates
            .iter()
            .map(|update| {
                Ok(CaseAssignment {
                    key: update.tx_hash.to_vec(),
                    value: encode(update)?,
                })
            })
            .collect::<CommitResult<Vec<_>>>()?;
        for rows in assignments.chunks(chunk.max(1)) {
            txn.update_rows(Table::TxStatus, rows)
                .map_err(|e| step_error(block_id, "status_update", e))?;
        }

        txn.commit().map_err(|e| step_error(block_id, "commit", e))
    }
}

fn encode<T: serde::Serialize>(value: &T) -> CommitResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| CommitError::Storage {
        reason: format!("row encode failed: {e}"),
    })
}

fn encode_rows<T, F>(entries: &[T], key_of: F) -> CommitResult<Vec<(Vec<u8>, Vec<u8>)>>
where
    T: serde::Serialize,
    F: Fn(&T) -> (Vec<u8>, &T),
{
    entries
        .iter()
        .map(|entry| {
            let (key, value) = key_of(entry);
            Ok((key, encode(value)?))
        })
        .collect()
}

/// Timeouts stay timeouts (retryable infra); everything else becomes a
/// commit abort naming the failed step.
fn step_error(block_id: BlockId, step: &'static str, err: StoreError) -> CommitError {
    match err {
        StoreError::LockTimeout { .. } | StoreError::IdleTimeout { .. } => err.into(),
        other => CommitError::CommitAborted {
            block_id,
            step,
            reason: other.to_string(),
        },
    }
}
