//! UtxoLedger: unspent-output map with per-key concurrency control.
//!
//! The ledger shards outputs by `(ecosystem, owner)`. Each shard carries
//! its own mutex, so unrelated accounts never contend; the scan-and-assign
//! step of `consume_inputs` is a critical section per key, not globally.
//!
//! The ledger is explicitly owned (constructed at node startup, passed by
//! handle), not process-global state.

use crate::domain::entities::{Consumer, Hash, LedgerKey, Output, OutputId};
use crate::domain::errors::{CommitError, CommitResult};
use parking_lot::{Mutex, RwLock};
use shared_types::{EcosystemId, KeyId};
use std::collections::HashMap;
use std::sync::Arc;

type Shard = Arc<Mutex<Vec<Output>>>;

/// The unspent-output ledger. Thread-safe; all methods take `&self`.
#[derive(Debug, Default)]
pub struct UtxoLedger {
    shards: RwLock<HashMap<LedgerKey, Shard>>,
}

impl UtxoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, key: LedgerKey) -> Shard {
        if let Some(shard) = self.shards.read().get(&key) {
            return Arc::clone(shard);
        }
        Arc::clone(self.shards.write().entry(key).or_default())
    }

    /// Appends newly created outputs under their `(ecosystem, owner)` keys.
    /// Side effect only; outputs arrive unspent.
    pub fn record_outputs(&self, outputs: Vec<Output>) {
        for output in outputs {
            debug_assert!(!output.is_spent());
            let shard = self.shard(output.key());
            shard.lock().push(output);
        }
    }

    /// Assigns `(tx_hash, input_index)` to unspent outputs of `keys`, in
    /// the order the outputs were created (FIFO per key), stopping once
    /// `declared_inputs` outputs are consumed.
    ///
    /// All key locks are taken up front in sorted order, so two
    /// transactions racing for the same outputs serialize and exactly one
    /// wins each output. On `InsufficientFunds` nothing is assigned: the
    /// offending transaction is excluded whole, never partially applied.
    pub fn consume_inputs(
        &self,
        tx_hash: Hash,
        keys: &[LedgerKey],
        declared_inputs: u32,
    ) -> CommitResult<Vec<OutputId>> {
        if declared_inputs == 0 {
            return Ok(Vec::new());
        }

        let mut sorted_keys: Vec<LedgerKey> = keys.to_vec();
        sorted_keys.sort_unstable();
        sorted_keys.dedup();

        // Lock order follows key order; prevents lock cycles between
        // transactions touching overlapping key sets.
        let shards: Vec<Shard> = sorted_keys.iter().map(|k| self.shard(*k)).collect();
        let mut guards: Vec<_> = shards.iter().map(|s| s.lock()).collect();

        // Scan pass: pick candidates without mutating.
        let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(declared_inputs as usize);
        'scan: for (shard_idx, guard) in guards.iter().enumerate() {
            for (output_idx, output) in guard.iter().enumerate() {
                if output.is_spent() {
                    continue;
                }
                candidates.push((shard_idx, output_idx));
                if candidates.len() == declared_inputs as usize {
                    break 'scan;
                }
            }
        }

        if candidates.len() < declared_inputs as usize {
            let key = sorted_keys.first().copied().unwrap_or(LedgerKey::new(0, [0; 32]));
            return Err(CommitError::InsufficientFunds {
                ecosystem: key.ecosystem,
                owner: key.owner,
                requested: declared_inputs,
                available: candidates.len() as u32,
            });
        }

        // Assign pass: only reached with enough outputs in hand.
        let mut consumed = Vec::with_capacity(candidates.len());
        for (input_index, (shard_idx, output_idx)) in candidates.into_iter().enumerate() {
            let output = &mut guards[shard_idx][output_idx];
            output.spend(Consumer {
                tx_hash,
                input_index: input_index as u32,
            })?;
            consumed.push(output.id);
        }
        Ok(consumed)
    }

    /// Returns only outputs with no consumer, in creation order. Reflects
    /// any consumption already applied in the current block-build pass.
    pub fn unspent_outputs_of(&self, ecosystem: EcosystemId, owner: KeyId) -> Vec<Output> {
        let key = LedgerKey::new(ecosystem, owner);
        let Some(shard) = self.shards.read().get(&key).cloned() else {
            return Vec::new();
        };
        let guard = shard.lock();
        guard.iter().filter(|o| !o.is_spent()).cloned().collect()
    }

    /// Total outputs recorded for a key, spent or not.
    pub fn output_count(&self, ecosystem: EcosystemId, owner: KeyId) -> usize {
        let key = LedgerKey::new(ecosystem, owner);
        self.shards
            .read()
            .get(&key)
            .map(|s| s.lock().len())
            .unwrap_or(0)
    }
}
