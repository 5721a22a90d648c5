//! ChainCommitService: the commit core behind the inbound port.
//!
//! Owns the in-memory state machines (mempool index, output ledger, vote
//! tally, reputation log) and drives the durable store through the
//! BlockCommitter. One instance per node.

use crate::committer::{BlockCommitter, CommitRequest};
use crate::config::CommitConfig;
use crate::domain::entities::{
    BlockId, Hash, LedgerKey, NodeId, Output, OutputId, StatusUpdate, TransactionRecord,
};
use crate::domain::errors::{CommitError, CommitResult};
use crate::domain::identity::{IdentityChain, TransactionIdentitySet};
use crate::domain::mempool::TxStore;
use crate::domain::quorum::ConfirmationQuorum;
use crate::domain::reputation::ReputationTracker;
use crate::domain::utxo::UtxoLedger;
use crate::domain::value_objects::{IdentityScope, MempoolStatus, QuorumStatus};
use crate::ports::inbound::ChainCommitApi;
use crate::ports::outbound::{
    CaseAssignment, ChainStore, NodeRegistry, StoreError, SystemTimeSource, Table, TimeSource,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{decode_transaction, encode_transaction, EcosystemId, KeyId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity view over the permanent inclusion log, backed by the store.
struct InclusionLogScope<'a, S> {
    store: &'a S,
}

impl<S: ChainStore> TransactionIdentitySet for InclusionLogScope<'_, S> {
    fn scope(&self) -> IdentityScope {
        IdentityScope::InclusionLog
    }

    fn contains(&self, hash: &Hash) -> CommitResult<bool> {
        Ok(self.store.get(Table::InclusionLog, hash)?.is_some())
    }
}

/// The transaction-commit and chain-finality core.
pub struct ChainCommitService<S, R, T = SystemTimeSource> {
    config: CommitConfig,
    store: Arc<S>,
    registry: Arc<R>,
    time: T,
    mempool: RwLock<TxStore>,
    ledger: UtxoLedger,
    quorum: RwLock<ConfirmationQuorum>,
    reputation: RwLock<ReputationTracker>,
    committer: BlockCommitter<S>,
}

impl<S, R> ChainCommitService<S, R>
where
    S: ChainStore,
    R: NodeRegistry,
{
    pub fn new(config: CommitConfig, store: Arc<S>, registry: Arc<R>) -> Self {
        Self::with_time_source(config, store, registry, SystemTimeSource)
    }
}

impl<S, R, T> ChainCommitService<S, R, T>
where
    S: ChainStore,
    R: NodeRegistry,
    T: TimeSource,
{
    pub fn with_time_source(
        config: CommitConfig,
        store: Arc<S>,
        registry: Arc<R>,
        time: T,
    ) -> Self {
        let committer = BlockCommitter::new(Arc::clone(&store), config.clone());
        let mempool = RwLock::new(TxStore::new(config.attempt_ceiling));
        Self {
            config,
            store,
            registry,
            time,
            mempool,
            ledger: UtxoLedger::new(),
            quorum: RwLock::new(ConfirmationQuorum::new()),
            reputation: RwLock::new(ReputationTracker::new()),
            committer,
        }
    }

    /// Rebuilds the mempool index from the durable mempool table. Called
    /// once at node startup, before the service takes traffic. Pages
    /// through the table in bounded batches.
    pub fn bootstrap(&self) -> CommitResult<usize> {
        let mut mempool = self.mempool.write();
        let mut after: Option<Vec<u8>> = None;
        let mut restored = 0usize;
        loop {
            let page = self
                .store
                .scan(Table::Mempool, after.as_deref(), self.config.dedup_scan_batch)?;
            let done = page.len() < self.config.dedup_scan_batch;
            for (key, value) in page {
                let record = decode_transaction(&value).map_err(|e| CommitError::Storage {
                    reason: format!("mempool row decode failed: {e}"),
                })?;
                mempool.insert_unchecked(record);
                restored += 1;
                after = Some(key);
            }
            if done {
                break;
            }
        }
        info!(restored, "mempool index rebuilt from durable store");
        Ok(restored)
    }

    /// Best-effort status-row write outside the commit path. Failures are
    /// logged, not surfaced; the in-memory decision already stands.
    fn persist_status(&self, update: &StatusUpdate) {
        let result = (|| -> Result<(), StoreError> {
            let value =
                bincode::serialize(update).map_err(|e| StoreError::Codec(e.to_string()))?;
            let mut txn = self.store.begin()?;
            txn.update_rows(
                Table::TxStatus,
                &[CaseAssignment {
                    key: update.tx_hash.to_vec(),
                    value,
                }],
            )?;
            txn.commit()
        })();
        if let Err(err) = result {
            warn!(error = %err, "status row update failed");
        }
    }
}

#[async_trait]
impl<S, R, T> ChainCommitApi for ChainCommitService<S, R, T>
where
    S: ChainStore,
    R: NodeRegistry,
    T: TimeSource,
{
    async fn submit_transaction(&self, tx: TransactionRecord) -> CommitResult<Hash> {
        let hash = tx.hash;
        // The write lock is held across the durable insert so a racing
        // submit of the same hash cannot slip between check and insert.
        let mut mempool = self.mempool.write();
        {
            let mempool_scope = mempool.mempool_scope();
            let pending_scope = mempool.pending_scope();
            let inclusion_scope = InclusionLogScope {
                store: self.store.as_ref(),
            };
            let chain = IdentityChain::new(&mempool_scope, &pending_scope, &inclusion_scope);
            if let Some(scope) = chain.locate(&hash)? {
                debug!(hash = ?hash, %scope, "duplicate transaction rejected");
                return Err(CommitError::DuplicateTransaction { hash, scope });
            }
        }

        let row = encode_transaction(&tx);
        let status = bincode::serialize(&StatusUpdate {
            tx_hash: hash,
            error: None,
            block_id: None,
        })
        .map_err(|e| CommitError::Storage {
            reason: format!("status row encode failed: {e}"),
        })?;

        let durable = (|| {
            let mut txn = self.store.begin()?;
            txn.insert_unique(Table::Mempool, &hash, &row)?;
            txn.upsert(Table::TxStatus, &hash, &status)?;
            txn.commit()
        })();
        match durable {
            Ok(()) => {}
            // The primary key is the final authority on uniqueness.
            Err(StoreError::DuplicateKey { .. }) => {
                return Err(CommitError::DuplicateTransaction {
                    hash,
                    scope: IdentityScope::Mempool,
                })
            }
            Err(other) => return Err(other.into()),
        }

        mempool.insert(tx)?;
        debug!(hash = ?hash, "transaction accepted into mempool");
        Ok(hash)
    }

    async fn select_batch(&self, limit: usize) -> Vec<TransactionRecord> {
        self.mempool
            .read()
            .select_batch(limit.min(self.config.max_batch))
    }

    async fn record_transaction_failure(&self, hash: Hash) -> CommitResult<u32> {
        let result = self.mempool.write().record_failure(&hash);
        if let Err(CommitError::AttemptCeilingExceeded { attempts, .. }) = &result {
            warn!(hash = ?hash, attempts, "transaction poisoned past attempt ceiling");
            self.persist_status(&StatusUpdate {
                tx_hash: hash,
                error: Some(format!("poisoned after {attempts} failed attempts")),
                block_id: None,
            });
        }
        result
    }

    async fn commit_block(&self, request: CommitRequest) -> CommitResult<()> {
        let block_id = request.block_id;
        let fenced = self
            .mempool
            .write()
            .begin_commit(&request.used_tx_hashes, block_id);
        if fenced.len() < request.used_tx_hashes.len() {
            debug!(
                block_id,
                requested = request.used_tx_hashes.len(),
                fenced = fenced.len(),
                "some block transactions were not in the local mempool"
            );
        }

        match self.committer.commit(&request) {
            Ok(()) => {
                self.mempool.write().complete_commit(&fenced);
                self.quorum.write().observe_block(block_id);
                Ok(())
            }
            Err(err) => {
                let requeued = self.mempool.write().abort_commit(&fenced);
                warn!(
                    block_id,
                    requeued = requeued.len(),
                    error = %err,
                    "block commit failed, transactions requeued"
                );
                Err(err)
            }
        }
    }

    async fn record_outputs(&self, outputs: Vec<Output>) {
        self.ledger.record_outputs(outputs);
    }

    async fn consume_inputs(
        &self,
        tx_hash: Hash,
        keys: Vec<LedgerKey>,
        declared_inputs: u32,
    ) -> CommitResult<Vec<OutputId>> {
        self.ledger.consume_inputs(tx_hash, &keys, declared_inputs)
    }

    async fn unspent_outputs_of(&self, ecosystem: EcosystemId, owner: KeyId) -> Vec<Output> {
        self.ledger.unspent_outputs_of(ecosystem, owner)
    }

    async fn record_vote(&self, block_id: BlockId, voter: NodeId, good: bool) -> bool {
        self.quorum
            .write()
            .record_vote(block_id, voter, good, self.time.now())
    }

    async fn is_confirmed(&self, block_id: BlockId) -> bool {
        let honor = self.registry.active_honor_node_count();
        self.quorum.write().is_confirmed(block_id, honor)
    }

    async fn may_generate_next_block(&self, current_block_id: BlockId) -> bool {
        self.quorum.read().may_generate_next_block(current_block_id)
    }

    async fn report_bad_block(
        &self,
        producer: NodeId,
        consumer: NodeId,
        block_id: BlockId,
    ) -> bool {
        self.reputation
            .write()
            .report_bad_block(producer, consumer, block_id, self.time.now())
    }

    async fn nodes_to_ban(&self) -> Vec<NodeId> {
        let nodes = self.reputation.read().nodes_to_ban(
            self.time.now(),
            self.config.ban_window_secs,
            self.config.min_distinct_blocks_per_reporter,
            self.config.min_corroborating_reporters,
        );
        self.registry.submit_ban_recommendations(&nodes);
        nodes
    }

    async fn mempool_status(&self) -> MempoolStatus {
        self.mempool.read().status(self.time.now())
    }

    async fn quorum_status(&self, block_id: BlockId) -> QuorumStatus {
        self.quorum.read().status(block_id)
    }
}
