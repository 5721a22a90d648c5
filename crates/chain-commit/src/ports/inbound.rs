//! # Inbound Port - ChainCommitApi
//!
//! Primary driving port exposing the commit core to the rest of the node
//! (API layer, block builder, peer-vote ingestion, reputation sweep).

use crate::committer::CommitRequest;
use crate::domain::entities::{BlockId, Hash, LedgerKey, NodeId, Output, OutputId, TransactionRecord};
use crate::domain::errors::CommitResult;
use crate::domain::value_objects::{MempoolStatus, QuorumStatus};
use async_trait::async_trait;
use shared_types::{EcosystemId, KeyId};

/// Primary API for the transaction-commit and chain-finality core.
///
/// # Example
///
/// ```rust,ignore
/// use chain_commit::ports::ChainCommitApi;
///
/// async fn build_block(core: &impl ChainCommitApi, block_id: u64) {
///     let batch = core.select_batch(100).await;
///     // ... validate, consume inputs, assemble CommitRequest ...
///     // core.commit_block(request).await?;
/// }
/// ```
#[async_trait]
pub trait ChainCommitApi: Send + Sync {
    /// Accepts a candidate transaction into the durable mempool.
    ///
    /// # Errors
    /// - `DuplicateTransaction`: hash already in mempool, pending-commit
    ///   set, or the permanent inclusion log
    /// - `Storage` / `StorageTimeout`: durable insert failed
    async fn submit_transaction(&self, tx: TransactionRecord) -> CommitResult<Hash>;

    /// Returns up to `limit` transactions in auction order (priority
    /// class desc, fee desc, submission time asc).
    async fn select_batch(&self, limit: usize) -> Vec<TransactionRecord>;

    /// Records a validation failure for a mempool transaction. Surfaces
    /// `AttemptCeilingExceeded` once the retry ceiling is passed.
    async fn record_transaction_failure(&self, hash: Hash) -> CommitResult<u32>;

    /// Applies one block's effects as a single atomic unit. Any failure
    /// rolls the whole unit back and requeues the block's transactions.
    async fn commit_block(&self, request: CommitRequest) -> CommitResult<()>;

    /// Appends newly created outputs to the ledger.
    async fn record_outputs(&self, outputs: Vec<Output>);

    /// Consumes `declared_inputs` unspent outputs of `keys` for the
    /// spending transaction, FIFO per key, all-or-nothing.
    async fn consume_inputs(
        &self,
        tx_hash: Hash,
        keys: Vec<LedgerKey>,
        declared_inputs: u32,
    ) -> CommitResult<Vec<OutputId>>;

    /// Unspent outputs of one `(ecosystem, owner)` key.
    async fn unspent_outputs_of(&self, ecosystem: EcosystemId, owner: KeyId) -> Vec<Output>;

    /// Ingests one peer vote. Unordered and duplicated delivery is fine;
    /// returns false for duplicates.
    async fn record_vote(&self, block_id: BlockId, voter: NodeId, good: bool) -> bool;

    /// Whether the block has reached quorum against the current
    /// honor-node snapshot. Latched once true.
    async fn is_confirmed(&self, block_id: BlockId) -> bool;

    /// Fork backpressure: whether the node may build `current_block_id`.
    async fn may_generate_next_block(&self, current_block_id: BlockId) -> bool;

    /// Appends a bad-block report; returns false for duplicates.
    async fn report_bad_block(&self, producer: NodeId, consumer: NodeId, block_id: BlockId)
        -> bool;

    /// Producers with corroborated bad-block evidence. Also forwarded to
    /// the node-registry ban sink.
    async fn nodes_to_ban(&self) -> Vec<NodeId>;

    /// Operator snapshot of the mempool.
    async fn mempool_status(&self) -> MempoolStatus;

    /// Finality snapshot for one block.
    async fn quorum_status(&self, block_id: BlockId) -> QuorumStatus;
}
