//! Outbound (driven) ports for the commit core.
//!
//! The durable store is out of scope for this subsystem: it is consumed
//! through [`ChainStore`] as an ACID transactional row store. The node
//! registry and wall clock are likewise external collaborators.

use crate::domain::errors::CommitError;
use shared_types::{NodeId, Timestamp};
use thiserror::Error;

/// Logical tables of the commit core, used to scope keys and the
/// monotonic id allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Durable mempool rows, primary key = transaction hash.
    Mempool,
    /// Permanent inclusion log, primary key = transaction hash.
    InclusionLog,
    /// Undo journal, primary key = allocated entry id.
    Rollback,
    /// Transaction status rows (error text / block id), key = hash.
    TxStatus,
    /// Output records, key = (tx hash, output index).
    Outputs,
    /// Per-block vote counters, key = block id.
    Confirmations,
    /// Bad-block reports, key = (producer, consumer, block).
    BadBlockReports,
    /// Arbitrary rows mutated by contract execution effects.
    ContractState,
}

impl Table {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mempool => "mempool",
            Self::InclusionLog => "inclusion_log",
            Self::Rollback => "rollback_log",
            Self::TxStatus => "tx_status",
            Self::Outputs => "outputs",
            Self::Confirmations => "confirmations",
            Self::BadBlockReports => "bad_block_reports",
            Self::ContractState => "contract_state",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Durable store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Primary-key violation. The final authority on uniqueness.
    #[error("duplicate key in table {table}")]
    DuplicateKey { table: Table },

    /// Lock-wait timeout exceeded.
    #[error("lock wait exceeded {waited_ms}ms on table {table}")]
    LockTimeout { table: Table, waited_ms: u64 },

    /// Idle-in-transaction timeout exceeded; the transaction was killed.
    #[error("transaction idle past {idle_ms}ms, aborted")]
    IdleTimeout { idle_ms: u64 },

    /// Row encode/decode failure.
    #[error("row codec failure: {0}")]
    Codec(String),

    /// Any other backend failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout { table, waited_ms } => CommitError::StorageTimeout {
                operation: format!("lock wait on {table} ({waited_ms}ms)"),
            },
            StoreError::IdleTimeout { idle_ms } => CommitError::StorageTimeout {
                operation: format!("idle transaction ({idle_ms}ms)"),
            },
            other => CommitError::Storage {
                reason: other.to_string(),
            },
        }
    }
}

/// One row of a multi-row conditional update. All assignments of one
/// `update_rows` call are applied by a single statement, bounding query
/// count independent of block size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseAssignment {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// A pre-computed row mutation produced by contract execution. Opaque to
/// this core; applied verbatim inside the commit unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEffect {
    Put {
        table: Table,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        table: Table,
        key: Vec<u8>,
    },
}

/// Durable store contract: an ACID transactional row store.
///
/// Lock-wait and idle-transaction timeouts are configured on the concrete
/// store at construction; breaching either surfaces as
/// [`StoreError::LockTimeout`] / [`StoreError::IdleTimeout`].
pub trait ChainStore: Send + Sync {
    /// Point read outside any transaction.
    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Key-ordered scan of up to `limit` rows strictly after `after`.
    /// Callers page through large tables in bounded batches.
    fn scan(
        &self,
        table: Table,
        after: Option<&[u8]>,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Opens a transaction. Dropping the handle without `commit` rolls
    /// every buffered write back.
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>>;
}

/// One open store transaction. Writes are invisible to other readers
/// until `commit`; any error leaves the store untouched.
pub trait StoreTransaction {
    /// Insert that fails with `DuplicateKey` if the key exists.
    fn insert_unique(&mut self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Insert-or-replace.
    fn upsert(&mut self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Deletes a row; missing rows are not an error.
    fn delete(&mut self, table: Table, key: &[u8]) -> StoreResult<()>;

    /// Unique-inserts a batch of rows as one statement.
    fn batch_insert(&mut self, table: Table, rows: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()>;

    /// Applies all assignments to existing rows as one multi-row
    /// statement (the SQL rendition is a single CASE update).
    fn update_rows(&mut self, table: Table, assignments: &[CaseAssignment]) -> StoreResult<()>;

    /// Reserves `count` consecutive ids from the table's monotonic
    /// allocator, returning the first. Reservations survive rollback
    /// (sequence semantics), which is what keeps concurrently committed
    /// blocks from interleaving ids.
    fn reserve_ids(&mut self, table: Table, count: u64) -> StoreResult<u64>;

    /// Point read seeing this transaction's own writes.
    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically applies every buffered write.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Node-registry collaborator: quorum denominator and ban sink.
pub trait NodeRegistry: Send + Sync {
    /// Snapshot of the active honor-node count at evaluation time.
    fn active_honor_node_count(&self) -> usize;

    /// Receives ban recommendations. Acting on them is external policy.
    fn submit_ban_recommendations(&self, nodes: &[NodeId]);
}

/// Time source, abstracted for deterministic tests.
pub trait TimeSource: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Default wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.time
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
