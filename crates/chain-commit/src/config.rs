//! Subsystem configuration.

/// Configuration for the commit core.
#[derive(Clone, Debug)]
pub struct CommitConfig {
    /// Validation failures tolerated before a mempool transaction is
    /// poisoned (excluded from batches, surfaced, never silently deleted).
    pub attempt_ceiling: u32,
    /// Row batch size for startup mempool rebuild scans.
    pub dedup_scan_batch: usize,
    /// Maximum rows per batch-insert / multi-row update statement.
    pub insert_chunk_size: usize,
    /// Default batch size for `select_batch`.
    pub max_batch: usize,
    /// Lock-wait timeout handed to the durable store (milliseconds).
    pub lock_wait_ms: u64,
    /// Idle-in-transaction timeout handed to the durable store (milliseconds).
    pub idle_txn_timeout_ms: u64,
    /// Trailing window for bad-block report aggregation (seconds).
    pub ban_window_secs: u64,
    /// Distinct disputed blocks a single reporter must have seen from a
    /// producer before that pair counts.
    pub min_distinct_blocks_per_reporter: usize,
    /// Independent reporters required before a producer ban is recommended.
    pub min_corroborating_reporters: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            attempt_ceiling: 125,
            dedup_scan_batch: 512,
            insert_chunk_size: 500,
            max_batch: 1_000,
            lock_wait_ms: 5_000,
            idle_txn_timeout_ms: 30_000,
            ban_window_secs: 24 * 60 * 60,
            min_distinct_blocks_per_reporter: 3,
            min_corroborating_reporters: 2,
        }
    }
}

impl CommitConfig {
    /// Creates a minimal config for testing.
    pub fn for_testing() -> Self {
        Self {
            attempt_ceiling: 3,
            dedup_scan_batch: 4,
            insert_chunk_size: 2,
            max_batch: 16,
            lock_wait_ms: 1_000,
            idle_txn_timeout_ms: 5_000,
            ban_window_secs: 1_000,
            min_distinct_blocks_per_reporter: 2,
            min_corroborating_reporters: 2,
        }
    }
}
