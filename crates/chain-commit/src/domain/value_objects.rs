//! Value objects: ordering keys, status snapshots, identity scopes.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, Hash, NodeId, PriorityClass, Timestamp, U256};
use std::cmp::Ordering;

/// Ordering key for the mempool priority index.
///
/// Natural iteration order of a `BTreeSet<PrioritizedTx>` is the auction
/// order: priority class descending, fee descending, submission time
/// ascending, hash ascending as the final deterministic tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioritizedTx {
    pub priority: PriorityClass,
    pub fee: U256,
    pub submitted_at: Timestamp,
    pub hash: Hash,
}

impl PrioritizedTx {
    pub const fn new(priority: PriorityClass, fee: U256, submitted_at: Timestamp, hash: Hash) -> Self {
        Self {
            priority,
            fee,
            submitted_at,
            hash,
        }
    }
}

impl Ord for PrioritizedTx {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.fee.cmp(&self.fee))
            .then_with(|| self.submitted_at.cmp(&other.submitted_at))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for PrioritizedTx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Where a duplicate hash was found. Variants are listed in the fixed
/// order the scopes are queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityScope {
    /// The transient mempool set.
    Mempool,
    /// Transactions selected into an in-flight block commit.
    PendingCommit,
    /// The permanent inclusion log.
    InclusionLog,
}

impl std::fmt::Display for IdentityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mempool => write!(f, "mempool"),
            Self::PendingCommit => write!(f, "pending commit set"),
            Self::InclusionLog => write!(f, "inclusion log"),
        }
    }
}

/// Operator-facing mempool snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MempoolStatus {
    /// Transactions available for selection.
    pub pending: usize,
    /// Transactions inside an in-flight commit.
    pub pending_commit: usize,
    /// Transactions past the attempt ceiling, kept for inspection.
    pub poisoned: usize,
    /// Age of the oldest transaction, seconds.
    pub oldest_age_secs: u64,
}

/// Finality snapshot for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuorumStatus {
    pub block_id: BlockId,
    pub good_votes: u32,
    pub bad_votes: u32,
    pub confirmed: bool,
}

/// Evidence behind one ban recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEvidence {
    pub producer: NodeId,
    /// Reporters that independently crossed the per-pair block threshold.
    pub corroborating_reporters: usize,
}
