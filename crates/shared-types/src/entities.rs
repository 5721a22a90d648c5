//! # Core Shared Entities
//!
//! Identifier types and the wire-level transaction record.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `NodeId`, `KeyId`, `BlockId`, `EcosystemId`
//! - **Mempool boundary**: `TransactionRecord`, `PriorityClass`

use serde::{Deserialize, Serialize};

// Re-export U256 from primitive-types for use across all subsystems.
pub use primitive_types::U256;

/// A 32-byte content digest (e.g., SHA-256).
pub type Hash = [u8; 32];

/// A 32-byte public-key identifier of a transaction sender or output owner.
pub type KeyId = [u8; 32];

/// Block identifier. Block ids are dense and monotonically increasing.
pub type BlockId = u64;

/// Ecosystem identifier partitioning the output ledger.
pub type EcosystemId = u32;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Unique identifier for a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Test-friendly constructor filling the id with one byte.
    pub const fn from_byte(b: u8) -> Self {
        Self([b; 32])
    }
}

/// Transaction priority class.
///
/// Used only as a sort tiebreak ahead of the fee bid; `StopNetwork`
/// always wins. Variant order is the ordering:
/// `OnBlockGenerated < ApiContract < StopNetwork`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum PriorityClass {
    /// Housekeeping transactions emitted when a block is generated.
    #[default]
    OnBlockGenerated = 0,
    /// Regular API-submitted contract transactions.
    ApiContract = 1,
    /// Emergency network-stop transactions. Always ordered first.
    StopNetwork = 2,
}

impl PriorityClass {
    /// Decodes a wire byte into a priority class.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::OnBlockGenerated),
            1 => Some(Self::ApiContract),
            2 => Some(Self::StopNetwork),
            _ => None,
        }
    }
}

/// A transaction as exchanged at the mempool boundary.
///
/// `hash` is the primary identity: two records with the same hash are the
/// same transaction everywhere in the system. The payload is an opaque
/// signed blob; this core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// 32-byte content digest, primary identity.
    pub hash: Hash,
    /// Opaque signed payload bytes.
    pub payload: Vec<u8>,
    /// Priority class (sort tiebreak above the fee).
    pub priority: PriorityClass,
    /// Expedite fee bid, in smallest units.
    pub fee: U256,
    /// Submission time, unix seconds.
    pub submitted_at: Timestamp,
    /// Sender public-key identifier.
    pub sender_key: KeyId,
    /// Set once the transaction has been folded into a block.
    pub used: bool,
    /// Set once the transaction has been gossiped to peers.
    pub sent: bool,
    /// Set once signature verification has passed.
    pub verified: bool,
}

impl TransactionRecord {
    /// Creates a fresh, unverified record.
    pub fn new(
        hash: Hash,
        payload: Vec<u8>,
        priority: PriorityClass,
        fee: U256,
        submitted_at: Timestamp,
        sender_key: KeyId,
    ) -> Self {
        Self {
            hash,
            payload,
            priority,
            fee,
            submitted_at,
            sender_key,
            used: false,
            sent: false,
            verified: false,
        }
    }
}
