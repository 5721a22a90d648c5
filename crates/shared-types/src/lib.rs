//! # Shared Types Crate
//!
//! Cross-subsystem primitives for the transaction-commit and chain-finality
//! core. This crate is the single source of truth for identifiers and for
//! the wire-level transaction record exchanged at the mempool boundary.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifier types (`Hash`, `NodeId`, `KeyId`,
//!   `BlockId`, `EcosystemId`) are defined once, here.
//! - **Explicit Codec**: the wire format in [`wire`] is encoded and decoded
//!   field by field per message type. No runtime reflection and no generic
//!   struct walker, so a mismatch between encode and decode is a
//!   compile-time visible defect, not a runtime surprise.

pub mod entities;
pub mod wire;

pub use entities::*;
pub use wire::{decode_transaction, encode_transaction, WireError};
