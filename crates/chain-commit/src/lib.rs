//! # Transaction-Commit & Chain-Finality Core
//!
//! Decides when a set of transactions may be irreversibly folded into chain
//! state, prevents double-spending of value, and determines whether a block
//! produced by a peer is trustworthy enough to build on.
//!
//! ## Components
//!
//! | Component | Module | Responsibility |
//! |-----------|--------|----------------|
//! | TxStore | `domain/mempool.rs` | Durable mempool + permanent inclusion log, hash uniqueness |
//! | UtxoLedger | `domain/utxo.rs` | Unspent-output map, at-most-one-consumer-per-output |
//! | RollbackLog | `domain/rollback.rs` | Per-block undo journal with contiguous ids |
//! | BlockCommitter | `committer.rs` | One block's effects as a single atomic unit |
//! | ConfirmationQuorum | `domain/quorum.rs` | Peer vote tally, finality gate, fork backpressure |
//! | ReputationTracker | `domain/reputation.rs` | Corroborated bad-block reports into ban advice |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | A transaction hash enters the inclusion log at most once | `domain/identity.rs` chain + store PK constraint |
//! | INVARIANT-2 | An output's consumer is write-once | `domain/utxo.rs` - `Output::spend()` under per-key lock |
//! | INVARIANT-3 | Block commit is all-or-nothing | `committer.rs` - single store transaction |
//! | INVARIANT-4 | Rollback ids are contiguous per block | `committer.rs` - one base-id reservation |
//! | INVARIANT-5 | Confirmation never reverts | `domain/quorum.rs` - latched flag |
//!
//! ## Data Flow
//!
//! ```text
//! submit ──→ [TxStore mempool] ──select_batch──→ block builder
//!                                   │ consume_inputs (per-key critical section)
//!                                   ▼
//!                          [BlockCommitter.commit]  ← raw contract effects
//!                    mempool delete + inclusion log + rollback journal
//!                                   │
//!                         peer votes ▼
//!                        [ConfirmationQuorum] ──bad votes──→ [ReputationTracker]
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/  - in-memory transactional store, static node registry
//! ports/     - inbound ChainCommitApi, outbound ChainStore / NodeRegistry / TimeSource
//! domain/    - pure state machines and ledgers listed above
//! service.rs - ChainCommitService wiring domain + ports
//! ```

pub mod adapters;
pub mod committer;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use committer::{BlockCommitter, CommitRequest};
pub use config::CommitConfig;
pub use domain::*;
pub use service::ChainCommitService;
