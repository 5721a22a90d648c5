//! # Chain-Commit Test Suite
//!
//! Unified test crate for the transaction-commit and chain-finality core.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Shared service/store harness
//!     ├── commit_flows.rs   # Submit -> select -> commit end to end
//!     ├── concurrency.rs    # Double-spend and racing-commit scenarios
//!     └── finality.rs       # Quorum, backpressure, reputation choreography
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p commit-tests
//!
//! # By category
//! cargo test -p commit-tests integration::commit_flows::
//! cargo test -p commit-tests integration::concurrency::
//! cargo test -p commit-tests integration::finality::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
