//! Cross-component integration tests.

pub mod commit_flows;
pub mod concurrency;
pub mod finality;
pub mod fixtures;
