//! Shared harness for the integration tests: one service wired to the
//! in-memory store and a static node registry.

use chain_commit::adapters::{MemoryStore, StaticNodeRegistry};
use chain_commit::domain::entities::{
    BlockId, Hash, InclusionEntry, Output, OutputId, StatusUpdate, TransactionRecord,
};
use chain_commit::{ChainCommitService, CommitConfig, CommitRequest};
use shared_types::{KeyId, PriorityClass, U256};
use std::sync::Arc;

pub type TestService = ChainCommitService<MemoryStore, StaticNodeRegistry>;

pub struct Harness {
    pub service: Arc<TestService>,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<StaticNodeRegistry>,
}

/// Installs a fmt subscriber once, so `RUST_LOG=chain_commit=debug`
/// surfaces core logs during test runs.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness(honor_count: usize) -> Harness {
    harness_with_config(honor_count, CommitConfig::for_testing())
}

pub fn harness_with_config(honor_count: usize, config: CommitConfig) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryStore::from_config(&config));
    let registry = Arc::new(StaticNodeRegistry::new(honor_count));
    let service = Arc::new(ChainCommitService::new(
        config,
        Arc::clone(&store),
        Arc::clone(&registry),
    ));
    Harness {
        service,
        store,
        registry,
    }
}

/// A deterministic transaction whose hash is derived from `seed`.
pub fn transaction(seed: u8, fee: u64, submitted_at: u64) -> TransactionRecord {
    TransactionRecord::new(
        [seed; 32],
        vec![seed; 8],
        PriorityClass::ApiContract,
        U256::from(fee),
        submitted_at,
        [0xEE; 32],
    )
}

/// An unspent output owned by `owner` in ecosystem 1.
pub fn output(tx_seed: u8, index: u32, owner: KeyId) -> Output {
    Output {
        id: OutputId::new([tx_seed; 32], index),
        owner,
        ecosystem: 1,
        value: U256::from(100u64),
        asset: "native".into(),
        producing_contract: None,
        producing_block: 1,
        consumer: None,
    }
}

/// A commit request finalizing `hashes` into `block_id`, with matching
/// inclusion-log rows and status updates.
pub fn block_request(block_id: BlockId, hashes: &[Hash]) -> CommitRequest {
    CommitRequest {
        block_id,
        used_tx_hashes: hashes.to_vec(),
        log_entries: hashes
            .iter()
            .map(|&hash| InclusionEntry { hash, block_id })
            .collect(),
        status_updates: hashes
            .iter()
            .map(|&tx_hash| StatusUpdate {
                tx_hash,
                error: None,
                block_id: Some(block_id),
            })
            .collect(),
        ..CommitRequest::default()
    }
}
