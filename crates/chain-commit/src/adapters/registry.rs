//! Static node-registry adapter.
//!
//! Serves a fixed (but adjustable) honor-node count and collects ban
//! recommendations for inspection. The networked registry service
//! replaces this behind the same port in a full node.

use crate::ports::outbound::NodeRegistry;
use parking_lot::Mutex;
use shared_types::NodeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

#[derive(Default)]
pub struct StaticNodeRegistry {
    honor_count: AtomicUsize,
    banned: Mutex<Vec<NodeId>>,
}

impl StaticNodeRegistry {
    pub fn new(honor_count: usize) -> Self {
        Self {
            honor_count: AtomicUsize::new(honor_count),
            banned: Mutex::new(Vec::new()),
        }
    }

    /// Adjusts the honor-node count (membership churn).
    pub fn set_honor_count(&self, count: usize) {
        self.honor_count.store(count, Ordering::SeqCst);
    }

    /// Recommendations received so far.
    pub fn ban_recommendations(&self) -> Vec<NodeId> {
        self.banned.lock().clone()
    }
}

impl NodeRegistry for StaticNodeRegistry {
    fn active_honor_node_count(&self) -> usize {
        self.honor_count.load(Ordering::SeqCst)
    }

    fn submit_ban_recommendations(&self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        info!(count = nodes.len(), "received ban recommendations");
        let mut banned = self.banned.lock();
        for node in nodes {
            if !banned.contains(node) {
                banned.push(*node);
            }
        }
    }
}
