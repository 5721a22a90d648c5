//! ReputationTracker: byzantine-evidence aggregation over bad-block reports.
//!
//! Single-reporter noise is filtered twice: a (producer, reporter) pair
//! only counts once it spans enough distinct disputed blocks inside the
//! trailing window, and a producer is only recommended for banning once
//! enough independent reporters cross that per-pair threshold.
//!
//! The output is advisory; removing a node from the honor set is an
//! external policy decision consuming this list.

use crate::domain::entities::{BadBlockReport, BlockId, NodeId, Timestamp};
use crate::domain::value_objects::BanEvidence;
use std::collections::{BTreeMap, HashSet};

/// Append-only bad-block report log with aggregation queries.
#[derive(Debug, Default)]
pub struct ReputationTracker {
    reports: Vec<BadBlockReport>,
    seen: HashSet<(NodeId, NodeId, BlockId)>,
}

impl ReputationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one report. At most one live row exists per
    /// (producer, reporter, block); duplicates return false.
    pub fn report_bad_block(
        &mut self,
        producer: NodeId,
        consumer: NodeId,
        block_id: BlockId,
        now: Timestamp,
    ) -> bool {
        if !self.seen.insert((producer, consumer, block_id)) {
            return false;
        }
        self.reports.push(BadBlockReport {
            producer,
            consumer,
            block_id,
            observed_at: now,
            deleted: false,
        });
        true
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// Producers with corroborated bad-block evidence inside the trailing
    /// window, with the evidence that crossed the thresholds. Output is
    /// ordered by producer id for determinism.
    pub fn ban_evidence(
        &self,
        now: Timestamp,
        window_secs: u64,
        min_distinct_blocks_per_reporter: usize,
        min_corroborating_reporters: usize,
    ) -> Vec<BanEvidence> {
        let cutoff = now.saturating_sub(window_secs);

        // (producer, reporter) -> distinct disputed blocks in the window.
        let mut per_pair: BTreeMap<(NodeId, NodeId), HashSet<BlockId>> = BTreeMap::new();
        for report in &self.reports {
            if report.deleted || report.observed_at < cutoff {
                continue;
            }
            per_pair
                .entry((report.producer, report.consumer))
                .or_default()
                .insert(report.block_id);
        }

        // producer -> reporters that crossed the per-pair block threshold.
        let mut per_producer: BTreeMap<NodeId, usize> = BTreeMap::new();
        for ((producer, _consumer), blocks) in per_pair {
            if blocks.len() >= min_distinct_blocks_per_reporter {
                *per_producer.entry(producer).or_default() += 1;
            }
        }

        per_producer
            .into_iter()
            .filter(|(_, reporters)| *reporters >= min_corroborating_reporters)
            .map(|(producer, corroborating_reporters)| BanEvidence {
                producer,
                corroborating_reporters,
            })
            .collect()
    }

    /// Producers recommended for exclusion from the honor-node set.
    pub fn nodes_to_ban(
        &self,
        now: Timestamp,
        window_secs: u64,
        min_distinct_blocks_per_reporter: usize,
        min_corroborating_reporters: usize,
    ) -> Vec<NodeId> {
        self.ban_evidence(
            now,
            window_secs,
            min_distinct_blocks_per_reporter,
            min_corroborating_reporters,
        )
        .into_iter()
        .map(|e| e.producer)
        .collect()
    }
}
