//! ConfirmationQuorum: peer vote tally and finality gate.
//!
//! State machine per block: `Unconfirmed -> Confirmed`, terminal. Driven
//! purely by vote counts; there is no rejection state, since persistent
//! disagreement is the ReputationTracker's business.
//!
//! Votes may arrive out of order, delayed, or duplicated; recording is
//! idempotent per (block, voter). Confirmation is latched: once a block
//! confirms it never reverts, even if the honor-node count later grows.

use crate::domain::entities::{BlockConfirmation, BlockId, NodeId, Timestamp};
use crate::domain::value_objects::QuorumStatus;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct BlockVotes {
    confirmation: BlockConfirmation,
    voters: HashSet<NodeId>,
    confirmed: bool,
}

/// Vote tally across blocks. One instance per node, owned by the service.
#[derive(Debug, Default)]
pub struct ConfirmationQuorum {
    blocks: HashMap<BlockId, BlockVotes>,
    /// Highest block id seen in any vote or commit.
    highest_known: BlockId,
    /// Highest block id that has reached quorum.
    highest_confirmed: Option<BlockId>,
}

impl ConfirmationQuorum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes that `block_id` exists (e.g., it was just committed locally).
    pub fn observe_block(&mut self, block_id: BlockId) {
        self.highest_known = self.highest_known.max(block_id);
    }

    /// Records one peer vote. Returns false for duplicate (block, voter)
    /// pairs, which are counted once no matter how often they arrive.
    pub fn record_vote(
        &mut self,
        block_id: BlockId,
        voter: NodeId,
        good: bool,
        now: Timestamp,
    ) -> bool {
        self.highest_known = self.highest_known.max(block_id);
        let votes = self.blocks.entry(block_id).or_default();
        votes.confirmation.block_id = block_id;
        if !votes.voters.insert(voter) {
            return false;
        }
        if good {
            votes.confirmation.good_votes += 1;
        } else {
            votes.confirmation.bad_votes += 1;
        }
        votes.confirmation.last_update = now;
        true
    }

    /// Whether `block_id` has reached quorum: `good >= floor(honor / 2)`.
    ///
    /// `honor_count` is a snapshot of the active honor-node set taken at
    /// evaluation time. Zero honor nodes means vacuous confirmation (the
    /// bootstrap / single-node case). The result is latched.
    pub fn is_confirmed(&mut self, block_id: BlockId, honor_count: usize) -> bool {
        let votes = self.blocks.entry(block_id).or_default();
        votes.confirmation.block_id = block_id;
        if votes.confirmed {
            return true;
        }
        let needed = (honor_count / 2) as u32;
        if honor_count == 0 || votes.confirmation.good_votes >= needed {
            votes.confirmed = true;
            self.highest_confirmed = Some(
                self.highest_confirmed
                    .map_or(block_id, |prev| prev.max(block_id)),
            );
            return true;
        }
        false
    }

    /// Backpressure gate: the node refuses to extend the chain more than
    /// one block past quorum-confirmed state.
    pub fn may_generate_next_block(&self, current_block_id: BlockId) -> bool {
        match self.highest_confirmed {
            Some(confirmed) => current_block_id <= confirmed + 1,
            // Nothing confirmed yet: only the first block may be built.
            None => current_block_id <= 1,
        }
    }

    pub fn status(&self, block_id: BlockId) -> QuorumStatus {
        self.blocks
            .get(&block_id)
            .map(|v| QuorumStatus {
                block_id,
                good_votes: v.confirmation.good_votes,
                bad_votes: v.confirmation.bad_votes,
                confirmed: v.confirmed,
            })
            .unwrap_or(QuorumStatus {
                block_id,
                ..QuorumStatus::default()
            })
    }

    pub fn highest_confirmed(&self) -> Option<BlockId> {
        self.highest_confirmed
    }

    pub fn highest_known(&self) -> BlockId {
        self.highest_known
    }
}
