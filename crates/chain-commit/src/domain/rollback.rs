//! RollbackLog: per-block undo journal construction.
//!
//! Every row a block's transactions mutate gets its pre-image captured as
//! a [`RollbackEntry`]. Ids are allocated contiguously per block from a
//! single base reservation, so ascending ids reconstruct block-local
//! ordering and descending ids give correct LIFO undo. Entries are
//! immutable once written; the reorg/undo routine consuming them lives
//! outside this core.

use crate::domain::entities::{BlockId, Hash, RollbackEntry};
use serde::{Deserialize, Serialize};

/// A rollback entry before id assignment, as produced during block
/// assembly (the pre-image of one mutated row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackDraft {
    pub tx_hash: Hash,
    pub table_name: String,
    pub row_id: String,
    pub prior_row_json: String,
    pub prior_row_hash: Hash,
}

impl RollbackDraft {
    pub fn new(
        tx_hash: Hash,
        table_name: impl Into<String>,
        row_id: impl Into<String>,
        prior_row_json: impl Into<String>,
        prior_row_hash: Hash,
    ) -> Self {
        Self {
            tx_hash,
            table_name: table_name.into(),
            row_id: row_id.into(),
            prior_row_json: prior_row_json.into(),
            prior_row_hash,
        }
    }
}

/// Materializes drafts into entries with ids `base, base+1, ..`, preserving
/// draft order. `base` comes from a single id reservation per block.
pub fn assign_rollback_ids(
    base: u64,
    block_id: BlockId,
    drafts: Vec<RollbackDraft>,
) -> Vec<RollbackEntry> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| RollbackEntry {
            id: base + i as u64,
            block_id,
            tx_hash: draft.tx_hash,
            table_name: draft.table_name,
            row_id: draft.row_id,
            prior_row_json: draft.prior_row_json,
            prior_row_hash: draft.prior_row_hash,
        })
        .collect()
}
