//! Transaction identity: "has this hash ever been seen?"
//!
//! Duplicate detection spans three locations with different lifetimes:
//! the transient mempool, the pending-commit set of an in-flight block,
//! and the permanent inclusion log. Instead of ad hoc sequential checks at
//! every call site, the three are modeled as one logical
//! [`TransactionIdentitySet`] with three backing implementations, queried
//! by [`IdentityChain`] in that fixed order.
//!
//! The chain is an optimization only. The durable store's primary-key
//! constraint on the mempool table remains the final authority under
//! concurrent submission.

use crate::domain::errors::CommitResult;
use crate::domain::value_objects::IdentityScope;
use shared_types::Hash;

/// One location a transaction hash may be known in.
pub trait TransactionIdentitySet {
    /// Which scope this set covers.
    fn scope(&self) -> IdentityScope;

    /// Whether `hash` is present in this scope.
    fn contains(&self, hash: &Hash) -> CommitResult<bool>;
}

/// The three identity scopes in their documented query order:
/// mempool, then pending-commit set, then inclusion log.
pub struct IdentityChain<'a> {
    sets: [&'a dyn TransactionIdentitySet; 3],
}

impl<'a> IdentityChain<'a> {
    pub fn new(
        mempool: &'a dyn TransactionIdentitySet,
        pending: &'a dyn TransactionIdentitySet,
        inclusion_log: &'a dyn TransactionIdentitySet,
    ) -> Self {
        debug_assert_eq!(mempool.scope(), IdentityScope::Mempool);
        debug_assert_eq!(pending.scope(), IdentityScope::PendingCommit);
        debug_assert_eq!(inclusion_log.scope(), IdentityScope::InclusionLog);
        Self {
            sets: [mempool, pending, inclusion_log],
        }
    }

    /// Returns the first scope containing `hash`, or `None` if unseen.
    pub fn locate(&self, hash: &Hash) -> CommitResult<Option<IdentityScope>> {
        for set in self.sets {
            if set.contains(hash)? {
                return Ok(Some(set.scope()));
            }
        }
        Ok(None)
    }
}
