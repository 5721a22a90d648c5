//! Racing-writer scenarios: double spends, duplicate submissions, and
//! concurrent block commits.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{block_request, harness, output, transaction};
    use chain_commit::domain::entities::{LedgerKey, RollbackEntry};
    use chain_commit::domain::{CommitError, RollbackDraft};
    use chain_commit::ports::outbound::{ChainStore, Table};
    use chain_commit::ports::ChainCommitApi;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Arc;

    // =============================================================================
    // DOUBLE SPEND
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_spenders_one_output_exactly_one_wins() {
        let h = harness(0);
        let owner = [5; 32];
        h.service.record_outputs(vec![output(9, 0, owner)]).await;

        let key = LedgerKey::new(1, owner);
        let a = tokio::spawn({
            let service = Arc::clone(&h.service);
            async move { service.consume_inputs([1; 32], vec![key], 1).await }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&h.service);
            async move { service.consume_inputs([2; 32], vec![key], 1).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            CommitError::InsufficientFunds { requested: 1, available: 0, .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_racing_spenders_never_share_an_output() {
        let h = harness(0);
        let owner = [5; 32];
        // 4 outputs, 8 spenders wanting one each.
        h.service
            .record_outputs((0..4).map(|i| output(9, i, owner)).collect())
            .await;

        let key = LedgerKey::new(1, owner);
        let tasks: Vec<_> = (0..8u8)
            .map(|n| {
                let service = Arc::clone(&h.service);
                tokio::spawn(async move { service.consume_inputs([n; 32], vec![key], 1).await })
            })
            .collect();

        let mut consumed = Vec::new();
        let mut losers = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(ids) => consumed.extend(ids),
                Err(CommitError::InsufficientFunds { .. }) => losers += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(losers, 4);
        assert_eq!(consumed.len(), 4);
        let distinct: HashSet<_> = consumed.iter().collect();
        assert_eq!(distinct.len(), 4, "an output was handed to two spenders");
        assert!(h.service.unspent_outputs_of(1, owner).await.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_outputs_untouched() {
        let h = harness(0);
        let owner = [5; 32];
        h.service
            .record_outputs(vec![output(9, 0, owner), output(9, 1, owner)])
            .await;

        // Declares 3 inputs with only 2 available: excluded whole.
        let err = h
            .service
            .consume_inputs([1; 32], vec![LedgerKey::new(1, owner)], 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommitError::InsufficientFunds { requested: 3, available: 2, .. }
        ));
        assert_eq!(h.service.unspent_outputs_of(1, owner).await.len(), 2);
    }

    // =============================================================================
    // DUPLICATE SUBMISSION RACE
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_racing_duplicate_submits_accept_exactly_one() {
        let h = harness(0);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&h.service);
                tokio::spawn(async move { service.submit_transaction(transaction(7, 10, 100)).await })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(h.store.row_count(Table::Mempool), 1);
    }

    // =============================================================================
    // CONCURRENT COMMITS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_keep_rollback_ids_contiguous() {
        let h = harness(0);
        let h1 = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();
        let h2 = h.service.submit_transaction(transaction(2, 20, 100)).await.unwrap();

        let mut req_a = block_request(1, &[h1]);
        req_a.rollback_entries = (0..5)
            .map(|i| RollbackDraft::new(h1, "contract_state", format!("a{i}"), "{}", [0; 32]))
            .collect();
        let mut req_b = block_request(2, &[h2]);
        req_b.rollback_entries = (0..5)
            .map(|i| RollbackDraft::new(h2, "contract_state", format!("b{i}"), "{}", [0; 32]))
            .collect();

        let a = tokio::spawn({
            let service = Arc::clone(&h.service);
            async move { service.commit_block(req_a).await }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&h.service);
            async move { service.commit_block(req_b).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Per block, ids form one unbroken run even though both blocks
        // allocated from the same sequence concurrently.
        let mut per_block: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for (_, raw) in h.store.scan(Table::Rollback, None, 1_000).unwrap() {
            let entry: RollbackEntry = bincode::deserialize(&raw).unwrap();
            per_block.entry(entry.block_id).or_default().push(entry.id);
        }
        assert_eq!(per_block.len(), 2);
        for ids in per_block.values_mut() {
            ids.sort_unstable();
            assert_eq!(ids.len(), 5);
            assert_eq!(ids[4] - ids[0], 4, "block ids interleaved: {ids:?}");
        }
    }
}
