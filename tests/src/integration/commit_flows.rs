//! End-to-end commit flows: submit, select, commit, and the failure
//! paths that must leave the durable store untouched.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{block_request, harness, transaction};
    use chain_commit::adapters::FailurePoint;
    use chain_commit::domain::entities::{RollbackEntry, StatusUpdate};
    use chain_commit::domain::{CommitError, IdentityScope, RollbackDraft};
    use chain_commit::ports::outbound::{ChainStore, Table};
    use chain_commit::ports::ChainCommitApi;
    use chain_commit::{ChainCommitService, CommitConfig};
    use shared_types::{PriorityClass, TransactionRecord, U256};

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_submit_select_commit_lifecycle() {
        let h = harness(0);

        // Fees 30, 10, 20: selection must come back 30, 20, 10.
        let h1 = h.service.submit_transaction(transaction(1, 30, 100)).await.unwrap();
        let h2 = h.service.submit_transaction(transaction(2, 10, 100)).await.unwrap();
        let h3 = h.service.submit_transaction(transaction(3, 20, 100)).await.unwrap();

        let batch = h.service.select_batch(10).await;
        let order: Vec<u8> = batch.iter().map(|t| t.hash[0]).collect();
        assert_eq!(order, vec![1, 3, 2]);

        let mut request = block_request(1, &[h1, h2, h3]);
        let prior = serde_json::json!({ "balance": 100 }).to_string();
        request.rollback_entries = vec![
            RollbackDraft::new(h1, "contract_state", "row-1", prior.clone(), [0; 32]),
            RollbackDraft::new(h2, "contract_state", "row-2", prior, [0; 32]),
        ];
        h.service.commit_block(request).await.unwrap();

        // Mempool drained, both in memory and durably.
        assert!(h.service.select_batch(10).await.is_empty());
        assert_eq!(h.store.row_count(Table::Mempool), 0);

        // Inclusion log holds all three hashes.
        for hash in [h1, h2, h3] {
            assert!(h.store.get(Table::InclusionLog, &hash).unwrap().is_some());
        }

        // Status rows carry the block id.
        let raw = h.store.get(Table::TxStatus, &h1).unwrap().unwrap();
        let status: StatusUpdate = bincode::deserialize(&raw).unwrap();
        assert_eq!(status.block_id, Some(1));
        assert_eq!(status.error, None);
    }

    #[tokio::test]
    async fn test_priority_class_dominates_fee() {
        let h = harness(0);
        let rich = TransactionRecord::new(
            [1; 32],
            vec![],
            PriorityClass::ApiContract,
            U256::from(1_000_000u64),
            1,
            [0xEE; 32],
        );
        let stop = TransactionRecord::new(
            [2; 32],
            vec![],
            PriorityClass::StopNetwork,
            U256::zero(),
            100,
            [0xEE; 32],
        );
        h.service.submit_transaction(rich).await.unwrap();
        h.service.submit_transaction(stop).await.unwrap();

        let batch = h.service.select_batch(1).await;
        assert_eq!(batch[0].hash, [2; 32]);
    }

    // =============================================================================
    // HASH UNIQUENESS ACROSS FINALIZATION
    // =============================================================================

    #[tokio::test]
    async fn test_hash_never_accepted_twice() {
        let h = harness(0);
        let hash = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();

        // Duplicate while pending.
        let err = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::DuplicateTransaction { scope: IdentityScope::Mempool, .. }
        ));

        // Duplicate after finalization, against the permanent log.
        h.service.commit_block(block_request(1, &[hash])).await.unwrap();
        let err = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::DuplicateTransaction { scope: IdentityScope::InclusionLog, .. }
        ));
    }

    // =============================================================================
    // ATOMICITY UNDER FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_failed_commit_is_invisible_and_retryable() {
        let h = harness(0);
        let h1 = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();
        let h2 = h.service.submit_transaction(transaction(2, 20, 100)).await.unwrap();

        let mut request = block_request(1, &[h1, h2]);
        request.rollback_entries =
            vec![RollbackDraft::new(h1, "contract_state", "r", "{}", [0; 32])];

        h.store.inject_failure(FailurePoint::OnTable(Table::Rollback));
        let err = h.service.commit_block(request.clone()).await.unwrap_err();
        assert!(matches!(err, CommitError::CommitAborted { .. }));

        // No partial application anywhere.
        assert_eq!(h.store.row_count(Table::InclusionLog), 0);
        assert_eq!(h.store.row_count(Table::Rollback), 0);
        assert_eq!(h.store.row_count(Table::Mempool), 2);

        // Transactions are selectable again and the retry succeeds.
        assert_eq!(h.service.select_batch(10).await.len(), 2);
        h.service.commit_block(request).await.unwrap();
        assert_eq!(h.store.row_count(Table::InclusionLog), 2);
    }

    #[tokio::test]
    async fn test_lock_timeout_requeues_without_abort() {
        let h = harness(0);
        let hash = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();

        h.store.inject_failure(FailurePoint::LockTimeout);
        let err = h.service.commit_block(block_request(1, &[hash])).await.unwrap_err();
        assert!(matches!(err, CommitError::StorageTimeout { .. }));

        assert_eq!(h.service.select_batch(10).await.len(), 1);
    }

    // =============================================================================
    // ATTEMPT CEILING
    // =============================================================================

    #[tokio::test]
    async fn test_poisoned_transaction_surfaced_not_deleted() {
        let h = harness(0);
        let hash = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();

        // for_testing ceiling is 3.
        for _ in 0..3 {
            h.service.record_transaction_failure(hash).await.unwrap();
        }
        let err = h.service.record_transaction_failure(hash).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::AttemptCeilingExceeded { attempts: 4, .. }
        ));

        // Excluded from batches, still durable and visible in status.
        assert!(h.service.select_batch(10).await.is_empty());
        assert!(h.store.get(Table::Mempool, &hash).unwrap().is_some());
        assert_eq!(h.service.mempool_status().await.poisoned, 1);
    }

    // =============================================================================
    // STARTUP REBUILD
    // =============================================================================

    #[tokio::test]
    async fn test_restart_rebuilds_mempool_and_dedup() {
        let h = harness(0);
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for seed in 1..=9u8 {
            let fee = rng.gen_range(1..1_000u64);
            h.service
                .submit_transaction(transaction(seed, fee, 100))
                .await
                .unwrap();
        }

        // New service over the same store, as after a process restart.
        let restarted = ChainCommitService::new(
            CommitConfig::for_testing(),
            h.store.clone(),
            h.registry.clone(),
        );
        assert_eq!(restarted.bootstrap().unwrap(), 9);

        // Auction order survives the rebuild (fee descending).
        let batch = restarted.select_batch(16).await;
        assert_eq!(batch.len(), 9);
        assert!(batch.windows(2).all(|w| w[0].fee >= w[1].fee));

        let err = restarted
            .submit_transaction(transaction(5, 5, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::DuplicateTransaction { .. }));
    }
}
