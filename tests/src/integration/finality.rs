//! Finality choreography: votes arriving from peers, the backpressure
//! gate on block production, and reputation-driven ban advice.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{block_request, harness, transaction};
    use chain_commit::ports::ChainCommitApi;
    use shared_types::NodeId;

    fn node(n: u8) -> NodeId {
        NodeId::from_byte(n)
    }

    // =============================================================================
    // QUORUM FLOW
    // =============================================================================

    #[tokio::test]
    async fn test_votes_confirm_and_open_the_next_block() {
        let h = harness(4); // needs floor(4/2) = 2 good votes

        let hash = h.service.submit_transaction(transaction(1, 10, 100)).await.unwrap();
        h.service.commit_block(block_request(1, &[hash])).await.unwrap();

        // One vote is not enough; building block 2 is still allowed (one
        // past nothing-confirmed is block 1 only), block 3 is not.
        assert!(h.service.record_vote(1, node(1), true).await);
        assert!(!h.service.is_confirmed(1).await);
        assert!(!h.service.may_generate_next_block(3).await);

        assert!(h.service.record_vote(1, node(2), true).await);
        assert!(h.service.is_confirmed(1).await);
        assert!(h.service.may_generate_next_block(2).await);
        assert!(!h.service.may_generate_next_block(3).await);

        let status = h.service.quorum_status(1).await;
        assert_eq!(status.good_votes, 2);
        assert!(status.confirmed);
    }

    #[tokio::test]
    async fn test_duplicate_and_unordered_votes() {
        let h = harness(4);
        assert!(h.service.record_vote(5, node(1), true).await);
        assert!(!h.service.record_vote(5, node(1), true).await);
        // A later vote for an earlier block still lands.
        assert!(h.service.record_vote(2, node(1), false).await);
        assert_eq!(h.service.quorum_status(5).await.good_votes, 1);
        assert_eq!(h.service.quorum_status(2).await.bad_votes, 1);
    }

    #[tokio::test]
    async fn test_single_node_bootstrap_is_vacuously_confirmed() {
        let h = harness(0);
        // No peers: every block confirms and the chain may keep extending.
        for block in 1..=3u64 {
            let hash = h
                .service
                .submit_transaction(transaction(block as u8, 10, 100))
                .await
                .unwrap();
            assert!(h.service.may_generate_next_block(block).await);
            h.service.commit_block(block_request(block, &[hash])).await.unwrap();
            assert!(h.service.is_confirmed(block).await);
        }
        assert!(h.service.may_generate_next_block(4).await);
        assert!(!h.service.may_generate_next_block(6).await);
    }

    #[tokio::test]
    async fn test_confirmation_latches_across_membership_growth() {
        let h = harness(2);
        h.service.record_vote(1, node(1), true).await;
        assert!(h.service.is_confirmed(1).await);

        // Ten more honor nodes join; block 1 stays confirmed.
        h.registry.set_honor_count(12);
        assert!(h.service.is_confirmed(1).await);
    }

    // =============================================================================
    // REPUTATION FLOW
    // =============================================================================

    #[tokio::test]
    async fn test_corroborated_reports_reach_the_registry() {
        let h = harness(4);
        let producer = node(1);

        // for_testing thresholds: 2 distinct blocks per reporter, 2 reporters.
        for block in 1..=2 {
            assert!(h.service.report_bad_block(producer, node(2), block).await);
            assert!(h.service.report_bad_block(producer, node(3), block).await);
        }

        assert_eq!(h.service.nodes_to_ban().await, vec![producer]);
        assert_eq!(h.registry.ban_recommendations(), vec![producer]);
    }

    #[tokio::test]
    async fn test_single_reporter_spam_is_ignored() {
        let h = harness(4);
        let producer = node(1);
        for block in 1..=50 {
            h.service.report_bad_block(producer, node(2), block).await;
        }
        // Duplicates of the same (producer, reporter, block) are dropped too.
        assert!(!h.service.report_bad_block(producer, node(2), 1).await);

        assert!(h.service.nodes_to_ban().await.is_empty());
        assert!(h.registry.ban_recommendations().is_empty());
    }
}
