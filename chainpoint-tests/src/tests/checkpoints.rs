#[cfg(test)]
mod insert_checkpoints {
    use chainpoint::UnsavedCheckpoint;

    use crate::factory::{checkpoints_at, random_contract_address};
    use crate::test_runner;

    #[tokio::test]
    async fn records_observed_contract_block_pairs() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            let checkpoints = checkpoints_at(&contract_address, &[5, 9, 12, 20]);

            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[contract_address.clone()], Some(100))
                .await
                .unwrap();

            assert_eq!(blocks, vec![5, 9, 12, 20]);
        })
        .await;
    }

    #[tokio::test]
    async fn replaying_an_identical_set_produces_no_duplicate_rows() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            let checkpoints = checkpoints_at(&contract_address, &[5, 9, 12, 20]);

            store.insert_checkpoints(&checkpoints).await.unwrap();
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[contract_address.clone()], Some(100))
                .await
                .unwrap();

            assert_eq!(blocks, vec![5, 9, 12, 20]);
        })
        .await;
    }

    #[tokio::test]
    async fn tolerates_quote_characters_in_addresses() {
        test_runner::run_test(|store| async move {
            let contract_address = format!("{}'--", random_contract_address());
            let checkpoints = checkpoints_at(&contract_address, &[8]);

            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[contract_address.clone()], None)
                .await
                .unwrap();

            assert_eq!(blocks, vec![8]);
        })
        .await;
    }

    #[tokio::test]
    async fn accepts_an_empty_collection() {
        test_runner::run_test(|store| async move {
            store.insert_checkpoints(&[]).await.unwrap();
        })
        .await;
    }

    #[tokio::test]
    async fn splits_large_inputs_into_concurrently_submitted_batches() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            // Three batches at a batch size of 1000.
            let checkpoints: Vec<_> = (1_000..3_500)
                .map(|block_number| UnsavedCheckpoint::new(&contract_address, block_number))
                .collect();

            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[contract_address.clone()], Some(5_000))
                .await
                .unwrap();

            assert_eq!(blocks.len(), 2_500);
            assert_eq!(blocks.first(), Some(&1_000));
            assert_eq!(blocks.last(), Some(&3_499));
        })
        .await;
    }
}

#[cfg(test)]
mod get_next_checkpoint_blocks {
    use crate::factory::{checkpoints_at, random_contract_address};
    use crate::test_runner;

    #[tokio::test]
    async fn returns_blocks_at_or_above_the_given_block_ascending() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            let checkpoints = checkpoints_at(&contract_address, &[5, 9, 12, 20]);
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(6, &[contract_address.clone()], None)
                .await
                .unwrap();

            assert_eq!(blocks, vec![9, 12, 20]);
        })
        .await;
    }

    #[tokio::test]
    async fn honors_the_limit() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            let checkpoints = checkpoints_at(&contract_address, &[5, 9, 12, 20]);
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(6, &[contract_address.clone()], Some(2))
                .await
                .unwrap();

            assert_eq!(blocks, vec![9, 12]);
        })
        .await;
    }

    #[tokio::test]
    async fn defaults_to_fifteen_blocks() {
        test_runner::run_test(|store| async move {
            let contract_address = random_contract_address();
            let block_numbers: Vec<u64> = (101..=120).collect();
            let checkpoints = checkpoints_at(&contract_address, &block_numbers);
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[contract_address.clone()], None)
                .await
                .unwrap();

            assert_eq!(blocks.len(), 15);
        })
        .await;
    }

    #[tokio::test]
    async fn filters_by_the_given_contract_set() {
        test_runner::run_test(|store| async move {
            let watched_contract = random_contract_address();
            let other_contract = random_contract_address();
            let checkpoints = checkpoints_at(&other_contract, &[5, 9, 12]);
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(0, &[watched_contract.clone()], None)
                .await
                .unwrap();

            assert!(blocks.is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn returns_one_value_per_matching_row_not_a_deduplicated_set() {
        test_runner::run_test(|store| async move {
            let first_contract = random_contract_address();
            let second_contract = random_contract_address();
            let mut checkpoints = checkpoints_at(&first_contract, &[7]);
            checkpoints.extend(checkpoints_at(&second_contract, &[7]));
            store.insert_checkpoints(&checkpoints).await.unwrap();

            let blocks = store
                .get_next_checkpoint_blocks(
                    0,
                    &[first_contract.clone(), second_contract.clone()],
                    None,
                )
                .await
                .unwrap();

            assert_eq!(blocks, vec![7, 7]);
        })
        .await;
    }

    #[tokio::test]
    async fn returns_nothing_for_an_empty_contract_set() {
        test_runner::run_test(|store| async move {
            let blocks = store.get_next_checkpoint_blocks(0, &[], None).await.unwrap();

            assert!(blocks.is_empty());
        })
        .await;
    }
}

#[cfg(test)]
mod purge_checkpoint_blocks {
    use crate::factory::{checkpoints_at, random_contract_address};
    use crate::test_runner;

    // A single sequential test: purging deletes below the height for every
    // contract outside the active set, so concurrent purge tests sharing
    // the database would race each other. All other tests keep their
    // checkpoints above block 3 for the same reason.
    #[tokio::test]
    async fn removes_stale_contracts_below_the_height_only() {
        test_runner::run_test(|store| async move {
            let active_contract = random_contract_address();
            let stale_contract = random_contract_address();
            let mut checkpoints = checkpoints_at(&active_contract, &[1, 2, 3]);
            checkpoints.extend(checkpoints_at(&stale_contract, &[1, 2, 3, 10]));
            store.insert_checkpoints(&checkpoints).await.unwrap();

            store.purge_checkpoint_blocks(3, &[active_contract.clone()]).await.unwrap();

            let active_blocks = store
                .get_next_checkpoint_blocks(0, &[active_contract.clone()], None)
                .await
                .unwrap();
            let stale_blocks = store
                .get_next_checkpoint_blocks(0, &[stale_contract.clone()], None)
                .await
                .unwrap();

            assert_eq!(active_blocks, vec![1, 2, 3]);
            assert_eq!(stale_blocks, vec![10]);

            // An empty active set protects nothing below the height.
            store.purge_checkpoint_blocks(3, &[]).await.unwrap();

            let active_blocks = store
                .get_next_checkpoint_blocks(0, &[active_contract.clone()], None)
                .await
                .unwrap();
            let stale_blocks = store
                .get_next_checkpoint_blocks(0, &[stale_contract.clone()], None)
                .await
                .unwrap();

            assert!(active_blocks.is_empty());
            assert_eq!(stale_blocks, vec![10]);
        })
        .await;
    }
}
