//! End-to-end exercise of the lifecycle facade: three equal-weight
//! validators rotating block production, checked against hand-computed
//! prevote/precommit accumulation at every step.

use bft_finality::{
    Address, AggregateCommit, BftConfig, BftModule, BlockHeader, BlsKey, InMemoryStateStore,
    Validator,
};

fn address(n: u8) -> Address {
    Address([n; 20])
}

fn validator(n: u8) -> Validator {
    Validator {
        address: address(n),
        bft_weight: 1,
        generator_key: [n; 32],
        bls_key: BlsKey([n; 48]),
    }
}

fn header(
    height: u32,
    generator: u8,
    max_height_generated: u32,
    max_height_prevoted: u32,
) -> BlockHeader {
    BlockHeader {
        id: [height as u8; 32],
        height,
        generator_address: address(generator),
        max_height_generated,
        max_height_prevoted,
        aggregate_commit: AggregateCommit::default(),
    }
}

async fn setup() -> (BftModule, InMemoryStateStore) {
    let module = BftModule::new(BftConfig::default());
    let mut store = InMemoryStateStore::new();
    module
        .init_genesis_state(&mut store, &header(9, 0, 0, 0))
        .await
        .unwrap();
    // Three validators of weight 1: prevote threshold 3, precommit and
    // certificate thresholds 2, effective from height 10.
    module
        .set_bft_parameters(
            &mut store,
            2,
            2,
            vec![validator(1), validator(2), validator(3)],
        )
        .await
        .unwrap();
    (module, store)
}

#[tokio::test]
async fn finality_heights_advance_as_votes_accumulate() {
    let (module, mut store) = setup().await;

    let params = module.get_bft_parameters(&store, 10).await.unwrap();
    assert_eq!(params.prevote_threshold, 3);
    assert_eq!(params.precommit_threshold, 2);

    // Height 10 by validator 2, first block ever: one prevote at 10.
    module
        .before_transactions_execute(&mut store, &header(10, 2, 0, 9), 0)
        .await
        .unwrap();
    let heights = module.get_bft_heights(&store).await.unwrap();
    assert_eq!(heights.max_height_prevoted, 9);
    assert_eq!(heights.max_height_precommitted, 9);

    // Height 11 by validator 1: prevotes now 11:1, 10:2.
    module
        .before_transactions_execute(&mut store, &header(11, 1, 5, 9), 0)
        .await
        .unwrap();
    let heights = module.get_bft_heights(&store).await.unwrap();
    assert_eq!(heights.max_height_prevoted, 9);

    // Height 12 by validator 3: height 10 reaches the prevote threshold.
    module
        .before_transactions_execute(&mut store, &header(12, 3, 0, 9), 0)
        .await
        .unwrap();
    let heights = module.get_bft_heights(&store).await.unwrap();
    assert_eq!(heights.max_height_prevoted, 10);
    assert_eq!(heights.max_height_precommitted, 9);

    // Height 13 by validator 2 acknowledging its own block at 10: first
    // precommit lands on 10, prevotes push maxHeightPrevoted to 11.
    module
        .before_transactions_execute(&mut store, &header(13, 2, 10, 10), 0)
        .await
        .unwrap();
    let heights = module.get_bft_heights(&store).await.unwrap();
    assert_eq!(heights.max_height_prevoted, 11);
    assert_eq!(heights.max_height_precommitted, 9);

    // Height 14 by validator 1 acknowledging its block at 11: precommits on
    // 11 and 10, so 10 reaches the precommit threshold.
    module
        .before_transactions_execute(&mut store, &header(14, 1, 11, 11), 0)
        .await
        .unwrap();
    let heights = module.get_bft_heights(&store).await.unwrap();
    assert_eq!(heights.max_height_prevoted, 12);
    assert_eq!(heights.max_height_precommitted, 10);
    assert_eq!(heights.max_height_certified, 9);
}

#[tokio::test]
async fn certified_height_follows_aggregate_commits() {
    let (module, mut store) = setup().await;

    let mut block = header(10, 2, 0, 9);
    block.aggregate_commit = AggregateCommit {
        height: 9,
        aggregation_bits: vec![0b111],
        certificate_signature: vec![0xAA; 96],
    };
    module
        .before_transactions_execute(&mut store, &block, 0)
        .await
        .unwrap();
    assert_eq!(
        module.get_bft_heights(&store).await.unwrap().max_height_certified,
        9
    );

    // An empty commit leaves the certified height untouched.
    module
        .before_transactions_execute(&mut store, &header(11, 1, 5, 9), 0)
        .await
        .unwrap();
    assert_eq!(
        module.get_bft_heights(&store).await.unwrap().max_height_certified,
        9
    );
}

#[tokio::test]
async fn finality_heights_never_regress() {
    let (module, mut store) = setup().await;

    let schedule = [
        (10u32, 2u8, 0u32),
        (11, 1, 5),
        (12, 3, 0),
        (13, 2, 10),
        (14, 1, 11),
        (15, 3, 12),
        (16, 2, 13),
        (17, 1, 14),
    ];

    let mut previous = module.get_bft_heights(&store).await.unwrap();
    for &(height, generator, max_height_generated) in &schedule {
        let block = header(
            height,
            generator,
            max_height_generated,
            previous.max_height_prevoted,
        );
        module
            .before_transactions_execute(&mut store, &block, 0)
            .await
            .unwrap();
        let current = module.get_bft_heights(&store).await.unwrap();
        assert!(current.max_height_prevoted >= previous.max_height_prevoted);
        assert!(current.max_height_precommitted >= previous.max_height_precommitted);
        assert!(current.max_height_certified >= previous.max_height_certified);
        assert!(current.max_height_precommitted <= current.max_height_prevoted);
        previous = current;
    }

    // With every validator steadily acknowledging its own chain, finality
    // keeps pace a few blocks behind the tip.
    assert!(previous.max_height_prevoted >= 14);
    assert!(previous.max_height_precommitted >= 12);
}

#[tokio::test]
async fn window_is_bounded_and_descending() {
    let module = BftModule::new(BftConfig { batch_size: 1 });
    let mut store = InMemoryStateStore::new();
    module
        .init_genesis_state(&mut store, &header(0, 0, 0, 0))
        .await
        .unwrap();
    module
        .set_bft_parameters(&mut store, 1, 1, vec![validator(1)])
        .await
        .unwrap();

    for h in 1..=10 {
        module
            .before_transactions_execute(&mut store, &header(h, 1, h.saturating_sub(1), 0), 0)
            .await
            .unwrap();
    }

    let votes = bft_finality::store::votes::get(&store).await.unwrap();
    // batch_size 1 bounds the window at 3 entries.
    assert_eq!(votes.block_bft_infos.len(), 3);
    let heights: Vec<u32> = votes.block_bft_infos.iter().map(|i| i.height).collect();
    assert_eq!(heights, vec![10, 9, 8]);
}
