//! Parallel buyers racing for the same stock.
//!
//! Live-stock validation and decrement happen under one catalog lock, so
//! the number of successful orders is bounded by stock no matter how the
//! tasks interleave.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures::future::join_all;
use harvest_hub_core::{PaymentMethod, ProductId};
use harvest_hub_integration_tests::seed::{APPLES_ID, BUYER_ID, CARROTS_ID};
use harvest_hub_integration_tests::{TestMarket, bengaluru, signed_in};
use harvest_hub_market::services::MarketError;

/// Spawn `buyers` tasks that each add `quantity` of `product` and place.
///
/// Returns the quantities of the orders that went through.
async fn race(
    t: TestMarket,
    product: ProductId,
    buyers: usize,
    quantity: u32,
) -> (Arc<TestMarket>, Vec<u32>) {
    let t = Arc::new(t);
    let tasks = (0..buyers).map(|_| {
        let t = Arc::clone(&t);
        tokio::spawn(async move {
            let mut session = signed_in(BUYER_ID);
            // Late buyers may already find the shelf empty.
            t.market
                .add_to_cart(&mut session, product, quantity)
                .await?;
            t.market
                .place_order(&mut session, bengaluru(), PaymentMethod::Cod)
                .await
        })
    });

    let mut placed = Vec::new();
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(order) => placed.push(order.item_count()),
            Err(MarketError::InsufficientStock { .. } | MarketError::OutOfStock { .. }) => {}
            Err(other) => panic!("unexpected placement error: {other}"),
        }
    }
    (t, placed)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_units_sold_exactly_once() {
    let t = TestMarket::new().await;
    let stock = t.market.live_stock_of(CARROTS_ID).await.unwrap();

    let (t, placed) = race(t, CARROTS_ID, 20, 1).await;

    assert_eq!(placed.len(), usize::try_from(stock).unwrap());
    assert_eq!(t.market.live_stock_of(CARROTS_ID).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sold_quantity_matches_stock_drop() {
    let t = TestMarket::new().await;
    let stock = t.market.live_stock_of(APPLES_ID).await.unwrap();

    let (t, placed) = race(t, APPLES_ID, 12, 3).await;
    let sold: u32 = placed.iter().sum();

    assert!(sold <= stock);
    // 10 units in lots of 3: three orders, one unit left over.
    assert_eq!(placed.len(), 3);
    assert_eq!(t.market.live_stock_of(APPLES_ID).await.unwrap(), stock - sold);
}
