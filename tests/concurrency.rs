mod common;

use futures_util::future::join_all;
use std::collections::HashSet;
use uuid::Uuid;

use common::TestPlatform;
use delivery_orders::domain::errors::ErrorKind;
use delivery_orders::domain::order::{Actor, OrderError, OrderStatus};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_assignment_race_has_exactly_one_winner() {
    for _ in 0..20 {
        let platform = TestPlatform::new().await;
        let order = platform.place_ready().await;
        let partner_a = platform.catalog.add_partner().await;
        let partner_b = platform.catalog.add_partner().await;

        let a = {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.assign_delivery(order.id, partner_a).await })
        };
        let b = {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.assign_delivery(order.id, partner_b).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(losers.len(), 1);
        assert_eq!(losers[0].kind(), ErrorKind::Conflict);

        let winner = winners[0].delivery_partner_id.unwrap();
        let stored = platform
            .handler
            .get_order(order.id, &Actor::admin(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(stored.status, OrderStatus::Assigned);
        assert_eq!(stored.delivery_partner_id, Some(winner));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_partners_one_order() {
    let platform = TestPlatform::new().await;
    let order = platform.place_ready().await;

    let mut partners = Vec::new();
    for _ in 0..8 {
        partners.push(platform.catalog.add_partner().await);
    }

    let claims = partners.iter().map(|partner| {
        let handler = platform.handler.clone();
        let partner = *partner;
        tokio::spawn(async move { handler.assign_delivery(order.id, partner).await })
    });
    let results: Vec<_> = join_all(claims).await.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::Conflict));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_partner_two_orders_gets_one() {
    for _ in 0..10 {
        let platform = TestPlatform::new().await;
        let first = platform.place_ready().await;
        let second = platform.place_ready().await;
        let partner = platform.catalog.add_partner().await;

        let claims = [first.id, second.id].map(|order_id| {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.assign_delivery(order_id, partner).await })
        });
        let results: Vec<_> = join_all(claims).await.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let busy = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(busy, OrderError::PartnerBusy(p) if *p == partner));

        let active = platform.handler.active_delivery(partner).await.unwrap();
        assert!(active.is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_accept_has_one_winner() {
    for _ in 0..20 {
        let platform = TestPlatform::new().await;
        let order = platform.place().await;
        let kitchen = platform.kitchen();

        let attempts = (0..2).map(|_| {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.transition(order.id, kitchen, OrderStatus::Accepted, None).await })
        });
        let results: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::InvalidTransition);

        let stored = platform
            .handler
            .get_order(order.id, &Actor::admin(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(stored.version, 2);
        let accepted = stored
            .status_history
            .iter()
            .filter(|e| e.status == OrderStatus::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_accept_races_cancel() {
    for _ in 0..20 {
        let platform = TestPlatform::new().await;
        let order = platform.place().await;
        let kitchen = platform.kitchen();
        let customer = Actor::customer(order.customer_id);

        let accept = {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.transition(order.id, kitchen, OrderStatus::Accepted, None).await })
        };
        let cancel = {
            let handler = platform.handler.clone();
            tokio::spawn(async move { handler.transition(order.id, customer, OrderStatus::Cancelled, None).await })
        };

        let outcomes = [accept.await.unwrap(), cancel.await.unwrap()];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);

        let stored = platform
            .handler
            .get_order(order.id, &Actor::admin(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(matches!(stored.status, OrderStatus::Accepted | OrderStatus::Cancelled));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_get_distinct_numbers() {
    let platform = TestPlatform::new().await;

    let placements = (0..16).map(|_| {
        let handler = platform.handler.clone();
        let request = platform.request();
        tokio::spawn(async move { handler.place_order(Uuid::new_v4(), request).await })
    });
    let orders: Vec<_> = join_all(placements)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let numbers: HashSet<_> = orders.iter().map(|o| o.display_number.clone()).collect();
    assert_eq!(numbers.len(), 16);
}
