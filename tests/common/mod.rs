#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use delivery_orders::domain::order::{
    Actor, Collaborators, OrderAggregate, OrderCommandHandler, OrderStatus, PlaceOrderRequest,
};
use delivery_orders::domain::ports::{InMemoryCatalog, InMemoryRateSource, RecordingNotificationSink};
use delivery_orders::domain::pricing::LineRequest;
use delivery_orders::event_sourcing::EventStore;

pub struct TestPlatform {
    pub handler: Arc<OrderCommandHandler>,
    pub catalog: Arc<InMemoryCatalog>,
    pub rates: Arc<InMemoryRateSource>,
    pub inbox: Arc<RecordingNotificationSink>,
    pub restaurant_id: Uuid,
    pub owner_id: Uuid,
    pub menu: Vec<Uuid>,
}

impl TestPlatform {
    pub async fn new() -> Self {
        Self::with_commission(None).await
    }

    pub async fn with_commission(commission_override: Option<Decimal>) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let rates = Arc::new(InMemoryRateSource::default());
        let inbox = Arc::new(RecordingNotificationSink::new());

        let owner_id = Uuid::new_v4();
        let restaurant_id = catalog.add_restaurant("Spice Route", owner_id, commission_override).await;
        let menu = vec![
            catalog.add_menu_item(restaurant_id, "Veg Biryani", Decimal::from(100)).await,
            catalog.add_menu_item(restaurant_id, "Butter Chicken", Decimal::from(150)).await,
        ];

        let handler = OrderCommandHandler::new(
            Arc::new(EventStore::new("Order")),
            Collaborators {
                menu: catalog.clone(),
                restaurants: catalog.clone(),
                partners: catalog.clone(),
                rates: rates.clone(),
                notifier: inbox.clone(),
            },
        );

        Self {
            handler: Arc::new(handler),
            catalog,
            rates,
            inbox,
            restaurant_id,
            owner_id,
            menu,
        }
    }

    pub fn request(&self) -> PlaceOrderRequest {
        PlaceOrderRequest {
            restaurant_id: self.restaurant_id,
            lines: self.menu.iter().map(|id| LineRequest::new(*id, 1)).collect(),
            delivery_address: "12 MG Road, Bengaluru".to_string(),
            distance_km: Decimal::from(4),
            customer_note: None,
        }
    }

    pub fn kitchen(&self) -> Actor {
        Actor::restaurant(self.restaurant_id)
    }

    pub async fn place(&self) -> OrderAggregate {
        self.handler
            .place_order(Uuid::new_v4(), self.request())
            .await
            .expect("placement should succeed")
    }

    pub async fn place_ready(&self) -> OrderAggregate {
        let order = self.place().await;
        let mut latest = order;
        for target in [OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::Ready] {
            latest = self
                .handler
                .transition(latest.id, self.kitchen(), target, None)
                .await
                .expect("kitchen transition should succeed");
        }
        latest
    }

    pub async fn deliver(&self, order_id: Uuid, partner_id: Uuid) -> OrderAggregate {
        self.handler
            .assign_delivery(order_id, partner_id)
            .await
            .expect("assignment should succeed");
        let rider = Actor::delivery(partner_id);
        self.handler
            .transition(order_id, rider, OrderStatus::PickedUp, None)
            .await
            .expect("pickup should succeed");
        self.handler
            .transition(order_id, rider, OrderStatus::Delivered, None)
            .await
            .expect("delivery should succeed")
    }
}
