use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::event_sourcing::core::DomainEvent;
use crate::domain::pricing::{Breakdown, LineItem};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    StatusChanged(OrderStatusChanged),
    PartnerAssigned(OrderPartnerAssigned),
    Rated(OrderRated),
}

impl DomainEvent for OrderEvent {
    fn event_name(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::PartnerAssigned(_) => "OrderPartnerAssigned",
            OrderEvent::Rated(_) => "OrderRated",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - Initial event; carries the frozen financials
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub display_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_owner_id: Uuid,
    pub delivery_address: String,
    pub distance_km: Decimal,
    pub customer_note: Option<String>,
    pub line_items: Vec<LineItem>,
    pub financials: Breakdown,
    pub placed_at: DateTime<Utc>,
}

/// Order Status Changed - One edge of the state machine was taken
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Order Partner Assigned - READY → ASSIGNED together with the partner id
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPartnerAssigned {
    pub partner_id: Uuid,
    pub at: DateTime<Utc>,
}

/// Order Rated - Customer feedback on a delivered order
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderRated {
    pub rating: u8,
    pub review: Option<String>,
    pub at: DateTime<Utc>,
}
