use uuid::Uuid;
use rust_decimal::Decimal;

use crate::domain::pricing::Quote;
use super::value_objects::{Actor, OrderStatus};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        order_id: Uuid,
        display_number: String,
        customer_id: Uuid,
        restaurant_id: Uuid,
        restaurant_owner_id: Uuid,
        delivery_address: String,
        distance_km: Decimal,
        customer_note: Option<String>,
        quote: Quote,
    },
    Transition {
        actor: Actor,
        target: OrderStatus,
        reason: Option<String>,
    },
    AssignPartner {
        partner_id: Uuid,
    },
    Rate {
        customer_id: Uuid,
        rating: u8,
        review: Option<String>,
    },
}
