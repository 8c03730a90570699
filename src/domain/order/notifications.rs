use crate::domain::ports::{Notification, NotificationKind};
use super::aggregate::OrderAggregate;
use super::events::OrderEvent;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Notifications
// ============================================================================
//
// Maps a committed event to the message a party should see. Built from the
// post-commit state so the text always matches what was persisted.
//
// ============================================================================

pub fn notification_for(order: &OrderAggregate, event: &OrderEvent) -> Option<Notification> {
    let number = &order.display_number;

    let (user_id, kind, title, body) = match event {
        OrderEvent::Placed(_) => (
            order.restaurant_owner_id,
            NotificationKind::NewOrder,
            "New Order Received!".to_string(),
            format!("Order #{} - ₹{:.2}", number, order.financials.total_amount),
        ),
        OrderEvent::PartnerAssigned(_) => (
            order.customer_id,
            NotificationKind::OrderAssigned,
            "Delivery Partner Assigned".to_string(),
            format!("A delivery partner is on the way to pick up order #{number}"),
        ),
        OrderEvent::StatusChanged(e) => match e.to {
            OrderStatus::Cancelled => (
                order.restaurant_owner_id,
                NotificationKind::OrderCancelled,
                "Order Cancelled".to_string(),
                format!("Order #{number} was cancelled by the customer"),
            ),
            OrderStatus::Ready => (
                order.customer_id,
                NotificationKind::OrderReady,
                "Order Ready".to_string(),
                format!("Order #{number} is ready and waiting for pickup"),
            ),
            OrderStatus::Rejected => (
                order.customer_id,
                NotificationKind::OrderUpdate,
                "Order Rejected".to_string(),
                match &e.reason {
                    Some(reason) => format!("Order #{number} was rejected: {reason}"),
                    None => format!("Order #{number} was rejected by the restaurant"),
                },
            ),
            OrderStatus::Accepted
            | OrderStatus::Preparing
            | OrderStatus::PickedUp
            | OrderStatus::Delivered => (
                order.customer_id,
                NotificationKind::OrderUpdate,
                "Order Update".to_string(),
                format!("Order #{number} is now {}", e.to.as_str().replace('_', " ")),
            ),
            OrderStatus::Pending | OrderStatus::Assigned => return None,
        },
        OrderEvent::Rated(_) => return None,
    };

    Some(Notification {
        user_id,
        kind,
        title,
        body,
        related_order_id: Some(order.id),
    })
}
