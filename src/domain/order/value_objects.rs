use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Order Value Objects
// ============================================================================

pub const MAX_CUSTOMER_NOTE_LEN: usize = 200;
pub const MAX_REJECTION_REASON_LEN: usize = 200;
pub const MAX_REVIEW_LEN: usize = 500;
pub const MAX_DELIVERY_ADDRESS_LEN: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Preparing,
    Ready,
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Rejected,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Assigned,
        OrderStatus::PickedUp,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Assigned => "assigned",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    /// The single state an order must be in to move into `self`.
    /// `None` for PENDING, which is only ever entered at placement.
    pub fn source(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Accepted | OrderStatus::Rejected | OrderStatus::Cancelled => Some(OrderStatus::Pending),
            OrderStatus::Preparing => Some(OrderStatus::Accepted),
            OrderStatus::Ready => Some(OrderStatus::Preparing),
            OrderStatus::Assigned => Some(OrderStatus::Ready),
            OrderStatus::PickedUp => Some(OrderStatus::Assigned),
            OrderStatus::Delivered => Some(OrderStatus::PickedUp),
        }
    }

    /// The role that owns the edge into `self`
    pub fn required_role(&self) -> Option<ActorRole> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Cancelled => Some(ActorRole::Customer),
            OrderStatus::Accepted | OrderStatus::Rejected | OrderStatus::Preparing | OrderStatus::Ready => {
                Some(ActorRole::Restaurant)
            }
            OrderStatus::Assigned | OrderStatus::PickedUp | OrderStatus::Delivered => Some(ActorRole::Delivery),
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        target.source() == Some(*self)
    }

    /// States that count as a partner's one active delivery
    pub fn is_active_delivery(&self) -> bool {
        matches!(self, OrderStatus::Assigned | OrderStatus::PickedUp)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Restaurant,
    Delivery,
    Admin,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorRole::Customer => "customer",
            ActorRole::Restaurant => "restaurant",
            ActorRole::Delivery => "delivery",
            ActorRole::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// An authenticated caller. For the restaurant role `id` is the restaurant
/// the session is bound to, not the owner's user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn customer(id: Uuid) -> Self {
        Self::new(id, ActorRole::Customer)
    }

    pub fn restaurant(restaurant_id: Uuid) -> Self {
        Self::new(restaurant_id, ActorRole::Restaurant)
    }

    pub fn delivery(partner_id: Uuid) -> Self {
        Self::new(partner_id, ActorRole::Delivery)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, ActorRole::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

/// Hands out human-readable order numbers such as `RUZ000042`.
pub struct DisplayNumberSequence {
    prefix: String,
    next: AtomicU64,
}

impl DisplayNumberSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{:06}", self.prefix, n)
    }
}

impl Default for DisplayNumberSequence {
    fn default() -> Self {
        Self::new("RUZ")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
