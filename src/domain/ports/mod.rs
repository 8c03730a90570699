use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing::PlatformRates;

// ============================================================================
// Collaborator Ports
// ============================================================================
//
// Contracts the order core consumes from the rest of the platform:
// - Menu lookup (live price + availability)
// - Restaurant directory (open/approved flags, commission override)
// - Delivery partner directory (approval + active flags)
// - Platform rate snapshot
// - Notification sink (fire-and-forget)
//
// Persistence, HTTP, auth and CRUD live behind these traits and are not
// part of this crate. `in_memory` provides implementations for tests and
// the demo binary.
//
// ============================================================================

pub mod in_memory;

pub use in_memory::{InMemoryCatalog, InMemoryRateSource, RecordingNotificationSink};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
}

impl CollaboratorError {
    pub fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        CollaboratorError::Unavailable {
            service,
            reason: reason.into(),
        }
    }
}

/// Live menu entry as seen at lookup time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSnapshot {
    pub item_id: Uuid,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub is_open: bool,
    pub is_approved: bool,
    /// Restaurant-specific commission percentage; `None` means platform default
    pub commission_override: Option<Decimal>,
}

impl RestaurantProfile {
    pub fn accepts_orders(&self) -> bool {
        self.is_open && self.is_approved
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: Uuid,
    pub is_approved: bool,
    pub is_active: bool,
}

impl PartnerProfile {
    pub fn can_deliver(&self) -> bool {
        self.is_approved && self.is_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    OrderUpdate,
    OrderAssigned,
    OrderReady,
    OrderCancelled,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewOrder => "new_order",
            NotificationKind::OrderUpdate => "order_update",
            NotificationKind::OrderAssigned => "order_assigned",
            NotificationKind::OrderReady => "order_ready",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::General => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub related_order_id: Option<Uuid>,
}

#[async_trait]
pub trait MenuLookup: Send + Sync {
    /// `Ok(None)` when the item is missing, inactive, unavailable, or
    /// belongs to another restaurant.
    async fn get_available_item(
        &self,
        restaurant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<MenuItemSnapshot>, CollaboratorError>;
}

#[async_trait]
pub trait RestaurantDirectory: Send + Sync {
    async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<RestaurantProfile>, CollaboratorError>;

    /// Fold a new customer rating into the restaurant's running average
    async fn record_rating(&self, restaurant_id: Uuid, rating: u8) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    async fn get_partner(&self, partner_id: Uuid) -> Result<Option<PartnerProfile>, CollaboratorError>;
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn current_rates(&self) -> Result<PlatformRates, CollaboratorError>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError>;
}
