use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::ErrorKind;
use crate::domain::ports::CollaboratorError;

// ============================================================================
// Pricing Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Invalid quantity {quantity} for menu item {menu_item_id}")]
    InvalidQuantity { menu_item_id: Uuid, quantity: u32 },

    #[error("Invalid delivery distance: {0} km")]
    InvalidDistance(Decimal),

    #[error("Invalid platform rates: {0}")]
    InvalidRates(String),

    #[error("Order amount out of range: {0}")]
    AmountOutOfRange(&'static str),

    #[error("Menu item {0} is not available")]
    ItemUnavailable(Uuid),

    #[error("Restaurant {0} not found or currently closed")]
    RestaurantUnavailable(Uuid),

    #[error(transparent)]
    Upstream(#[from] CollaboratorError),
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::EmptyOrder
            | PricingError::InvalidQuantity { .. }
            | PricingError::InvalidDistance(_)
            | PricingError::InvalidRates(_)
            | PricingError::AmountOutOfRange(_) => ErrorKind::Validation,
            PricingError::ItemUnavailable(_) | PricingError::RestaurantUnavailable(_) => ErrorKind::NotFound,
            PricingError::Upstream(_) => ErrorKind::UpstreamUnavailable,
        }
    }
}
