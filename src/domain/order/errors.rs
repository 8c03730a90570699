use uuid::Uuid;

use crate::domain::errors::ErrorKind;
use crate::domain::ports::CollaboratorError;
use crate::domain::pricing::PricingError;
use crate::event_sourcing::StoreError;
use super::value_objects::{ActorRole, OrderStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("{role} {actor_id} is not allowed to {action}")]
    Unauthorized {
        actor_id: Uuid,
        role: ActorRole,
        action: String,
    },

    #[error("Delivery partner {0} is not approved or not active")]
    PartnerNotEligible(Uuid),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Only delivered orders can be rated (status: {0})")]
    NotRateable(OrderStatus),

    #[error("Order {0} is not available or already assigned")]
    AlreadyAssigned(Uuid),

    #[error("Delivery partner {0} already has an active delivery")]
    PartnerBusy(Uuid),

    #[error("Order has already been rated")]
    AlreadyRated,

    #[error("Order {0} already exists")]
    AlreadyPlaced(Uuid),

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("{field} cannot exceed {max} characters")]
    TextTooLong { field: &'static str, max: usize },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Upstream(#[from] CollaboratorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::Unauthorized { .. } | OrderError::PartnerNotEligible(_) => ErrorKind::Unauthorized,
            OrderError::InvalidTransition { .. } | OrderError::NotRateable(_) => ErrorKind::InvalidTransition,
            OrderError::AlreadyAssigned(_)
            | OrderError::PartnerBusy(_)
            | OrderError::AlreadyRated
            | OrderError::AlreadyPlaced(_)
            | OrderError::ConcurrentModification(_) => ErrorKind::Conflict,
            OrderError::InvalidRating(_)
            | OrderError::TextTooLong { .. }
            | OrderError::EmptyField(_)
            | OrderError::EmptyItems => ErrorKind::Validation,
            OrderError::Pricing(e) => e.kind(),
            OrderError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            OrderError::Store(StoreError::AggregateNotFound(_)) => ErrorKind::NotFound,
            OrderError::Store(StoreError::ConcurrencyConflict { .. }) => ErrorKind::Conflict,
            OrderError::NotInitialized | OrderError::Store(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn unauthorized(actor_id: Uuid, role: ActorRole, action: impl Into<String>) -> Self {
        OrderError::Unauthorized {
            actor_id,
            role,
            action: action.into(),
        }
    }
}
