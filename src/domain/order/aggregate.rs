use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::event_sourcing::core::Aggregate;
use crate::domain::pricing::{Breakdown, LineItem};
use super::value_objects::*;
use super::events::*;
use super::commands::OrderCommand;
use super::errors::OrderError;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Every transition is decided here, against the state rebuilt from the
// order's own stream. The handler only commits the resulting events if the
// stream has not moved since the read.
//
// Transition checks run in a fixed order:
//   target has an incoming edge → role owns the edge → actor owns the order
//   → current status is the edge's source → edge-specific guards
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,
    pub display_number: String,

    // Parties
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_owner_id: Uuid,
    pub delivery_partner_id: Option<Uuid>,

    // Frozen at placement
    pub delivery_address: String,
    pub distance_km: Decimal,
    pub customer_note: Option<String>,
    pub line_items: Vec<LineItem>,
    pub financials: Breakdown,

    // Lifecycle
    pub status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
    pub rejection_reason: Option<String>,

    // Feedback
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAggregate {
    /// Validate a placement and produce the first event of a new stream
    pub fn handle_creation(command: &OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        let OrderCommand::PlaceOrder {
            order_id,
            display_number,
            customer_id,
            restaurant_id,
            restaurant_owner_id,
            delivery_address,
            distance_km,
            customer_note,
            quote,
        } = command
        else {
            return Err(OrderError::NotInitialized);
        };

        if quote.lines.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(OrderError::EmptyField("delivery address"));
        }
        check_len("delivery address", delivery_address, MAX_DELIVERY_ADDRESS_LEN)?;

        let customer_note = normalize_text(customer_note.as_deref());
        if let Some(note) = &customer_note {
            check_len("customer note", note, MAX_CUSTOMER_NOTE_LEN)?;
        }

        Ok(vec![OrderEvent::Placed(OrderPlaced {
            order_id: *order_id,
            display_number: display_number.clone(),
            customer_id: *customer_id,
            restaurant_id: *restaurant_id,
            restaurant_owner_id: *restaurant_owner_id,
            delivery_address: delivery_address.to_string(),
            distance_km: *distance_km,
            customer_note,
            line_items: quote.lines.clone(),
            financials: quote.breakdown.clone(),
            placed_at: Utc::now(),
        })])
    }

    /// Whether the order exists at all from this actor's point of view
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Customer => self.customer_id == actor.id,
            ActorRole::Restaurant => self.restaurant_id == actor.id,
            ActorRole::Delivery => {
                self.delivery_partner_id == Some(actor.id) || self.is_open_for_assignment()
            }
            ActorRole::Admin => true,
        }
    }

    pub fn is_open_for_assignment(&self) -> bool {
        self.status == OrderStatus::Ready && self.delivery_partner_id.is_none()
    }

    /// Instant the order entered `status`, if it ever did
    pub fn entered_at(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        self.status_history
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.at)
    }

    /// Run every guard on an edge without producing events
    pub fn check_transition(&self, actor: &Actor, target: OrderStatus) -> Result<(), OrderError> {
        let invalid = OrderError::InvalidTransition {
            from: self.status,
            to: target,
        };
        let (Some(source), Some(role)) = (target.source(), target.required_role()) else {
            return Err(invalid);
        };

        let action = format!("move order to {target}");
        if actor.role != role {
            return Err(OrderError::unauthorized(actor.id, actor.role, action));
        }

        let owns_order = match actor.role {
            ActorRole::Customer => self.customer_id == actor.id,
            ActorRole::Restaurant => self.restaurant_id == actor.id,
            ActorRole::Delivery | ActorRole::Admin => true,
        };
        if !owns_order {
            return Err(OrderError::unauthorized(actor.id, actor.role, action));
        }

        if target == OrderStatus::Assigned {
            return self.check_assignable();
        }

        if self.status != source {
            return Err(invalid);
        }

        if matches!(target, OrderStatus::PickedUp | OrderStatus::Delivered)
            && self.delivery_partner_id != Some(actor.id)
        {
            return Err(OrderError::unauthorized(actor.id, actor.role, action));
        }

        Ok(())
    }

    pub(crate) fn check_assignable(&self) -> Result<(), OrderError> {
        if !self.is_open_for_assignment() {
            return Err(OrderError::AlreadyAssigned(self.id));
        }
        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), OrderError> {
    if value.chars().count() > max {
        return Err(OrderError::TextTooLong { field, max });
    }
    Ok(())
}

/// Trim free text and treat blank input as absent
fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => Ok(Self {
                id: e.order_id,
                version: 0,
                display_number: e.display_number.clone(),
                customer_id: e.customer_id,
                restaurant_id: e.restaurant_id,
                restaurant_owner_id: e.restaurant_owner_id,
                delivery_partner_id: None,
                delivery_address: e.delivery_address.clone(),
                distance_km: e.distance_km,
                customer_note: e.customer_note.clone(),
                line_items: e.line_items.clone(),
                financials: e.financials.clone(),
                status: OrderStatus::Pending,
                status_history: vec![StatusEntry {
                    status: OrderStatus::Pending,
                    at: e.placed_at,
                }],
                rejection_reason: None,
                rating: None,
                review: None,
                reviewed_at: None,
                created_at: e.placed_at,
                updated_at: e.placed_at,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => Err(OrderError::AlreadyPlaced(self.id)),
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.status_history.push(StatusEntry { status: e.to, at: e.at });
                if e.to == OrderStatus::Rejected {
                    self.rejection_reason = e.reason.clone();
                }
                self.updated_at = e.at;
                Ok(())
            }
            OrderEvent::PartnerAssigned(e) => {
                self.delivery_partner_id = Some(e.partner_id);
                self.status = OrderStatus::Assigned;
                self.status_history.push(StatusEntry {
                    status: OrderStatus::Assigned,
                    at: e.at,
                });
                self.updated_at = e.at;
                Ok(())
            }
            OrderEvent::Rated(e) => {
                self.rating = Some(e.rating);
                self.review = e.review.clone();
                self.reviewed_at = Some(e.at);
                self.updated_at = e.at;
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder { .. } => Err(OrderError::AlreadyPlaced(self.id)),

            OrderCommand::Transition { actor, target, reason } => {
                self.check_transition(actor, *target)?;

                // Partner assignment has its own event
                if *target == OrderStatus::Assigned {
                    return Ok(vec![OrderEvent::PartnerAssigned(OrderPartnerAssigned {
                        partner_id: actor.id,
                        at: Utc::now(),
                    })]);
                }

                let reason = normalize_text(reason.as_deref());
                if let Some(reason) = &reason {
                    check_len("reason", reason, MAX_REJECTION_REASON_LEN)?;
                }

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *target,
                    actor_id: actor.id,
                    reason,
                    at: Utc::now(),
                })])
            }

            OrderCommand::AssignPartner { partner_id } => {
                self.check_assignable()?;

                Ok(vec![OrderEvent::PartnerAssigned(OrderPartnerAssigned {
                    partner_id: *partner_id,
                    at: Utc::now(),
                })])
            }

            OrderCommand::Rate { customer_id, rating, review } => {
                if *customer_id != self.customer_id {
                    return Err(OrderError::unauthorized(*customer_id, ActorRole::Customer, "rate this order"));
                }
                if !(1..=5).contains(rating) {
                    return Err(OrderError::InvalidRating(*rating));
                }
                let review = normalize_text(review.as_deref());
                if let Some(review) = &review {
                    check_len("review", review, MAX_REVIEW_LEN)?;
                }
                if self.status != OrderStatus::Delivered {
                    return Err(OrderError::NotRateable(self.status));
                }
                if self.rating.is_some() {
                    return Err(OrderError::AlreadyRated);
                }

                Ok(vec![OrderEvent::Rated(OrderRated {
                    rating: *rating,
                    review,
                    at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::pricing::Quote;
    use rust_decimal_macros::dec;

    fn create_test_quote() -> Quote {
        let lines = vec![
            LineItem::new(Uuid::new_v4(), "Veg Biryani", dec!(100), 1).unwrap(),
            LineItem::new(Uuid::new_v4(), "Butter Chicken", dec!(150), 1).unwrap(),
        ];
        Quote {
            lines,
            breakdown: Breakdown {
                items_total: dec!(250),
                delivery_charge: dec!(62),
                platform_fee: dec!(6.00),
                total_amount: dec!(318.00),
                commission_percentage_applied: dec!(10),
                admin_commission_amount: dec!(25.00),
                restaurant_earning_amount: dec!(225.00),
                rates_version: 1,
            },
        }
    }

    fn place_command(customer_id: Uuid, restaurant_id: Uuid) -> OrderCommand {
        OrderCommand::PlaceOrder {
            order_id: Uuid::new_v4(),
            display_number: "RUZ000001".to_string(),
            customer_id,
            restaurant_id,
            restaurant_owner_id: Uuid::new_v4(),
            delivery_address: "12 MG Road, Bengaluru".to_string(),
            distance_km: dec!(4),
            customer_note: Some("  extra spicy ".to_string()),
            quote: create_test_quote(),
        }
    }

    fn create_test_order() -> OrderAggregate {
        let events = OrderAggregate::handle_creation(&place_command(Uuid::new_v4(), Uuid::new_v4())).unwrap();
        let mut order = OrderAggregate::apply_first_event(&events[0]).unwrap();
        order.set_version(1);
        order
    }

    fn apply(order: &mut OrderAggregate, command: OrderCommand) -> Result<(), OrderError> {
        for event in order.handle_command(&command)? {
            order.apply_event(&event)?;
            order.version += 1;
        }
        Ok(())
    }

    fn move_to(order: &mut OrderAggregate, actor: Actor, target: OrderStatus) -> Result<(), OrderError> {
        apply(order, OrderCommand::Transition { actor, target, reason: None })
    }

    fn advance_to_ready(order: &mut OrderAggregate) {
        let kitchen = Actor::restaurant(order.restaurant_id);
        move_to(order, kitchen, OrderStatus::Accepted).unwrap();
        move_to(order, kitchen, OrderStatus::Preparing).unwrap();
        move_to(order, kitchen, OrderStatus::Ready).unwrap();
    }

    fn deliver(order: &mut OrderAggregate) -> Uuid {
        advance_to_ready(order);
        let partner = Uuid::new_v4();
        apply(order, OrderCommand::AssignPartner { partner_id: partner }).unwrap();
        move_to(order, Actor::delivery(partner), OrderStatus::PickedUp).unwrap();
        move_to(order, Actor::delivery(partner), OrderStatus::Delivered).unwrap();
        partner
    }

    #[test]
    fn test_order_placement() {
        let order = create_test_order();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.display_number, "RUZ000001");
        assert_eq!(order.line_items.len(), 2);
        assert_eq!(order.financials.total_amount, dec!(318.00));
        assert_eq!(order.customer_note.as_deref(), Some("extra spicy"));
        assert!(order.delivery_partner_id.is_none());
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.entered_at(OrderStatus::Pending), Some(order.created_at));
    }

    #[test]
    fn test_placement_validates_free_text() {
        let mut command = place_command(Uuid::new_v4(), Uuid::new_v4());
        if let OrderCommand::PlaceOrder { delivery_address, .. } = &mut command {
            *delivery_address = "   ".to_string();
        }
        assert!(matches!(
            OrderAggregate::handle_creation(&command),
            Err(OrderError::EmptyField("delivery address"))
        ));

        let mut command = place_command(Uuid::new_v4(), Uuid::new_v4());
        if let OrderCommand::PlaceOrder { customer_note, .. } = &mut command {
            *customer_note = Some("x".repeat(MAX_CUSTOMER_NOTE_LEN + 1));
        }
        let err = OrderAggregate::handle_creation(&command).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_placement_with_no_lines_fails() {
        let mut command = place_command(Uuid::new_v4(), Uuid::new_v4());
        if let OrderCommand::PlaceOrder { quote, .. } = &mut command {
            quote.lines.clear();
        }
        assert!(matches!(OrderAggregate::handle_creation(&command), Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_full_lifecycle_records_every_status() {
        let mut order = create_test_order();
        let partner = deliver(&mut order);

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.delivery_partner_id, Some(partner));
        let visited: Vec<_> = order.status_history.iter().map(|e| e.status).collect();
        assert_eq!(
            visited,
            vec![
                OrderStatus::Pending,
                OrderStatus::Accepted,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Assigned,
                OrderStatus::PickedUp,
                OrderStatus::Delivered,
            ]
        );
        assert_eq!(order.version, 7);
    }

    #[test]
    fn test_skipping_a_state_is_invalid() {
        let mut order = create_test_order();
        let kitchen = Actor::restaurant(order.restaurant_id);

        let result = move_to(&mut order, kitchen, OrderStatus::Preparing);
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition { from: OrderStatus::Pending, to: OrderStatus::Preparing })
        ));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_pending_cannot_be_reentered() {
        let order = create_test_order();
        let err = order
            .check_transition(&Actor::restaurant(order.restaurant_id), OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_wrong_role_is_unauthorized() {
        let order = create_test_order();

        let customer = Actor::customer(order.customer_id);
        let err = order.check_transition(&customer, OrderStatus::Accepted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let kitchen = Actor::restaurant(order.restaurant_id);
        let err = order.check_transition(&kitchen, OrderStatus::Cancelled).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let admin = Actor::admin(Uuid::new_v4());
        let err = order.check_transition(&admin, OrderStatus::Accepted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_other_restaurant_is_unauthorized() {
        let order = create_test_order();
        let other = Actor::restaurant(Uuid::new_v4());
        assert!(matches!(
            order.check_transition(&other, OrderStatus::Accepted),
            Err(OrderError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_customer_cancels_only_while_pending() {
        let mut order = create_test_order();
        let customer = Actor::customer(order.customer_id);
        let restaurant = Actor::restaurant(order.restaurant_id);
        move_to(&mut order, restaurant, OrderStatus::Accepted).unwrap();

        let result = move_to(&mut order, customer, OrderStatus::Cancelled);
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));

        let mut order = create_test_order();
        let customer = Actor::customer(order.customer_id);
        move_to(&mut order, customer, OrderStatus::Cancelled).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.status.is_terminal());
    }

    #[test]
    fn test_rejection_keeps_reason() {
        let mut order = create_test_order();
        let kitchen = Actor::restaurant(order.restaurant_id);
        apply(
            &mut order,
            OrderCommand::Transition {
                actor: kitchen,
                target: OrderStatus::Rejected,
                reason: Some("Out of rice".to_string()),
            },
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.rejection_reason.as_deref(), Some("Out of rice"));

        let err = move_to(&mut order, kitchen, OrderStatus::Accepted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_overlong_rejection_reason_fails() {
        let order = create_test_order();
        let command = OrderCommand::Transition {
            actor: Actor::restaurant(order.restaurant_id),
            target: OrderStatus::Rejected,
            reason: Some("x".repeat(MAX_REJECTION_REASON_LEN + 1)),
        };
        assert!(matches!(order.handle_command(&command), Err(OrderError::TextTooLong { .. })));
    }

    #[test]
    fn test_assignment_requires_ready_and_unassigned() {
        let mut order = create_test_order();
        let first = Uuid::new_v4();

        let early = order.handle_command(&OrderCommand::AssignPartner { partner_id: first });
        assert!(matches!(early, Err(OrderError::AlreadyAssigned(_))));

        advance_to_ready(&mut order);
        apply(&mut order, OrderCommand::AssignPartner { partner_id: first }).unwrap();
        assert_eq!(order.status, OrderStatus::Assigned);

        let second = order.handle_command(&OrderCommand::AssignPartner { partner_id: Uuid::new_v4() });
        let err = second.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyAssigned(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(order.delivery_partner_id, Some(first));
    }

    #[test]
    fn test_only_assigned_partner_can_pick_up() {
        let mut order = create_test_order();
        advance_to_ready(&mut order);
        let partner = Uuid::new_v4();
        apply(&mut order, OrderCommand::AssignPartner { partner_id: partner }).unwrap();

        let stranger = Actor::delivery(Uuid::new_v4());
        let err = move_to(&mut order, stranger, OrderStatus::PickedUp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        move_to(&mut order, Actor::delivery(partner), OrderStatus::PickedUp).unwrap();
        assert_eq!(order.status, OrderStatus::PickedUp);
    }

    #[test]
    fn test_visibility_scope() {
        let mut order = create_test_order();

        assert!(order.is_visible_to(&Actor::customer(order.customer_id)));
        assert!(!order.is_visible_to(&Actor::customer(Uuid::new_v4())));
        assert!(order.is_visible_to(&Actor::restaurant(order.restaurant_id)));
        assert!(!order.is_visible_to(&Actor::restaurant(Uuid::new_v4())));
        assert!(order.is_visible_to(&Actor::admin(Uuid::new_v4())));
        assert!(!order.is_visible_to(&Actor::delivery(Uuid::new_v4())));

        advance_to_ready(&mut order);
        let any_partner = Actor::delivery(Uuid::new_v4());
        assert!(order.is_visible_to(&any_partner));

        let partner = Uuid::new_v4();
        apply(&mut order, OrderCommand::AssignPartner { partner_id: partner }).unwrap();
        assert!(order.is_visible_to(&Actor::delivery(partner)));
        assert!(!order.is_visible_to(&any_partner));
    }

    #[test]
    fn test_rating_only_once_and_only_when_delivered() {
        let mut order = create_test_order();
        let command = OrderCommand::Rate {
            customer_id: order.customer_id,
            rating: 5,
            review: Some("Great food".to_string()),
        };

        let early = order.handle_command(&command).unwrap_err();
        assert!(matches!(early, OrderError::NotRateable(OrderStatus::Pending)));

        deliver(&mut order);
        apply(&mut order, command.clone()).unwrap();
        assert_eq!(order.rating, Some(5));
        assert_eq!(order.review.as_deref(), Some("Great food"));
        assert!(order.reviewed_at.is_some());

        let again = order.handle_command(&command).unwrap_err();
        assert!(matches!(again, OrderError::AlreadyRated));
        assert_eq!(again.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_rating_bounds() {
        let mut order = create_test_order();
        deliver(&mut order);

        for bad in [0u8, 6] {
            let command = OrderCommand::Rate {
                customer_id: order.customer_id,
                rating: bad,
                review: None,
            };
            assert!(matches!(order.handle_command(&command), Err(OrderError::InvalidRating(r)) if r == bad));
        }

        let command = OrderCommand::Rate {
            customer_id: order.customer_id,
            rating: 4,
            review: Some("x".repeat(MAX_REVIEW_LEN + 1)),
        };
        assert!(matches!(order.handle_command(&command), Err(OrderError::TextTooLong { field: "review", .. })));
    }

    #[test]
    fn test_second_placement_is_rejected() {
        let order = create_test_order();
        let result = order.handle_command(&place_command(order.customer_id, order.restaurant_id));
        assert!(matches!(result, Err(OrderError::AlreadyPlaced(_))));
    }

    #[test]
    fn test_stream_must_start_with_placement() {
        let event = OrderEvent::Rated(OrderRated {
            rating: 5,
            review: None,
            at: Utc::now(),
        });
        assert!(matches!(OrderAggregate::apply_first_event(&event), Err(OrderError::NotInitialized)));
    }
}
