use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;
use rust_decimal::Decimal;

use crate::domain::ports::{
    MenuLookup, NotificationSink, PartnerDirectory, RateSource, RestaurantDirectory,
};
use crate::domain::pricing::{self, LineRequest, PricingError, Quote};
use crate::domain::settlement::{SettlementLedger, SettlementScope, SettlementStats};
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::{EventStore, StoreError};
use crate::metrics::Metrics;

use super::aggregate::OrderAggregate;
use super::arbiter::AssignmentArbiter;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::notifications::notification_for;
use super::value_objects::{Actor, ActorRole, DisplayNumberSequence, OrderStatus};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store → Notifications
//
// Every write reads the order stream, lets the aggregate decide, and appends
// with the version it read. If another writer got there first the order is
// reloaded once and the command re-checked against fresh state, so the loser
// sees the business reason (InvalidTransition, AlreadyAssigned, ...) rather
// than a storage error. Nothing is retried.
//
// ============================================================================

/// Everything the order core needs from the rest of the platform
#[derive(Clone)]
pub struct Collaborators {
    pub menu: Arc<dyn MenuLookup>,
    pub restaurants: Arc<dyn RestaurantDirectory>,
    pub partners: Arc<dyn PartnerDirectory>,
    pub rates: Arc<dyn RateSource>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub restaurant_id: Uuid,
    pub lines: Vec<LineRequest>,
    pub delivery_address: String,
    pub distance_km: Decimal,
    pub customer_note: Option<String>,
}

pub struct OrderCommandHandler {
    event_store: Arc<EventStore<OrderEvent>>,
    collaborators: Collaborators,
    arbiter: AssignmentArbiter,
    display_numbers: DisplayNumberSequence,
    metrics: Option<Arc<Metrics>>,
}

impl OrderCommandHandler {
    pub fn new(event_store: Arc<EventStore<OrderEvent>>, collaborators: Collaborators) -> Self {
        Self {
            event_store,
            collaborators,
            arbiter: AssignmentArbiter::new(),
            display_numbers: DisplayNumberSequence::default(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_display_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.display_numbers = DisplayNumberSequence::new(prefix);
        self
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Price the request against the live menu and open a new order stream
    pub async fn place_order(
        &self,
        customer_id: Uuid,
        request: PlaceOrderRequest,
    ) -> Result<OrderAggregate, OrderError> {
        self.place_order_inner(customer_id, request)
            .await
            .inspect_err(|e| self.record_rejection(e))
    }

    async fn place_order_inner(
        &self,
        customer_id: Uuid,
        request: PlaceOrderRequest,
    ) -> Result<OrderAggregate, OrderError> {
        let (restaurant_owner_id, quote) = self.price_request(&request).await?;

        let order_id = Uuid::new_v4();
        let command = OrderCommand::PlaceOrder {
            order_id,
            display_number: self.display_numbers.next(),
            customer_id,
            restaurant_id: request.restaurant_id,
            restaurant_owner_id,
            delivery_address: request.delivery_address,
            distance_km: request.distance_km,
            customer_note: request.customer_note,
            quote,
        };

        let events = OrderAggregate::handle_creation(&command)?;
        let new_version = self.append(order_id, 0, &events, Actor::customer(customer_id)).await?;

        let mut order = OrderAggregate::apply_first_event(&events[0])?;
        for event in events.iter().skip(1) {
            order.apply_event(event)?;
        }
        order.set_version(new_version);

        if let Some(metrics) = &self.metrics {
            metrics.orders_placed.inc();
        }
        tracing::info!(
            order_id = %order.id,
            display_number = %order.display_number,
            restaurant_id = %order.restaurant_id,
            total = %order.financials.total_amount,
            "Order placed"
        );

        self.notify(&order, &events).await;
        Ok(order)
    }

    /// Quote a request exactly as placement would, without creating anything
    pub async fn preview_quote(&self, request: &PlaceOrderRequest) -> Result<Quote, OrderError> {
        let (_, quote) = self.price_request(request).await?;
        Ok(quote)
    }

    async fn price_request(&self, request: &PlaceOrderRequest) -> Result<(Uuid, Quote), OrderError> {
        let started = Instant::now();

        let restaurant = self
            .collaborators
            .restaurants
            .get_restaurant(request.restaurant_id)
            .await?
            .ok_or(PricingError::RestaurantUnavailable(request.restaurant_id))?;
        let rates = self.collaborators.rates.current_rates().await?;

        let quote = pricing::price(
            &restaurant,
            self.collaborators.menu.as_ref(),
            &request.lines,
            request.distance_km,
            &rates,
        )
        .await?;

        if let Some(metrics) = &self.metrics {
            metrics.pricing_duration.observe(started.elapsed().as_secs_f64());
        }

        Ok((restaurant.owner_id, quote))
    }

    /// Move an order along one edge of the state machine
    pub async fn transition(
        &self,
        order_id: Uuid,
        actor: Actor,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<OrderAggregate, OrderError> {
        self.transition_inner(order_id, actor, target, reason)
            .await
            .inspect_err(|e| self.record_rejection(e))
    }

    async fn transition_inner(
        &self,
        order_id: Uuid,
        actor: Actor,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<OrderAggregate, OrderError> {
        // A claim is judged on the order itself, not on what the partner can see
        if target == OrderStatus::Assigned && actor.role == ActorRole::Delivery {
            return self.assign_delivery_inner(order_id, actor.id).await;
        }

        let order = self.load_scoped(order_id, &actor).await?;
        let command = OrderCommand::Transition { actor, target, reason };
        self.execute(order, actor, command).await
    }

    /// A delivery partner claims a READY order
    pub async fn assign_delivery(&self, order_id: Uuid, partner_id: Uuid) -> Result<OrderAggregate, OrderError> {
        self.assign_delivery_inner(order_id, partner_id)
            .await
            .inspect_err(|e| self.record_rejection(e))
    }

    async fn assign_delivery_inner(&self, order_id: Uuid, partner_id: Uuid) -> Result<OrderAggregate, OrderError> {
        let _claim = self.arbiter.lock_partner(partner_id).await;

        let partner = self.collaborators.partners.get_partner(partner_id).await?;
        if !partner.is_some_and(|p| p.can_deliver()) {
            return Err(OrderError::PartnerNotEligible(partner_id));
        }

        let order = self.load(order_id).await?;
        if let Err(e) = order.check_assignable() {
            self.record_assignment_conflict();
            return Err(e);
        }

        if self.active_delivery(partner_id).await?.is_some() {
            self.record_assignment_conflict();
            return Err(OrderError::PartnerBusy(partner_id));
        }

        let result = self
            .execute(order, Actor::delivery(partner_id), OrderCommand::AssignPartner { partner_id })
            .await;

        if let Err(OrderError::AlreadyAssigned(_) | OrderError::ConcurrentModification(_)) = &result {
            self.record_assignment_conflict();
        }
        result
    }

    /// Customer feedback on a delivered order; allowed once
    pub async fn rate(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        rating: u8,
        review: Option<String>,
    ) -> Result<OrderAggregate, OrderError> {
        self.rate_inner(order_id, customer_id, rating, review)
            .await
            .inspect_err(|e| self.record_rejection(e))
    }

    async fn rate_inner(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        rating: u8,
        review: Option<String>,
    ) -> Result<OrderAggregate, OrderError> {
        let order = self.load_scoped(order_id, &Actor::customer(customer_id)).await?;
        let command = OrderCommand::Rate { customer_id, rating, review };
        let order = self.execute(order, Actor::customer(customer_id), command).await?;

        if let Err(e) = self
            .collaborators
            .restaurants
            .record_rating(order.restaurant_id, rating)
            .await
        {
            tracing::warn!(
                order_id = %order.id,
                restaurant_id = %order.restaurant_id,
                error = %e,
                "Failed to record rating on restaurant"
            );
        }

        Ok(order)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_order(&self, order_id: Uuid, actor: &Actor) -> Result<OrderAggregate, OrderError> {
        self.load_scoped(order_id, actor).await
    }

    /// Orders belonging to the actor, newest first
    pub async fn list_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderAggregate>, OrderError> {
        let mut orders: Vec<OrderAggregate> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|o| match actor.role {
                ActorRole::Customer => o.customer_id == actor.id,
                ActorRole::Restaurant => o.restaurant_id == actor.id,
                ActorRole::Delivery => o.delivery_partner_id == Some(actor.id),
                ActorRole::Admin => true,
            })
            .filter(|o| status.map_or(true, |s| o.status == s))
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// READY orders nobody has claimed yet, longest waiting first
    pub async fn available_orders(&self) -> Result<Vec<OrderAggregate>, OrderError> {
        let mut orders: Vec<OrderAggregate> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|o| o.is_open_for_assignment())
            .collect();

        orders.sort_by_key(|o| o.entered_at(OrderStatus::Ready));
        Ok(orders)
    }

    /// The partner's current ASSIGNED or PICKED_UP order, if any
    pub async fn active_delivery(&self, partner_id: Uuid) -> Result<Option<OrderAggregate>, OrderError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|o| o.delivery_partner_id == Some(partner_id) && o.status.is_active_delivery()))
    }

    pub async fn settlement(&self, scope: SettlementScope) -> Result<SettlementStats, OrderError> {
        let orders = self.load_all().await?;
        Ok(SettlementLedger::compute(&orders, scope))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Load an order, reporting anything outside the actor's scope as absent
    async fn load_scoped(&self, order_id: Uuid, actor: &Actor) -> Result<OrderAggregate, OrderError> {
        let order = self.load(order_id).await?;
        if !order.is_visible_to(actor) {
            return Err(OrderError::NotFound(order_id));
        }
        Ok(order)
    }

    async fn load(&self, order_id: Uuid) -> Result<OrderAggregate, OrderError> {
        match self.event_store.load_aggregate(order_id).await {
            Ok(order) => Ok(order),
            Err(StoreError::AggregateNotFound(_)) => Err(OrderError::NotFound(order_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_all(&self) -> Result<Vec<OrderAggregate>, OrderError> {
        Ok(self.event_store.load_all::<OrderAggregate>().await?)
    }

    /// Decide, commit against the version read, then fold the new events in
    async fn execute(
        &self,
        mut order: OrderAggregate,
        actor: Actor,
        command: OrderCommand,
    ) -> Result<OrderAggregate, OrderError> {
        let events = order.handle_command(&command)?;
        let expected_version = order.version();

        match self.append(order.id, expected_version, &events, actor).await {
            Ok(new_version) => {
                for event in &events {
                    order.apply_event(event)?;
                    if let (Some(metrics), OrderEvent::StatusChanged(_) | OrderEvent::PartnerAssigned(_)) =
                        (&self.metrics, event)
                    {
                        metrics.record_transition(order.status.as_str());
                    }
                }
                order.set_version(new_version);

                tracing::info!(
                    order_id = %order.id,
                    actor_id = %actor.id,
                    status = %order.status,
                    version = new_version,
                    "Order updated"
                );

                self.notify(&order, &events).await;
                Ok(order)
            }
            Err(StoreError::ConcurrencyConflict { expected, actual, .. }) => {
                tracing::debug!(
                    order_id = %order.id,
                    expected = expected,
                    actual = actual,
                    "Lost write race, re-checking against fresh state"
                );
                let fresh: OrderAggregate = self.event_store.load_aggregate(order.id).await?;
                fresh.handle_command(&command)?;
                Err(OrderError::ConcurrentModification(order.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn append(
        &self,
        order_id: Uuid,
        expected_version: i64,
        events: &[OrderEvent],
        actor: Actor,
    ) -> Result<i64, StoreError> {
        let correlation_id = Uuid::new_v4();
        let envelopes = events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                EventEnvelope::new(
                    order_id,
                    expected_version + 1 + i as i64,
                    event.event_name().to_string(),
                    event.clone(),
                    correlation_id,
                )
                .with_user(actor.id)
                .with_metadata("actor_role", actor.role.to_string())
            })
            .collect();

        self.event_store.append_events(order_id, expected_version, envelopes).await
    }

    /// Fire-and-forget; a failed notification never fails the operation
    async fn notify(&self, order: &OrderAggregate, events: &[OrderEvent]) {
        for notification in events.iter().filter_map(|e| notification_for(order, e)) {
            let kind = notification.kind;
            if let Err(e) = self.collaborators.notifier.notify(notification).await {
                tracing::warn!(order_id = %order.id, kind = kind.as_str(), error = %e, "Notification failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_notification_failure(kind.as_str());
                }
            }
        }
    }

    fn record_rejection(&self, error: &OrderError) {
        tracing::debug!(kind = %error.kind(), error = %error, "Order command refused");
        if let Some(metrics) = &self.metrics {
            metrics.record_rejection(error.kind().as_str());
        }
    }

    fn record_assignment_conflict(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.assignment_conflicts.inc();
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
