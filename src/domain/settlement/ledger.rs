use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::order::{OrderAggregate, OrderStatus};

// ============================================================================
// Settlement Ledger
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum SettlementScope {
    Platform,
    Restaurant(Uuid),
    DeliveryPartner(Uuid),
}

impl SettlementScope {
    pub fn includes(&self, order: &OrderAggregate) -> bool {
        match self {
            SettlementScope::Platform => true,
            SettlementScope::Restaurant(id) => order.restaurant_id == *id,
            SettlementScope::DeliveryPartner(id) => order.delivery_partner_id == Some(*id),
        }
    }
}

/// Money sums cover DELIVERED orders only; counts cover every order in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementStats {
    pub scope: SettlementScope,
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub pending_orders: u64,
    pub active_deliveries: u64,
    pub orders_by_status: BTreeMap<OrderStatus, u64>,
    pub total_revenue: Decimal,
    pub restaurant_earnings: Decimal,
    pub admin_commission: Decimal,
    pub delivery_charges: Decimal,
    pub platform_fees: Decimal,
}

impl SettlementStats {
    fn empty(scope: SettlementScope) -> Self {
        Self {
            scope,
            total_orders: 0,
            delivered_orders: 0,
            pending_orders: 0,
            active_deliveries: 0,
            orders_by_status: BTreeMap::new(),
            total_revenue: Decimal::ZERO,
            restaurant_earnings: Decimal::ZERO,
            admin_commission: Decimal::ZERO,
            delivery_charges: Decimal::ZERO,
            platform_fees: Decimal::ZERO,
        }
    }
}

pub struct SettlementLedger;

impl SettlementLedger {
    pub fn compute<'a, I>(orders: I, scope: SettlementScope) -> SettlementStats
    where
        I: IntoIterator<Item = &'a OrderAggregate>,
    {
        let mut stats = SettlementStats::empty(scope);

        for order in orders.into_iter().filter(|o| scope.includes(o)) {
            stats.total_orders += 1;
            *stats.orders_by_status.entry(order.status).or_insert(0) += 1;

            match order.status {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Assigned | OrderStatus::PickedUp => stats.active_deliveries += 1,
                OrderStatus::Delivered => {
                    let f = &order.financials;
                    stats.delivered_orders += 1;
                    stats.total_revenue += f.total_amount;
                    stats.restaurant_earnings += f.restaurant_earning_amount;
                    stats.admin_commission += f.admin_commission_amount;
                    stats.delivery_charges += f.delivery_charge;
                    stats.platform_fees += f.platform_fee;
                }
                _ => {}
            }
        }

        stats
    }
}
