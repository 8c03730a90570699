use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::PricingError;

// ============================================================================
// Pricing Value Objects
// ============================================================================

/// Ceiling for any single order amount. Keeps settlement sums over many
/// orders well inside `Decimal` range.
pub const MAX_ORDER_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Round a monetary amount to 2 decimal places, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Versioned snapshot of the platform-wide rate configuration.
///
/// Pricing captures one snapshot per order; later edits publish a new
/// version and never touch orders priced against an older one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRates {
    pub version: u64,
    pub base_delivery_charge: Decimal,
    pub per_km_rate: Decimal,
    pub platform_fee_percentage: Decimal,
    pub default_commission_percentage: Decimal,
}

impl Default for PlatformRates {
    fn default() -> Self {
        Self {
            version: 1,
            base_delivery_charge: Decimal::from(30),
            per_km_rate: Decimal::from(8),
            platform_fee_percentage: Decimal::new(24, 1),
            default_commission_percentage: Decimal::from(10),
        }
    }
}

impl PlatformRates {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.base_delivery_charge.is_sign_negative() {
            return Err(PricingError::InvalidRates("base delivery charge cannot be negative".into()));
        }
        if self.per_km_rate.is_sign_negative() {
            return Err(PricingError::InvalidRates("per km rate cannot be negative".into()));
        }
        validate_percentage("platform fee", self.platform_fee_percentage)?;
        validate_percentage("default commission", self.default_commission_percentage)?;
        Ok(())
    }
}

pub(crate) fn validate_percentage(name: &str, value: Decimal) -> Result<(), PricingError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidRates(format!("{name} percentage {value} outside 0..=100")));
    }
    Ok(())
}

/// One requested line of an order, before resolution against the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub menu_item_id: Uuid,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(menu_item_id: Uuid, quantity: u32) -> Self {
        Self { menu_item_id, quantity }
    }
}

/// A priced line. Name and unit price are snapshots taken at pricing time
/// and are never re-read from the live menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub menu_item_id: Uuid,
    pub name_snapshot: String,
    pub unit_price_snapshot: Decimal,
    pub quantity: u32,
    pub line_subtotal: Decimal,
}

impl LineItem {
    pub fn new(
        menu_item_id: Uuid,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<Self, PricingError> {
        let line_subtotal = unit_price
            .checked_mul(Decimal::from(quantity))
            .filter(|subtotal| *subtotal <= MAX_ORDER_AMOUNT)
            .ok_or(PricingError::AmountOutOfRange("line subtotal"))?;

        Ok(Self {
            menu_item_id,
            name_snapshot: name.into(),
            unit_price_snapshot: unit_price,
            quantity,
            line_subtotal,
        })
    }
}

/// The monetary breakdown frozen on an order at placement.
///
/// `total_amount = items_total + delivery_charge + platform_fee` and
/// `restaurant_earning_amount = items_total - admin_commission_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub items_total: Decimal,
    pub delivery_charge: Decimal,
    pub platform_fee: Decimal,
    pub total_amount: Decimal,
    pub commission_percentage_applied: Decimal,
    pub admin_commission_amount: Decimal,
    pub restaurant_earning_amount: Decimal,
    pub rates_version: u64,
}

/// Priced lines plus their breakdown; the output of a placement or preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<LineItem>,
    pub breakdown: Breakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(6.005)), dec!(6.01));
        assert_eq!(round_money(dec!(6.004)), dec!(6.00));
        assert_eq!(round_money(dec!(-1.125)), dec!(-1.13));
    }

    #[test]
    fn test_default_rates_match_platform_defaults() {
        let rates = PlatformRates::default();
        assert_eq!(rates.base_delivery_charge, dec!(30));
        assert_eq!(rates.per_km_rate, dec!(8));
        assert_eq!(rates.platform_fee_percentage, dec!(2.4));
        assert_eq!(rates.default_commission_percentage, dec!(10));
        assert!(rates.validate().is_ok());
    }

    #[test]
    fn test_rates_validation_rejects_out_of_range_values() {
        let mut rates = PlatformRates::default();
        rates.default_commission_percentage = dec!(120);
        assert!(matches!(rates.validate(), Err(PricingError::InvalidRates(_))));

        let mut rates = PlatformRates::default();
        rates.per_km_rate = dec!(-1);
        assert!(matches!(rates.validate(), Err(PricingError::InvalidRates(_))));
    }

    #[test]
    fn test_line_item_subtotal() {
        let line = LineItem::new(Uuid::new_v4(), "Masala Dosa", dec!(85.50), 3).unwrap();
        assert_eq!(line.line_subtotal, dec!(256.50));
    }

    #[test]
    fn test_line_item_rejects_runaway_subtotal() {
        let huge = LineItem::new(Uuid::new_v4(), "Banquet", dec!(100000000000000000000), u32::MAX);
        assert!(matches!(huge, Err(PricingError::AmountOutOfRange("line subtotal"))));

        let over_ceiling = LineItem::new(Uuid::new_v4(), "Banquet", MAX_ORDER_AMOUNT, 2);
        assert!(matches!(over_ceiling, Err(PricingError::AmountOutOfRange(_))));
    }

    #[test]
    fn test_breakdown_serializes_decimals_as_strings() {
        let breakdown = Breakdown {
            items_total: dec!(250),
            delivery_charge: dec!(62),
            platform_fee: dec!(6.00),
            total_amount: dec!(318.00),
            commission_percentage_applied: dec!(10),
            admin_commission_amount: dec!(25.00),
            restaurant_earning_amount: dec!(225.00),
            rates_version: 1,
        };

        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["total_amount"], "318.00");

        let back: Breakdown = serde_json::from_value(json).unwrap();
        assert_eq!(back, breakdown);
    }
}
