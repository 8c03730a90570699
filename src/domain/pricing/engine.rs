use rust_decimal::Decimal;

use super::errors::PricingError;
use super::value_objects::{round_money, validate_percentage, Breakdown, MAX_ORDER_AMOUNT, LineItem, LineRequest, PlatformRates, Quote};
use crate::domain::ports::{MenuLookup, RestaurantProfile};

// ============================================================================
// Pricing Engine
// ============================================================================
//
// price():             validate request → resolve every line against the
//                      live menu → compute_breakdown()
// compute_breakdown(): pure arithmetic over already-resolved lines
//
// Any line that fails to resolve fails the whole quote; there are no
// partial orders.
//
// ============================================================================

/// Minimum billable delivery distance
pub const MIN_DISTANCE_KM: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Price a set of requested lines for one restaurant.
///
/// Reads the menu once per line and nothing else; calling it twice with an
/// unchanged menu yields identical quotes.
pub async fn price(
    restaurant: &RestaurantProfile,
    menu: &dyn MenuLookup,
    lines: &[LineRequest],
    distance_km: Decimal,
    rates: &PlatformRates,
) -> Result<Quote, PricingError> {
    validate_request(lines, distance_km)?;

    if !restaurant.accepts_orders() {
        return Err(PricingError::RestaurantUnavailable(restaurant.id));
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let item = menu
            .get_available_item(restaurant.id, line.menu_item_id)
            .await?
            .ok_or(PricingError::ItemUnavailable(line.menu_item_id))?;

        priced.push(LineItem::new(line.menu_item_id, item.name, item.price, line.quantity)?);
    }

    let breakdown = compute_breakdown(restaurant, &priced, distance_km, rates)?;

    Ok(Quote {
        lines: priced,
        breakdown,
    })
}

/// Compute the frozen breakdown from resolved lines.
pub fn compute_breakdown(
    restaurant: &RestaurantProfile,
    lines: &[LineItem],
    distance_km: Decimal,
    rates: &PlatformRates,
) -> Result<Breakdown, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyOrder);
    }
    rates.validate()?;

    let commission_percentage_applied = match restaurant.commission_override {
        Some(commission) => {
            validate_percentage("restaurant commission", commission)?;
            commission
        }
        None => rates.default_commission_percentage,
    };

    let items_total = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.line_subtotal))
        .and_then(bounded)
        .ok_or(PricingError::AmountOutOfRange("items total"))?;

    let delivery_charge = distance_km
        .checked_mul(rates.per_km_rate)
        .and_then(|distance_charge| distance_charge.checked_add(rates.base_delivery_charge))
        .and_then(bounded)
        .map(round_money)
        .ok_or(PricingError::AmountOutOfRange("delivery charge"))?;

    // items_total is bounded and percentages are at most 100, so these cannot overflow
    let platform_fee = round_money(items_total * rates.platform_fee_percentage / Decimal::ONE_HUNDRED);
    let admin_commission_amount = round_money(items_total * commission_percentage_applied / Decimal::ONE_HUNDRED);

    let total_amount = bounded(items_total + delivery_charge + platform_fee)
        .ok_or(PricingError::AmountOutOfRange("order total"))?;

    Ok(Breakdown {
        items_total,
        delivery_charge,
        platform_fee,
        total_amount,
        commission_percentage_applied,
        admin_commission_amount,
        restaurant_earning_amount: items_total - admin_commission_amount,
        rates_version: rates.version,
    })
}

fn bounded(amount: Decimal) -> Option<Decimal> {
    (amount <= MAX_ORDER_AMOUNT).then_some(amount)
}

fn validate_request(lines: &[LineRequest], distance_km: Decimal) -> Result<(), PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    if let Some(bad) = lines.iter().find(|l| l.quantity == 0) {
        return Err(PricingError::InvalidQuantity {
            menu_item_id: bad.menu_item_id,
            quantity: bad.quantity,
        });
    }

    if distance_km < MIN_DISTANCE_KM {
        return Err(PricingError::InvalidDistance(distance_km));
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
