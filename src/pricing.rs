// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Unit-economics calculator for property listings.
//!
//! Given a base price and three percentage rates, computes purchase costs,
//! transaction fees, the mandatory/official fee, and the total listing
//! price. All outputs are fixed-point two-decimal strings; arithmetic is
//! exact `Decimal` throughout so persisted values never carry float drift.
//!
//! The calculator is pure and has no knowledge of storage or HTTP.

use std::str::FromStr;

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};

/// Monetary input failed to parse.
///
/// Loosely-formatted strings ("₦1,000.50", "$2 500") are cleaned before
/// parsing; input that yields no digits or an invalid decimal is a typed
/// error, not a silent zero. The caller decides between defaulting and
/// rejecting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    #[error("monetary value contains no digits: {0:?}")]
    NoDigits(String),

    #[error("monetary value is not a valid decimal: {0:?}")]
    Malformed(String),

    #[error("monetary value is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// Per-unit price is undefined for a listing with zero units.
    #[error("unit count must be at least 1")]
    ZeroUnits,
}

/// Percentage rates applied to a property's base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRates {
    pub purchase_pct: Decimal,
    pub transaction_pct: Decimal,
    pub mof_pct: Decimal,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            purchase_pct: Decimal::new(5, 0),
            transaction_pct: Decimal::new(5, 0),
            mof_pct: Decimal::new(3, 0),
        }
    }
}

/// Cost breakdown for one listing, rendered as two-decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCosts {
    /// Base price, normalized to two decimals.
    pub property_price: String,
    pub purchase_costs: String,
    pub transaction_fees: String,
    pub mof_fees: String,
    pub total_cost: String,
    total: Decimal,
}

impl UnitCosts {
    /// Unrounded total, for follow-on arithmetic (per-unit division).
    pub fn total(&self) -> Decimal {
        self.total
    }
}

/// Compute the cost breakdown for a base price and rate triple.
pub fn compute_unit_costs(price: Decimal, rates: &FeeRates) -> UnitCosts {
    let hundred = Decimal::ONE_HUNDRED;
    let purchase = price * rates.purchase_pct / hundred;
    let transaction = price * rates.transaction_pct / hundred;
    let mof = price * rates.mof_pct / hundred;
    let total = price + purchase + transaction + mof;

    UnitCosts {
        property_price: money_string(price),
        purchase_costs: money_string(purchase),
        transaction_fees: money_string(transaction),
        mof_fees: money_string(mof),
        total_cost: money_string(total),
        total,
    }
}

/// Parse a loosely-formatted monetary string.
///
/// Strips every character that is not an ASCII digit or decimal point
/// (currency symbols, thousands separators, whitespace) before parsing.
pub fn parse_money(raw: &str) -> Result<Decimal, MoneyParseError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(MoneyParseError::NoDigits(raw.to_string()));
    }

    Decimal::from_str(&cleaned).map_err(|_| MoneyParseError::Malformed(raw.to_string()))
}

/// Convert a JSON number into a monetary `Decimal`.
pub fn money_from_f64(value: f64) -> Result<Decimal, MoneyParseError> {
    Decimal::from_f64(value).ok_or(MoneyParseError::NotFinite)
}

/// Render a monetary value as a fixed-point two-decimal string.
///
/// Midpoints round away from zero, so 2.005 renders as "2.01".
pub fn money_string(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Per-unit price for a listing. Fails fast on zero units rather than
/// persisting an undefined derived field.
pub fn price_per_unit(total: Decimal, num_units: u32) -> Result<Decimal, PricingError> {
    if num_units == 0 {
        return Err(PricingError::ZeroUnits);
    }
    Ok(total / Decimal::from(num_units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reference_breakdown_100_at_5_5_3() {
        let costs = compute_unit_costs(dec!(100), &FeeRates::default());
        assert_eq!(costs.property_price, "100.00");
        assert_eq!(costs.purchase_costs, "5.00");
        assert_eq!(costs.transaction_fees, "5.00");
        assert_eq!(costs.mof_fees, "3.00");
        assert_eq!(costs.total_cost, "113.00");
    }

    #[test]
    fn parses_currency_symbols_and_thousands_separators() {
        let price = parse_money("₦1,000.50").unwrap();
        assert_eq!(price, dec!(1000.50));

        let rates = FeeRates {
            purchase_pct: dec!(10),
            transaction_pct: Decimal::ZERO,
            mof_pct: Decimal::ZERO,
        };
        let costs = compute_unit_costs(price, &rates);
        assert_eq!(costs.purchase_costs, "100.05");
        assert_eq!(costs.total_cost, "1100.55");
    }

    #[test]
    fn input_without_digits_is_a_typed_error() {
        // Previously this coerced to zero and priced the listing at "0.00";
        // the parse failure is now surfaced to the caller.
        let err = parse_money("not a price").unwrap_err();
        assert_eq!(err, MoneyParseError::NoDigits("not a price".to_string()));
    }

    #[test]
    fn input_with_multiple_decimal_points_is_malformed() {
        let err = parse_money("1.2.3").unwrap_err();
        assert!(matches!(err, MoneyParseError::Malformed(_)));
    }

    #[test]
    fn total_equals_sum_of_components_within_rounding() {
        for (price, rates) in [
            (dec!(250000), FeeRates::default()),
            (
                dec!(999.99),
                FeeRates {
                    purchase_pct: dec!(7.5),
                    transaction_pct: dec!(1.25),
                    mof_pct: dec!(0.4),
                },
            ),
            (dec!(0.01), FeeRates::default()),
        ] {
            let costs = compute_unit_costs(price, &rates);
            let sum = Decimal::from_str(&costs.property_price).unwrap()
                + Decimal::from_str(&costs.purchase_costs).unwrap()
                + Decimal::from_str(&costs.transaction_fees).unwrap()
                + Decimal::from_str(&costs.mof_fees).unwrap();
            let total = Decimal::from_str(&costs.total_cost).unwrap();
            let diff = (sum - total).abs();
            assert!(diff <= dec!(0.02), "diff {diff} for price {price}");
        }
    }

    #[test]
    fn money_string_pads_and_rounds_midpoints_away_from_zero() {
        assert_eq!(money_string(dec!(5)), "5.00");
        assert_eq!(money_string(dec!(2.005)), "2.01");
        assert_eq!(money_string(dec!(2.004)), "2.00");
    }

    #[test]
    fn per_unit_price_divides_total() {
        let costs = compute_unit_costs(dec!(100), &FeeRates::default());
        let per_unit = price_per_unit(costs.total(), 2).unwrap();
        assert_eq!(money_string(per_unit), "56.50");
    }

    #[test]
    fn per_unit_price_rejects_zero_units() {
        assert_eq!(
            price_per_unit(dec!(113), 0),
            Err(PricingError::ZeroUnits)
        );
    }

    #[test]
    fn non_finite_number_is_rejected() {
        assert_eq!(money_from_f64(f64::NAN), Err(MoneyParseError::NotFinite));
        assert!(money_from_f64(250000.0).is_ok());
    }
}
