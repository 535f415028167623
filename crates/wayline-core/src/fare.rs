//! # Fare Computation Engine
//!
//! Turns a combined [`PricingConfig`] and [`TripMeasurements`] into a
//! [`FareBreakdown`]. Pure: no clock, no I/O, no randomness, so it is safe
//! to call for quotes before a booking exists.
//!
//! ## Computation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        compute_fare()                                   │
//! │                                                                         │
//! │  1. Base fee                      ──► line "Base fee"                  │
//! │  2. Strategy charge                                                    │
//! │     POINT_TO_POINT: round(miles × per_mile)   ──► line "Distance"      │
//! │     HOURLY:         round(hours × per_hour)   ──► line "Hourly"        │
//! │     FLAT:           (nothing)                                          │
//! │  3. subtotal = sum of rounded lines                                    │
//! │  4. subtotal < min_fare?  ──► subtotal = min_fare                      │
//! │                               line "Minimum fare applied"              │
//! │  5. total = subtotal  (fees and taxes belong to the caller)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each line is rounded to the cent on its own before summing so a
//! re-quote always reproduces the same cents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PricingConfig, PricingStrategy, TaxRate, TripMeasurements};

// =============================================================================
// Fare Breakdown
// =============================================================================

/// What a single fare line charges for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FareLineKind {
    BaseFee,
    Distance,
    Hourly,
    MinimumFareAdjustment,
}

/// One priced line of a fare, in computation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FareLine {
    pub kind: FareLineKind,
    pub label: String,
    pub amount: Money,
}

/// Output of [`compute_fare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FareBreakdown {
    pub strategy: PricingStrategy,
    pub lines: Vec<FareLine>,
    pub subtotal: Money,
    /// Equal to `subtotal`; fees and taxes are added when the price is locked.
    pub total: Money,
    pub min_fare_applied: bool,
    /// Human-readable summary, built alongside the numbers.
    pub breakdown: String,
}

// =============================================================================
// Engine
// =============================================================================

/// Computes the fare for a trip.
///
/// Negative rates and negative/NaN measurements are treated as zero; this
/// function never fails.
///
/// ## Example
/// ```rust
/// use wayline_core::fare::compute_fare;
/// use wayline_core::types::{PricingConfig, PricingStrategy, TripMeasurements};
///
/// let config = PricingConfig {
///     pricing_strategy: PricingStrategy::PointToPoint,
///     min_fare_cents: 5500,
///     base_fee_cents: 5500,
///     per_mile_cents: 275,
///     ..Default::default()
/// };
///
/// let fare = compute_fare(&config, &TripMeasurements::distance(30.0));
/// assert_eq!(fare.total.cents(), 13750);
/// assert!(!fare.min_fare_applied);
/// ```
pub fn compute_fare(config: &PricingConfig, measurements: &TripMeasurements) -> FareBreakdown {
    let config = config.normalized();
    let m = measurements.normalized();

    let mut lines = Vec::with_capacity(3);
    let mut parts = Vec::with_capacity(3);

    let base = config.base_fee();
    lines.push(FareLine {
        kind: FareLineKind::BaseFee,
        label: "Base fee".to_string(),
        amount: base,
    });
    parts.push(format!("Base fee {}", base));

    match config.pricing_strategy {
        PricingStrategy::PointToPoint => {
            let charge = config.per_mile().times_quantity(m.distance_miles);
            let label = format!("Distance {:.2} mi x {}", m.distance_miles, config.per_mile());
            parts.push(format!("{} = {}", label, charge));
            lines.push(FareLine {
                kind: FareLineKind::Distance,
                label,
                amount: charge,
            });
        }
        PricingStrategy::Hourly => {
            let charge = config.per_hour().times_quantity(m.hours_requested);
            let label = format!("Hourly {:.2} h x {}", m.hours_requested, config.per_hour());
            parts.push(format!("{} = {}", label, charge));
            lines.push(FareLine {
                kind: FareLineKind::Hourly,
                label,
                amount: charge,
            });
        }
        PricingStrategy::Flat => {}
    }

    let mut subtotal: Money = lines.iter().map(|l| l.amount).sum();
    let mut min_fare_applied = false;

    let min_fare = config.min_fare();
    if subtotal < min_fare {
        let adjustment = min_fare - subtotal;
        lines.push(FareLine {
            kind: FareLineKind::MinimumFareAdjustment,
            label: "Minimum fare applied".to_string(),
            amount: adjustment,
        });
        parts.push(format!("Minimum fare applied ({})", min_fare));
        subtotal = min_fare;
        min_fare_applied = true;
    }

    FareBreakdown {
        strategy: config.pricing_strategy,
        lines,
        subtotal,
        total: subtotal,
        min_fare_applied,
        breakdown: parts.join("; "),
    }
}

// =============================================================================
// Locked Price
// =============================================================================

/// The four price fields written onto a booking at approval.
///
/// Invariant: `total == subtotal + fees + taxes`, every field ≥ 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LockedPrice {
    pub subtotal: Money,
    pub fees: Money,
    pub taxes: Money,
    pub total: Money,
}

impl LockedPrice {
    /// A price with no fees or taxes on top of the fare.
    pub fn from_fare(fare: &FareBreakdown) -> Self {
        LockedPrice::with_charges(fare, Money::zero(), TaxRate::zero())
    }

    /// Adds a flat fee and tax (on subtotal + fees) to a fare.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::fare::{compute_fare, LockedPrice};
    /// use wayline_core::money::Money;
    /// use wayline_core::types::{PricingConfig, PricingStrategy, TaxRate, TripMeasurements};
    ///
    /// let config = PricingConfig {
    ///     pricing_strategy: PricingStrategy::Flat,
    ///     base_fee_cents: 10000,
    ///     ..Default::default()
    /// };
    /// let fare = compute_fare(&config, &TripMeasurements::default());
    /// let price = LockedPrice::with_charges(&fare, Money::from_cents(500), TaxRate::from_bps(1000));
    /// assert_eq!(price.taxes.cents(), 1050);
    /// assert_eq!(price.total.cents(), 11550);
    /// ```
    pub fn with_charges(fare: &FareBreakdown, fees: Money, tax_rate: TaxRate) -> Self {
        let subtotal = fare.total;
        let fees = fees.clamp_non_negative();
        let taxes = (subtotal + fees).calculate_tax(tax_rate);
        LockedPrice {
            subtotal,
            fees,
            taxes,
            total: subtotal + fees + taxes,
        }
    }

    /// Checks the price can be locked onto a booking.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.total.is_positive() {
            return Err(CoreError::InvalidFare {
                reason: format!("total must be positive, got {}", self.total),
            });
        }
        if self.subtotal.is_negative() || self.fees.is_negative() || self.taxes.is_negative() {
            return Err(CoreError::InvalidFare {
                reason: "price components must not be negative".to_string(),
            });
        }
        if self.subtotal + self.fees + self.taxes != self.total {
            return Err(CoreError::InvalidFare {
                reason: format!(
                    "total {} does not equal subtotal {} + fees {} + taxes {}",
                    self.total, self.subtotal, self.fees, self.taxes
                ),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn airport_config(min_fare_cents: i64) -> PricingConfig {
        PricingConfig {
            pricing_strategy: PricingStrategy::PointToPoint,
            min_fare_cents,
            base_fee_cents: 5500,
            per_mile_cents: 275,
            per_minute_cents: 0,
            per_hour_cents: 0,
        }
    }

    #[test]
    fn test_point_to_point_long_trip() {
        let fare = compute_fare(&airport_config(5500), &TripMeasurements::distance(30.0));
        assert_eq!(fare.subtotal.cents(), 13750);
        assert_eq!(fare.total.cents(), 13750);
        assert!(!fare.min_fare_applied);
        assert_eq!(fare.lines[1].amount.cents(), 8250);
    }

    #[test]
    fn test_point_to_point_short_trip_above_minimum() {
        let fare = compute_fare(&airport_config(5500), &TripMeasurements::distance(2.0));
        assert_eq!(fare.total.cents(), 6050);
        assert!(!fare.min_fare_applied);
    }

    #[test]
    fn test_minimum_fare_floor() {
        let fare = compute_fare(&airport_config(9000), &TripMeasurements::distance(2.0));
        assert_eq!(fare.total.cents(), 9000);
        assert!(fare.min_fare_applied);
        let last = fare.lines.last().unwrap();
        assert_eq!(last.kind, FareLineKind::MinimumFareAdjustment);
        assert_eq!(last.amount.cents(), 2950);
        // lines always add up to the subtotal
        let sum: Money = fare.lines.iter().map(|l| l.amount).sum();
        assert_eq!(sum, fare.subtotal);
    }

    #[test]
    fn test_breakdown_string_order() {
        let fare = compute_fare(&airport_config(9000), &TripMeasurements::distance(2.0));
        assert_eq!(
            fare.breakdown,
            "Base fee $55.00; Distance 2.00 mi x $2.75 = $5.50; Minimum fare applied ($90.00)"
        );
    }

    #[test]
    fn test_hourly() {
        let config = PricingConfig {
            pricing_strategy: PricingStrategy::Hourly,
            min_fare_cents: 20000,
            base_fee_cents: 2500,
            per_hour_cents: 9500,
            ..Default::default()
        };
        let fare = compute_fare(&config, &TripMeasurements::hours(3.5));
        // 2500 + round(3.5 * 9500) = 2500 + 33250
        assert_eq!(fare.total.cents(), 35750);
        assert!(!fare.min_fare_applied);

        let short = compute_fare(&config, &TripMeasurements::hours(1.0));
        assert_eq!(short.total.cents(), 20000);
        assert!(short.min_fare_applied);
    }

    #[test]
    fn test_flat_ignores_measurements() {
        let config = PricingConfig {
            pricing_strategy: PricingStrategy::Flat,
            base_fee_cents: 12000,
            per_mile_cents: 500,
            per_hour_cents: 500,
            ..Default::default()
        };
        let fare = compute_fare(&config, &TripMeasurements::distance(100.0));
        assert_eq!(fare.total.cents(), 12000);
        assert_eq!(fare.lines.len(), 1);
    }

    #[test]
    fn test_bad_input_is_normalized() {
        let config = PricingConfig {
            pricing_strategy: PricingStrategy::PointToPoint,
            min_fare_cents: -100,
            base_fee_cents: -5000,
            per_mile_cents: 300,
            ..Default::default()
        };
        let fare = compute_fare(&config, &TripMeasurements::distance(-12.0));
        assert_eq!(fare.total, Money::zero());
        assert!(!fare.min_fare_applied);

        let nan = compute_fare(&airport_config(0), &TripMeasurements::distance(f64::NAN));
        assert_eq!(nan.total.cents(), 5500);
    }

    #[test]
    fn test_absurd_inputs_saturate_instead_of_overflowing() {
        let far = compute_fare(&airport_config(5500), &TripMeasurements::distance(1e20));
        assert_eq!(far.total.cents(), i64::MAX);
        assert!(!far.min_fare_applied);

        let config = PricingConfig {
            pricing_strategy: PricingStrategy::Hourly,
            min_fare_cents: 100,
            base_fee_cents: i64::MAX,
            per_hour_cents: 9500,
            ..Default::default()
        };
        let fare = compute_fare(&config, &TripMeasurements::hours(3.0));
        assert_eq!(fare.subtotal.cents(), i64::MAX);
        assert!(fare.total.is_positive());
        assert!(LockedPrice::with_charges(&fare, Money::from_cents(500), TaxRate::from_bps(860))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_each_line_rounded_before_summing() {
        // 0.5 mi at 101 cents = 50.5 → 51
        let config = PricingConfig {
            pricing_strategy: PricingStrategy::PointToPoint,
            base_fee_cents: 100,
            per_mile_cents: 101,
            ..Default::default()
        };
        let fare = compute_fare(&config, &TripMeasurements::distance(0.5));
        assert_eq!(fare.lines[1].amount.cents(), 51);
        assert_eq!(fare.total.cents(), 151);
    }

    #[test]
    fn test_locked_price_validation() {
        let fare = compute_fare(&airport_config(5500), &TripMeasurements::distance(2.0));
        let price = LockedPrice::from_fare(&fare);
        assert!(price.validate().is_ok());
        assert_eq!(price.total.cents(), 6050);

        let zero = compute_fare(&PricingConfig::default(), &TripMeasurements::default());
        let err = LockedPrice::from_fare(&zero).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidFare { .. }));

        let malformed = LockedPrice {
            subtotal: Money::from_cents(1000),
            fees: Money::zero(),
            taxes: Money::zero(),
            total: Money::from_cents(999),
        };
        assert!(matches!(malformed.validate(), Err(CoreError::InvalidFare { .. })));
    }

    #[test]
    fn test_identical_inputs_serialize_identically() {
        let m = TripMeasurements::distance(17.3);
        let a = serde_json::to_string(&compute_fare(&airport_config(5500), &m)).unwrap();
        let b = serde_json::to_string(&compute_fare(&airport_config(5500), &m)).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_fare_monotonic_in_distance(
            base in 0i64..20_000,
            per_mile in 0i64..1_000,
            min_fare in 0i64..50_000,
            a in 0.0f64..500.0,
            b in 0.0f64..500.0,
        ) {
            let config = PricingConfig {
                pricing_strategy: PricingStrategy::PointToPoint,
                min_fare_cents: min_fare,
                base_fee_cents: base,
                per_mile_cents: per_mile,
                ..Default::default()
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = compute_fare(&config, &TripMeasurements::distance(lo));
            let high = compute_fare(&config, &TripMeasurements::distance(hi));
            prop_assert!(low.total <= high.total);
            prop_assert!(high.total.cents() >= min_fare);
        }

        #[test]
        fn prop_fare_monotonic_in_hours(
            per_hour in 0i64..20_000,
            min_fare in 0i64..50_000,
            a in 0.0f64..24.0,
            b in 0.0f64..24.0,
        ) {
            let config = PricingConfig {
                pricing_strategy: PricingStrategy::Hourly,
                min_fare_cents: min_fare,
                per_hour_cents: per_hour,
                ..Default::default()
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = compute_fare(&config, &TripMeasurements::hours(lo));
            let high = compute_fare(&config, &TripMeasurements::hours(hi));
            prop_assert!(low.total <= high.total);
        }

        #[test]
        fn prop_fare_is_deterministic(miles in 0.0f64..1_000.0, per_mile in 0i64..2_000) {
            let config = PricingConfig {
                pricing_strategy: PricingStrategy::PointToPoint,
                per_mile_cents: per_mile,
                ..Default::default()
            };
            let m = TripMeasurements::distance(miles);
            prop_assert_eq!(compute_fare(&config, &m), compute_fare(&config, &m));
        }
    }
}
