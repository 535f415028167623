//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A re-quote of the same trip must produce the same cents, forever.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Only trip measurements (miles, hours) are fractional. Every charge  │
//! │    is rounded to a whole cent the moment it is produced and all sums   │
//! │    after that are integer sums.                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use wayline_core::money::Money;
//!
//! let per_mile = Money::from_cents(275);     // $2.75 / mile
//! let distance = per_mile.times_quantity(30.0); // $82.50
//! assert_eq!(distance.cents(), 8250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Intermediate differences (captured − refunded) may dip
///   below zero before being clamped for display
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PricingConfig rates ──► FareBreakdown lines ──► LockedPrice.total     │
/// │                                                        │                │
/// │                                                        ▼                │
/// │  Payment.amount_total ──► RevenueBucket.captured / refunded / net      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::money::Money;
    ///
    /// let fare = Money::from_cents(13750); // Represents $137.50
    /// assert_eq!(fare.cents(), 13750);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates Money from cents, treating negative input as zero.
    ///
    /// Rates and payment amounts arriving from admin forms or provider
    /// payloads pass through here before any arithmetic.
    #[inline]
    pub const fn non_negative(cents: i64) -> Self {
        if cents < 0 {
            Money(0)
        } else {
            Money(cents)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns this value, or zero if it is negative.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::money::Money;
    ///
    /// let net = Money::from_cents(5000) - Money::from_cents(8000);
    /// assert_eq!(net.clamp_non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        Money::non_negative(self.0)
    }

    /// Multiplies a per-unit rate by a fractional quantity, rounded to the
    /// nearest cent (half away from zero).
    ///
    /// Negative, NaN or infinite quantities count as zero.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::money::Money;
    ///
    /// let per_hour = Money::from_cents(9500);
    /// assert_eq!(per_hour.times_quantity(2.5).cents(), 23750);
    /// assert_eq!(per_hour.times_quantity(-3.0).cents(), 0);
    /// ```
    pub fn times_quantity(&self, quantity: f64) -> Money {
        let quantity = if quantity.is_finite() && quantity > 0.0 {
            quantity
        } else {
            0.0
        };
        // `as` saturates at i64 bounds for absurd inputs
        Money((self.0 as f64 * quantity).round() as i64)
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// We use integer math: `(amount * rate + 5000) / 10000`
    /// The +5000 rounds the half-cent up.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::money::Money;
    /// use wayline_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(1000); // $10.00
    /// let rate = TaxRate::from_bps(825);      // 8.25%
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// Used for fare breakdown strings. The dashboard does its own localized
/// formatting from the raw cents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// Arithmetic saturates at the i64 bounds instead of overflowing.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
