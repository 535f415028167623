//! # Domain Types
//!
//! Core domain types used throughout Wayline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Booking      │   │   Assignment    │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  driver_id      │   │  booking_id     │       │
//! │  │  status         │   │  vehicle_unit_id│   │  status         │       │
//! │  │  measurements   │   │  driver_payment │   │  amount_total   │       │
//! │  │  price fields   │   └─────────────────┘   │  paid_at        │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PricingConfig   │   │ BookingStatus   │   │ PaymentStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  strategy       │   │  14 variants    │   │  none..refunded │       │
//! │  │  rates (cents)  │   │  6 terminal     │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bookings are created by the intake collaborator; only the lifecycle
//! controller touches `status` and the locked price fields afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 860 bps = 8.6% (Phoenix transaction privilege tax, for example)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// The lifecycle status of a booking.
///
/// ## Lifecycle
/// ```text
/// DRAFT ─► PENDING_REVIEW ─► PENDING_PAYMENT ─► CONFIRMED ─► ASSIGNED
///                │                  │                           │
///                ▼                  └────── (assign early) ─────┤
///            DECLINED                                           ▼
///                          EN_ROUTE ─► ARRIVED ─► IN_PROGRESS ─► COMPLETED
///                                         │                         │
///                                         ▼                         ▼
///                                      NO_SHOW          REFUNDED / PARTIALLY_REFUNDED
///
/// Any non-terminal status ─► CANCELLED ─► REFUNDED / PARTIALLY_REFUNDED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Customer is still filling in trip details.
    #[default]
    Draft,
    /// Waiting for an admin to approve and price the trip.
    PendingReview,
    /// Priced; waiting for the customer to pay.
    PendingPayment,
    /// Payment captured.
    Confirmed,
    /// Driver and vehicle unit both assigned.
    Assigned,
    /// Driver is on the way to pickup.
    EnRoute,
    /// Driver is at the pickup address.
    Arrived,
    /// Passenger on board.
    InProgress,
    /// Trip finished.
    Completed,
    /// Cancelled by admin, customer or scheduler.
    Cancelled,
    /// Passenger never showed up.
    NoShow,
    /// Payment fully refunded.
    Refunded,
    /// Payment partly refunded.
    PartiallyRefunded,
    /// Admin refused the request.
    Declined,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [BookingStatus; 14] = [
        BookingStatus::Draft,
        BookingStatus::PendingReview,
        BookingStatus::PendingPayment,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::EnRoute,
        BookingStatus::Arrived,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
        BookingStatus::Refunded,
        BookingStatus::PartiallyRefunded,
        BookingStatus::Declined,
    ];

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::PendingReview => "pending_review",
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::EnRoute => "en_route",
            BookingStatus::Arrived => "arrived",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Refunded => "refunded",
            BookingStatus::PartiallyRefunded => "partially_refunded",
            BookingStatus::Declined => "declined",
        }
    }

    /// Returns true if no further lifecycle operation (other than a refund
    /// on completed/cancelled bookings) is defined from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed
                | BookingStatus::Cancelled
                | BookingStatus::NoShow
                | BookingStatus::Refunded
                | BookingStatus::PartiallyRefunded
                | BookingStatus::Declined
        )
    }

    /// The next status in the driver's trip progression, if any.
    pub fn driver_next(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Assigned => Some(BookingStatus::EnRoute),
            BookingStatus::EnRoute => Some(BookingStatus::Arrived),
            BookingStatus::Arrived => Some(BookingStatus::InProgress),
            BookingStatus::InProgress => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// The provider-reported status of a booking's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No checkout attempted yet.
    #[default]
    None,
    /// Checkout started, not yet captured.
    Pending,
    /// Funds captured.
    Paid,
    /// Provider declined or the session expired.
    Failed,
    /// Fully refunded.
    Refunded,
    /// Partly refunded.
    PartiallyRefunded,
}

impl PaymentStatus {
    /// True for the two refund statuses.
    pub fn is_refund(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::PartiallyRefunded)
    }
}

// =============================================================================
// Actor
// =============================================================================

/// Who requested a cancellation, recorded for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Admin,
    Customer,
    /// Background scheduler (e.g. abandoning an unpaid booking).
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Admin => write!(f, "admin"),
            Actor::Customer => write!(f, "customer"),
            Actor::System => write!(f, "system"),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// How a trip's distance/time turns into a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Base fee plus a per-mile charge.
    #[default]
    PointToPoint,
    /// Base fee plus a per-hour charge for the hours requested.
    Hourly,
    /// Base fee only.
    Flat,
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingStrategy::PointToPoint => write!(f, "point_to_point"),
            PricingStrategy::Hourly => write!(f, "hourly"),
            PricingStrategy::Flat => write!(f, "flat"),
        }
    }
}

/// Pricing fields embedded in a service type and in a vehicle category.
///
/// The rate used for a booking is the field-wise sum of both.
/// All monetary fields are integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingConfig {
    #[serde(default)]
    pub pricing_strategy: PricingStrategy,
    #[serde(default)]
    pub min_fare_cents: i64,
    #[serde(default)]
    pub base_fee_cents: i64,
    #[serde(default)]
    pub per_mile_cents: i64,
    #[serde(default)]
    pub per_minute_cents: i64,
    #[serde(default)]
    pub per_hour_cents: i64,
}

impl PricingConfig {
    /// Combines a service type's pricing with a vehicle category's.
    ///
    /// Each rate is summed; the strategy comes from the service type.
    /// Negative inputs are clamped before summing.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::types::{PricingConfig, PricingStrategy};
    ///
    /// let service = PricingConfig {
    ///     pricing_strategy: PricingStrategy::Hourly,
    ///     per_hour_cents: 8000,
    ///     ..Default::default()
    /// };
    /// let vehicle = PricingConfig { per_hour_cents: 1500, ..Default::default() };
    /// let combined = PricingConfig::combine(&service, &vehicle);
    /// assert_eq!(combined.per_hour_cents, 9500);
    /// assert_eq!(combined.pricing_strategy, PricingStrategy::Hourly);
    /// ```
    pub fn combine(service: &PricingConfig, vehicle: &PricingConfig) -> PricingConfig {
        let s = service.normalized();
        let v = vehicle.normalized();
        PricingConfig {
            pricing_strategy: s.pricing_strategy,
            min_fare_cents: s.min_fare_cents.saturating_add(v.min_fare_cents),
            base_fee_cents: s.base_fee_cents.saturating_add(v.base_fee_cents),
            per_mile_cents: s.per_mile_cents.saturating_add(v.per_mile_cents),
            per_minute_cents: s.per_minute_cents.saturating_add(v.per_minute_cents),
            per_hour_cents: s.per_hour_cents.saturating_add(v.per_hour_cents),
        }
    }

    /// Returns a copy with every rate clamped to ≥ 0.
    pub fn normalized(&self) -> PricingConfig {
        PricingConfig {
            pricing_strategy: self.pricing_strategy,
            min_fare_cents: self.min_fare_cents.max(0),
            base_fee_cents: self.base_fee_cents.max(0),
            per_mile_cents: self.per_mile_cents.max(0),
            per_minute_cents: self.per_minute_cents.max(0),
            per_hour_cents: self.per_hour_cents.max(0),
        }
    }

    #[inline]
    pub fn min_fare(&self) -> Money {
        Money::non_negative(self.min_fare_cents)
    }

    #[inline]
    pub fn base_fee(&self) -> Money {
        Money::non_negative(self.base_fee_cents)
    }

    #[inline]
    pub fn per_mile(&self) -> Money {
        Money::non_negative(self.per_mile_cents)
    }

    #[inline]
    pub fn per_hour(&self) -> Money {
        Money::non_negative(self.per_hour_cents)
    }
}

/// Trip measurements fed to the fare engine.
///
/// Routing data may not exist yet when a quote is requested, so every
/// field defaults to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripMeasurements {
    #[serde(default)]
    pub distance_miles: f64,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default)]
    pub hours_requested: f64,
}

impl TripMeasurements {
    /// Point-to-point measurements.
    pub fn distance(miles: f64) -> Self {
        TripMeasurements {
            distance_miles: miles,
            ..Default::default()
        }
    }

    /// Hourly (as-directed) measurements.
    pub fn hours(hours: f64) -> Self {
        TripMeasurements {
            hours_requested: hours,
            ..Default::default()
        }
    }

    /// Returns a copy with negative/NaN/infinite values replaced by zero.
    pub fn normalized(&self) -> TripMeasurements {
        fn clean(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                0.0
            }
        }
        TripMeasurements {
            distance_miles: clean(self.distance_miles),
            duration_minutes: clean(self.duration_minutes),
            hours_requested: clean(self.hours_requested),
        }
    }
}

// =============================================================================
// Assignment
// =============================================================================

/// Driver and vehicle unit assigned to a booking.
///
/// Either half may be missing while dispatch is still deciding; the booking
/// only moves to `assigned` once both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Assignment {
    pub driver_id: Option<String>,
    pub vehicle_unit_id: Option<String>,
    #[ts(as = "String")]
    pub assigned_at: DateTime<Utc>,
    /// What the driver is paid for this trip.
    pub driver_payment_cents: i64,
}

impl Assignment {
    /// True when both a driver and a vehicle unit are set.
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.driver_id) && present(&self.vehicle_unit_id)
    }
}

// =============================================================================
// Booking
// =============================================================================

/// Trip request as handed over by the intake collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub id: String,
    pub pickup_at: DateTime<Utc>,
    pub pickup_address: String,
    #[serde(default)]
    pub dropoff_address: Option<String>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub hours_requested: Option<f64>,
    pub service_type_id: String,
    pub vehicle_category_id: String,
    pub currency: String,
}

/// The central booking entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub pickup_at: DateTime<Utc>,
    pub pickup_address: String,
    pub dropoff_address: Option<String>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub hours_requested: Option<f64>,
    pub service_type_id: String,
    pub vehicle_category_id: String,
    pub subtotal_cents: i64,
    pub fees_cents: i64,
    pub taxes_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub assignment: Option<Assignment>,
    /// Reason given when an admin declined the request.
    pub decline_reason: Option<String>,
    /// Who cancelled the booking.
    pub cancelled_by: Option<Actor>,
    /// When the payment provider reported the capture.
    ///
    /// Tracked apart from `status` because a driver may be assigned before
    /// the customer pays.
    #[ts(as = "Option<String>")]
    pub payment_captured_at: Option<DateTime<Utc>>,
    /// When the status last changed.
    #[ts(as = "Option<String>")]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Creates a booking from an intake request.
    ///
    /// Intake flows that skip drafting start at `pending_review`.
    pub fn from_intake(new: NewBooking, skip_draft: bool) -> Self {
        Booking {
            id: new.id,
            status: if skip_draft {
                BookingStatus::PendingReview
            } else {
                BookingStatus::Draft
            },
            pickup_at: new.pickup_at,
            pickup_address: new.pickup_address,
            dropoff_address: new.dropoff_address,
            distance_miles: new.distance_miles,
            duration_minutes: new.duration_minutes,
            hours_requested: new.hours_requested,
            service_type_id: new.service_type_id,
            vehicle_category_id: new.vehicle_category_id,
            subtotal_cents: 0,
            fees_cents: 0,
            taxes_cents: 0,
            total_cents: 0,
            currency: new.currency,
            assignment: None,
            decline_reason: None,
            cancelled_by: None,
            payment_captured_at: None,
            status_changed_at: None,
        }
    }

    /// Trip measurements with missing values treated as zero.
    pub fn measurements(&self) -> TripMeasurements {
        TripMeasurements {
            distance_miles: self.distance_miles.unwrap_or(0.0),
            duration_minutes: self.duration_minutes.unwrap_or(0.0),
            hours_requested: self.hours_requested.unwrap_or(0.0),
        }
    }

    /// Returns the locked total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_captured_at.is_some()
    }

    /// The single status a driver may move this booking to next, if any.
    ///
    /// An unpaid `assigned` booking has no driver step until payment lands.
    pub fn allowed_driver_next(&self) -> Option<BookingStatus> {
        match self.status {
            BookingStatus::Assigned if !self.is_paid() => None,
            status => status.driver_next(),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Payment attached to a booking, as last reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub booking_id: String,
    pub status: PaymentStatus,
    pub amount_subtotal_cents: i64,
    pub amount_total_cents: i64,
    pub amount_paid_cents: i64,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    /// Last provider update; refunds are attributed to this instant.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub currency: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
