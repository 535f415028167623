//! # wayline-core: Pure Business Logic for Wayline
//!
//! This crate is the **heart** of Wayline. It contains the booking lifecycle,
//! the fare engine and the revenue aggregator as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Wayline Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Admin / Customer / Driver surfaces (not here)          │   │
//! │  │    Booking intake ─► Review ─► Checkout ─► Driver app           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ service calls, payment webhooks        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  wayline-dispatch (service layer)               │   │
//! │  │    BookingService, PaymentWebhookHandler, RevenueReports        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ wayline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ lifecycle │  │   fare    │  │  revenue  │  │ calendar  │  │   │
//! │  │   │  guards   │  │  engine   │  │  buckets  │  │ civil day │  │   │
//! │  │   │  events   │  │  lines    │  │  MoM %    │  │ civil mo. │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK READS • NO LOGGING • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, Payment, PricingConfig, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`fare`] - Fare Computation Engine
//! - [`lifecycle`] - Booking Lifecycle Controller
//! - [`calendar`] - Civil day/month windows for a fixed UTC offset
//! - [`revenue`] - Revenue and driver earnings aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the current time is always a parameter
//! 2. **No I/O**: persistence, notifications and logging live in wayline-dispatch
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: a refused transition is a typed error and leaves the booking untouched
//!
//! ## Example Usage
//!
//! ```rust
//! use wayline_core::fare::compute_fare;
//! use wayline_core::types::{PricingConfig, TripMeasurements};
//!
//! let config = PricingConfig {
//!     base_fee_cents: 5500,
//!     per_mile_cents: 275,
//!     ..Default::default()
//! };
//! let fare = compute_fare(&config, &TripMeasurements::distance(30.0));
//!
//! // $55.00 + 30 mi × $2.75
//! assert_eq!(fare.total.cents(), 13750);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod fare;
pub mod lifecycle;
pub mod money;
pub mod revenue;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use wayline_core::Money` instead of
// `use wayline_core::money::Money`

pub use calendar::{CivilOffset, Granularity, Window, MAX_WINDOWS};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fare::{compute_fare, FareBreakdown, FareLine, FareLineKind, LockedPrice};
pub use lifecycle::{EventPayload, LifecycleEvent, SmsNotice};
pub use money::Money;
pub use revenue::{
    DashboardSummary, EarningsBucket, EarningsRecord, PaymentRecord, RevenueAggregator,
    RevenueBucket, WindowSpec,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default currency for bookings and payments.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Default number of trailing months on the revenue dashboard.
pub const DEFAULT_TRAILING_MONTHS: u32 = 12;
