//! # Validation Module
//!
//! Input validation for pricing catalogs, business settings and booking intake.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Config load (wayline-dispatch)                               │
//! │  ├── TOML deserialization (types, defaults)                            │
//! │  └── THIS MODULE: offset, currency, tax, pricing rows                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service calls                                                │
//! │  ├── THIS MODULE: booking intake, ids                                  │
//! │  └── Lifecycle guards (lifecycle.rs)                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Fare engine                                                  │
//! │  └── Clamps whatever still slips through (never panics)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use wayline_core::validation::{validate_currency, validate_tax_rate_bps};
//!
//! validate_currency("USD").unwrap();
//! validate_tax_rate_bps(860).unwrap();
//! ```

use std::collections::HashSet;

use crate::calendar::MAX_OFFSET_MINUTES;
use crate::error::ValidationError;
use crate::types::{NewBooking, PricingConfig, PricingStrategy};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalog identifier (service type or vehicle category id).
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use wayline_core::validation::validate_catalog_id;
///
/// assert!(validate_catalog_id("airport_transfer").is_ok());
/// assert!(validate_catalog_id("").is_err());
/// assert!(validate_catalog_id("has space").is_err());
/// ```
pub fn validate_catalog_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must be at most 64 characters".to_string(),
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an ISO-4217 style currency code.
///
/// ## Rules
/// - Exactly three ASCII letters (case-insensitive)
///
/// ## Returns
/// The upper-cased code.
pub fn validate_currency(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three-letter code".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a business UTC offset in minutes.
///
/// ## Rules
/// - Within ±14 hours
pub fn validate_utc_offset_minutes(minutes: i32) -> ValidationResult<()> {
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(ValidationError::OutOfRange {
            field: "utc_offset_minutes".to_string(),
            min: -(MAX_OFFSET_MINUTES as i64),
            max: MAX_OFFSET_MINUTES as i64,
        });
    }

    Ok(())
}

/// Validates an amount in cents that may be zero but not negative.
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates one pricing row from the catalog.
///
/// ## Rules
/// - Every rate and fee is non-negative
/// - An hourly row needs a positive per-hour rate to ever charge time
///
/// ## Example
/// ```rust
/// use wayline_core::types::PricingConfig;
/// use wayline_core::validation::validate_pricing_config;
///
/// let ok = PricingConfig { base_fee_cents: 5500, per_mile_cents: 275, ..Default::default() };
/// assert!(validate_pricing_config(&ok).is_ok());
///
/// let bad = PricingConfig { per_mile_cents: -1, ..Default::default() };
/// assert!(validate_pricing_config(&bad).is_err());
/// ```
pub fn validate_pricing_config(config: &PricingConfig) -> ValidationResult<()> {
    validate_non_negative_cents("min_fare_cents", config.min_fare_cents)?;
    validate_non_negative_cents("base_fee_cents", config.base_fee_cents)?;
    validate_non_negative_cents("per_mile_cents", config.per_mile_cents)?;
    validate_non_negative_cents("per_minute_cents", config.per_minute_cents)?;
    validate_non_negative_cents("per_hour_cents", config.per_hour_cents)?;

    if config.pricing_strategy == PricingStrategy::Hourly && config.per_hour_cents == 0 {
        return Err(ValidationError::MustBePositive {
            field: "per_hour_cents".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional trip measurement (miles, minutes or hours).
///
/// Absent is fine; present must be finite and non-negative.
pub fn validate_measurement(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        }),
        Some(v) if v < 0.0 => Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Checks that every id is valid and appears once.
pub fn validate_unique_ids<'a>(
    field: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        validate_catalog_id(id)?;
        if !seen.insert(id.trim()) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: id.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Booking Intake
// =============================================================================

/// Validates a booking intake payload before it enters the store.
pub fn validate_new_booking(new: &NewBooking) -> ValidationResult<()> {
    validate_uuid(&new.id)?;

    if new.pickup_address.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "pickup_address".to_string(),
        });
    }

    validate_catalog_id(&new.service_type_id)?;
    validate_catalog_id(&new.vehicle_category_id)?;
    validate_currency(&new.currency)?;
    validate_measurement("distance_miles", new.distance_miles)?;
    validate_measurement("duration_minutes", new.duration_minutes)?;
    validate_measurement("hours_requested", new.hours_requested)?;

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use wayline_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
