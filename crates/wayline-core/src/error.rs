//! # Error Types
//!
//! Domain-specific error types for wayline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  wayline-core errors (this file)                                       │
//! │  ├── CoreError        - Lifecycle / pricing / lookup failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  wayline-dispatch errors (separate crate)                              │
//! │  └── DispatchError    - Config, outbox and I/O failures                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DispatchError → Caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (booking ID, status, operation)
//! 3. Errors are enum variants, never String
//! 4. The core returns errors; it never logs or retries them

use thiserror::Error;

use crate::types::BookingStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A lifecycle operation was attempted from a status that does not permit it.
    ///
    /// ## When This Occurs
    /// - Approving a booking that is still a draft
    /// - A duplicated/out-of-order webhook trying to refund an unpaid booking
    /// - A driver app skipping from `assigned` straight to `arrived`
    ///
    /// ## Recovery
    /// Always recoverable: the caller re-reads the current status and decides again.
    /// The booking is left untouched.
    #[error("Booking {booking_id} is {from}, cannot {operation}")]
    InvalidTransition {
        booking_id: String,
        from: BookingStatus,
        operation: &'static str,
    },

    /// Fare computation or approval produced a non-positive or malformed total.
    ///
    /// Never coerced into a valid price.
    #[error("Invalid fare: {reason}")]
    InvalidFare { reason: String },

    /// A referenced booking or pricing config does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a booking lookup miss.
    pub fn booking_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Booking",
            id: id.into(),
        }
    }

    /// True for errors a webhook handler should log and drop.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, CoreError::InvalidTransition { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when configuration or caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate service type id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
