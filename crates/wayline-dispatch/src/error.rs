//! # Dispatch Error Types
//!
//! Error types for the service layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Dispatch Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │  Configuration  │  │     Delivery            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  InvalidConfig  │  │  ChannelClosed          │ │
//! │  │  InvalidTrans.  │  │  ConfigLoad     │  │  NotificationFailed     │ │
//! │  │  NotFound       │  │  ConfigSave     │  │  Serialization          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use wayline_core::{CoreError, ValidationError};

/// Result type alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Service-layer error type.
#[derive(Debug, Error)]
pub enum DispatchError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// A core lifecycle, fare or lookup error.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration failed validation.
    #[error("Invalid dispatch configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse a config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write a config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    /// JSON (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The event outbox is no longer accepting events.
    #[error("Event outbox is closed")]
    ChannelClosed,

    /// A notifier rejected an event.
    #[error("Notification failed: {0}")]
    NotificationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        DispatchError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for DispatchError {
    fn from(err: toml::de::Error) -> Self {
        DispatchError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for DispatchError {
    fn from(err: toml::ser::Error) -> Self {
        DispatchError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl DispatchError {
    /// True when a lifecycle guard refused the operation.
    ///
    /// Webhook handlers drop these; everyone else surfaces them.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DispatchError::Core(e) if e.is_invalid_transition())
    }

    /// True when the booking or catalog entry does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::Core(CoreError::NotFound { .. }))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidConfig(_)
                | DispatchError::ConfigLoadFailed(_)
                | DispatchError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_core::BookingStatus;

    #[test]
    fn test_categorization() {
        let err: DispatchError = CoreError::InvalidTransition {
            booking_id: "bk-1".to_string(),
            from: BookingStatus::Draft,
            operation: "apply refund",
        }
        .into();
        assert!(err.is_invalid_transition());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Booking bk-1 is draft, cannot apply refund");

        let err: DispatchError = CoreError::booking_not_found("bk-2").into();
        assert!(err.is_not_found());

        assert!(DispatchError::InvalidConfig("x".into()).is_config_error());
        assert!(!DispatchError::ChannelClosed.is_config_error());
    }

    #[test]
    fn test_validation_converts_through_core() {
        let err: DispatchError = ValidationError::Required {
            field: "reason".to_string(),
        }
        .into();
        assert!(matches!(err, DispatchError::Core(CoreError::Validation(_))));
    }
}
