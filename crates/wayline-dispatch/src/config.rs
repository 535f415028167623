//! # Dispatch Configuration
//!
//! Business settings, fee schedule and pricing catalog for the service layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     WAYLINE_UTC_OFFSET_MINUTES=-420                                    │
//! │     WAYLINE_TAX_RATE_BPS=860                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/wayline/dispatch.toml (Linux)                            │
//! │     ~/Library/Application Support/com.wayline.dispatch/dispatch.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Phoenix offset (UTC-7), USD, no fees, empty catalog                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # dispatch.toml
//! [business]
//! name = "Desert Sky Transportation"
//! utc_offset_minutes = -420
//! currency = "USD"
//!
//! [fees]
//! booking_fee_cents = 500
//! tax_rate_bps = 860
//!
//! [[service_types]]
//! id = "airport_transfer"
//! name = "Airport Transfer"
//! pricing_strategy = "point_to_point"
//! base_fee_cents = 4000
//! per_mile_cents = 225
//! min_fare_cents = 5500
//!
//! [[vehicles]]
//! id = "suv"
//! name = "Executive SUV"
//! base_fee_cents = 1500
//! per_mile_cents = 50
//!
//! [outbox]
//! capacity = 256
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use wayline_core::validation::{
    validate_currency, validate_non_negative_cents, validate_pricing_config,
    validate_tax_rate_bps, validate_unique_ids, validate_utc_offset_minutes,
};
use wayline_core::{CivilOffset, Money, PricingConfig, TaxRate, DEFAULT_CURRENCY};

use crate::error::{DispatchError, DispatchResult};

// =============================================================================
// Business Settings
// =============================================================================

/// Who the operator is and which civil calendar its books follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    /// Display name on reports.
    #[serde(default = "default_business_name")]
    pub name: String,

    /// Fixed offset for civil day/month boundaries, minutes east of UTC.
    /// Default: -420 (Phoenix, no DST)
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,

    /// Currency for all bookings.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_business_name() -> String {
    "Wayline".to_string()
}

fn default_utc_offset() -> i32 {
    CivilOffset::PHOENIX.minutes()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Default for BusinessConfig {
    fn default() -> Self {
        BusinessConfig {
            name: default_business_name(),
            utc_offset_minutes: default_utc_offset(),
            currency: default_currency(),
        }
    }
}

// =============================================================================
// Fee Schedule
// =============================================================================

/// Charges added on top of the fare engine's subtotal when a price is locked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat booking fee per trip.
    #[serde(default)]
    pub booking_fee_cents: i64,

    /// Tax on subtotal + fees, in basis points.
    #[serde(default)]
    pub tax_rate_bps: u32,
}

impl FeeSchedule {
    pub fn booking_fee(&self) -> Money {
        Money::non_negative(self.booking_fee_cents)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Catalog Entries
// =============================================================================

/// A service type or vehicle category with its pricing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub pricing: PricingConfig,
}

// =============================================================================
// Outbox Settings
// =============================================================================

/// Lifecycle event channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxSettings {
    /// Events buffered before publishers wait on the notifier.
    #[serde(default = "default_outbox_capacity")]
    pub capacity: usize,
}

fn default_outbox_capacity() -> usize {
    256
}

impl Default for OutboxSettings {
    fn default() -> Self {
        OutboxSettings {
            capacity: default_outbox_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete service-layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub business: BusinessConfig,

    #[serde(default)]
    pub fees: FeeSchedule,

    #[serde(default)]
    pub service_types: Vec<CatalogEntry>,

    #[serde(default)]
    pub vehicles: Vec<CatalogEntry>,

    #[serde(default)]
    pub outbox: OutboxSettings,
}

impl DispatchConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (dispatch.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DispatchResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading dispatch config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load dispatch config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document without applying overrides.
    pub fn from_toml(contents: &str) -> DispatchResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> DispatchResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| DispatchError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DispatchError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| DispatchError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Dispatch config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DispatchResult<()> {
        validate_utc_offset_minutes(self.business.utc_offset_minutes).map_err(invalid)?;
        validate_currency(&self.business.currency).map_err(invalid)?;
        validate_tax_rate_bps(self.fees.tax_rate_bps).map_err(invalid)?;
        validate_non_negative_cents("booking_fee_cents", self.fees.booking_fee_cents)
            .map_err(invalid)?;

        validate_unique_ids(
            "service_types.id",
            self.service_types.iter().map(|e| e.id.as_str()),
        )
        .map_err(invalid)?;
        validate_unique_ids("vehicles.id", self.vehicles.iter().map(|e| e.id.as_str()))
            .map_err(invalid)?;

        for entry in self.service_types.iter().chain(&self.vehicles) {
            validate_pricing_config(&entry.pricing)
                .map_err(|e| DispatchError::InvalidConfig(format!("{}: {}", entry.id, e)))?;
        }

        if self.outbox.capacity == 0 {
            return Err(DispatchError::InvalidConfig(
                "outbox.capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup; unparsable values are skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("WAYLINE_UTC_OFFSET_MINUTES") {
            match value.parse::<i32>() {
                Ok(minutes) => {
                    debug!(minutes, "Overriding UTC offset from environment");
                    self.business.utc_offset_minutes = minutes;
                }
                Err(_) => warn!(value = %value, "Ignoring unparsable WAYLINE_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(currency) = lookup("WAYLINE_CURRENCY") {
            self.business.currency = currency;
        }

        if let Some(value) = lookup("WAYLINE_TAX_RATE_BPS") {
            match value.parse::<u32>() {
                Ok(bps) => {
                    debug!(bps, "Overriding tax rate from environment");
                    self.fees.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %value, "Ignoring unparsable WAYLINE_TAX_RATE_BPS"),
            }
        }

        if let Some(value) = lookup("WAYLINE_BOOKING_FEE_CENTS") {
            match value.parse::<i64>() {
                Ok(cents) => self.fees.booking_fee_cents = cents,
                Err(_) => warn!(value = %value, "Ignoring unparsable WAYLINE_BOOKING_FEE_CENTS"),
            }
        }

        if let Some(value) = lookup("WAYLINE_OUTBOX_CAPACITY") {
            match value.parse::<usize>() {
                Ok(capacity) => self.outbox.capacity = capacity,
                Err(_) => warn!(value = %value, "Ignoring unparsable WAYLINE_OUTBOX_CAPACITY"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "wayline", "dispatch")
            .map(|dirs| dirs.config_dir().join("dispatch.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The business civil offset.
    ///
    /// Falls back to Phoenix for an out-of-range value; `validate` rejects those.
    pub fn offset(&self) -> CivilOffset {
        CivilOffset::from_minutes(self.business.utc_offset_minutes).unwrap_or_default()
    }

    pub fn currency(&self) -> &str {
        &self.business.currency
    }
}

fn invalid(err: wayline_core::ValidationError) -> DispatchError {
    DispatchError::InvalidConfig(err.to_string())
}
