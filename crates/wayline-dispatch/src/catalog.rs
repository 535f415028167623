//! # Pricing Catalog
//!
//! Looks up service type and vehicle category pricing and turns a trip into a
//! quote. The fare engine itself lives in `wayline_core::fare`; this module
//! only resolves which [`PricingConfig`] applies and adds the fee schedule.
//!
//! ```text
//! service_type_id ──┐
//!                   ├─► PricingConfig::combine ─► compute_fare ─► LockedPrice::with_charges
//! vehicle_id ───────┘                                               (booking fee + tax)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wayline_core::{
    compute_fare, CoreError, CoreResult, FareBreakdown, LockedPrice, PricingConfig,
    TripMeasurements,
};

use crate::config::{CatalogEntry, DispatchConfig, FeeSchedule};

/// A priced trip before it is locked onto a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub service_type_id: String,
    pub vehicle_category_id: String,
    pub pricing: PricingConfig,
    pub fare: FareBreakdown,
    pub price: LockedPrice,
}

/// Read-only pricing lookup built from configuration.
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    service_types: HashMap<String, CatalogEntry>,
    vehicles: HashMap<String, CatalogEntry>,
    fees: FeeSchedule,
}

impl PricingCatalog {
    pub fn new(
        service_types: impl IntoIterator<Item = CatalogEntry>,
        vehicles: impl IntoIterator<Item = CatalogEntry>,
        fees: FeeSchedule,
    ) -> Self {
        PricingCatalog {
            service_types: service_types
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect(),
            vehicles: vehicles.into_iter().map(|e| (e.id.clone(), e)).collect(),
            fees,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        PricingCatalog::new(
            config.service_types.iter().cloned(),
            config.vehicles.iter().cloned(),
            config.fees,
        )
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    /// Combined pricing for a service type and vehicle category.
    ///
    /// ## Errors
    /// `NotFound` if either id is unknown.
    pub fn pricing_for(&self, service_type_id: &str, vehicle_id: &str) -> CoreResult<PricingConfig> {
        let service = self
            .service_types
            .get(service_type_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Service type",
                id: service_type_id.to_string(),
            })?;
        let vehicle = self
            .vehicles
            .get(vehicle_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Vehicle category",
                id: vehicle_id.to_string(),
            })?;
        Ok(PricingConfig::combine(&service.pricing, &vehicle.pricing))
    }

    /// Prices a trip with the booking fee and tax applied.
    ///
    /// A quote is a preview; a zero total is returned as-is and only rejected
    /// when the price is locked at approval.
    pub fn quote(
        &self,
        service_type_id: &str,
        vehicle_id: &str,
        measurements: &TripMeasurements,
    ) -> CoreResult<Quote> {
        let pricing = self.pricing_for(service_type_id, vehicle_id)?;
        let fare = compute_fare(&pricing, measurements);
        let price = LockedPrice::with_charges(&fare, self.fees.booking_fee(), self.fees.tax_rate());
        Ok(Quote {
            service_type_id: service_type_id.to_string(),
            vehicle_category_id: vehicle_id.to_string(),
            pricing,
            fare,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_core::PricingStrategy;

    fn entry(id: &str, pricing: PricingConfig) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: id.to_string(),
            pricing,
        }
    }

    fn catalog(fees: FeeSchedule) -> PricingCatalog {
        PricingCatalog::new(
            [
                entry(
                    "airport_transfer",
                    PricingConfig {
                        pricing_strategy: PricingStrategy::PointToPoint,
                        min_fare_cents: 5500,
                        base_fee_cents: 4000,
                        per_mile_cents: 225,
                        ..Default::default()
                    },
                ),
                entry(
                    "hourly_charter",
                    PricingConfig {
                        pricing_strategy: PricingStrategy::Hourly,
                        per_hour_cents: 9500,
                        ..Default::default()
                    },
                ),
            ],
            [entry(
                "suv",
                PricingConfig {
                    base_fee_cents: 1500,
                    per_mile_cents: 50,
                    per_hour_cents: 500,
                    ..Default::default()
                },
            )],
            fees,
        )
    }

    #[test]
    fn test_quote_combines_service_and_vehicle() {
        let quote = catalog(FeeSchedule::default())
            .quote("airport_transfer", "suv", &TripMeasurements::distance(30.0))
            .unwrap();
        assert_eq!(quote.pricing.base_fee_cents, 5500);
        assert_eq!(quote.pricing.per_mile_cents, 275);
        assert_eq!(quote.fare.total.cents(), 13750);
        assert_eq!(quote.price.total.cents(), 13750);
    }

    #[test]
    fn test_quote_applies_fee_schedule() {
        let fees = FeeSchedule {
            booking_fee_cents: 500,
            tax_rate_bps: 1000,
        };
        let quote = catalog(fees)
            .quote("hourly_charter", "suv", &TripMeasurements::hours(2.0))
            .unwrap();
        // 1500 base + 2h × $100.00
        assert_eq!(quote.fare.total.cents(), 21500);
        assert_eq!(quote.price.fees.cents(), 500);
        assert_eq!(quote.price.taxes.cents(), 2200);
        assert_eq!(quote.price.total.cents(), 24200);
    }

    #[test]
    fn test_unknown_ids_not_found() {
        let catalog = catalog(FeeSchedule::default());
        let err = catalog
            .quote("limo", "suv", &TripMeasurements::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Service type", .. }));

        let err = catalog
            .pricing_for("airport_transfer", "bus")
            .unwrap_err();
        assert_eq!(err.to_string(), "Vehicle category not found: bus");
    }
}
