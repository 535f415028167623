//! # wayline-dispatch: Service Layer for Wayline
//!
//! Wraps the pure `wayline-core` logic with the pieces a running system
//! needs: configuration, per-booking serialization, event delivery, payment
//! webhooks and dashboard reports.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dispatch Service Layer                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │             BookingService (lifecycle by booking id)             │  │
//! │  └──────┬──────────────────────┬─────────────────────────┬──────────┘  │
//! │         ▼                      ▼                         ▼             │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌────────────────────────┐│
//! │  │ BookingStore   │  │ PricingCatalog     │  │ EventOutbox            ││
//! │  │                │  │                    │  │                        ││
//! │  │ Mutex per      │  │ service type +     │  │ bounded mpsc ──►       ││
//! │  │ booking,       │  │ vehicle pricing,   │  │ OutboxProcessor ──►    ││
//! │  │ version count  │  │ fees, tax          │  │ Notifier               ││
//! │  └────────────────┘  └────────────────────┘  └────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────────┐│
//! │  │ PaymentWebhookHandler      │  │ RevenueReports                     ││
//! │  │ checkout / refund events,  │  │ dashboard summary, trailing        ││
//! │  │ tolerant of replays        │  │ months, driver earnings            ││
//! │  └────────────────────────────┘  └────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Dispatch error types
//! - [`catalog`] - Pricing lookup and quotes
//! - [`store`] - In-memory booking store
//! - [`outbox`] - Lifecycle event delivery
//! - [`service`] - Booking lifecycle service
//! - [`webhook`] - Payment provider callbacks
//! - [`reports`] - Revenue and earnings reports
//! - [`telemetry`] - Tracing subscriber setup

pub mod catalog;
pub mod config;
pub mod error;
pub mod outbox;
pub mod reports;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod webhook;

pub use catalog::{PricingCatalog, Quote};
pub use config::{CatalogEntry, DispatchConfig, FeeSchedule};
pub use error::{DispatchError, DispatchResult};
pub use outbox::{EventOutbox, LogNotifier, Notifier, OutboxProcessor, RecordingNotifier};
pub use reports::{RevenueReport, RevenueReports};
pub use service::BookingService;
pub use store::{BookingStore, StoredBooking};
pub use webhook::{PaymentWebhookHandler, ProviderEvent, WebhookOutcome};

use std::sync::Arc;

/// Wires a service and its outbox processor from configuration.
///
/// The caller spawns `processor.run()`.
pub fn build_service<N: Notifier>(
    config: &DispatchConfig,
    notifier: Arc<N>,
) -> (BookingService, OutboxProcessor<N>) {
    let (processor, outbox) = OutboxProcessor::new(config.outbox.capacity, notifier);
    let service = BookingService::new(
        Arc::new(BookingStore::new()),
        Arc::new(PricingCatalog::from_config(config)),
        outbox,
    );
    (service, processor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_service_from_default_config() {
        let config = DispatchConfig::default();
        let (service, mut processor) = build_service(&config, Arc::new(RecordingNotifier::new()));
        assert!(service.store().is_empty().await);
        assert_eq!(processor.process_pending(), 0);
        assert!(service.catalog().pricing_for("any", "any").is_err());
    }
}
