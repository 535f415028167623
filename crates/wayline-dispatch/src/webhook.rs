//! # Payment Webhooks
//!
//! Turns payment-provider callbacks into lifecycle operations.
//!
//! ## Event Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  provider event          lifecycle call                outcome         │
//! │  ──────────────────────  ───────────────────────────   ─────────────── │
//! │  checkout_completed  ──► record_payment_captured   ──► Applied         │
//! │                                                    ──► Duplicate (noop)│
//! │  refund_updated      ──► apply_refund              ──► Applied         │
//! │                                                                         │
//! │  InvalidTransition from either call ──► warn! + Ignored                │
//! │  NotFound / validation              ──► returned to the caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Providers retry and reorder deliveries, so a refused transition is an
//! expected outcome here rather than a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use wayline_core::{LifecycleEvent, Money};

use crate::error::DispatchResult;
use crate::service::BookingService;

/// A payment-provider callback, already authenticated by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    CheckoutCompleted {
        booking_id: String,
        paid_at: DateTime<Utc>,
    },
    RefundUpdated {
        booking_id: String,
        amount_refunded_cents: i64,
        amount_paid_cents: i64,
        updated_at: DateTime<Utc>,
    },
}

impl ProviderEvent {
    pub fn booking_id(&self) -> &str {
        match self {
            ProviderEvent::CheckoutCompleted { booking_id, .. }
            | ProviderEvent::RefundUpdated { booking_id, .. } => booking_id,
        }
    }
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// A lifecycle event was committed.
    Applied(LifecycleEvent),
    /// Already recorded; nothing changed.
    Duplicate,
    /// The booking's status does not accept this event.
    Ignored { reason: String },
}

/// Applies provider callbacks to bookings.
#[derive(Clone)]
pub struct PaymentWebhookHandler {
    service: Arc<BookingService>,
}

impl PaymentWebhookHandler {
    pub fn new(service: Arc<BookingService>) -> Self {
        PaymentWebhookHandler { service }
    }

    /// Parses and handles a JSON body.
    pub async fn handle_json(&self, body: &str) -> DispatchResult<WebhookOutcome> {
        let event: ProviderEvent = serde_json::from_str(body)?;
        self.handle(event).await
    }

    pub async fn handle(&self, event: ProviderEvent) -> DispatchResult<WebhookOutcome> {
        debug!(booking_id = %event.booking_id(), ?event, "Payment webhook received");

        let result = match &event {
            ProviderEvent::CheckoutCompleted {
                booking_id,
                paid_at,
            } => self
                .service
                .record_payment_captured(booking_id, *paid_at)
                .await
                .map(|applied| applied.map_or(WebhookOutcome::Duplicate, WebhookOutcome::Applied)),
            ProviderEvent::RefundUpdated {
                booking_id,
                amount_refunded_cents,
                amount_paid_cents,
                updated_at,
            } => self
                .service
                .apply_refund(
                    booking_id,
                    Money::from_cents(*amount_refunded_cents),
                    Money::from_cents(*amount_paid_cents),
                    *updated_at,
                )
                .await
                .map(WebhookOutcome::Applied),
        };

        match result {
            Err(e) if e.is_invalid_transition() => {
                warn!(
                    booking_id = %event.booking_id(),
                    error = %e,
                    "Ignoring payment webhook for booking in incompatible status"
                );
                Ok(WebhookOutcome::Ignored {
                    reason: e.to_string(),
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PricingCatalog;
    use crate::config::{CatalogEntry, FeeSchedule};
    use crate::outbox::{LogNotifier, OutboxProcessor};
    use crate::store::BookingStore;
    use chrono::TimeZone;
    use wayline_core::{
        Actor, Booking, BookingStatus, NewBooking, PricingConfig, PricingStrategy,
    };

    const ID: &str = "6f1c2a8e-3b4d-4e5f-8a9b-0c1d2e3f4a5b";

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, h, 0, 0).unwrap()
    }

    async fn handler_with_pending_payment() -> (PaymentWebhookHandler, Arc<BookingService>) {
        let catalog = PricingCatalog::new(
            [CatalogEntry {
                id: "flat_city".to_string(),
                name: "City Flat".to_string(),
                pricing: PricingConfig {
                    pricing_strategy: PricingStrategy::Flat,
                    base_fee_cents: 8000,
                    ..Default::default()
                },
            }],
            [CatalogEntry {
                id: "sedan".to_string(),
                name: "Sedan".to_string(),
                pricing: PricingConfig::default(),
            }],
            FeeSchedule::default(),
        );
        let (processor, outbox) = OutboxProcessor::new(32, Arc::new(LogNotifier));
        tokio::spawn(processor.run());

        let service = Arc::new(BookingService::new(
            Arc::new(BookingStore::new()),
            Arc::new(catalog),
            outbox,
        ));
        service
            .create(
                NewBooking {
                    id: ID.to_string(),
                    pickup_at: at(18),
                    pickup_address: "Tempe Marketplace".to_string(),
                    dropoff_address: None,
                    distance_miles: None,
                    duration_minutes: None,
                    hours_requested: None,
                    service_type_id: "flat_city".to_string(),
                    vehicle_category_id: "sedan".to_string(),
                    currency: "USD".to_string(),
                },
                true,
            )
            .await
            .unwrap();
        service.approve(ID).await.unwrap();
        (PaymentWebhookHandler::new(Arc::clone(&service)), service)
    }

    async fn current(service: &BookingService) -> Booking {
        service.get(ID).await.unwrap().booking
    }

    #[tokio::test]
    async fn test_checkout_applied_then_duplicate() {
        let (handler, service) = handler_with_pending_payment().await;
        let body = format!(
            r#"{{"type":"checkout_completed","booking_id":"{}","paid_at":"2026-05-01T19:00:00Z"}}"#,
            ID
        );

        let first = handler.handle_json(&body).await.unwrap();
        assert!(matches!(first, WebhookOutcome::Applied(ref e) if e.to_status == BookingStatus::Confirmed));

        let version = service.get(ID).await.unwrap().version;
        let second = handler.handle_json(&body).await.unwrap();
        assert_eq!(second, WebhookOutcome::Duplicate);
        assert_eq!(service.get(ID).await.unwrap().version, version);

        let booking = current(&service).await;
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_captured_at, Some(at(19)));
    }

    #[tokio::test]
    async fn test_refund_before_capture_is_ignored() {
        let (handler, service) = handler_with_pending_payment().await;
        let outcome = handler
            .handle(ProviderEvent::RefundUpdated {
                booking_id: ID.to_string(),
                amount_refunded_cents: 8000,
                amount_paid_cents: 8000,
                updated_at: at(20),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));
        assert_eq!(current(&service).await.status, BookingStatus::PendingPayment);
    }

    #[tokio::test]
    async fn test_partial_refund_after_cancellation() {
        let (handler, service) = handler_with_pending_payment().await;
        handler
            .handle(ProviderEvent::CheckoutCompleted {
                booking_id: ID.to_string(),
                paid_at: at(19),
            })
            .await
            .unwrap();
        service.cancel(ID, Actor::Customer).await.unwrap();

        let outcome = handler
            .handle(ProviderEvent::RefundUpdated {
                booking_id: ID.to_string(),
                amount_refunded_cents: 4000,
                amount_paid_cents: 8000,
                updated_at: at(21),
            })
            .await
            .unwrap();
        assert!(
            matches!(outcome, WebhookOutcome::Applied(ref e) if e.to_status == BookingStatus::PartiallyRefunded)
        );

        // a replay of the same refund hits a terminal status
        let replay = handler
            .handle(ProviderEvent::RefundUpdated {
                booking_id: ID.to_string(),
                amount_refunded_cents: 4000,
                amount_paid_cents: 8000,
                updated_at: at(21),
            })
            .await
            .unwrap();
        assert!(matches!(replay, WebhookOutcome::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_unknown_booking_is_an_error() {
        let (handler, _service) = handler_with_pending_payment().await;
        let err = handler
            .handle(ProviderEvent::CheckoutCompleted {
                booking_id: "missing".to_string(),
                paid_at: at(19),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (handler, _service) = handler_with_pending_payment().await;
        assert!(handler.handle_json("{\"type\":\"mystery\"}").await.is_err());
    }
}
