//! # Booking Service
//!
//! Async entry points for every lifecycle operation, addressed by booking id.
//!
//! ## Call Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  admin / driver app / webhook                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  BookingService::approve("bk-1")                                        │
//! │        │                                                                │
//! │        ├─► BookingStore::update  (per-booking lock, copy, commit)       │
//! │        │      └─► PricingCatalog::quote ─► Booking::approve_and_price   │
//! │        │                                                                │
//! │        ├─► info!(booking_id, from, to)                                  │
//! │        │                                                                │
//! │        └─► EventOutbox::publish(event)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The event is published only after the change has been committed. If the
//! outbox is gone the transition still stands; the failure is logged.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};
use wayline_core::validation::validate_new_booking;
use wayline_core::{
    Actor, Assignment, Booking, BookingStatus, LifecycleEvent, Money, NewBooking,
};

use crate::catalog::{PricingCatalog, Quote};
use crate::error::DispatchResult;
use crate::outbox::EventOutbox;
use crate::store::{BookingStore, StoredBooking};

/// Lifecycle operations over the booking store.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<BookingStore>,
    catalog: Arc<PricingCatalog>,
    outbox: EventOutbox,
}

impl BookingService {
    pub fn new(store: Arc<BookingStore>, catalog: Arc<PricingCatalog>, outbox: EventOutbox) -> Self {
        BookingService {
            store,
            catalog,
            outbox,
        }
    }

    pub fn store(&self) -> &Arc<BookingStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<PricingCatalog> {
        &self.catalog
    }

    // =========================================================================
    // Intake & Lookup
    // =========================================================================

    /// Validates and stores a booking from the intake collaborator.
    pub async fn create(&self, new: NewBooking, skip_draft: bool) -> DispatchResult<Booking> {
        validate_new_booking(&new)?;
        let booking = Booking::from_intake(new, skip_draft);
        self.store.insert(booking.clone()).await?;
        info!(booking_id = %booking.id, status = %booking.status, "Booking created");
        Ok(booking)
    }

    pub async fn get(&self, id: &str) -> DispatchResult<StoredBooking> {
        Ok(self.store.get(id).await?)
    }

    /// Prices a stored booking without changing it.
    pub async fn quote(&self, id: &str) -> DispatchResult<Quote> {
        let booking = self.store.get(id).await?.booking;
        Ok(self.catalog.quote(
            &booking.service_type_id,
            &booking.vehicle_category_id,
            &booking.measurements(),
        )?)
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    pub async fn submit_for_review(&self, id: &str) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, |b| b.submit_for_review(at)).await
    }

    /// Prices the booking from the catalog and fee schedule and locks it.
    pub async fn approve(&self, id: &str) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        let catalog = Arc::clone(&self.catalog);
        self.transition(id, move |b| {
            let quote = catalog.quote(
                &b.service_type_id,
                &b.vehicle_category_id,
                &b.measurements(),
            )?;
            debug!(booking_id = %b.id, breakdown = %quote.fare.breakdown, "Locking fare");
            b.approve_and_price(&quote.price, at)
        })
        .await
    }

    pub async fn decline(&self, id: &str, reason: &str) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, |b| b.decline(reason, at)).await
    }

    /// Returns `None` when the capture was already recorded.
    pub async fn record_payment_captured(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> DispatchResult<Option<LifecycleEvent>> {
        let (event, version) = self
            .store
            .update(id, |b| b.record_payment_captured(at))
            .await?;
        match event {
            Some(event) => {
                self.log_transition(&event, version);
                self.publish(event.clone()).await;
                Ok(Some(event))
            }
            None => {
                debug!(booking_id = %id, "Payment capture already recorded");
                Ok(None)
            }
        }
    }

    pub async fn assign_driver(
        &self,
        id: &str,
        assignment: Assignment,
    ) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, move |b| b.assign_driver(assignment, at)).await
    }

    pub async fn driver_advance(
        &self,
        id: &str,
        next: BookingStatus,
    ) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, |b| b.driver_advance(next, at)).await
    }

    pub async fn mark_no_show(&self, id: &str) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, |b| b.mark_no_show(at)).await
    }

    pub async fn cancel(&self, id: &str, actor: Actor) -> DispatchResult<LifecycleEvent> {
        let at = Utc::now();
        self.transition(id, |b| b.cancel(actor, at)).await
    }

    pub async fn apply_refund(
        &self,
        id: &str,
        refunded: Money,
        total_paid: Money,
        at: DateTime<Utc>,
    ) -> DispatchResult<LifecycleEvent> {
        self.transition(id, |b| b.apply_refund(refunded, total_paid, at))
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn transition<F>(&self, id: &str, op: F) -> DispatchResult<LifecycleEvent>
    where
        F: FnOnce(&mut Booking) -> wayline_core::CoreResult<LifecycleEvent>,
    {
        let (event, version) = self.store.update(id, op).await?;
        self.log_transition(&event, version);
        self.publish(event.clone()).await;
        Ok(event)
    }

    fn log_transition(&self, event: &LifecycleEvent, version: u64) {
        info!(
            booking_id = %event.booking_id,
            from = %event.from_status,
            to = %event.to_status,
            version,
            "Booking transitioned"
        );
    }

    async fn publish(&self, event: LifecycleEvent) {
        let booking_id = event.booking_id.clone();
        if let Err(e) = self.outbox.publish(event).await {
            error!(?e, booking_id = %booking_id, "Failed to publish lifecycle event");
        }
    }
}
