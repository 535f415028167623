//! # Booking Lifecycle
//!
//! Guarded status transitions for a [`Booking`].
//!
//! Each operation checks the current status, applies the change, and
//! returns a [`LifecycleEvent`] for the notification collaborator. Nothing
//! here sends email/SMS, reads the clock, or persists anything: the caller
//! passes the instant of the change and owns the transaction around it.
//!
//! ## Transition Table
//! ```text
//! ┌───────────────────────────┬──────────────────────────────┬──────────────────────┐
//! │ Operation                 │ From                         │ To                   │
//! ├───────────────────────────┼──────────────────────────────┼──────────────────────┤
//! │ submit_for_review         │ draft                        │ pending_review       │
//! │ approve_and_price         │ pending_review               │ pending_payment      │
//! │ decline                   │ pending_review               │ declined             │
//! │ record_payment_captured   │ pending_payment              │ confirmed            │
//! │                           │ confirmed / already paid     │ (no-op)              │
//! │                           │ assigned..in_progress unpaid │ (unchanged, paid)    │
//! │ assign_driver             │ pending_payment, confirmed   │ assigned if complete │
//! │                           │ assigned                     │ assigned (reassign)  │
//! │ driver_advance            │ assigned → en_route → arrived → in_progress →     │
//! │                           │ completed, one step at a time                      │
//! │ mark_no_show              │ arrived                      │ no_show              │
//! │ cancel                    │ any non-terminal             │ cancelled            │
//! │ apply_refund              │ completed, cancelled (paid)  │ refunded / partially │
//! └───────────────────────────┴──────────────────────────────┴──────────────────────┘
//! ```
//!
//! A failed operation leaves the booking exactly as it was.
//!
//! ## Payment Gate
//! Assignment may happen before the customer pays, so payment capture is
//! tracked in `payment_captured_at` as well as through `confirmed`. The
//! driver cannot leave for pickup (`assigned → en_route`) until it is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::fare::LockedPrice;
use crate::money::Money;
use crate::types::{Actor, Assignment, Booking, BookingStatus};

// =============================================================================
// Lifecycle Event
// =============================================================================

/// Which customer SMS a driver step should trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SmsNotice {
    DriverEnRoute,
    DriverArrived,
}

/// What happened, with the data a notifier needs to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    SubmittedForReview,
    Approved { total: Money },
    Declined { reason: String },
    PaymentCaptured { total: Money },
    DriverAssigned {
        driver_id: Option<String>,
        vehicle_unit_id: Option<String>,
        reassigned: bool,
    },
    CustomerSms { notice: SmsNotice },
    TripStarted,
    TripCompleted,
    NoShow,
    Cancelled { actor: Actor },
    Refunded { refunded: Money, total_paid: Money },
}

/// A status change (or same-status update) to hand to notification collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LifecycleEvent {
    pub booking_id: String,
    pub from_status: BookingStatus,
    pub to_status: BookingStatus,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub payload: EventPayload,
}

impl LifecycleEvent {
    /// True if the event moved the booking to a different status.
    pub fn changed_status(&self) -> bool {
        self.from_status != self.to_status
    }
}

// =============================================================================
// Guarded Operations
// =============================================================================

impl Booking {
    /// `draft → pending_review`.
    pub fn submit_for_review(&mut self, at: DateTime<Utc>) -> CoreResult<LifecycleEvent> {
        self.require(&[BookingStatus::Draft], "submit for review")?;
        Ok(self.move_to(BookingStatus::PendingReview, at, EventPayload::SubmittedForReview))
    }

    /// `pending_review → pending_payment`, locking the price fields.
    ///
    /// ## Errors
    /// - `InvalidTransition` outside `pending_review`
    /// - `InvalidFare` if the total is not positive or does not add up
    pub fn approve_and_price(
        &mut self,
        price: &LockedPrice,
        at: DateTime<Utc>,
    ) -> CoreResult<LifecycleEvent> {
        self.require(&[BookingStatus::PendingReview], "approve and price")?;
        price.validate()?;

        self.subtotal_cents = price.subtotal.cents();
        self.fees_cents = price.fees.cents();
        self.taxes_cents = price.taxes.cents();
        self.total_cents = price.total.cents();

        Ok(self.move_to(
            BookingStatus::PendingPayment,
            at,
            EventPayload::Approved { total: price.total },
        ))
    }

    /// `pending_review → declined`; the reason goes to the customer.
    pub fn decline(&mut self, reason: &str, at: DateTime<Utc>) -> CoreResult<LifecycleEvent> {
        self.require(&[BookingStatus::PendingReview], "decline")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::Required {
                field: "decline reason".to_string(),
            }
            .into());
        }

        self.decline_reason = Some(reason.to_string());
        Ok(self.move_to(
            BookingStatus::Declined,
            at,
            EventPayload::Declined {
                reason: reason.to_string(),
            },
        ))
    }

    /// Records the provider's capture webhook.
    ///
    /// Idempotent: a retried webhook on an already-paid booking returns
    /// `Ok(None)` and emits nothing.
    ///
    /// ## Flow
    /// ```text
    /// pending_payment ──────────────► confirmed          (event)
    /// confirmed / paid anything ────► unchanged          (None)
    /// assigned..in_progress, unpaid ► unchanged, paid    (event)
    /// anything else ────────────────► InvalidTransition
    /// ```
    pub fn record_payment_captured(
        &mut self,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<LifecycleEvent>> {
        let payload = EventPayload::PaymentCaptured {
            total: self.total(),
        };
        match self.status {
            BookingStatus::PendingPayment => {
                self.payment_captured_at = Some(at);
                Ok(Some(self.move_to(BookingStatus::Confirmed, at, payload)))
            }
            BookingStatus::Confirmed => {
                if self.payment_captured_at.is_none() {
                    self.payment_captured_at = Some(at);
                }
                Ok(None)
            }
            BookingStatus::Assigned
            | BookingStatus::EnRoute
            | BookingStatus::Arrived
            | BookingStatus::InProgress => {
                if self.is_paid() {
                    return Ok(None);
                }
                self.payment_captured_at = Some(at);
                Ok(Some(self.event(self.status, at, payload)))
            }
            BookingStatus::Completed
            | BookingStatus::Refunded
            | BookingStatus::PartiallyRefunded
                if self.is_paid() =>
            {
                Ok(None)
            }
            _ => Err(self.invalid("record payment capture")),
        }
    }

    /// Stores a driver/vehicle assignment.
    ///
    /// The booking moves to `assigned` only when both driver and vehicle unit
    /// are present; otherwise the partial assignment is kept and the status
    /// stays put. Reassigning an `assigned` booking keeps it `assigned` and
    /// requires a complete assignment.
    pub fn assign_driver(
        &mut self,
        assignment: Assignment,
        at: DateTime<Utc>,
    ) -> CoreResult<LifecycleEvent> {
        self.require(
            &[
                BookingStatus::PendingPayment,
                BookingStatus::Confirmed,
                BookingStatus::Assigned,
            ],
            "assign driver",
        )?;

        if assignment.driver_payment_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "driver_payment_cents".to_string(),
            }
            .into());
        }

        let reassigned = self.status == BookingStatus::Assigned;
        if reassigned && !assignment.is_complete() {
            return Err(ValidationError::Required {
                field: "driver_id and vehicle_unit_id".to_string(),
            }
            .into());
        }

        let payload = EventPayload::DriverAssigned {
            driver_id: assignment.driver_id.clone(),
            vehicle_unit_id: assignment.vehicle_unit_id.clone(),
            reassigned,
        };
        let to = if assignment.is_complete() {
            BookingStatus::Assigned
        } else {
            self.status
        };
        self.assignment = Some(assignment);

        Ok(self.move_to(to, at, payload))
    }

    /// Moves the trip one step along
    /// `assigned → en_route → arrived → in_progress → completed`.
    ///
    /// Rejects anything but the adjacent next step, and refuses to leave
    /// `assigned` while payment has not been captured.
    pub fn driver_advance(
        &mut self,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> CoreResult<LifecycleEvent> {
        if self.status.driver_next() != Some(next) {
            return Err(self.invalid("advance trip"));
        }
        if next == BookingStatus::EnRoute && !self.is_paid() {
            return Err(self.invalid("dispatch unpaid trip"));
        }

        let payload = match next {
            BookingStatus::EnRoute => EventPayload::CustomerSms {
                notice: SmsNotice::DriverEnRoute,
            },
            BookingStatus::Arrived => EventPayload::CustomerSms {
                notice: SmsNotice::DriverArrived,
            },
            BookingStatus::Completed => EventPayload::TripCompleted,
            _ => EventPayload::TripStarted,
        };
        Ok(self.move_to(next, at, payload))
    }

    /// `arrived → no_show`.
    pub fn mark_no_show(&mut self, at: DateTime<Utc>) -> CoreResult<LifecycleEvent> {
        self.require(&[BookingStatus::Arrived], "mark no-show")?;
        Ok(self.move_to(BookingStatus::NoShow, at, EventPayload::NoShow))
    }

    /// Any non-terminal status → `cancelled`, recording who asked.
    pub fn cancel(&mut self, actor: Actor, at: DateTime<Utc>) -> CoreResult<LifecycleEvent> {
        if self.status.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.cancelled_by = Some(actor);
        Ok(self.move_to(BookingStatus::Cancelled, at, EventPayload::Cancelled { actor }))
    }

    /// `completed | cancelled` (paid) → `refunded` when the refund covers
    /// everything paid, else `partially_refunded`.
    pub fn apply_refund(
        &mut self,
        refunded: Money,
        total_paid: Money,
        at: DateTime<Utc>,
    ) -> CoreResult<LifecycleEvent> {
        self.require(
            &[BookingStatus::Completed, BookingStatus::Cancelled],
            "apply refund",
        )?;
        if !self.is_paid() {
            return Err(self.invalid("refund unpaid booking"));
        }
        if !refunded.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "refunded_cents".to_string(),
            }
            .into());
        }
        if !total_paid.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "total_paid_cents".to_string(),
            }
            .into());
        }

        let to = if refunded >= total_paid {
            BookingStatus::Refunded
        } else {
            BookingStatus::PartiallyRefunded
        };
        Ok(self.move_to(
            to,
            at,
            EventPayload::Refunded {
                refunded,
                total_paid,
            },
        ))
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn require(&self, allowed: &[BookingStatus], operation: &'static str) -> CoreResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            booking_id: self.id.clone(),
            from: self.status,
            operation,
        }
    }

    fn event(&self, to: BookingStatus, at: DateTime<Utc>, payload: EventPayload) -> LifecycleEvent {
        LifecycleEvent {
            booking_id: self.id.clone(),
            from_status: self.status,
            to_status: to,
            occurred_at: at,
            payload,
        }
    }

    fn move_to(&mut self, to: BookingStatus, at: DateTime<Utc>, payload: EventPayload) -> LifecycleEvent {
        let event = self.event(to, at, payload);
        if self.status != to {
            self.status = to;
            self.status_changed_at = Some(at);
        }
        event
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
