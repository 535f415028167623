//! # Event Outbox
//!
//! Hands committed lifecycle events to the notification collaborator.
//!
//! ## Outbox Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Event Outbox Flow                                │
//! │                                                                         │
//! │  BookingService ──publish──► EventOutbox (mpsc::Sender, cloneable)     │
//! │                                    │                                    │
//! │                                    ▼  bounded channel                   │
//! │                          OutboxProcessor<N>                             │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                          N: Notifier::notify(&event)                    │
//! │                           ├── Ok  → delivered += 1                     │
//! │                           └── Err → log, failed += 1, move on          │
//! │                                                                         │
//! │  The processor stops once every EventOutbox clone has been dropped    │
//! │  and the channel is drained.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whether an event becomes an email, an SMS or nothing at all is the
//! notifier's call.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use wayline_core::LifecycleEvent;

use crate::error::{DispatchError, DispatchResult};

// =============================================================================
// Notifier Trait
// =============================================================================

/// Receives lifecycle events (implemented by the email/SMS integration).
pub trait Notifier: Send + Sync {
    /// Delivers one event.
    fn notify(&self, event: &LifecycleEvent) -> DispatchResult<()>;
}

/// Notifier that writes each event to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &LifecycleEvent) -> DispatchResult<()> {
        info!(
            booking_id = %event.booking_id,
            from = %event.from_status,
            to = %event.to_status,
            payload = ?event.payload,
            "Lifecycle event"
        );
        Ok(())
    }
}

/// Notifier that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &LifecycleEvent) -> DispatchResult<()> {
        self.events
            .lock()
            .map_err(|e| DispatchError::NotificationFailed(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}

// =============================================================================
// Outbox Handle
// =============================================================================

/// Publishing side of the outbox.
#[derive(Clone)]
pub struct EventOutbox {
    tx: mpsc::Sender<LifecycleEvent>,
}

impl EventOutbox {
    /// Queues an event, waiting if the channel is full.
    pub async fn publish(&self, event: LifecycleEvent) -> DispatchResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| DispatchError::ChannelClosed)
    }
}

// =============================================================================
// Outbox Processor
// =============================================================================

/// Delivery counters reported when the processor stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutboxStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Drains the outbox into a [`Notifier`].
pub struct OutboxProcessor<N: Notifier> {
    rx: mpsc::Receiver<LifecycleEvent>,
    notifier: Arc<N>,
    stats: OutboxStats,
}

impl<N: Notifier> OutboxProcessor<N> {
    /// Creates a processor and the handle publishers use.
    pub fn new(capacity: usize, notifier: Arc<N>) -> (Self, EventOutbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let processor = OutboxProcessor {
            rx,
            notifier,
            stats: OutboxStats::default(),
        };
        (processor, EventOutbox { tx })
    }

    /// Runs until every publisher is gone.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) -> OutboxStats {
        info!("Outbox processor starting");

        while let Some(event) = self.rx.recv().await {
            self.deliver(&event);
        }

        info!(
            delivered = self.stats.delivered,
            failed = self.stats.failed,
            "Outbox processor stopped"
        );
        self.stats
    }

    /// Delivers whatever is queued right now without waiting for more.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.deliver(&event);
            processed += 1;
        }
        processed
    }

    pub fn stats(&self) -> OutboxStats {
        self.stats
    }

    fn deliver(&mut self, event: &LifecycleEvent) {
        match self.notifier.notify(event) {
            Ok(()) => {
                debug!(booking_id = %event.booking_id, to = %event.to_status, "Event delivered");
                self.stats.delivered += 1;
            }
            Err(e) => {
                error!(?e, booking_id = %event.booking_id, "Failed to deliver lifecycle event");
                self.stats.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wayline_core::{BookingStatus, EventPayload};

    fn event(id: &str) -> LifecycleEvent {
        LifecycleEvent {
            booking_id: id.to_string(),
            from_status: BookingStatus::Draft,
            to_status: BookingStatus::PendingReview,
            occurred_at: Utc.with_ymd_and_hms(2026, 4, 1, 18, 0, 0).unwrap(),
            payload: EventPayload::SubmittedForReview,
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, event: &LifecycleEvent) -> DispatchResult<()> {
            if event.booking_id == "bad" {
                return Err(DispatchError::NotificationFailed("sms gateway down".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_process_pending_in_order() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut processor, outbox) = OutboxProcessor::new(8, Arc::clone(&notifier));

        outbox.publish(event("bk-1")).await.unwrap();
        outbox.publish(event("bk-2")).await.unwrap();
        assert_eq!(processor.process_pending(), 2);

        let ids: Vec<_> = notifier.events().into_iter().map(|e| e.booking_id).collect();
        assert_eq!(ids, vec!["bk-1", "bk-2"]);
        assert_eq!(processor.stats().delivered, 2);
    }

    #[tokio::test]
    async fn test_run_skips_failures_and_stops_when_publishers_drop() {
        let (processor, outbox) = OutboxProcessor::new(4, Arc::new(FailingNotifier));
        let task = tokio::spawn(processor.run());

        outbox.publish(event("ok-1")).await.unwrap();
        outbox.publish(event("bad")).await.unwrap();
        outbox.publish(event("ok-2")).await.unwrap();
        drop(outbox);

        let stats = task.await.unwrap();
        assert_eq!(
            stats,
            OutboxStats {
                delivered: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_publish_after_processor_dropped() {
        let (processor, outbox) = OutboxProcessor::new(1, Arc::new(LogNotifier));
        drop(processor);
        assert!(matches!(
            outbox.publish(event("bk-1")).await,
            Err(DispatchError::ChannelClosed)
        ));
    }
}
