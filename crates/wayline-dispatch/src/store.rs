//! # Booking Store
//!
//! In-memory booking repository with per-booking serialization.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BookingStore::update(id, op)                        │
//! │                                                                         │
//! │  1. Find:    map read lock → Arc<Mutex<StoredBooking>>                 │
//! │  2. Lock:    that booking's Mutex (other bookings unaffected)          │
//! │  3. Copy:    working = stored.booking.clone()                          │
//! │  4. Apply:   op(&mut working)                                          │
//! │                 ├── Err → drop working, stored booking untouched       │
//! │                 └── Ok  → if changed: commit working, version += 1     │
//! │  5. Unlock                                                             │
//! │                                                                         │
//! │  Two transitions racing on one booking run one after the other, so    │
//! │  both can never succeed from the same starting status.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use wayline_core::{Booking, CoreError, CoreResult, ValidationError};

/// A booking together with its committed-change counter.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBooking {
    pub booking: Booking,
    /// Starts at 0 on insert; +1 per committed change. No-op updates keep it.
    pub version: u64,
}

/// In-memory booking repository.
#[derive(Debug, Default)]
pub struct BookingStore {
    bookings: RwLock<HashMap<String, Arc<Mutex<StoredBooking>>>>,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new booking.
    ///
    /// ## Errors
    /// `Validation(Duplicate)` if the id is already stored.
    pub async fn insert(&self, booking: Booking) -> CoreResult<()> {
        let mut map = self.bookings.write().await;
        if map.contains_key(&booking.id) {
            return Err(ValidationError::Duplicate {
                field: "booking id".to_string(),
                value: booking.id,
            }
            .into());
        }
        map.insert(
            booking.id.clone(),
            Arc::new(Mutex::new(StoredBooking {
                booking,
                version: 0,
            })),
        );
        Ok(())
    }

    /// Snapshot of one booking.
    pub async fn get(&self, id: &str) -> CoreResult<StoredBooking> {
        let entry = self.entry(id).await?;
        let stored = entry.lock().await;
        Ok(stored.clone())
    }

    /// Runs `op` on a working copy of the booking and commits it on success.
    ///
    /// Calls on the same id are serialized; a failing `op` leaves the stored
    /// booking and its version unchanged, and so does an `op` that succeeds
    /// without changing anything (a replayed webhook).
    pub async fn update<T, F>(&self, id: &str, op: F) -> CoreResult<(T, u64)>
    where
        F: FnOnce(&mut Booking) -> CoreResult<T>,
    {
        let entry = self.entry(id).await?;
        let mut stored = entry.lock().await;

        let mut working = stored.booking.clone();
        let out = op(&mut working)?;

        if working != stored.booking {
            stored.booking = working;
            stored.version += 1;
        }
        Ok((out, stored.version))
    }

    /// Snapshots of every booking, in no particular order.
    pub async fn all(&self) -> Vec<Booking> {
        let entries: Vec<_> = self.bookings.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(entry.lock().await.booking.clone());
        }
        out
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }

    async fn entry(&self, id: &str) -> CoreResult<Arc<Mutex<StoredBooking>>> {
        self.bookings
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::booking_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wayline_core::{Actor, BookingStatus, NewBooking};

    fn booking(id: &str) -> Booking {
        Booking::from_intake(
            NewBooking {
                id: id.to_string(),
                pickup_at: Utc.with_ymd_and_hms(2026, 4, 2, 14, 0, 0).unwrap(),
                pickup_address: "PHX Terminal 3".to_string(),
                dropoff_address: None,
                distance_miles: Some(12.0),
                duration_minutes: None,
                hours_requested: None,
                service_type_id: "airport_transfer".to_string(),
                vehicle_category_id: "sedan".to_string(),
                currency: "USD".to_string(),
            },
            false,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = BookingStore::new();
        store.insert(booking("bk-1")).await.unwrap();

        let stored = store.get("bk-1").await.unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.booking.status, BookingStatus::Draft);

        assert!(store.insert(booking("bk-1")).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_booking_not_found() {
        let store = BookingStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Booking", .. }));

        let err = store
            .update("nope", |b| b.submit_for_review(Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_commits_only_on_success() {
        let store = BookingStore::new();
        store.insert(booking("bk-1")).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 18, 0, 0).unwrap();

        let (event, version) = store
            .update("bk-1", |b| b.submit_for_review(at))
            .await
            .unwrap();
        assert_eq!(event.to_status, BookingStatus::PendingReview);
        assert_eq!(version, 1);

        // partially mutates the copy, then fails
        let err = store
            .update("bk-1", |b| {
                b.cancel(Actor::Admin, at)?;
                b.submit_for_review(at)
            })
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());

        let stored = store.get("bk-1").await.unwrap();
        assert_eq!(stored.booking.status, BookingStatus::PendingReview);
        assert_eq!(stored.booking.cancelled_by, None);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_noop_update_keeps_version() {
        let store = BookingStore::new();
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 18, 0, 0).unwrap();
        let mut confirmed = booking("bk-paid");
        confirmed.status = BookingStatus::Confirmed;
        confirmed.payment_captured_at = Some(at);
        store.insert(confirmed).await.unwrap();

        // a replayed capture webhook changes nothing
        let (event, version) = store
            .update("bk-paid", |b| b.record_payment_captured(at))
            .await
            .unwrap();
        assert!(event.is_none());
        assert_eq!(version, 0);

        let (_, version) = store
            .update("bk-paid", |b| b.cancel(Actor::Customer, at))
            .await
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.get("bk-paid").await.unwrap().version, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_one_winner() {
        let store = Arc::new(BookingStore::new());
        store.insert(booking("bk-race")).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 18, 0, 0).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.update("bk-race", |b| b.submit_for_review(at)).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.get("bk-race").await.unwrap().version, 1);
    }
}
