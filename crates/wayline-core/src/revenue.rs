//! # Revenue & Earnings Aggregator
//!
//! Buckets payment rows (admin revenue) and completed trips (driver
//! earnings) into civil day/month windows for the dashboards.
//!
//! ## Aggregation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-bucket totals                                    │
//! │                                                                         │
//! │  captured = Σ amount_total  where status = paid     and paid_at    ∈ W │
//! │  refunded = Σ amount_total  where status ∈ refunds  and updated_at ∈ W │
//! │  net      = max(0, captured − refunded)                                │
//! │  count    = number of captured payments                                │
//! │                                                                         │
//! │  W = [start, end) from the civil calendar. A payment is placed by the  │
//! │  civil key (YYYY-MM or YYYY-MM-DD) of its instant, never by the raw    │
//! │  UTC date.                                                             │
//! │                                                                         │
//! │  month-over-month % = (current − previous) / previous × 100            │
//! │                       only when previous > 0                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Today" and "this month" are always relative to the `now` the caller
//! passes in, so reports are reproducible in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::calendar::{CivilOffset, Granularity, Window};
use crate::types::{Booking, BookingStatus, Payment, PaymentStatus};

// =============================================================================
// Input Records
// =============================================================================

/// The slice of a payment row the aggregator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount_total_cents: i64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Instant a capture is attributed to; `updated_at` stands in when a
    /// paid row lacks `paid_at`.
    fn captured_at(&self) -> DateTime<Utc> {
        self.paid_at.unwrap_or(self.updated_at)
    }
}

impl From<&Payment> for PaymentRecord {
    fn from(p: &Payment) -> Self {
        PaymentRecord {
            amount_total_cents: p.amount_total_cents,
            status: p.status,
            paid_at: p.paid_at,
            updated_at: p.updated_at,
        }
    }
}

/// A completed trip's payout to its driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub driver_id: String,
    pub driver_payment_cents: i64,
    pub completed_at: DateTime<Utc>,
}

impl EarningsRecord {
    /// Extracts the payout of a completed, assigned booking.
    pub fn from_booking(booking: &Booking) -> Option<Self> {
        if booking.status != BookingStatus::Completed {
            return None;
        }
        let assignment = booking.assignment.as_ref()?;
        Some(EarningsRecord {
            driver_id: assignment.driver_id.clone()?,
            driver_payment_cents: assignment.driver_payment_cents,
            completed_at: booking.status_changed_at.unwrap_or(booking.pickup_at),
        })
    }
}

// =============================================================================
// Output Buckets
// =============================================================================

/// Revenue totals for one civil day or month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueBucket {
    pub key: String,
    pub granularity: Granularity,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
    pub captured_cents: i64,
    pub refunded_cents: i64,
    /// `max(0, captured − refunded)`.
    pub net_cents: i64,
    /// Number of captured payments.
    pub count: u32,
    /// Number of refunded payments.
    pub refund_count: u32,
}

impl RevenueBucket {
    fn empty(window: &Window) -> Self {
        RevenueBucket {
            key: window.key.clone(),
            granularity: window.granularity,
            start: window.start,
            end: window.end,
            captured_cents: 0,
            refunded_cents: 0,
            net_cents: 0,
            count: 0,
            refund_count: 0,
        }
    }

    fn settle(&mut self) {
        self.net_cents = (self.captured_cents - self.refunded_cents).max(0);
    }
}

/// Driver payouts for one civil day or month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsBucket {
    pub key: String,
    pub granularity: Granularity,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
    pub earnings_cents: i64,
    pub trips: u32,
}

/// Headline numbers for the admin finance dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub today: RevenueBucket,
    pub this_month: RevenueBucket,
    pub previous_month: RevenueBucket,
    /// `None` when the previous month captured nothing.
    pub month_over_month_pct: Option<f64>,
}

/// Which windows a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    /// The civil day containing `now`.
    Day,
    /// The civil month containing `now`.
    Month,
    /// The last `months` civil months, ending with the current one.
    TrailingMonths { months: u32 },
    /// Every window from the one containing `from` through the one containing `to`.
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        granularity: Granularity,
    },
}

// =============================================================================
// Percent Change
// =============================================================================

/// `(current − previous) / previous × 100`, or `None` if `previous <= 0`.
///
/// ## Example
/// ```rust
/// use wayline_core::revenue::percent_change;
///
/// assert_eq!(percent_change(15000, 10000), Some(50.0));
/// assert_eq!(percent_change(15000, 0), None);
/// ```
pub fn percent_change(current: i64, previous: i64) -> Option<f64> {
    if previous <= 0 {
        return None;
    }
    Some((current - previous) as f64 / previous as f64 * 100.0)
}

/// Month-over-month change in captured revenue.
pub fn month_over_month(current: &RevenueBucket, previous: &RevenueBucket) -> Option<f64> {
    percent_change(current.captured_cents, previous.captured_cents)
}

// =============================================================================
// Aggregator
// =============================================================================

/// Builds revenue and earnings buckets in one business offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevenueAggregator {
    offset: CivilOffset,
}

impl RevenueAggregator {
    pub fn new(offset: CivilOffset) -> Self {
        RevenueAggregator { offset }
    }

    pub fn offset(&self) -> CivilOffset {
        self.offset
    }

    /// Resolves a window spec against `now`.
    ///
    /// Range and trailing specs yield at most [`MAX_WINDOWS`](crate::calendar::MAX_WINDOWS) windows.
    pub fn windows(&self, now: DateTime<Utc>, spec: &WindowSpec) -> Vec<Window> {
        match spec {
            WindowSpec::Day => vec![self.offset.day_window(now)],
            WindowSpec::Month => vec![self.offset.month_window(now)],
            WindowSpec::TrailingMonths { months } => {
                self.offset.trailing_month_windows(now, *months)
            }
            WindowSpec::Range {
                from,
                to,
                granularity,
            } => self.offset.windows_between(*from, *to, *granularity),
        }
    }

    /// Revenue buckets for a window spec.
    pub fn summarize(
        &self,
        records: &[PaymentRecord],
        now: DateTime<Utc>,
        spec: &WindowSpec,
    ) -> Vec<RevenueBucket> {
        self.revenue(records, &self.windows(now, spec))
    }

    /// Revenue buckets for explicit windows, in the order given.
    pub fn revenue(&self, records: &[PaymentRecord], windows: &[Window]) -> Vec<RevenueBucket> {
        let mut buckets: Vec<RevenueBucket> = windows.iter().map(RevenueBucket::empty).collect();
        let index = WindowIndex::new(self.offset, windows);

        for record in records {
            let amount = record.amount_total_cents.max(0);
            match record.status {
                PaymentStatus::Paid => {
                    for i in index.locate(record.captured_at()) {
                        buckets[i].captured_cents += amount;
                        buckets[i].count += 1;
                    }
                }
                PaymentStatus::Refunded | PaymentStatus::PartiallyRefunded => {
                    for i in index.locate(record.updated_at) {
                        buckets[i].refunded_cents += amount;
                        buckets[i].refund_count += 1;
                    }
                }
                PaymentStatus::None | PaymentStatus::Pending | PaymentStatus::Failed => {}
            }
        }

        for bucket in &mut buckets {
            bucket.settle();
        }
        buckets
    }

    /// Revenue for the civil day containing `now`.
    pub fn today(&self, records: &[PaymentRecord], now: DateTime<Utc>) -> RevenueBucket {
        self.single(records, self.offset.day_window(now))
    }

    /// Revenue for the civil month containing `now`.
    pub fn this_month(&self, records: &[PaymentRecord], now: DateTime<Utc>) -> RevenueBucket {
        self.single(records, self.offset.month_window(now))
    }

    /// Revenue for the last `months` civil months, oldest first.
    pub fn trailing_months(
        &self,
        records: &[PaymentRecord],
        now: DateTime<Utc>,
        months: u32,
    ) -> Vec<RevenueBucket> {
        self.revenue(records, &self.offset.trailing_month_windows(now, months))
    }

    /// Today, this month, last month and the month-over-month change.
    pub fn dashboard(&self, records: &[PaymentRecord], now: DateTime<Utc>) -> DashboardSummary {
        let windows = [
            self.offset.day_window(now),
            self.offset.month_window(now),
            self.offset.month_window(self.offset.add_months(now, -1)),
        ];
        let mut buckets = self.revenue(records, &windows).into_iter();
        // revenue() returns exactly one bucket per window
        let today = buckets.next().unwrap_or_else(|| RevenueBucket::empty(&windows[0]));
        let this_month = buckets.next().unwrap_or_else(|| RevenueBucket::empty(&windows[1]));
        let previous_month = buckets.next().unwrap_or_else(|| RevenueBucket::empty(&windows[2]));
        let month_over_month_pct = month_over_month(&this_month, &previous_month);

        DashboardSummary {
            today,
            this_month,
            previous_month,
            month_over_month_pct,
        }
    }

    /// Driver payout buckets, optionally for one driver only.
    pub fn earnings(
        &self,
        records: &[EarningsRecord],
        driver_id: Option<&str>,
        windows: &[Window],
    ) -> Vec<EarningsBucket> {
        let mut buckets: Vec<EarningsBucket> = windows
            .iter()
            .map(|w| EarningsBucket {
                key: w.key.clone(),
                granularity: w.granularity,
                start: w.start,
                end: w.end,
                earnings_cents: 0,
                trips: 0,
            })
            .collect();
        let index = WindowIndex::new(self.offset, windows);

        for record in records {
            if driver_id.is_some_and(|id| id != record.driver_id) {
                continue;
            }
            for i in index.locate(record.completed_at) {
                buckets[i].earnings_cents += record.driver_payment_cents.max(0);
                buckets[i].trips += 1;
            }
        }
        buckets
    }

    fn single(&self, records: &[PaymentRecord], window: Window) -> RevenueBucket {
        let fallback = RevenueBucket::empty(&window);
        self.revenue(records, std::slice::from_ref(&window))
            .pop()
            .unwrap_or(fallback)
    }
}

// =============================================================================
// Window Index
// =============================================================================

/// Maps an instant to every bucket whose civil key it carries.
///
/// A day window and the month window around it both match, so a dashboard
/// asking for both sees the record in each. Within one granularity an
/// instant has exactly one key.
struct WindowIndex<'a> {
    offset: CivilOffset,
    windows: &'a [Window],
    by_key: HashMap<(Granularity, String), Vec<usize>>,
}

impl<'a> WindowIndex<'a> {
    fn new(offset: CivilOffset, windows: &'a [Window]) -> Self {
        let mut by_key: HashMap<(Granularity, String), Vec<usize>> = HashMap::new();
        for (i, w) in windows.iter().enumerate() {
            by_key.entry((w.granularity, w.key.clone())).or_default().push(i);
        }
        WindowIndex {
            offset,
            windows,
            by_key,
        }
    }

    fn locate(&self, t: DateTime<Utc>) -> Vec<usize> {
        let mut found = Vec::new();
        for granularity in [Granularity::Day, Granularity::Month] {
            let key = match granularity {
                Granularity::Day => self.offset.day_key(t),
                Granularity::Month => self.offset.month_key(t),
            };
            if let Some(indices) = self.by_key.get(&(granularity, key)) {
                found.extend(indices.iter().copied().filter(|&i| self.windows[i].contains(t)));
            }
        }
        found
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn paid(cents: i64, at: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            amount_total_cents: cents,
            status: PaymentStatus::Paid,
            paid_at: Some(at),
            updated_at: at,
        }
    }

    fn refunded(cents: i64, paid_at: DateTime<Utc>, refunded_at: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            amount_total_cents: cents,
            status: PaymentStatus::Refunded,
            paid_at: Some(paid_at),
            updated_at: refunded_at,
        }
    }

    fn aggregator() -> RevenueAggregator {
        RevenueAggregator::new(CivilOffset::PHOENIX)
    }

    #[test]
    fn test_phoenix_month_boundary_splits_buckets() {
        // 2026-01-31T23:30-07:00 and 2026-02-01T00:10-07:00
        let records = vec![
            paid(10000, utc(2026, 2, 1, 6, 30)),
            paid(20000, utc(2026, 2, 1, 7, 10)),
        ];
        let buckets = aggregator().trailing_months(&records, utc(2026, 2, 15, 19, 0), 2);
        assert_eq!(buckets[0].key, "2026-01");
        assert_eq!(buckets[0].captured_cents, 10000);
        assert_eq!(buckets[1].key, "2026-02");
        assert_eq!(buckets[1].captured_cents, 20000);
    }

    #[test]
    fn test_same_civil_day_across_utc_midnight() {
        let records = vec![
            paid(5000, utc(2026, 3, 3, 23, 57)),
            paid(7000, utc(2026, 3, 4, 0, 2)),
        ];
        let today = aggregator().today(&records, utc(2026, 3, 3, 20, 0));
        assert_eq!(today.key, "2026-03-03");
        assert_eq!(today.captured_cents, 12000);
        assert_eq!(today.count, 2);
    }

    #[test]
    fn test_boundary_instant_counted_once() {
        // exactly civil midnight Mar 2 belongs to Mar 2 only
        let midnight = utc(2026, 3, 2, 7, 0);
        let records = vec![paid(4200, midnight)];
        let buckets = aggregator().summarize(
            &records,
            midnight,
            &WindowSpec::Range {
                from: utc(2026, 3, 1, 12, 0),
                to: utc(2026, 3, 2, 12, 0),
                granularity: Granularity::Day,
            },
        );
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].captured_cents, 0);
        assert_eq!(buckets[1].captured_cents, 4200);
    }

    #[test]
    fn test_net_never_negative() {
        let records = vec![
            paid(3000, utc(2026, 5, 10, 18, 0)),
            refunded(9000, utc(2026, 4, 20, 18, 0), utc(2026, 5, 11, 18, 0)),
        ];
        let month = aggregator().this_month(&records, utc(2026, 5, 20, 18, 0));
        assert_eq!(month.captured_cents, 3000);
        assert_eq!(month.refunded_cents, 9000);
        assert_eq!(month.net_cents, 0);
    }

    #[test]
    fn test_refund_attributed_to_refund_month() {
        let records = vec![refunded(8000, utc(2026, 4, 20, 18, 0), utc(2026, 5, 2, 18, 0))];
        let buckets = aggregator().trailing_months(&records, utc(2026, 5, 20, 18, 0), 2);
        assert_eq!(buckets[0].key, "2026-04");
        assert_eq!(buckets[0].refunded_cents, 0);
        assert_eq!(buckets[1].refunded_cents, 8000);
        assert_eq!(buckets[1].refund_count, 1);
    }

    #[test]
    fn test_ignores_unsettled_payments() {
        let at = utc(2026, 5, 10, 18, 0);
        let records = vec![
            PaymentRecord {
                status: PaymentStatus::Pending,
                ..paid(1000, at)
            },
            PaymentRecord {
                status: PaymentStatus::Failed,
                ..paid(1000, at)
            },
            paid(-500, at),
        ];
        let today = aggregator().today(&records, at);
        assert_eq!(today.captured_cents, 0);
        assert_eq!(today.count, 1);
    }

    #[test]
    fn test_month_over_month() {
        assert_eq!(percent_change(15000, 10000), Some(50.0));
        assert_eq!(percent_change(5000, 10000), Some(-50.0));
        assert_eq!(percent_change(15000, 0), None);

        let records = vec![
            paid(10000, utc(2026, 4, 15, 18, 0)),
            paid(15000, utc(2026, 5, 15, 18, 0)),
        ];
        let summary = aggregator().dashboard(&records, utc(2026, 5, 20, 18, 0));
        assert_eq!(summary.previous_month.key, "2026-04");
        assert_eq!(summary.this_month.captured_cents, 15000);
        assert_eq!(summary.month_over_month_pct, Some(50.0));
        assert_eq!(summary.today.captured_cents, 0);

        let empty_prev = aggregator().dashboard(&records[1..], utc(2026, 5, 20, 18, 0));
        assert_eq!(empty_prev.month_over_month_pct, None);
    }

    #[test]
    fn test_dashboard_counts_today_in_this_month() {
        let now = utc(2026, 5, 20, 18, 0);
        let records = vec![
            paid(10000, utc(2026, 4, 15, 18, 0)),
            paid(15000, now),
            refunded(2000, utc(2026, 5, 2, 18, 0), now),
        ];
        let summary = aggregator().dashboard(&records, now);

        assert_eq!(summary.today.captured_cents, 15000);
        assert_eq!(summary.today.refunded_cents, 2000);
        assert_eq!(summary.this_month.captured_cents, 15000);
        assert_eq!(summary.this_month.refunded_cents, 2000);
        assert_eq!(summary.this_month.net_cents, 13000);
        assert_eq!(summary.this_month, aggregator().this_month(&records, now));
        assert_eq!(summary.month_over_month_pct, Some(50.0));
    }

    #[test]
    fn test_driver_earnings() {
        let records = vec![
            EarningsRecord {
                driver_id: "drv-1".to_string(),
                driver_payment_cents: 6000,
                completed_at: utc(2026, 6, 1, 5, 0), // May 31 civil
            },
            EarningsRecord {
                driver_id: "drv-1".to_string(),
                driver_payment_cents: 4500,
                completed_at: utc(2026, 6, 3, 18, 0),
            },
            EarningsRecord {
                driver_id: "drv-2".to_string(),
                driver_payment_cents: 9900,
                completed_at: utc(2026, 6, 3, 18, 0),
            },
        ];
        let agg = aggregator();
        let windows = agg.windows(utc(2026, 6, 10, 18, 0), &WindowSpec::TrailingMonths { months: 2 });
        let mine = agg.earnings(&records, Some("drv-1"), &windows);
        assert_eq!(mine[0].earnings_cents, 6000);
        assert_eq!(mine[1].earnings_cents, 4500);
        assert_eq!(mine[1].trips, 1);

        let all = agg.earnings(&records, None, &windows);
        assert_eq!(all[1].earnings_cents, 14400);
    }

    #[test]
    fn test_results_depend_only_on_now() {
        let records = vec![paid(2500, utc(2026, 7, 4, 20, 0))];
        let now = utc(2026, 7, 4, 22, 0);
        assert_eq!(aggregator().today(&records, now), aggregator().today(&records, now));
        let tomorrow = aggregator().today(&records, utc(2026, 7, 5, 18, 0));
        assert_eq!(tomorrow.captured_cents, 0);
    }

    proptest! {
        #[test]
        fn prop_payment_counted_once_across_days(secs in 1_700_000_000i64..1_800_000_000i64, cents in 1i64..1_000_000) {
            let t = DateTime::from_timestamp(secs, 0).unwrap();
            let agg = aggregator();
            let buckets = agg.summarize(
                &[paid(cents, t)],
                t,
                &WindowSpec::Range {
                    from: t - chrono::TimeDelta::days(3),
                    to: t + chrono::TimeDelta::days(3),
                    granularity: Granularity::Day,
                },
            );
            let total: i64 = buckets.iter().map(|b| b.captured_cents).sum();
            prop_assert_eq!(total, cents);
            prop_assert_eq!(buckets.iter().filter(|b| b.count == 1).count(), 1);
        }

        #[test]
        fn prop_net_is_clamped(captured in 0i64..1_000_000, refund in 0i64..1_000_000) {
            let at = utc(2026, 8, 12, 18, 0);
            let records = vec![paid(captured, at), refunded(refund, at, at)];
            let today = aggregator().today(&records, at);
            prop_assert!(today.net_cents >= 0);
            prop_assert_eq!(today.net_cents, (captured - refund).max(0));
        }
    }
}
