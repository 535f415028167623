//! # Revenue Reports
//!
//! Dashboard-facing reports over payment rows and completed bookings.
//! Every report is computed in the configured business offset and against a
//! `now` supplied by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wayline_core::{
    Booking, CivilOffset, DashboardSummary, EarningsBucket, EarningsRecord, PaymentRecord,
    RevenueAggregator, RevenueBucket, WindowSpec,
};

use crate::config::DispatchConfig;
use crate::store::BookingStore;

/// The admin finance dashboard in one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub business: String,
    pub generated_at: DateTime<Utc>,
    pub utc_offset_minutes: i32,
    pub summary: DashboardSummary,
    /// Oldest month first, ending with the current month.
    pub trailing_months: Vec<RevenueBucket>,
}

/// Report builder bound to one business offset.
#[derive(Debug, Clone)]
pub struct RevenueReports {
    business: String,
    aggregator: RevenueAggregator,
}

impl RevenueReports {
    pub fn new(business: impl Into<String>, offset: CivilOffset) -> Self {
        RevenueReports {
            business: business.into(),
            aggregator: RevenueAggregator::new(offset),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        RevenueReports::new(config.business.name.clone(), config.offset())
    }

    pub fn dashboard(&self, payments: &[PaymentRecord], now: DateTime<Utc>) -> DashboardSummary {
        self.aggregator.dashboard(payments, now)
    }

    pub fn revenue(
        &self,
        payments: &[PaymentRecord],
        now: DateTime<Utc>,
        spec: &WindowSpec,
    ) -> Vec<RevenueBucket> {
        self.aggregator.summarize(payments, now, spec)
    }

    /// Summary plus the last `months` months.
    pub fn build(&self, payments: &[PaymentRecord], now: DateTime<Utc>, months: u32) -> RevenueReport {
        debug!(payments = payments.len(), months, "Building revenue report");
        RevenueReport {
            business: self.business.clone(),
            generated_at: now,
            utc_offset_minutes: self.aggregator.offset().minutes(),
            summary: self.aggregator.dashboard(payments, now),
            trailing_months: self.aggregator.trailing_months(payments, now, months),
        }
    }

    /// Driver payouts from completed bookings.
    pub fn driver_earnings(
        &self,
        bookings: &[Booking],
        driver_id: Option<&str>,
        now: DateTime<Utc>,
        spec: &WindowSpec,
    ) -> Vec<EarningsBucket> {
        let records: Vec<EarningsRecord> =
            bookings.iter().filter_map(EarningsRecord::from_booking).collect();
        let windows = self.aggregator.windows(now, spec);
        self.aggregator.earnings(&records, driver_id, &windows)
    }

    /// Driver payouts over everything currently in the store.
    pub async fn driver_earnings_from_store(
        &self,
        store: &BookingStore,
        driver_id: Option<&str>,
        now: DateTime<Utc>,
        spec: &WindowSpec,
    ) -> Vec<EarningsBucket> {
        let bookings = store.all().await;
        self.driver_earnings(&bookings, driver_id, now, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wayline_core::{Assignment, BookingStatus, NewBooking, PaymentStatus};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn paid(cents: i64, at: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            amount_total_cents: cents,
            status: PaymentStatus::Paid,
            paid_at: Some(at),
            updated_at: at,
        }
    }

    fn completed(id: &str, driver: &str, pay: i64, at: DateTime<Utc>) -> Booking {
        let mut booking = Booking::from_intake(
            NewBooking {
                id: id.to_string(),
                pickup_at: at,
                pickup_address: "Mesa".to_string(),
                dropoff_address: None,
                distance_miles: Some(10.0),
                duration_minutes: None,
                hours_requested: None,
                service_type_id: "airport_transfer".to_string(),
                vehicle_category_id: "sedan".to_string(),
                currency: "USD".to_string(),
            },
            false,
        );
        booking.status = BookingStatus::Completed;
        booking.status_changed_at = Some(at);
        booking.assignment = Some(Assignment {
            driver_id: Some(driver.to_string()),
            vehicle_unit_id: Some("unit-1".to_string()),
            assigned_at: at,
            driver_payment_cents: pay,
        });
        booking
    }

    #[test]
    fn test_build_report() {
        let reports = RevenueReports::new("Desert Sky", CivilOffset::PHOENIX);
        let payments = vec![
            paid(10000, utc(2026, 1, 15, 18)),
            paid(15000, utc(2026, 2, 10, 18)),
        ];
        let report = reports.build(&payments, utc(2026, 2, 20, 18), 3);

        assert_eq!(report.utc_offset_minutes, -420);
        assert_eq!(report.summary.month_over_month_pct, Some(50.0));
        let keys: Vec<_> = report.trailing_months.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2025-12", "2026-01", "2026-02"]);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"captured_cents\":15000"));
    }

    #[test]
    fn test_revenue_respects_configured_offset() {
        // 2026-03-01T02:00Z is Mar 1 in UTC but Feb 28 in Phoenix
        let payments = vec![paid(5000, utc(2026, 3, 1, 2))];
        let now = utc(2026, 3, 1, 2);

        let phoenix = RevenueReports::new("a", CivilOffset::PHOENIX);
        let utc_books = RevenueReports::new("b", CivilOffset::UTC);

        assert_eq!(phoenix.revenue(&payments, now, &WindowSpec::Day)[0].key, "2026-02-28");
        assert_eq!(utc_books.revenue(&payments, now, &WindowSpec::Day)[0].key, "2026-03-01");
    }

    #[tokio::test]
    async fn test_driver_earnings_from_store() {
        let store = BookingStore::new();
        store
            .insert(completed("bk-1", "drv-1", 6000, utc(2026, 6, 3, 18)))
            .await
            .unwrap();
        store
            .insert(completed("bk-2", "drv-2", 9000, utc(2026, 6, 4, 18)))
            .await
            .unwrap();
        let mut open = completed("bk-3", "drv-1", 7000, utc(2026, 6, 5, 18));
        open.status = BookingStatus::InProgress;
        store.insert(open).await.unwrap();

        let reports = RevenueReports::new("Desert Sky", CivilOffset::PHOENIX);
        let buckets = reports
            .driver_earnings_from_store(&store, Some("drv-1"), utc(2026, 6, 10, 18), &WindowSpec::Month)
            .await;
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].earnings_cents, 6000);
        assert_eq!(buckets[0].trips, 1);
    }
}
