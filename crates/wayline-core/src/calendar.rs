//! # Civil Calendar
//!
//! Day and month boundaries in the business's fixed local offset.
//!
//! Every report that buckets money by day or month goes through this
//! module; nothing else in the workspace does its own offset math.
//!
//! ## Boundary Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_of_civil_day(t), offset = -07:00 (Phoenix, no DST)               │
//! │                                                                         │
//! │   t (UTC)            2026-02-01T06:40Z                                  │
//! │     │ + offset                                                          │
//! │     ▼                                                                   │
//! │   shifted            2026-01-31T23:40   ← civil wall clock              │
//! │     │ truncate to 00:00                                                 │
//! │     ▼                                                                   │
//! │   civil midnight     2026-01-31T00:00                                   │
//! │     │ - offset                                                          │
//! │     ▼                                                                   │
//! │   start (UTC)        2026-01-31T07:00Z                                  │
//! │                                                                         │
//! │  Buckets are half-open: [start, next_start). Month steps are taken on  │
//! │  the civil calendar (Jan 31 → Feb 1 → Mar 1), never as N × 86400s.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Largest offset accepted, in minutes (UTC±14:00).
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Most windows a single range or trailing request produces.
pub const MAX_WINDOWS: usize = 1_000;

// =============================================================================
// Civil Offset
// =============================================================================

/// A fixed UTC offset with no daylight-saving transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CivilOffset {
    minutes: i32,
}

impl CivilOffset {
    /// UTC-07:00, the offset the business operates in.
    pub const PHOENIX: CivilOffset = CivilOffset { minutes: -7 * 60 };

    /// UTC itself.
    pub const UTC: CivilOffset = CivilOffset { minutes: 0 };

    /// Creates an offset from minutes east of UTC.
    ///
    /// ## Example
    /// ```rust
    /// use wayline_core::calendar::CivilOffset;
    ///
    /// assert!(CivilOffset::from_minutes(-420).is_ok());
    /// assert!(CivilOffset::from_minutes(15 * 60).is_err());
    /// ```
    pub fn from_minutes(minutes: i32) -> Result<Self, ValidationError> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -(MAX_OFFSET_MINUTES as i64),
                max: MAX_OFFSET_MINUTES as i64,
            });
        }
        Ok(CivilOffset { minutes })
    }

    /// Minutes east of UTC.
    #[inline]
    pub const fn minutes(&self) -> i32 {
        self.minutes
    }

    #[inline]
    fn delta(&self) -> TimeDelta {
        TimeDelta::minutes(self.minutes as i64)
    }

    /// The civil wall-clock reading of `t`.
    pub fn to_civil(&self, t: DateTime<Utc>) -> NaiveDateTime {
        t.naive_utc() + self.delta()
    }

    /// The civil date containing `t`.
    pub fn civil_date(&self, t: DateTime<Utc>) -> NaiveDate {
        self.to_civil(t).date()
    }

    /// The UTC instant of civil midnight at the start of `date`.
    pub fn midnight_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        (date.and_time(NaiveTime::MIN) - self.delta()).and_utc()
    }

    // -------------------------------------------------------------------------
    // Boundaries
    // -------------------------------------------------------------------------

    /// Start of the civil day containing `t`.
    pub fn day_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight_utc(self.civil_date(t))
    }

    /// Start of the civil day after the one containing `t`.
    pub fn next_day_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.civil_date(t);
        self.midnight_utc(date.succ_opt().unwrap_or(date))
    }

    /// Start of the civil month containing `t`.
    pub fn month_start(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight_utc(first_of_month(self.civil_date(t)))
    }

    /// Start of the civil month `months` away from the month containing `t`.
    ///
    /// Negative values step backwards. Saturates at chrono's calendar range.
    pub fn add_months(&self, t: DateTime<Utc>, months: i32) -> DateTime<Utc> {
        let first = first_of_month(self.civil_date(t));
        let stepped = if months >= 0 {
            first
                .checked_add_months(Months::new(months.unsigned_abs()))
                .unwrap_or(NaiveDate::MAX)
        } else {
            first
                .checked_sub_months(Months::new(months.unsigned_abs()))
                .unwrap_or(NaiveDate::MIN)
        };
        self.midnight_utc(stepped)
    }

    // -------------------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------------------

    /// `YYYY-MM-DD` of the civil day containing `t`.
    pub fn day_key(&self, t: DateTime<Utc>) -> String {
        self.civil_date(t).format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM` of the civil month containing `t`.
    pub fn month_key(&self, t: DateTime<Utc>) -> String {
        self.civil_date(t).format("%Y-%m").to_string()
    }

    // -------------------------------------------------------------------------
    // Windows
    // -------------------------------------------------------------------------

    /// The civil day containing `t`.
    pub fn day_window(&self, t: DateTime<Utc>) -> Window {
        Window {
            key: self.day_key(t),
            granularity: Granularity::Day,
            start: self.day_start(t),
            end: self.next_day_start(t),
        }
    }

    /// The civil month containing `t`.
    pub fn month_window(&self, t: DateTime<Utc>) -> Window {
        Window {
            key: self.month_key(t),
            granularity: Granularity::Month,
            start: self.month_start(t),
            end: self.add_months(t, 1),
        }
    }

    /// The window of the given granularity containing `t`.
    pub fn window(&self, t: DateTime<Utc>, granularity: Granularity) -> Window {
        match granularity {
            Granularity::Day => self.day_window(t),
            Granularity::Month => self.month_window(t),
        }
    }

    /// The `count` civil months ending with the month containing `now`,
    /// oldest first. `count` is capped at [`MAX_WINDOWS`].
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use wayline_core::calendar::CivilOffset;
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    /// let keys: Vec<String> = CivilOffset::PHOENIX
    ///     .trailing_month_windows(now, 3)
    ///     .into_iter()
    ///     .map(|w| w.key)
    ///     .collect();
    /// assert_eq!(keys, vec!["2026-01", "2026-02", "2026-03"]);
    /// ```
    pub fn trailing_month_windows(&self, now: DateTime<Utc>, count: u32) -> Vec<Window> {
        let count = (count as usize).min(MAX_WINDOWS) as i32;
        (0..count)
            .map(|i| {
                let start = self.add_months(now, i - (count - 1));
                self.month_window(start)
            })
            .collect()
    }

    /// Consecutive windows from the one containing `from` through the one
    /// containing `to` (inclusive). Empty when `to` precedes `from`.
    ///
    /// Stops after [`MAX_WINDOWS`] windows; longer ranges are truncated at
    /// the far end.
    pub fn windows_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        granularity: Granularity,
    ) -> Vec<Window> {
        let mut windows = Vec::new();
        if to < from {
            return windows;
        }
        let mut cursor = self.window(from, granularity);
        loop {
            let next_start = cursor.end;
            let done = to < next_start
                || next_start <= cursor.start
                || windows.len() + 1 >= MAX_WINDOWS;
            windows.push(cursor);
            if done {
                break;
            }
            cursor = self.window(next_start, granularity);
        }
        windows
    }
}

impl Default for CivilOffset {
    fn default() -> Self {
        CivilOffset::PHOENIX
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

// =============================================================================
// Window
// =============================================================================

/// Bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Month,
}

/// A half-open civil time window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// `YYYY-MM-DD` or `YYYY-MM` in civil time.
    pub key: String,
    pub granularity: Granularity,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// True if `t` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
