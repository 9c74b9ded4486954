//! Time windows bounding a mindful minutes query.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive)
    pub start: DateTime<Utc>,
    /// End of the window (exclusive)
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Check if a timestamp falls within this window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Check if the range `[start, end]` overlaps this window.
    ///
    /// Zero-length ranges count when their instant lies inside the window.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start == end {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }

    /// Window from the start of the local day containing `now` up to `now`.
    pub fn today_in<Z: TimeZone>(now: DateTime<Z>) -> Self {
        let zone = now.timezone();
        let midnight = now.date_naive().and_time(NaiveTime::default());

        let start = zone
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| first_valid_instant(&zone, &now));

        Self {
            start,
            end: now.with_timezone(&Utc),
        }
    }

    /// Today's window in the given IANA zone, or the system zone when `None`.
    pub fn today(timezone: Option<Tz>) -> Self {
        match timezone {
            Some(tz) => Self::today_in(Utc::now().with_timezone(&tz)),
            None => Self::today_in(Local::now()),
        }
    }
}

/// Earliest instant of `now`'s local day when midnight falls in a DST gap.
fn first_valid_instant<Z: TimeZone>(zone: &Z, now: &DateTime<Z>) -> DateTime<Utc> {
    let day = now.date_naive();
    (0..24 * 60)
        .filter_map(|minute| NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0))
        .find_map(|time| zone.from_local_datetime(&day.and_time(time)).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
