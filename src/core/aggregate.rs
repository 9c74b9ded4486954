//! Reduction of mindful records into whole minutes.

use crate::store::types::MindfulRecord;

/// Total elapsed seconds across all records, summed without per-record rounding.
pub fn total_elapsed_secs(records: &[MindfulRecord]) -> f64 {
    records.iter().map(MindfulRecord::elapsed_secs).sum()
}

/// Whole minutes across all records: `floor(sum(end - start) / 60)`.
///
/// An empty slice yields 0 without doing any arithmetic. Negative sums
/// (records with `end < start`) clamp to 0.
pub fn total_minutes(records: &[MindfulRecord]) -> u64 {
    if records.is_empty() {
        return 0;
    }

    let minutes = (total_elapsed_secs(records) / 60.0).floor();
    if minutes.is_finite() && minutes > 0.0 {
        minutes as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn record(start_secs: i64, end_secs: i64) -> MindfulRecord {
        let base: DateTime<Utc> = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        MindfulRecord::new(
            base + Duration::seconds(start_secs),
            base + Duration::seconds(end_secs),
        )
    }

    #[test]
    fn test_under_a_minute_is_zero() {
        assert_eq!(total_minutes(&[record(0, 30)]), 0);
    }

    #[test]
    fn test_sum_before_floor() {
        // 90s + 150s = 240s; flooring per record would give 1 + 2 = 3
        assert_eq!(total_minutes(&[record(0, 90), record(0, 150)]), 4);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(total_minutes(&[]), 0);
    }

    #[test]
    fn test_order_independent() {
        let mut records = vec![record(0, 61), record(100, 250), record(400, 401)];
        let forward = total_minutes(&records);
        records.reverse();
        assert_eq!(total_minutes(&records), forward);
        assert_eq!(forward, 3);
    }

    #[test]
    fn test_sub_second_durations_accumulate() {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let records: Vec<_> = (0..120)
            .map(|_| MindfulRecord::new(base, base + Duration::milliseconds(500)))
            .collect();
        assert!((total_elapsed_secs(&records) - 60.0).abs() < 1e-6);
        assert_eq!(total_minutes(&records), 1);
    }

    #[test]
    fn test_inverted_records_never_go_negative() {
        assert_eq!(total_minutes(&[record(120, 0)]), 0);
    }
}
