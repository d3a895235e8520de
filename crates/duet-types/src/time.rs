//! Timestamp conventions shared by the db layer, handlers and the cleanup
//! job.
//!
//! Timestamps are stored as local-time TEXT with second precision. The
//! format sorts lexicographically in chronological order, so range queries
//! on the stored column are plain string comparisons.

use chrono::{Duration, Local, NaiveDate};

/// Stored timestamp format: `2024-05-05 18:30:00`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, rendered in the stored format.
pub fn now_stamp() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Local time `ttl` from now, rendered in the stored format.
pub fn stamp_in(ttl: Duration) -> String {
    (Local::now() + ttl).format(TIME_FORMAT).to_string()
}

/// Half-open bounds of a calendar day: `[day 00:00:00, next day 00:00:00)`.
///
/// A song counts as "today's" when its timestamp falls inside these bounds,
/// preserving the original midnight-to-midnight day semantics.
pub fn day_bounds(day: NaiveDate) -> (String, String) {
    let next = day.succ_opt().unwrap_or(day);
    (
        format!("{} 00:00:00", day.format("%Y-%m-%d")),
        format!("{} 00:00:00", next.format("%Y-%m-%d")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_are_half_open() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start, "2024-05-05 00:00:00");
        assert_eq!(end, "2024-05-06 00:00:00");

        // Lexicographic comparison matches chronological order.
        assert!(start.as_str() <= "2024-05-05 23:59:59");
        assert!("2024-05-05 23:59:59" < end.as_str());
        assert!("2024-05-04 23:59:59" < start.as_str());
    }

    #[test]
    fn day_bounds_cross_month_and_year() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start, "2024-12-31 00:00:00");
        assert_eq!(end, "2025-01-01 00:00:00");
    }

    #[test]
    fn now_stamp_parses_back() {
        let stamp = now_stamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIME_FORMAT).is_ok());
    }
}
