// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota accounting windows. All windows are UTC calendar periods.

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use mindlog_core::WindowKind;

/// Identifier of the window containing `now`: `YYYY-MM-DD` or `YYYY-MM`.
pub fn window_key(kind: WindowKind, now: DateTime<Utc>) -> String {
    match kind {
        WindowKind::Daily => now.format("%Y-%m-%d").to_string(),
        WindowKind::Monthly => now.format("%Y-%m").to_string(),
    }
}

/// First instant of the window containing `now`.
pub fn window_start(kind: WindowKind, now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let first = match kind {
        WindowKind::Daily => date,
        WindowKind::Monthly => date.with_day(1).unwrap_or(date),
    };
    first.and_time(NaiveTime::MIN).and_utc()
}

/// First instant of the next window.
pub fn window_end(kind: WindowKind, now: DateTime<Utc>) -> DateTime<Utc> {
    let start = window_start(kind, now);
    match kind {
        WindowKind::Daily => start + Duration::days(1),
        WindowKind::Monthly => start
            .checked_add_months(Months::new(1))
            .unwrap_or(start + Duration::days(31)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn daily_window() {
        let now = at("2026-03-10T23:59:59Z");
        assert_eq!(window_key(WindowKind::Daily, now), "2026-03-10");
        assert_eq!(window_start(WindowKind::Daily, now), at("2026-03-10T00:00:00Z"));
        assert_eq!(window_end(WindowKind::Daily, now), at("2026-03-11T00:00:00Z"));
    }

    #[test]
    fn monthly_window_rolls_over_year() {
        let now = at("2026-12-31T10:00:00Z");
        assert_eq!(window_key(WindowKind::Monthly, now), "2026-12");
        assert_eq!(window_start(WindowKind::Monthly, now), at("2026-12-01T00:00:00Z"));
        assert_eq!(window_end(WindowKind::Monthly, now), at("2027-01-01T00:00:00Z"));
    }

    #[test]
    fn non_utc_offsets_are_normalised() {
        let now = DateTime::parse_from_rfc3339("2026-03-11T01:30:00+03:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(window_key(WindowKind::Daily, now), "2026-03-10");
    }
}
