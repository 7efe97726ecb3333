use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{ActivityRecord, YearMonth};

/// Calendar period a view is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day(NaiveDate),
    Week(u32),
    Month(YearMonth),
}

impl Period {
    /// An explicit week or month column wins over deriving it from the date.
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        match self {
            Period::Day(day) => record.date == Some(*day),
            Period::Week(week) => record
                .week
                .or_else(|| record.date.map(|date| date.iso_week().week()))
                .is_some_and(|found| found == *week),
            Period::Month(month) => record
                .month
                .or_else(|| record.date.map(YearMonth::of))
                .is_some_and(|found| found == *month),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Period::Day(day) => day.to_string(),
            Period::Week(week) => format!("week {week}"),
            Period::Month(month) => month.to_string(),
        }
    }
}

pub fn filter_period(records: &[ActivityRecord], period: &Period) -> Vec<ActivityRecord> {
    records
        .iter()
        .filter(|record| period.matches(record))
        .cloned()
        .collect()
}

pub fn filter_recruiter(records: &[ActivityRecord], recruiter: &str) -> Vec<ActivityRecord> {
    records
        .iter()
        .filter(|record| record.recruiter == recruiter)
        .cloned()
        .collect()
}

/// Records dated within `start..=end`. Undated records never match.
pub fn filter_date_range(
    records: &[ActivityRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ActivityRecord> {
    records
        .iter()
        .filter(|record| record.date.is_some_and(|date| date >= start && date <= end))
        .cloned()
        .collect()
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Days elapsed in the week up to and including `day`.
pub fn days_elapsed_in_week(day: NaiveDate) -> u32 {
    day.weekday().num_days_from_monday() + 1
}

/// Sorted, distinct recruiter names.
pub fn recruiters(records: &[ActivityRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.recruiter.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Ordering key for weekly history: ISO year/week from the date when one is
/// present, otherwise the explicit week number within the month's year.
///
/// A row with only a week number has no year and keys as year `0`. Such rows
/// sort ahead of every dated row, and a week-only table spanning a new year
/// orders week 1 before week 52. Tables that cross years need `Fecha` or `Mes`.
pub fn chronological_key(record: &ActivityRecord) -> Option<(i32, u32)> {
    if let Some(date) = record.date {
        let iso = date.iso_week();
        return Some((iso.year(), iso.week()));
    }
    record
        .week
        .map(|week| (record.month.map(|month| month.year).unwrap_or(0), week))
}

/// The record covering the ISO week of `day`.
///
/// Rows that carry a year must match it. A bare week number is only used
/// when no row carries the full year and week.
pub fn find_week(records: &[ActivityRecord], day: NaiveDate) -> Option<&ActivityRecord> {
    let iso = day.iso_week();
    let key = (iso.year(), iso.week());
    records
        .iter()
        .find(|record| chronological_key(record) == Some(key))
        .or_else(|| {
            records.iter().find(|record| {
                record.date.is_none() && record.month.is_none() && record.week == Some(key.1)
            })
        })
}

/// Stable sort; records without any period marker keep their input order
/// relative to each other and sort first.
pub fn sort_chronologically(records: &mut [ActivityRecord]) {
    records.sort_by_key(chronological_key);
}

/// The trailing `n` records of one recruiter in period order.
pub fn last_n(records: &[ActivityRecord], recruiter: &str, n: usize) -> Vec<ActivityRecord> {
    let mut own = filter_recruiter(records, recruiter);
    sort_chronologically(&mut own);
    let skip = own.len().saturating_sub(n);
    own.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counters, Metric};

    fn daily(recruiter: &str, y: i32, m: u32, d: u32, hired: u64) -> ActivityRecord {
        let mut counters = Counters::new();
        counters.set(Metric::Hired, hired);
        ActivityRecord {
            recruiter: recruiter.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d),
            week: None,
            month: None,
            counters,
        }
    }

    fn weekly(recruiter: &str, week: u32, hired: u64) -> ActivityRecord {
        let mut record = daily(recruiter, 2025, 1, 1, hired);
        record.date = None;
        record.week = Some(week);
        record
    }

    #[test]
    fn day_filter_returns_only_that_date() {
        let records = vec![
            daily("Ana", 2025, 1, 14, 1),
            daily("Ana", 2025, 1, 15, 2),
            daily("Luis", 2025, 1, 15, 3),
        ];
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        let found = filter_period(&records, &Period::Day(day));
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|record| record.date == Some(day)));

        let missing = NaiveDate::from_ymd_opt(2025, 2, 1).expect("date");
        assert!(filter_period(&records, &Period::Day(missing)).is_empty());
    }

    #[test]
    fn explicit_week_column_takes_precedence() {
        // 2025-01-15 is ISO week 3, but the row says week 7.
        let mut record = daily("Ana", 2025, 1, 15, 1);
        record.week = Some(7);
        assert!(Period::Week(7).matches(&record));
        assert!(!Period::Week(3).matches(&record));

        let derived = daily("Ana", 2025, 1, 15, 1);
        assert!(Period::Week(3).matches(&derived));
    }

    #[test]
    fn month_matches_column_or_date() {
        let january = YearMonth::new(2025, 1).expect("month");
        let mut explicit = weekly("Ana", 5, 1);
        explicit.month = Some(january);
        assert!(Period::Month(january).matches(&explicit));
        assert!(Period::Month(january).matches(&daily("Ana", 2025, 1, 31, 0)));
        assert!(!Period::Month(january).matches(&daily("Ana", 2025, 2, 1, 0)));
        assert!(!Period::Month(january).matches(&weekly("Ana", 5, 1)));
    }

    #[test]
    fn week_helpers_anchor_on_monday() {
        let wednesday = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        assert_eq!(week_start(wednesday), NaiveDate::from_ymd_opt(2025, 1, 13).expect("date"));
        assert_eq!(days_elapsed_in_week(wednesday), 3);
    }

    #[test]
    fn last_n_keeps_trailing_periods() {
        let records = vec![
            weekly("Ana", 3, 3),
            weekly("Luis", 1, 9),
            weekly("Ana", 1, 1),
            weekly("Ana", 2, 2),
        ];
        let tail = last_n(&records, "Ana", 2);
        let weeks: Vec<_> = tail.iter().map(|record| record.week).collect();
        assert_eq!(weeks, vec![Some(2), Some(3)]);
    }

    #[test]
    fn find_week_matches_year_and_week() {
        let in_year = |year: i32, week: u32, hired: u64| {
            let mut record = weekly("Ana", week, hired);
            record.month = YearMonth::new(year, 1);
            record
        };
        let wednesday = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        let records = vec![in_year(2024, 3, 7), in_year(2025, 3, 2)];
        let found = find_week(&records, wednesday).expect("week 3");
        assert_eq!(found.counters.value(Metric::Hired), 2);

        let dated = vec![daily("Ana", 2024, 1, 17, 7), daily("Ana", 2025, 1, 13, 2)];
        let found = find_week(&dated, wednesday).expect("week 3");
        assert_eq!(found.date, NaiveDate::from_ymd_opt(2025, 1, 13));

        let bare = vec![weekly("Ana", 2, 1), weekly("Ana", 3, 5)];
        let found = find_week(&bare, wednesday).expect("week 3");
        assert_eq!(found.counters.value(Metric::Hired), 5);

        assert!(find_week(&[in_year(2024, 3, 7)], wednesday).is_none());
    }

    #[test]
    fn week_only_rows_sort_before_dated_rows() {
        let mut records = vec![daily("Ana", 2025, 1, 6, 1), weekly("Ana", 52, 2)];
        sort_chronologically(&mut records);
        assert_eq!(records[0].week, Some(52));
    }

    #[test]
    fn recruiters_are_sorted_and_distinct() {
        let records = vec![
            daily("Luis", 2025, 1, 1, 0),
            daily("Ana", 2025, 1, 1, 0),
            daily("Luis", 2025, 1, 2, 0),
        ];
        assert_eq!(recruiters(&records), vec!["Ana".to_string(), "Luis".to_string()]);
    }
}
