use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ActivityRecord, Counters, Metric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Recruiter,
    Date,
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    Recruiter(String),
    Date(NaiveDate),
    Team,
}

impl std::fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupLabel::Recruiter(name) => f.write_str(name),
            GroupLabel::Date(date) => write!(f, "{date}"),
            GroupLabel::Team => f.write_str("Team"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals {
    pub label: GroupLabel,
    pub counters: Counters,
}

/// Metrics tracked by at least one record, in funnel order.
pub fn tracked_metrics(records: &[ActivityRecord]) -> Vec<Metric> {
    Metric::ALL
        .into_iter()
        .filter(|metric| records.iter().any(|record| record.counters.tracks(*metric)))
        .collect()
}

/// Sums every tracked counter per group.
///
/// A metric tracked anywhere in the input appears in every output row; a
/// metric tracked nowhere appears in none. Records without a date are left
/// out of date groups. The team rollup always yields exactly one row.
pub fn group_totals(records: &[ActivityRecord], key: GroupKey) -> Vec<GroupTotals> {
    let metrics = tracked_metrics(records);
    let mut groups: BTreeMap<GroupLabel, Counters> = BTreeMap::new();

    if key == GroupKey::Team {
        groups.insert(GroupLabel::Team, zeroed(&metrics));
    }

    for record in records {
        let label = match key {
            GroupKey::Recruiter => GroupLabel::Recruiter(record.recruiter.clone()),
            GroupKey::Date => match record.date {
                Some(date) => GroupLabel::Date(date),
                None => continue,
            },
            GroupKey::Team => GroupLabel::Team,
        };
        let entry = groups.entry(label).or_insert_with(|| zeroed(&metrics));
        for (metric, value) in record.counters.iter() {
            entry.add(metric, value);
        }
    }

    groups
        .into_iter()
        .map(|(label, counters)| GroupTotals { label, counters })
        .collect()
}

/// Team-wide totals of the record set.
pub fn totals(records: &[ActivityRecord]) -> Counters {
    group_totals(records, GroupKey::Team)
        .into_iter()
        .next()
        .map(|group| group.counters)
        .unwrap_or_default()
}

fn zeroed(metrics: &[Metric]) -> Counters {
    let mut counters = Counters::new();
    for metric in metrics {
        counters.set(*metric, 0);
    }
    counters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(recruiter: &str, day: u32, values: &[(Metric, u64)]) -> ActivityRecord {
        let mut counters = Counters::new();
        for (metric, value) in values {
            counters.set(*metric, *value);
        }
        ActivityRecord {
            recruiter: recruiter.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, day),
            week: None,
            month: None,
            counters,
        }
    }

    #[test]
    fn sums_per_recruiter_and_omits_absent_columns() {
        let records = vec![
            record("Ana", 13, &[(Metric::Hired, 2), (Metric::Contacts, 10)]),
            record("Luis", 13, &[(Metric::Hired, 1), (Metric::Contacts, 4)]),
            record("Ana", 14, &[(Metric::Hired, 3), (Metric::Contacts, 6)]),
        ];
        let groups = group_totals(&records, GroupKey::Recruiter);
        assert_eq!(groups.len(), 2);

        let ana = &groups[0];
        assert_eq!(ana.label, GroupLabel::Recruiter("Ana".to_string()));
        assert_eq!(ana.counters.get(Metric::Hired), Some(5));
        assert_eq!(ana.counters.get(Metric::Contacts), Some(16));
        assert_eq!(ana.counters.get(Metric::Interviews), None);

        let luis = &groups[1];
        assert_eq!(luis.counters.get(Metric::Hired), Some(1));
        assert_eq!(luis.counters.get(Metric::Contacts), Some(4));
    }

    #[test]
    fn partially_tracked_columns_appear_in_every_group() {
        let records = vec![
            record("Ana", 13, &[(Metric::Hired, 2), (Metric::Interviews, 5)]),
            record("Luis", 13, &[(Metric::Hired, 1)]),
        ];
        let groups = group_totals(&records, GroupKey::Recruiter);
        assert_eq!(groups[1].counters.get(Metric::Interviews), Some(0));
    }

    #[test]
    fn groups_by_date() {
        let records = vec![
            record("Ana", 14, &[(Metric::Hired, 2)]),
            record("Luis", 13, &[(Metric::Hired, 1)]),
            record("Ana", 13, &[(Metric::Hired, 4)]),
        ];
        let groups = group_totals(&records, GroupKey::Date);
        let hired: Vec<_> = groups
            .iter()
            .map(|group| group.counters.value(Metric::Hired))
            .collect();
        assert_eq!(hired, vec![5, 2]);
    }

    #[test]
    fn empty_input_rolls_up_to_one_empty_row() {
        let groups = group_totals(&[], GroupKey::Team);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].counters, Counters::new());
        assert!(group_totals(&[], GroupKey::Recruiter).is_empty());
        assert_eq!(totals(&[]).value(Metric::Hired), 0);
    }
}
