use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::models::{
    Metric, Row, YearMonth, DATE_COLUMN, MONTH_COLUMN, RECRUITER_COLUMN, WEEK_COLUMN,
    WORKING_DAYS_COLUMN,
};
use crate::period::week_start;
use crate::source::Table;

pub const MOCK_RECRUITERS: [&str; 4] = [
    "Ana García",
    "Carlos López",
    "María Rodríguez",
    "Jorge Martínez",
];

/// Share of weekday volume produced on Saturdays and Sundays.
const WEEKEND_FACTOR: f64 = 0.2;

/// Synthetic tables with the same columns as the live store.
#[derive(Debug, Clone, Default)]
pub struct MockData {
    pub daily: Vec<Row>,
    pub weekly: Vec<Row>,
    pub goals: Vec<Row>,
    pub working_days: Vec<Row>,
}

impl MockData {
    pub fn rows(&self, table: Table) -> Vec<Row> {
        match table {
            Table::DailyMetrics => self.daily.clone(),
            Table::WeeklyMetrics => self.weekly.clone(),
            Table::WeeklyGoals => self.goals.clone(),
            Table::WorkingDays => self.working_days.clone(),
        }
    }
}

/// Generates `weeks` full weeks of activity ending on the week of `end`.
/// The same seed always yields the same tables.
pub fn generate(end: NaiveDate, weeks: u32, seed: u64) -> MockData {
    let mut rng = StdRng::seed_from_u64(seed);
    let first_day = week_start(end) - Duration::weeks(i64::from(weeks.max(1)) - 1);
    let mut data = MockData::default();

    for recruiter in MOCK_RECRUITERS {
        let skill: f64 = rng.gen_range(0.7..1.3);
        let mut weeks_by_start: BTreeMap<NaiveDate, [u64; 6]> = BTreeMap::new();

        let mut day = first_day;
        while day <= end {
            let counts = daily_counts(&mut rng, day, skill);
            let week = weeks_by_start.entry(week_start(day)).or_insert([0; 6]);
            for (total, value) in week.iter_mut().zip(counts) {
                *total += value;
            }
            data.daily.push(activity_row(recruiter, &counts, |row| {
                row.insert(DATE_COLUMN.to_string(), json!(day.to_string()));
            }));
            day += Duration::days(1);
        }

        for (start, counts) in weeks_by_start {
            data.weekly.push(activity_row(recruiter, &counts, |row| {
                row.insert(DATE_COLUMN.to_string(), json!(start.to_string()));
                row.insert(WEEK_COLUMN.to_string(), json!(start.iso_week().week()));
                row.insert(MONTH_COLUMN.to_string(), json!(YearMonth::of(start).to_string()));
            }));
        }

        let hired_goal: u64 = rng.gen_range(15..=25);
        let goal_counts = [
            hired_goal * 12,
            hired_goal * 8,
            hired_goal * 3,
            hired_goal * 2,
            hired_goal + hired_goal / 2,
            hired_goal,
        ];
        data.goals.push(activity_row(recruiter, &goal_counts, |_| {}));

        let mut config = Row::new();
        config.insert(RECRUITER_COLUMN.to_string(), json!(recruiter));
        config.insert(
            WORKING_DAYS_COLUMN.to_string(),
            json!(if rng.gen_bool(0.25) { 6 } else { 5 }),
        );
        data.working_days.push(config);
    }

    data
}

/// Funnel counts for one day, in `Metric::ALL` order.
fn daily_counts(rng: &mut StdRng, day: NaiveDate, skill: f64) -> [u64; 6] {
    let volume = match day.weekday() {
        Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
        _ => 1.0,
    };
    let publications = f64::from(rng.gen_range(8u32..=16)) * volume * skill;
    let contacts = publications * rng.gen_range(2.0..4.0);
    let appointments = contacts * rng.gen_range(0.25..0.45);
    let interviews = appointments * rng.gen_range(0.6..0.9);
    let accepted = interviews * rng.gen_range(0.3..0.6);
    let hired = accepted * rng.gen_range(0.5..0.9);
    [publications, contacts, appointments, interviews, accepted, hired]
        .map(|value| value.round() as u64)
}

fn activity_row(recruiter: &str, counts: &[u64; 6], extra: impl FnOnce(&mut Row)) -> Row {
    let mut row = Row::new();
    row.insert(RECRUITER_COLUMN.to_string(), Value::from(recruiter));
    for (metric, value) in Metric::ALL.into_iter().zip(counts) {
        row.insert(metric.column().to_string(), json!(value));
    }
    extra(&mut row);
    row
}
