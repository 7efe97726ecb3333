use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;

/// One row as delivered by the table store: a flat field name to value map.
pub type Row = serde_json::Map<String, Value>;

pub const RECRUITER_COLUMN: &str = "Reclutador";
pub const DATE_COLUMN: &str = "Fecha";
pub const WEEK_COLUMN: &str = "Semana";
pub const MONTH_COLUMN: &str = "Mes";
pub const WORKING_DAYS_COLUMN: &str = "Dias_Generales";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Publications,
    Contacts,
    Appointments,
    Interviews,
    Accepted,
    Hired,
}

impl Metric {
    /// Funnel order, widest stage first.
    pub const ALL: [Metric; 6] = [
        Metric::Publications,
        Metric::Contacts,
        Metric::Appointments,
        Metric::Interviews,
        Metric::Accepted,
        Metric::Hired,
    ];

    /// Column name used by the table store.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Publications => "Publicaciones",
            Metric::Contacts => "Contactos",
            Metric::Appointments => "Citas",
            Metric::Interviews => "Entrevistas",
            Metric::Accepted => "Aceptados",
            Metric::Hired => "Firmaron",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Publications => "Publications",
            Metric::Contacts => "Contacts",
            Metric::Appointments => "Appointments",
            Metric::Interviews => "Interviews",
            Metric::Accepted => "Accepted",
            Metric::Hired => "Hired",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counter values keyed by metric. A metric missing from the map is not
/// tracked by the source table, which is different from a tracked zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters(BTreeMap<Metric, u64>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_row(row: &Row) -> Self {
        let mut counters = Counters::new();
        for metric in Metric::ALL {
            if let Some(value) = row.get(metric.column()) {
                counters.set(metric, cell_count(value));
            }
        }
        counters
    }

    pub fn get(&self, metric: Metric) -> Option<u64> {
        self.0.get(&metric).copied()
    }

    /// Value of the metric, zero when untracked.
    pub fn value(&self, metric: Metric) -> u64 {
        self.get(metric).unwrap_or(0)
    }

    pub fn tracks(&self, metric: Metric) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn set(&mut self, metric: Metric, value: u64) {
        self.0.insert(metric, value);
    }

    pub fn add(&mut self, metric: Metric, value: u64) {
        *self.0.entry(metric).or_insert(0) += value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, u64)> + '_ {
        self.0.iter().map(|(metric, value)| (*metric, *value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {trimmed:?}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in {trimmed:?}"))?;
        let month: u32 = month
            .get(..2)
            .unwrap_or(month)
            .parse()
            .map_err(|_| format!("invalid month in {trimmed:?}"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month out of range in {trimmed:?}"))
    }
}

/// One observation for one recruiter over one day or one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub recruiter: String,
    pub date: Option<NaiveDate>,
    pub week: Option<u32>,
    pub month: Option<YearMonth>,
    pub counters: Counters,
}

impl ActivityRecord {
    /// Returns `None` when the row carries no recruiter.
    pub fn from_row(row: &Row) -> Option<Self> {
        let recruiter = cell_text(row.get(RECRUITER_COLUMN)?)?;
        Some(Self {
            recruiter,
            date: row.get(DATE_COLUMN).and_then(cell_date),
            week: row.get(WEEK_COLUMN).and_then(cell_week),
            month: row
                .get(MONTH_COLUMN)
                .and_then(cell_text)
                .and_then(|text| text.parse().ok()),
            counters: Counters::from_row(row),
        })
    }

    /// Short label for the period this record covers.
    pub fn period_label(&self) -> String {
        match (self.week, self.date) {
            (Some(week), _) => format!("W{week:02}"),
            (None, Some(date)) => date.to_string(),
            (None, None) => "-".to_string(),
        }
    }
}

/// Weekly targets for one recruiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRecord {
    pub recruiter: String,
    pub counters: Counters,
}

impl GoalRecord {
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            recruiter: cell_text(row.get(RECRUITER_COLUMN)?)?,
            counters: Counters::from_row(row),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingDays {
    pub recruiter: String,
    pub days: u32,
}

impl WorkingDays {
    pub fn from_row(row: &Row) -> Option<Self> {
        let recruiter = cell_text(row.get(RECRUITER_COLUMN)?)?;
        let days = row.get(WORKING_DAYS_COLUMN).map(cell_count)?;
        Some(Self {
            recruiter,
            days: u32::try_from(days).unwrap_or(u32::MAX),
        })
    }
}

/// Goal derived from a recruiter's own history for one weekly period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedGoal {
    pub recruiter: String,
    pub week: Option<u32>,
    pub month: Option<YearMonth>,
    pub date: Option<NaiveDate>,
    pub goals: BTreeMap<Metric, f64>,
}

impl DerivedGoal {
    pub fn goal(&self, metric: Metric) -> Option<f64> {
        self.goals.get(&metric).copied()
    }
}

pub fn parse_activity(rows: &[Row]) -> Vec<ActivityRecord> {
    rows.iter().filter_map(ActivityRecord::from_row).collect()
}

pub fn parse_goals(rows: &[Row]) -> Vec<GoalRecord> {
    rows.iter().filter_map(GoalRecord::from_row).collect()
}

pub fn parse_working_days(rows: &[Row]) -> Vec<WorkingDays> {
    rows.iter().filter_map(WorkingDays::from_row).collect()
}

/// Reads a counter cell. Blank or unreadable cells count as zero and
/// negative values clamp to zero.
pub fn cell_count(value: &Value) -> u64 {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.round() as u64,
        _ => 0,
    }
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        // Linked-record and lookup fields arrive as single-element arrays.
        Value::Array(items) => return items.first().and_then(cell_text),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_date(value: &Value) -> Option<NaiveDate> {
    let text = cell_text(value)?;
    NaiveDate::parse_from_str(text.get(..10).unwrap_or(text.as_str()), "%Y-%m-%d").ok()
}

/// Accepts `12`, `"12"`, `"W12"` or `"2025-W12"`.
fn cell_week(value: &Value) -> Option<u32> {
    let week = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text
            .trim()
            .rsplit(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse().ok()),
        _ => None,
    };
    week.filter(|week| (1..=53).contains(week))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn missing_columns_are_untracked() {
        let counters = Counters::from_row(&row(json!({
            "Reclutador": "Ana",
            "Firmaron": 3,
            "Contactos": "12"
        })));
        assert_eq!(counters.get(Metric::Hired), Some(3));
        assert_eq!(counters.get(Metric::Contacts), Some(12));
        assert_eq!(counters.get(Metric::Interviews), None);
        assert_eq!(counters.value(Metric::Interviews), 0);
    }

    #[test]
    fn bad_cells_read_as_zero() {
        assert_eq!(cell_count(&json!(null)), 0);
        assert_eq!(cell_count(&json!("n/a")), 0);
        assert_eq!(cell_count(&json!(-4)), 0);
        assert_eq!(cell_count(&json!(2.6)), 3);
    }

    #[test]
    fn activity_row_parses_period_markers() {
        let record = ActivityRecord::from_row(&row(json!({
            "Reclutador": ["Ana"],
            "Fecha": "2025-01-15T00:00:00.000Z",
            "Semana": "2025-W03",
            "Mes": "2025-01",
            "Firmaron": 1
        })))
        .expect("record");
        assert_eq!(record.recruiter, "Ana");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(record.week, Some(3));
        assert_eq!(record.month, YearMonth::new(2025, 1));
    }

    #[test]
    fn rows_without_recruiter_are_skipped() {
        let rows = vec![row(json!({"Firmaron": 2})), row(json!({"Reclutador": "Ana"}))];
        assert_eq!(parse_activity(&rows).len(), 1);
    }

    #[test]
    fn year_month_parses_and_steps_back() {
        let month: YearMonth = "2025-01".parse().expect("month");
        assert_eq!(month.previous(), YearMonth { year: 2024, month: 12 });
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert_eq!(month.to_string(), "2025-01");
    }
}
