//! View models for the daily, weekly, monthly and department dashboards.
//!
//! Builders only compute values; every bit of formatting and styling lives in
//! the renderers.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::aggregate::{group_totals, totals, tracked_metrics, GroupKey, GroupLabel};
use crate::goals::{self, derive_goals, goal_for, weekly_goal, working_days, WEEKS_PER_MONTH};
use crate::kpi::{self, Tone};
use crate::models::{ActivityRecord, Counters, Metric, YearMonth};
use crate::period::{
    days_elapsed_in_week, filter_date_range, filter_period, filter_recruiter, find_week, last_n,
    sort_chronologically, week_start, Period,
};
use crate::source::Dataset;

const TREND_WEEKS: usize = 8;
const MONTH_BLOCK_WEEKS: usize = WEEKS_PER_MONTH as usize;
const EVOLUTION_METRICS: [Metric; 4] = [
    Metric::Publications,
    Metric::Contacts,
    Metric::Interviews,
    Metric::Hired,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CardValue {
    Count(u64),
    Percent(f64),
    Decimal(f64),
    Flag(bool),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub label: &'static str,
    pub value: CardValue,
    pub subtitle: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Text(String),
    Count(u64),
    Number(f64),
    /// `None` renders as not applicable.
    Percent(Option<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Funnel,
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub series: Vec<Series>,
    /// Horizontal goal line, when the chart has one.
    pub reference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub tone: Tone,
    pub text: String,
}

impl Note {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct View {
    pub title: String,
    pub subtitle: String,
    pub cards: Vec<Card>,
    pub tables: Vec<Table>,
    pub charts: Vec<Chart>,
    pub notes: Vec<Note>,
}

impl View {
    fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            ..Self::default()
        }
    }
}

/// The requested recruiter, or the first one alphabetically.
pub fn resolve_recruiter(data: &Dataset, requested: Option<&str>) -> Result<String, String> {
    let known = data.recruiters();
    match requested {
        Some(name) if known.iter().any(|known| known == name) => Ok(name.to_string()),
        Some(name) => Err(format!("Unknown recruiter {name:?}.")),
        None => known
            .into_iter()
            .next()
            .ok_or_else(|| "No recruiters found in the data store.".to_string()),
    }
}

pub fn daily_view(data: &Dataset, recruiter: &str, day: NaiveDate) -> View {
    let mut view = View::new(
        "Daily dashboard",
        format!("{recruiter} · {}", day.format("%A, %d %B %Y")),
    );

    let own = filter_recruiter(&data.daily, recruiter);
    let today = filter_period(&own, &Period::Day(day));
    let days = working_days(&data.working_days, recruiter);
    let weekly_hired_goal = weekly_goal(&data.goals, recruiter, Metric::Hired);
    let daily_goal = goals::daily_goal(weekly_hired_goal, days);

    let hired_today = totals(&today).value(Metric::Hired);
    let week_to_date = filter_date_range(&own, week_start(day), day);
    let accumulated = totals(&week_to_date).value(Metric::Hired);
    let projected = kpi::projection(accumulated, days_elapsed_in_week(day), days);

    let compliance = if daily_goal > 0.0 {
        hired_today as f64 / daily_goal * 100.0
    } else {
        0.0
    };
    let met_today = hired_today as f64 >= daily_goal;
    let will_reach = projected as f64 >= weekly_hired_goal;

    view.cards = vec![
        Card {
            label: "DAILY GOAL",
            value: CardValue::Decimal(daily_goal),
            subtitle: format!("Based on {days} working days"),
            tone: Tone::Neutral,
        },
        Card {
            label: "ACHIEVED TODAY",
            value: CardValue::Count(hired_today),
            subtitle: format!("{compliance:.0}% of goal"),
            tone: kpi::effectiveness_tone(compliance),
        },
        Card {
            label: "GOAL MET TODAY",
            value: CardValue::Flag(met_today),
            subtitle: format!("{hired_today} of {}", daily_goal.trunc()),
            tone: kpi::met_tone(met_today),
        },
        Card {
            label: "WEEKLY PROJECTION",
            value: CardValue::Count(projected),
            subtitle: if will_reach {
                "Will reach the weekly goal".to_string()
            } else {
                "Will not reach the weekly goal".to_string()
            },
            tone: kpi::met_tone(will_reach),
        },
    ];

    if today.is_empty() {
        view.notes
            .push(Note::new(Tone::Neutral, "No activity recorded for this day."));
    } else {
        let achieved = totals(&today);
        let rows = tracked_metrics(&today)
            .into_iter()
            .map(|metric| {
                let goal = goals::daily_goal(weekly_goal(&data.goals, recruiter, metric), days);
                let value = achieved.value(metric);
                vec![
                    Cell::Text(metric.label().to_string()),
                    Cell::Number(goal),
                    Cell::Count(value),
                    Cell::Number(value as f64 - goal),
                    Cell::Percent((goal > 0.0).then(|| kpi::ratio_percent(value as f64, goal))),
                ]
            })
            .collect();
        view.tables.push(Table {
            title: "Metrics for the day".to_string(),
            columns: columns(&["Metric", "Daily goal", "Achieved", "Difference", "Compliance"]),
            rows,
        });
    }

    let message = format!(
        "At the current pace the week closes with {projected} hires (goal {weekly_hired_goal})."
    );
    view.notes.push(if will_reach {
        Note::new(Tone::Good, message)
    } else {
        Note::new(Tone::Warning, format!("{message} The pace needs to increase."))
    });

    view
}

pub fn weekly_view(data: &Dataset, recruiter: &str, day: NaiveDate) -> View {
    let start = week_start(day);
    let mut view = View::new(
        "Weekly dashboard",
        format!(
            "{recruiter} · week {} ({} to {})",
            day.iso_week().week(),
            start.format("%d/%m/%Y"),
            (start + Duration::days(6)).format("%d/%m/%Y")
        ),
    );

    let own = filter_recruiter(&data.daily, recruiter);
    let week = filter_date_range(&own, start, day);
    let achieved = totals(&week);
    let hired = achieved.value(Metric::Hired) as f64;
    let goal = weekly_goal(&data.goals, recruiter, Metric::Hired);

    let effectiveness = kpi::effectiveness(hired, goal);
    let productivity = kpi::productivity(hired, achieved.value(Metric::Contacts) as f64);
    let quality = kpi::quality(hired, achieved.value(Metric::Interviews) as f64);
    let met = hired >= goal;

    view.cards = vec![
        Card {
            label: "EFFECTIVENESS",
            value: CardValue::Percent(effectiveness),
            subtitle: format!("{hired} of {goal}"),
            tone: kpi::effectiveness_tone(effectiveness),
        },
        Card {
            label: "PRODUCTIVITY",
            value: CardValue::Percent(productivity),
            subtitle: "Hired / contacts".to_string(),
            tone: kpi::productivity_tone(productivity),
        },
        Card {
            label: "QUALITY",
            value: CardValue::Percent(quality),
            subtitle: "Interview conversion".to_string(),
            tone: kpi::quality_tone(quality),
        },
        Card {
            label: "GOAL MET",
            value: CardValue::Flag(met),
            subtitle: format!("{effectiveness}% compliance"),
            tone: kpi::met_tone(met),
        },
    ];

    if week.is_empty() {
        view.notes
            .push(Note::new(Tone::Neutral, "No activity recorded for this week."));
    } else {
        view.charts.push(funnel("Recruitment funnel", &week, &achieved));
    }

    let history = last_n(&data.weekly, recruiter, TREND_WEEKS);
    if history.iter().any(|record| record.week.is_some() || record.date.is_some()) {
        view.charts.push(Chart {
            title: format!("Hired, last {TREND_WEEKS} weeks"),
            kind: ChartKind::Line,
            series: vec![series(Metric::Hired, &history)],
            reference: Some(goal),
        });
    } else {
        view.notes
            .push(Note::new(Tone::Neutral, "Not enough weekly history for a trend."));
    }

    if let Some(table) = rolling_goal_table(data, recruiter, day, &achieved) {
        view.tables.push(table);
    }

    view
}

/// Rolling goals for the week containing `day`, against week-to-date totals.
fn rolling_goal_table(
    data: &Dataset,
    recruiter: &str,
    day: NaiveDate,
    achieved: &Counters,
) -> Option<Table> {
    let own = filter_recruiter(&data.weekly, recruiter);
    let current = find_week(&own, day)?;
    let derived = derive_goals(&own);
    let goal = goal_for(&derived, current)?;

    let rows = goal
        .goals
        .iter()
        .map(|(metric, target)| {
            let value = achieved.value(*metric);
            vec![
                Cell::Text(metric.label().to_string()),
                Cell::Number(*target),
                Cell::Count(value),
                Cell::Percent((*target > 0.0).then(|| kpi::ratio_percent(value as f64, *target))),
            ]
        })
        .collect();

    Some(Table {
        title: "Rolling goals".to_string(),
        columns: columns(&["Metric", "Rolling goal", "Achieved", "Compliance"]),
        rows,
    })
}

/// Without a month, the latest four weekly rows stand in for "this month".
pub fn monthly_view(data: &Dataset, recruiter: &str, month: Option<YearMonth>) -> View {
    let mut view = View::new(
        "Monthly dashboard",
        match month {
            Some(month) => format!("{recruiter} · {month}"),
            None => format!("{recruiter} · last {MONTH_BLOCK_WEEKS} weeks"),
        },
    );

    let mut own = filter_recruiter(&data.weekly, recruiter);
    sort_chronologically(&mut own);
    let (current, previous) = match month {
        Some(month) => (
            filter_period(&own, &Period::Month(month)),
            filter_period(&own, &Period::Month(month.previous())),
        ),
        None => {
            let split = own.len().saturating_sub(MONTH_BLOCK_WEEKS);
            let previous_start = split.saturating_sub(MONTH_BLOCK_WEEKS);
            (own[split..].to_vec(), own[previous_start..split].to_vec())
        }
    };

    if current.is_empty() {
        view.notes
            .push(Note::new(Tone::Warning, "No data available for this month."));
        return view;
    }

    let total = totals(&current);
    let total_hired = total.value(Metric::Hired) as f64;
    let monthly_goal = goals::monthly_goal(&data.goals, recruiter);
    let effectiveness = kpi::effectiveness(total_hired, monthly_goal);
    let weekly_average = total_hired / current.len() as f64;
    let weekly_target = weekly_goal(&data.goals, recruiter, Metric::Hired);
    let above = weekly_average >= weekly_target;

    let previous_hired = totals(&previous).value(Metric::Hired) as f64;
    let change = kpi::period_change(total_hired, previous_hired);

    view.cards = vec![
        Card {
            label: "MONTHLY EFFECTIVENESS",
            value: CardValue::Percent(effectiveness),
            subtitle: format!("{} weeks", current.len()),
            tone: kpi::effectiveness_tone(effectiveness),
        },
        Card {
            label: "TOTAL HIRED",
            value: CardValue::Count(total.value(Metric::Hired)),
            subtitle: format!("Goal: {monthly_goal}"),
            tone: Tone::Neutral,
        },
        Card {
            label: "WEEKLY AVERAGE",
            value: CardValue::Decimal(kpi::round_to(weekly_average, 1)),
            subtitle: if above {
                "Above goal".to_string()
            } else {
                "Below goal".to_string()
            },
            tone: kpi::met_tone(above),
        },
        match change {
            Some(change) => Card {
                label: "VS PREVIOUS MONTH",
                value: CardValue::Percent(change),
                subtitle: if change >= 0.0 {
                    "Improving".to_string()
                } else {
                    "Declining".to_string()
                },
                tone: kpi::met_tone(change >= 0.0),
            },
            None => Card {
                label: "VS PREVIOUS MONTH",
                value: CardValue::Missing,
                subtitle: "No previous data".to_string(),
                tone: Tone::Neutral,
            },
        },
    ];

    let recent = last_n(&own, recruiter, TREND_WEEKS);
    let recent_metrics = tracked_metrics(&recent);
    view.charts.push(Chart {
        title: format!("Metric evolution, last {TREND_WEEKS} weeks"),
        kind: ChartKind::Line,
        series: EVOLUTION_METRICS
            .into_iter()
            .filter(|metric| recent_metrics.contains(metric))
            .map(|metric| series(metric, &recent))
            .collect(),
        reference: None,
    });

    let summary_metrics: Vec<Metric> = EVOLUTION_METRICS
        .into_iter()
        .filter(|metric| tracked_metrics(&current).contains(metric))
        .collect();
    let mut header = vec!["Week".to_string()];
    header.extend(summary_metrics.iter().map(|metric| metric.label().to_string()));
    view.tables.push(Table {
        title: "Weekly summary".to_string(),
        columns: header,
        rows: current
            .iter()
            .map(|record| {
                let mut row = vec![Cell::Text(record.period_label())];
                row.extend(
                    summary_metrics
                        .iter()
                        .map(|metric| Cell::Count(record.counters.value(*metric))),
                );
                row
            })
            .collect(),
    });

    view
}

/// Team roll-up for one period, built from the daily table.
pub fn department_view(data: &Dataset, period: Period) -> View {
    let mut view = View::new("Department dashboard", period.label());
    let records = filter_period(&data.daily, &period);
    if records.is_empty() {
        view.notes
            .push(Note::new(Tone::Warning, "No activity recorded for this period."));
        return view;
    }

    let team = totals(&records);
    let per_recruiter = group_totals(&records, GroupKey::Recruiter);
    let goal_of = |recruiter: &str| {
        let weekly = weekly_goal(&data.goals, recruiter, Metric::Hired);
        match period {
            Period::Day(_) => {
                goals::daily_goal(weekly, working_days(&data.working_days, recruiter))
            }
            Period::Week(_) => weekly,
            Period::Month(_) => weekly * f64::from(WEEKS_PER_MONTH),
        }
    };

    let team_goal: f64 = per_recruiter
        .iter()
        .map(|group| goal_of(&group.label.to_string()))
        .sum();
    let hired = team.value(Metric::Hired) as f64;
    let effectiveness = kpi::effectiveness(hired, team_goal);
    let productivity = kpi::productivity(hired, team.value(Metric::Contacts) as f64);
    let quality = kpi::quality(hired, team.value(Metric::Interviews) as f64);

    view.cards = vec![
        Card {
            label: "TEAM HIRED",
            value: CardValue::Count(team.value(Metric::Hired)),
            subtitle: format!("{} recruiters", per_recruiter.len()),
            tone: Tone::Neutral,
        },
        Card {
            label: "TEAM EFFECTIVENESS",
            value: CardValue::Percent(effectiveness),
            subtitle: format!("Goal: {}", kpi::round_to(team_goal, 1)),
            tone: kpi::effectiveness_tone(effectiveness),
        },
        Card {
            label: "TEAM PRODUCTIVITY",
            value: CardValue::Percent(productivity),
            subtitle: "Hired / contacts".to_string(),
            tone: kpi::productivity_tone(productivity),
        },
        Card {
            label: "TEAM QUALITY",
            value: CardValue::Percent(quality),
            subtitle: "Interview conversion".to_string(),
            tone: kpi::quality_tone(quality),
        },
    ];

    view.charts.push(funnel("Team funnel", &records, &team));

    let mut ranking = per_recruiter;
    ranking.sort_by(|a, b| {
        b.counters
            .value(Metric::Hired)
            .cmp(&a.counters.value(Metric::Hired))
            .then_with(|| a.label.cmp(&b.label))
    });
    view.tables.push(Table {
        title: "Recruiter ranking".to_string(),
        columns: columns(&[
            "Recruiter",
            "Hired",
            "Goal",
            "Effectiveness",
            "Productivity",
            "Quality",
        ]),
        rows: ranking
            .iter()
            .map(|group| {
                let name = group.label.to_string();
                let hired = group.counters.value(Metric::Hired) as f64;
                let goal = goal_of(&name);
                vec![
                    Cell::Text(name),
                    Cell::Count(group.counters.value(Metric::Hired)),
                    Cell::Number(goal),
                    Cell::Percent(Some(kpi::effectiveness(hired, goal))),
                    Cell::Percent(group.counters.get(Metric::Contacts).map(|contacts| {
                        kpi::productivity(hired, contacts as f64)
                    })),
                    Cell::Percent(group.counters.get(Metric::Interviews).map(|interviews| {
                        kpi::quality(hired, interviews as f64)
                    })),
                ]
            })
            .collect(),
    });

    if !matches!(period, Period::Day(_)) {
        let by_date = group_totals(&records, GroupKey::Date);
        view.charts.push(Chart {
            title: "Hired per day".to_string(),
            kind: ChartKind::Bar,
            series: vec![Series {
                name: Metric::Hired.label().to_string(),
                points: by_date
                    .iter()
                    .map(|group| {
                        let label = match &group.label {
                            GroupLabel::Date(date) => date.format("%Y-%m-%d").to_string(),
                            other => other.to_string(),
                        };
                        (label, group.counters.value(Metric::Hired) as f64)
                    })
                    .collect(),
            }],
            reference: None,
        });
    }

    view
}

/// Rolling goals for every weekly period of one recruiter, or of everyone.
pub fn goals_view(data: &Dataset, recruiter: Option<&str>) -> View {
    let history = match recruiter {
        Some(name) => filter_recruiter(&data.weekly, name),
        None => data.weekly.clone(),
    };
    let mut view = View::new(
        "Rolling goals",
        recruiter.unwrap_or("All recruiters").to_string(),
    );
    if history.is_empty() {
        view.notes
            .push(Note::new(Tone::Warning, "No weekly history available."));
        return view;
    }

    let metrics = tracked_metrics(&history);
    let derived = derive_goals(&history);
    let mut header = columns(&["Recruiter", "Week"]);
    header.extend(metrics.iter().map(|metric| metric.label().to_string()));
    // Pinned metrics carry a goal even when the table does not track them.
    for metric in goals::PINNED_METRICS {
        if !metrics.contains(&metric) {
            header.push(metric.label().to_string());
        }
    }

    view.tables.push(Table {
        title: "Derived weekly goals".to_string(),
        columns: header,
        rows: derived
            .iter()
            .map(|goal| {
                let record = ActivityRecord {
                    recruiter: goal.recruiter.clone(),
                    date: goal.date,
                    week: goal.week,
                    month: goal.month,
                    counters: Counters::new(),
                };
                let mut row = vec![
                    Cell::Text(goal.recruiter.clone()),
                    Cell::Text(record.period_label()),
                ];
                row.extend(
                    metrics
                        .iter()
                        .map(|metric| Cell::Number(goal.goal(*metric).unwrap_or(0.0))),
                );
                for metric in goals::PINNED_METRICS {
                    if !metrics.contains(&metric) {
                        row.push(Cell::Number(goal.goal(metric).unwrap_or(0.0)));
                    }
                }
                row
            })
            .collect(),
    });

    view
}

fn funnel(title: &str, records: &[ActivityRecord], achieved: &Counters) -> Chart {
    Chart {
        title: title.to_string(),
        kind: ChartKind::Funnel,
        series: vec![Series {
            name: "Achieved".to_string(),
            points: tracked_metrics(records)
                .into_iter()
                .map(|metric| (metric.label().to_string(), achieved.value(metric) as f64))
                .collect(),
        }],
        reference: None,
    }
}

fn series(metric: Metric, records: &[ActivityRecord]) -> Series {
    Series {
        name: metric.label().to_string(),
        points: records
            .iter()
            .map(|record| (record.period_label(), record.counters.value(metric) as f64))
            .collect(),
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
