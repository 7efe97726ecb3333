use std::collections::BTreeMap;

use crate::aggregate::tracked_metrics;
use crate::models::{ActivityRecord, DerivedGoal, GoalRecord, Metric, WorkingDays};
use crate::period::sort_chronologically;

/// Trailing periods averaged into a rolling goal.
pub const ROLLING_WINDOW: usize = 2;
/// Metrics whose goal is fixed business policy rather than history.
pub const PINNED_METRICS: [Metric; 2] = [Metric::Accepted, Metric::Hired];
pub const PINNED_GOAL: f64 = 1.0;

pub const DEFAULT_WEEKLY_GOAL: f64 = 25.0;
pub const DEFAULT_WORKING_DAYS: u32 = 5;
pub const WEEKS_PER_MONTH: u32 = 4;

/// Rolling mean of each recruiter's own previous periods.
///
/// The goal for period `p` averages periods `p-2` and `p-1` and never looks at
/// `p` itself. Periods without a full window, or whose window has an
/// untracked cell, get `0`. Output is grouped by recruiter (sorted) and
/// ordered by period within each recruiter.
pub fn rolling_goals(history: &[ActivityRecord]) -> Vec<DerivedGoal> {
    let metrics = tracked_metrics(history);
    let mut by_recruiter: BTreeMap<&str, Vec<ActivityRecord>> = BTreeMap::new();
    for record in history {
        by_recruiter
            .entry(record.recruiter.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut goals = Vec::with_capacity(history.len());
    for (recruiter, mut records) in by_recruiter {
        sort_chronologically(&mut records);
        for (index, record) in records.iter().enumerate() {
            let window = index
                .checked_sub(ROLLING_WINDOW)
                .map(|start| &records[start..index]);
            let values = metrics
                .iter()
                .map(|metric| (*metric, window.map_or(0.0, |w| window_mean(w, *metric))))
                .collect();
            goals.push(DerivedGoal {
                recruiter: recruiter.to_string(),
                week: record.week,
                month: record.month,
                date: record.date,
                goals: values,
            });
        }
    }
    goals
}

/// Overwrites accepted and hired goals with the fixed policy value.
pub fn pin_fixed_goals(mut goals: Vec<DerivedGoal>) -> Vec<DerivedGoal> {
    for goal in &mut goals {
        for metric in PINNED_METRICS {
            goal.goals.insert(metric, PINNED_GOAL);
        }
    }
    goals
}

pub fn derive_goals(history: &[ActivityRecord]) -> Vec<DerivedGoal> {
    pin_fixed_goals(rolling_goals(history))
}

fn window_mean(window: &[ActivityRecord], metric: Metric) -> f64 {
    let values: Option<Vec<u64>> = window
        .iter()
        .map(|record| record.counters.get(metric))
        .collect();
    match values {
        Some(values) if !values.is_empty() => {
            values.iter().sum::<u64>() as f64 / values.len() as f64
        }
        _ => 0.0,
    }
}

/// Weekly target for a recruiter and metric.
///
/// Uses the metric's own column when the goal row tracks it, else the hired
/// column. Without a goal row the hired goal defaults to
/// [`DEFAULT_WEEKLY_GOAL`] and other metrics have no goal (`0`).
pub fn weekly_goal(goals: &[GoalRecord], recruiter: &str, metric: Metric) -> f64 {
    match goals.iter().find(|goal| goal.recruiter == recruiter) {
        Some(row) => row
            .counters
            .get(metric)
            .or_else(|| row.counters.get(Metric::Hired))
            .map(|value| value as f64)
            .unwrap_or(DEFAULT_WEEKLY_GOAL),
        None if metric == Metric::Hired => DEFAULT_WEEKLY_GOAL,
        None => 0.0,
    }
}

pub fn working_days(config: &[WorkingDays], recruiter: &str) -> u32 {
    config
        .iter()
        .find(|row| row.recruiter == recruiter)
        .map(|row| row.days)
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_WORKING_DAYS)
}

/// Weekly goal prorated over the recruiter's working days.
pub fn daily_goal(weekly: f64, working_days: u32) -> f64 {
    weekly / f64::from(working_days.max(1))
}

pub fn monthly_goal(goals: &[GoalRecord], recruiter: &str) -> f64 {
    weekly_goal(goals, recruiter, Metric::Hired) * f64::from(WEEKS_PER_MONTH)
}

/// Derived goal aligned with one activity record.
pub fn goal_for<'a>(
    goals: &'a [DerivedGoal],
    record: &ActivityRecord,
) -> Option<&'a DerivedGoal> {
    goals.iter().find(|goal| {
        goal.recruiter == record.recruiter
            && goal.week == record.week
            && goal.month == record.month
            && goal.date == record.date
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counters, YearMonth};

    fn week(recruiter: &str, week: u32, values: &[(Metric, u64)]) -> ActivityRecord {
        let mut counters = Counters::new();
        for (metric, value) in values {
            counters.set(*metric, *value);
        }
        ActivityRecord {
            recruiter: recruiter.to_string(),
            date: None,
            week: Some(week),
            month: None,
            counters,
        }
    }

    fn full(recruiter: &str, n: u32, base: u64) -> ActivityRecord {
        let values: Vec<_> = Metric::ALL.iter().map(|metric| (*metric, base)).collect();
        week(recruiter, n, &values)
    }

    #[test]
    fn third_period_averages_the_two_before() {
        let history = vec![full("Ana", 1, 10), full("Ana", 2, 20), full("Ana", 3, 90)];
        let goals = derive_goals(&history);
        let third = &goals[2];
        assert_eq!(third.week, Some(3));
        for metric in [
            Metric::Publications,
            Metric::Contacts,
            Metric::Appointments,
            Metric::Interviews,
        ] {
            assert_eq!(third.goal(metric), Some(15.0));
        }
        assert_eq!(third.goal(Metric::Accepted), Some(1.0));
        assert_eq!(third.goal(Metric::Hired), Some(1.0));
    }

    #[test]
    fn first_two_periods_lack_history() {
        let history = vec![full("Ana", 1, 10), full("Ana", 2, 20), full("Ana", 3, 30)];
        let goals = derive_goals(&history);
        for goal in &goals[..2] {
            assert_eq!(goal.goal(Metric::Contacts), Some(0.0));
            assert_eq!(goal.goal(Metric::Publications), Some(0.0));
            assert_eq!(goal.goal(Metric::Hired), Some(1.0));
        }
    }

    #[test]
    fn rolling_step_leaves_pinned_metrics_computed() {
        let history = vec![full("Ana", 1, 4), full("Ana", 2, 6), full("Ana", 3, 0)];
        let rolled = rolling_goals(&history);
        assert_eq!(rolled[2].goal(Metric::Hired), Some(5.0));
        let pinned = pin_fixed_goals(rolled);
        assert_eq!(pinned[2].goal(Metric::Hired), Some(1.0));
    }

    #[test]
    fn recruiters_do_not_share_history() {
        let history = vec![
            full("Ana", 1, 10),
            full("Luis", 1, 100),
            full("Ana", 2, 20),
            full("Luis", 2, 200),
            full("Ana", 3, 0),
            full("Luis", 3, 0),
        ];
        let goals = derive_goals(&history);
        let ana: Vec<_> = goals.iter().filter(|goal| goal.recruiter == "Ana").collect();
        let luis: Vec<_> = goals.iter().filter(|goal| goal.recruiter == "Luis").collect();
        assert_eq!(ana[2].goal(Metric::Contacts), Some(15.0));
        assert_eq!(luis[2].goal(Metric::Contacts), Some(150.0));
    }

    #[test]
    fn unordered_history_is_sorted_first() {
        let history = vec![full("Ana", 3, 0), full("Ana", 1, 2), full("Ana", 2, 4)];
        let goals = derive_goals(&history);
        let third = goals.iter().find(|goal| goal.week == Some(3)).expect("week 3");
        assert_eq!(third.goal(Metric::Interviews), Some(3.0));
    }

    #[test]
    fn lone_period_gets_zero_and_pinned_goals() {
        let goals = derive_goals(&[week("Ana", 1, &[(Metric::Contacts, 8)])]);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal(Metric::Contacts), Some(0.0));
        assert_eq!(goals[0].goal(Metric::Accepted), Some(1.0));
        assert_eq!(goals[0].goal(Metric::Hired), Some(1.0));
    }

    #[test]
    fn goal_engine_is_idempotent() {
        let history = vec![
            full("Ana", 1, 3),
            full("Ana", 2, 8),
            full("Ana", 3, 5),
            full("Ana", 4, 1),
        ];
        assert_eq!(derive_goals(&history), derive_goals(&history));
    }

    #[test]
    fn goal_lookup_keeps_years_apart() {
        let in_year = |year: i32, n: u32, base: u64| {
            let mut record = full("Ana", n, base);
            record.month = YearMonth::new(year, 1);
            record
        };
        let history = vec![
            in_year(2025, 1, 2),
            in_year(2024, 1, 40),
            in_year(2024, 2, 60),
            in_year(2025, 2, 4),
            in_year(2025, 3, 0),
            in_year(2024, 3, 0),
        ];
        let goals = derive_goals(&history);

        let current = in_year(2025, 3, 0);
        let goal = goal_for(&goals, &current).expect("goal");
        assert_eq!(goal.month, YearMonth::new(2025, 1));
        assert_eq!(goal.goal(Metric::Contacts), Some(3.0));

        let earlier = goal_for(&goals, &in_year(2024, 3, 0)).expect("goal");
        assert_eq!(earlier.goal(Metric::Contacts), Some(50.0));
    }

    #[test]
    fn goal_lookup_falls_back_to_defaults() {
        let mut counters = Counters::new();
        counters.set(Metric::Hired, 20);
        counters.set(Metric::Contacts, 150);
        let goals = vec![GoalRecord {
            recruiter: "Ana".to_string(),
            counters,
        }];
        assert_eq!(weekly_goal(&goals, "Ana", Metric::Contacts), 150.0);
        assert_eq!(weekly_goal(&goals, "Ana", Metric::Interviews), 20.0);
        assert_eq!(weekly_goal(&goals, "Luis", Metric::Hired), DEFAULT_WEEKLY_GOAL);
        assert_eq!(weekly_goal(&goals, "Luis", Metric::Contacts), 0.0);
        assert_eq!(monthly_goal(&[], "Luis"), 100.0);
    }

    #[test]
    fn working_days_default_to_five() {
        let config = vec![
            WorkingDays {
                recruiter: "Ana".to_string(),
                days: 4,
            },
            WorkingDays {
                recruiter: "Luis".to_string(),
                days: 0,
            },
        ];
        assert_eq!(working_days(&config, "Ana"), 4);
        assert_eq!(working_days(&config, "Luis"), DEFAULT_WORKING_DAYS);
        assert_eq!(working_days(&[], "Eva"), DEFAULT_WORKING_DAYS);
        assert_eq!(daily_goal(25.0, 5), 5.0);
    }
}
