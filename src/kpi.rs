use serde::Serialize;

/// Semantic colour of a card, left to the renderer to style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Good,
    Warning,
    Bad,
    Neutral,
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `numerator / denominator` as a percentage rounded to one decimal.
/// A zero denominator is a normal state and yields `0`.
pub fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round_to(numerator / denominator * 100.0, 1)
}

/// Hires achieved against the goal.
pub fn effectiveness(hired: f64, goal: f64) -> f64 {
    ratio_percent(hired, goal)
}

/// Hires per contact made.
pub fn productivity(hired: f64, contacts: f64) -> f64 {
    ratio_percent(hired, contacts)
}

/// Hires per interview conducted.
pub fn quality(hired: f64, interviews: f64) -> f64 {
    ratio_percent(hired, interviews)
}

/// Linear run-rate extrapolation of a period-end total.
///
/// This is `accumulated / elapsed * total` with no smoothing at all, so a
/// single strong or weak first day dominates the result. Zero elapsed units
/// project to `0`.
pub fn projection(accumulated: u64, elapsed_units: u32, total_units: u32) -> u64 {
    if elapsed_units == 0 {
        return 0;
    }
    (accumulated as f64 / elapsed_units as f64 * total_units as f64).round() as u64
}

/// Percentage change between two totals, `None` without a previous base.
pub fn period_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(round_to((current - previous) / previous * 100.0, 1))
}

pub fn effectiveness_tone(value: f64) -> Tone {
    banded(value, 90.0, 75.0)
}

pub fn productivity_tone(value: f64) -> Tone {
    banded(value, 15.0, 10.0)
}

pub fn quality_tone(value: f64) -> Tone {
    banded(value, 50.0, 35.0)
}

pub fn met_tone(met: bool) -> Tone {
    if met {
        Tone::Good
    } else {
        Tone::Bad
    }
}

fn banded(value: f64, good: f64, warning: f64) -> Tone {
    if value >= good {
        Tone::Good
    } else if value >= warning {
        Tone::Warning
    } else {
        Tone::Bad
    }
}
