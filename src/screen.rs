use chrono::NaiveDate;

use crate::dashboard::{self, Cell, Note, Table, View};
use crate::kpi::Tone;
use crate::models::YearMonth;
use crate::period::Period;
use crate::source::Dataset;

/// One dashboard request, with every default already resolved except the
/// recruiter, which depends on the loaded data.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Recruiters,
    Daily {
        recruiter: Option<String>,
        date: NaiveDate,
    },
    Weekly {
        recruiter: Option<String>,
        date: NaiveDate,
    },
    Monthly {
        recruiter: Option<String>,
        month: Option<YearMonth>,
    },
    Department(Period),
    Goals {
        recruiter: Option<String>,
    },
}

/// Runs one render cycle over a loaded snapshot. Fetch errors are shown
/// first; a snapshot that cannot be rendered yields only the halt message.
pub fn build(data: &Dataset, screen: &Screen) -> View {
    let mut view = match data.halt_reason() {
        Some(reason) => halted(reason),
        None => screen_view(data, screen).unwrap_or_else(halted),
    };

    let mut notes: Vec<Note> = data
        .errors
        .iter()
        .map(|error| Note::new(Tone::Bad, error.clone()))
        .collect();
    notes.append(&mut view.notes);
    view.notes = notes;
    view
}

fn screen_view(data: &Dataset, screen: &Screen) -> Result<View, String> {
    let view = match screen {
        Screen::Recruiters => recruiters_view(data),
        Screen::Daily { recruiter, date } => {
            let recruiter = dashboard::resolve_recruiter(data, recruiter.as_deref())?;
            dashboard::daily_view(data, &recruiter, *date)
        }
        Screen::Weekly { recruiter, date } => {
            let recruiter = dashboard::resolve_recruiter(data, recruiter.as_deref())?;
            dashboard::weekly_view(data, &recruiter, *date)
        }
        Screen::Monthly { recruiter, month } => {
            let recruiter = dashboard::resolve_recruiter(data, recruiter.as_deref())?;
            dashboard::monthly_view(data, &recruiter, *month)
        }
        Screen::Department(period) => dashboard::department_view(data, *period),
        Screen::Goals { recruiter } => {
            let recruiter = match recruiter {
                Some(name) => Some(dashboard::resolve_recruiter(data, Some(name.as_str()))?),
                None => None,
            };
            dashboard::goals_view(data, recruiter.as_deref())
        }
    };
    Ok(view)
}

fn recruiters_view(data: &Dataset) -> View {
    View {
        title: "Recruiters".to_string(),
        subtitle: format!("{} found", data.recruiters().len()),
        tables: vec![Table {
            title: "Recruiters".to_string(),
            columns: vec!["Recruiter".to_string()],
            rows: data
                .recruiters()
                .into_iter()
                .map(|name| vec![Cell::Text(name)])
                .collect(),
        }],
        ..View::default()
    }
}

fn halted(reason: String) -> View {
    View {
        title: "Dashboard unavailable".to_string(),
        notes: vec![Note::new(Tone::Bad, reason)],
        ..View::default()
    }
}
