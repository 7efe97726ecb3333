use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::models::YearMonth;
use crate::period::Period;
use crate::report::{self, Format};
use crate::screen::{self, Screen};
use crate::source::Loader;

const HELP: &str = "\
Commands:
  recruiters                 list recruiters
  daily [recruiter]          today's dashboard
  weekly [recruiter]         this week's dashboard
  monthly [recruiter]        last four weeks
  department [date|YYYY-MM|week]
  goals [recruiter]          derived rolling goals
  refresh                    drop cached tables
  quit
";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Show(Screen),
    Refresh,
    Help,
    Quit,
}

/// Parses one shell line. Everything after the command word is its argument,
/// so recruiter names may contain spaces. Blank lines yield `None`.
pub fn parse_line(line: &str, today: NaiveDate) -> Result<Option<Action>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let argument = Some(rest.trim())
        .filter(|rest| !rest.is_empty())
        .map(str::to_string);

    let action = match command.to_lowercase().as_str() {
        "recruiters" => Action::Show(Screen::Recruiters),
        "daily" => Action::Show(Screen::Daily {
            recruiter: argument,
            date: today,
        }),
        "weekly" => Action::Show(Screen::Weekly {
            recruiter: argument,
            date: today,
        }),
        "monthly" => Action::Show(Screen::Monthly {
            recruiter: argument,
            month: None,
        }),
        "department" => Action::Show(Screen::Department(match argument {
            Some(argument) => parse_period(&argument)?,
            None => Period::Day(today),
        })),
        "goals" => Action::Show(Screen::Goals { recruiter: argument }),
        "refresh" => Action::Refresh,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => return Err(format!("Unknown command {other:?}. Type `help`.")),
    };
    Ok(Some(action))
}

/// `YYYY-MM-DD`, `YYYY-MM` or a bare week number.
pub fn parse_period(text: &str) -> Result<Period, String> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Period::Day(date));
    }
    if let Ok(week) = text.parse::<u32>() {
        return match week {
            1..=53 => Ok(Period::Week(week)),
            _ => Err(format!("Week {week} is out of range.")),
        };
    }
    text.parse::<YearMonth>()
        .map(Period::Month)
        .map_err(|_| format!("Expected a date, a YYYY-MM month or a week number, got {text:?}."))
}

/// Interactive session: every command is one render cycle over a shared
/// cache, until `quit` or end of input.
pub async fn run(mut loader: Loader, format: Format, today: NaiveDate) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(HELP.as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let output = match parse_line(&line, today) {
            Ok(None) => continue,
            Ok(Some(Action::Quit)) => break,
            Ok(Some(Action::Help)) => HELP.to_string(),
            Ok(Some(Action::Refresh)) => {
                loader.refresh();
                "Cache cleared; the next command fetches fresh data.\n".to_string()
            }
            Ok(Some(Action::Show(screen))) => {
                debug!(?screen, "render cycle");
                let data = loader.load().await;
                let view = screen::build(&data, &screen);
                report::render(&view, format)?
            }
            Err(message) => format!("{message}\n"),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).expect("date")
    }

    #[test]
    fn recruiter_names_keep_their_spaces() {
        let action = parse_line("daily  Ana García ", today()).expect("parsed");
        assert_eq!(
            action,
            Some(Action::Show(Screen::Daily {
                recruiter: Some("Ana García".to_string()),
                date: today(),
            }))
        );
    }

    #[test]
    fn bare_commands_use_defaults() {
        assert_eq!(
            parse_line("weekly", today()).expect("parsed"),
            Some(Action::Show(Screen::Weekly {
                recruiter: None,
                date: today(),
            }))
        );
        assert_eq!(
            parse_line("department", today()).expect("parsed"),
            Some(Action::Show(Screen::Department(Period::Day(today()))))
        );
        assert_eq!(parse_line("REFRESH", today()).expect("parsed"), Some(Action::Refresh));
        assert_eq!(parse_line("   ", today()).expect("parsed"), None);
    }

    #[test]
    fn department_periods_parse() {
        assert_eq!(parse_period("2025-01-15"), Ok(Period::Day(today())));
        assert_eq!(parse_period("3"), Ok(Period::Week(3)));
        assert_eq!(
            parse_period("2025-01"),
            Ok(Period::Month(YearMonth::new(2025, 1).expect("month")))
        );
        assert!(parse_period("60").is_err());
        assert!(parse_period("soon").is_err());
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(parse_line("export everything", today()).is_err());
    }
}
