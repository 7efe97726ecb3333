use std::fmt::Write;

use anyhow::Context;
use clap::ValueEnum;

use crate::dashboard::{Card, CardValue, Cell, Chart, ChartKind, Note, View};
use crate::kpi::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Markdown,
    Json,
    Csv,
}

pub fn render(view: &View, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Markdown => Ok(markdown(view)),
        Format::Json => serde_json::to_string_pretty(view).context("failed to encode view as JSON"),
        Format::Csv => csv_tables(view),
    }
}

pub fn markdown(view: &View) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", view.title);
    let _ = writeln!(output, "{}", view.subtitle);

    for note in view.notes.iter().filter(|note| note.tone == Tone::Bad) {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", note_line(note));
    }

    if !view.cards.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Indicators");
        for card in &view.cards {
            let _ = writeln!(output, "{}", card_line(card));
        }
    }

    for table in &view.tables {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", table.title);
        let _ = writeln!(output, "| {} |", table.columns.join(" | "));
        let _ = writeln!(
            output,
            "|{}",
            table.columns.iter().map(|_| "---|").collect::<String>()
        );
        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            let _ = writeln!(output, "| {} |", cells.join(" | "));
        }
    }

    for chart in &view.charts {
        let _ = writeln!(output);
        chart_section(&mut output, chart);
    }

    let remaining: Vec<&Note> = view
        .notes
        .iter()
        .filter(|note| note.tone != Tone::Bad)
        .collect();
    if !remaining.is_empty() {
        let _ = writeln!(output);
        for note in remaining {
            let _ = writeln!(output, "{}", note_line(note));
        }
    }

    output
}

/// Every table of the view as CSV, separated by a blank line.
pub fn csv_tables(view: &View) -> anyhow::Result<String> {
    let mut sections = Vec::new();

    for table in &view.tables {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(cell_text))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush CSV: {}", err.error()))?;
        sections.push(String::from_utf8(bytes).context("CSV output was not UTF-8")?);
    }

    Ok(sections.join("\n"))
}

fn card_line(card: &Card) -> String {
    format!(
        "- {} {}: **{}** ({})",
        tone_marker(card.tone),
        card.label,
        value_text(&card.value),
        card.subtitle
    )
}

fn note_line(note: &Note) -> String {
    let prefix = match note.tone {
        Tone::Good => "> ✓",
        Tone::Warning => "> ⚠",
        Tone::Bad => "> ✗",
        Tone::Neutral => ">",
    };
    format!("{prefix} {}", note.text)
}

fn chart_section(output: &mut String, chart: &Chart) {
    let _ = writeln!(output, "## {}", chart.title);
    if let Some(reference) = chart.reference {
        let _ = writeln!(output, "Goal line: {reference}");
    }
    for series in &chart.series {
        if chart.series.len() > 1 || chart.kind != ChartKind::Funnel {
            let _ = writeln!(output, "### {}", series.name);
        }
        let first = series.points.first().map(|(_, value)| *value).unwrap_or(0.0);
        for (label, value) in &series.points {
            match chart.kind {
                ChartKind::Funnel => {
                    let share = if first > 0.0 { value / first * 100.0 } else { 0.0 };
                    let _ = writeln!(output, "- {label}: {value} ({share:.0}% of initial)");
                }
                ChartKind::Line | ChartKind::Bar => {
                    let _ = writeln!(output, "- {label}: {value}");
                }
            }
        }
    }
}

fn tone_marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Good => "🟢",
        Tone::Warning => "🟡",
        Tone::Bad => "🔴",
        Tone::Neutral => "🔵",
    }
}

fn value_text(value: &CardValue) -> String {
    match value {
        CardValue::Count(count) => count.to_string(),
        CardValue::Percent(percent) => format!("{percent:.1}%"),
        CardValue::Decimal(number) => format!("{number:.1}"),
        CardValue::Flag(true) => "YES".to_string(),
        CardValue::Flag(false) => "NO".to_string(),
        CardValue::Missing => "n/a".to_string(),
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => text.clone(),
        Cell::Count(count) => count.to_string(),
        Cell::Number(number) => format!("{number:.1}"),
        Cell::Percent(Some(percent)) => format!("{percent:.0}%"),
        Cell::Percent(None) => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Series, Table};

    fn sample() -> View {
        View {
            title: "Weekly dashboard".to_string(),
            subtitle: "Ana".to_string(),
            cards: vec![Card {
                label: "EFFECTIVENESS",
                value: CardValue::Percent(40.0),
                subtitle: "8 of 20".to_string(),
                tone: Tone::Bad,
            }],
            tables: vec![Table {
                title: "Metrics".to_string(),
                columns: vec!["Metric".to_string(), "Compliance".to_string()],
                rows: vec![
                    vec![Cell::Text("Hired".to_string()), Cell::Percent(Some(40.0))],
                    vec![Cell::Text("Contacts, total".to_string()), Cell::Percent(None)],
                ],
            }],
            charts: vec![Chart {
                title: "Funnel".to_string(),
                kind: ChartKind::Funnel,
                series: vec![Series {
                    name: "Achieved".to_string(),
                    points: vec![("Contacts".to_string(), 40.0), ("Hired".to_string(), 8.0)],
                }],
                reference: None,
            }],
            notes: vec![
                Note::new(Tone::Warning, "Pace needs to increase."),
                Note::new(Tone::Bad, "Error loading metas_semanales"),
            ],
        }
    }

    #[test]
    fn markdown_lists_cards_tables_and_charts() {
        let output = markdown(&sample());
        assert!(output.starts_with("# Weekly dashboard\n"));
        assert!(output.contains("- 🔴 EFFECTIVENESS: **40.0%** (8 of 20)"));
        assert!(output.contains("| Hired | 40% |"));
        assert!(output.contains("| Contacts, total | N/A |"));
        assert!(output.contains("- Hired: 8 (20% of initial)"));
        assert!(output.contains("> ⚠ Pace needs to increase."));
    }

    #[test]
    fn errors_are_shown_before_indicators() {
        let output = markdown(&sample());
        let error = output.find("Error loading").expect("error note");
        let cards = output.find("## Indicators").expect("cards");
        assert!(error < cards);
    }

    #[test]
    fn csv_quotes_cells_with_commas() {
        let output = csv_tables(&sample()).expect("csv");
        assert!(output.starts_with("Metric,Compliance\n"));
        assert!(output.contains("\"Contacts, total\",N/A"));
    }

    #[test]
    fn json_carries_plain_values() {
        let output = render(&sample(), Format::Json).expect("json");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(value["cards"][0]["value"]["kind"], "percent");
        assert_eq!(value["cards"][0]["tone"], "bad");
    }
}
