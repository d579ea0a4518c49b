use std::io::{self, Write};

use clap::ValueEnum;
use crewboard::error::AppError;
use serde::Serialize;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Csv,
}

/// A record printable as an aligned table row or a CSV line.
pub(crate) trait Row: Serialize {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

pub(crate) fn print_rows<R: Row>(rows: &[R], format: OutputFormat) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => {
            out.write_all(render_table(rows).as_bytes())?;
            Ok(())
        }
        OutputFormat::Csv => write_csv(rows, &mut out),
    }
}

fn write_csv<R: Row, W: Write>(rows: &[R], writer: W) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)
            .map_err(|err| AppError::Output(err.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}

pub(crate) fn render_table<R: Row>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(no results)\n".to_string();
    }

    let cells: Vec<Vec<String>> = rows.iter().map(R::cells).collect();
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|header| header.len()).collect();
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut rendered = String::new();
    let headers: Vec<String> = R::HEADERS.iter().map(|header| header.to_string()).collect();
    push_line(&mut rendered, &headers, &widths);
    for line in &cells {
        push_line(&mut rendered, line, &widths);
    }
    rendered
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

/// Fit free text into one table cell.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or("-")
        .to_string()
}
