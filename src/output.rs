//! Row rendering for the CLI: tab-separated tables or JSON lines.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use lbxd::FetchReport;
use lbxd::pagination::{WatchEntry, WatchlistEntry};
use serde::Serialize;
use serde_json::Value;

/// How tabular commands print their rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Header line followed by tab-separated rows
    #[default]
    Tsv,
    /// One JSON object per line
    Json,
}

/// A record that can be printed as a table row.
pub trait Row: Serialize {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

/// Username paired with its resolved member ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberIdRow {
    pub username: String,
    pub member_id: String,
}

impl Row for MemberIdRow {
    const HEADERS: &'static [&'static str] = &["username", "member_id"];

    fn cells(&self) -> Vec<String> {
        vec![self.username.clone(), self.member_id.clone()]
    }
}

impl Row for WatchlistEntry {
    const HEADERS: &'static [&'static str] = &["member", "film", "name", "release_year"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.member.clone(),
            self.film.clone(),
            self.name.clone().unwrap_or_default(),
            self.release_year.map(|y| y.to_string()).unwrap_or_default(),
        ]
    }
}

impl Row for WatchEntry {
    const HEADERS: &'static [&'static str] = &["member", "film", "rating"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.member.clone(),
            self.film.clone(),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
        ]
    }
}

/// Writes `rows` in the requested format.
pub fn write_rows<W: Write, R: Row>(out: &mut W, rows: &[R], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Tsv => {
            writeln!(out, "{}", R::HEADERS.join("\t"))?;
            for row in rows {
                let cells: Vec<String> = row.cells().iter().map(|c| sanitize_cell(c)).collect();
                writeln!(out, "{}", cells.join("\t"))?;
            }
        }
        OutputFormat::Json => {
            for row in rows {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Writes each payload as a single compact JSON line.
pub fn write_json_lines<W: Write>(out: &mut W, values: &[Value]) -> Result<()> {
    for value in values {
        serde_json::to_writer(&mut *out, value)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Lists targets that produced no payload, one tab-separated line each.
///
/// Not-found targets print as `not-found\t<path>`; exhausted targets print as
/// `failed\t<path>\t<attempts>\t<last error>`.
pub fn write_unresolved<W: Write>(out: &mut W, report: &FetchReport) -> Result<()> {
    for path in &report.not_found {
        writeln!(out, "not-found\t{}", sanitize_cell(path))?;
    }
    for failed in &report.failed {
        writeln!(
            out,
            "failed\t{}\t{}\t{}",
            sanitize_cell(&failed.target),
            failed.attempts,
            sanitize_cell(&failed.last_error)
        )?;
    }
    Ok(())
}

// Tabs and newlines inside a cell would break the row structure.
fn sanitize_cell(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}
