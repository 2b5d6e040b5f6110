//! Writes a [`Report`] to disk as a plain-text document or CSV.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::identity::Identity;
use crate::report::Report;
use crate::util::format_hms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ExportFormat {
    #[strum(serialize = "txt")]
    Text,
    #[strum(serialize = "csv")]
    Csv,
}

/// `<employee>_<company>_worktime_report_<date>.<ext>` with unsafe characters dropped
pub fn report_file_name(identity: &Identity, generated: NaiveDate, format: ExportFormat) -> String {
    let raw = format!(
        "{}_{}_worktime_report_{}.{}",
        identity.employee,
        identity.company,
        generated.format("%Y-%m-%d"),
        format
    );
    raw.chars()
        .filter(|c| c.is_alphanumeric() || " _-().".contains(*c))
        .collect()
}

/// Render the report as a text document.
pub fn render_text(report: &Report, identity: &Identity, generated: NaiveDate) -> String {
    let mut out = String::new();
    if let Err(e) = write_text(&mut out, report, identity, generated) {
        // only reachable if a Display impl fails
        warn!(error = %e, "report text truncated");
    }
    out
}

fn write_text(
    out: &mut impl fmt::Write,
    report: &Report,
    identity: &Identity,
    generated: NaiveDate,
) -> fmt::Result {
    let rule = "-".repeat(44);

    writeln!(out, "WORK TIME REPORT")?;
    writeln!(out)?;
    writeln!(out, "{:<18}{}", "Company:", identity.company)?;
    writeln!(out, "{:<18}{}", "Employee:", identity.employee)?;
    writeln!(out, "{:<18}{}", "Position:", identity.position)?;
    writeln!(out, "{:<18}{}", "Generated:", generated.format("%Y-%m-%d"))?;

    for day in &report.days {
        writeln!(out)?;
        writeln!(out, "Date: {}", day.label())?;
        writeln!(out, "{rule}")?;
        writeln!(out, "{:^14} {:^14} {:^14}", "Start", "End", "Duration")?;
        for s in &day.sessions {
            writeln!(
                out,
                "{:^14} {:^14} {:^14}",
                s.start_time().format("%H:%M:%S").to_string(),
                s.end_time().format("%H:%M:%S").to_string(),
                format_hms(s.duration_seconds())
            )?;
        }
        writeln!(out, "{rule}")?;
        writeln!(
            out,
            "{:>29} {:^14}",
            format!("Total for {}:", day.label()),
            format_hms(day.total_seconds)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{:<22}{}", "Sessions:", report.session_count)?;
    writeln!(out, "{:<22}{}", "Total time:", format_hms(report.total_seconds))?;
    writeln!(out, "{:<22}{}", "Average duration:", format_hms(report.average_seconds))
}

/// Render the report as CSV rows in report order.
pub fn render_csv(report: &Report) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["date", "start", "end", "duration_seconds", "duration"])?;
    for day in &report.days {
        for s in &day.sessions {
            wtr.write_record([
                day.label(),
                s.start_time().format("%H:%M:%S").to_string(),
                s.end_time().format("%H:%M:%S").to_string(),
                format!("{:.3}", s.duration_seconds()),
                format_hms(s.duration_seconds()),
            ])?;
        }
    }
    wtr.into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Write the report into `reports_dir` and return the file's path.
pub fn export(
    report: &Report,
    identity: &Identity,
    generated: NaiveDate,
    format: ExportFormat,
    reports_dir: &Path,
) -> Result<PathBuf, ExportError> {
    if report.is_empty() {
        return Err(ExportError::NothingToReport);
    }
    let path = reports_dir.join(report_file_name(identity, generated, format));
    let bytes = match format {
        ExportFormat::Text => render_text(report, identity, generated).into_bytes(),
        ExportFormat::Csv => render_csv(report)?,
    };

    fs::create_dir_all(reports_dir)
        .and_then(|_| fs::write(&path, bytes))
        .map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), %format, "report exported");
    Ok(path)
}
