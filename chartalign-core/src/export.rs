//! Export aligned chart data as JSON, CSV, or a plain-text summary.

use crate::align::{AlignedTable, SeriesSummary};
use crate::chart::ChartRow;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Serialize chart rows to pretty JSON.
pub fn export_json(rows: &[ChartRow]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Export chart rows as CSV.
///
/// Columns: date, then `stock{i}`, `price{i}` for every one of the
/// `positions` ticker positions. Absent values are empty cells.
pub fn export_csv(rows: &[ChartRow], positions: usize) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(1 + positions * 2);
    header.push("date".to_string());
    for i in 1..=positions {
        header.push(format!("stock{i}"));
        header.push(format!("price{i}"));
    }
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.to_string());
        for i in 1..=positions {
            record.push(row.stock(i).map(|v| format!("{v:.2}")).unwrap_or_default());
            record.push(row.price(i).map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io {
            path: "<memory>".into(),
            source: e.into_error(),
        })?;
    Ok(String::from_utf8(data)?)
}

/// Render a fixed-width summary of each ticker position.
pub fn render_summary(table: &AlignedTable) -> String {
    let summary = table.summary();
    let mut out = String::with_capacity(128 + summary.len() * 96);

    out.push_str(&format!(
        "{:<3} {:<14} {:<12} {:>12} {:<12} {:>12} {:>10} {:>6}\n",
        "#", "Ticker", "Start", "Start Px", "Last", "Last Px", "Index", "Obs"
    ));
    out.push_str(&"-".repeat(90));
    out.push('\n');
    for s in &summary {
        out.push_str(&format_summary_line(s));
    }
    if table.is_empty() {
        out.push_str("(no data to chart)\n");
    }
    out
}

fn format_summary_line(s: &SeriesSummary) -> String {
    let dash = || "-".to_string();
    format!(
        "{:<3} {:<14} {:<12} {:>12} {:<12} {:>12} {:>10} {:>6}\n",
        s.position,
        s.ticker.as_str(),
        s.start.map(|p| p.date.to_string()).unwrap_or_else(dash),
        s.start.map(|p| format!("{:.2}", p.price)).unwrap_or_else(dash),
        s.last_date.map(|d| d.to_string()).unwrap_or_else(dash),
        s.last_price.map(|v| format!("{v:.2}")).unwrap_or_else(dash),
        s.last_normalized.map(|v| format!("{v:.2}")).unwrap_or_else(dash),
        s.observations,
    )
}

/// Write an export to `path`.
pub fn write_to(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
