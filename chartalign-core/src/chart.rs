//! Positional chart rows.
//!
//! The line chart wants one flat object per date with `stock1`/`price1` …
//! `stock5`/`price5` fields, where the number is the ticker's 1-based position
//! in the caller's ticker order. This module is the only place that knows
//! about that layout.

use crate::align::{AlignedTable, SeriesPoint};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One date's values across all ticker positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub date: NaiveDate,
    /// `cells[i]` is ticker position `i + 1`; `None` where that ticker has no observation.
    pub cells: Vec<Option<SeriesPoint>>,
}

impl ChartRow {
    /// Normalized value for 1-based position `i` (`stock{i}`).
    pub fn stock(&self, i: usize) -> Option<f64> {
        self.cell(i).map(|p| p.normalized)
    }

    /// Raw price for 1-based position `i` (`price{i}`).
    pub fn price(&self, i: usize) -> Option<f64> {
        self.cell(i).map(|p| p.price)
    }

    pub fn has_data(&self) -> bool {
        self.cells.iter().any(Option::is_some)
    }

    fn cell(&self, i: usize) -> Option<&SeriesPoint> {
        i.checked_sub(1)
            .and_then(|idx| self.cells.get(idx))
            .and_then(Option::as_ref)
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.cells.iter().filter(|c| c.is_some()).count();
        let mut map = serializer.serialize_map(Some(1 + present * 2))?;
        map.serialize_entry("date", &self.date.format("%Y-%m-%d").to_string())?;
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(point) = cell {
                map.serialize_entry(&format!("stock{}", i + 1), &point.normalized)?;
                map.serialize_entry(&format!("price{}", i + 1), &point.price)?;
            }
        }
        map.end()
    }
}

/// Flatten an aligned table into chart rows, one per date, rows without data dropped.
pub fn to_chart_rows(table: &AlignedTable) -> Vec<ChartRow> {
    table
        .dates
        .iter()
        .map(|date| ChartRow {
            date: *date,
            cells: table
                .series
                .iter()
                .map(|s| s.points.get(date).copied())
                .collect(),
        })
        .filter(ChartRow::has_data)
        .collect()
}

/// Deterministic BLAKE3 digest over chart rows.
///
/// Covers dates, positions, and the exact bits of every value, so two outputs
/// share a fingerprint only if they serialize identically.
pub fn fingerprint(rows: &[ChartRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        hasher.update(row.date.to_string().as_bytes());
        for (i, cell) in row.cells.iter().enumerate() {
            if let Some(point) = cell {
                hasher.update(&(i as u64).to_le_bytes());
                hasher.update(&point.normalized.to_le_bytes());
                hasher.update(&point.price.to_le_bytes());
            }
        }
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
