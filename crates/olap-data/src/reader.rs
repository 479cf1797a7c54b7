//! CSV loading for layoff tables.
//!
//! Maps the required columns by header name into [`RawRecord`]s. Values are
//! kept as text; typing happens in the normalizer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use olap_core::error::{OlapError, Result};
use olap_core::models::{RawRecord, REQUIRED_COLUMNS};
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load every row of the CSV file at `path`.
pub fn load_layoffs_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|source| OlapError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_layoffs(file)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read layoff rows from any CSV source with a header line.
///
/// Fails with [`OlapError::Schema`] when a required column is absent.
/// Extra columns are ignored and empty cells become `None`.
pub fn read_layoffs<R: Read>(source: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(source);

    let headers = rdr.headers()?.clone();
    let positions = column_positions(&headers)?;
    debug!("Column positions: {:?}", positions);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cell = |i: usize| {
            record
                .get(positions[i])
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        rows.push(RawRecord {
            date: cell(0),
            company: cell(1),
            location: cell(2),
            country: cell(3),
            industry: cell(4),
            total_laid_off: cell(5),
            percentage_laid_off: cell(6),
            funds_raised: cell(7),
        });
    }

    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Index of each [`REQUIRED_COLUMNS`] entry within `headers`.
fn column_positions(headers: &csv::StringRecord) -> Result<Vec<usize>> {
    REQUIRED_COLUMNS
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|h| h.trim() == *column)
                .ok_or_else(|| OlapError::Schema {
                    column: column.to_string(),
                })
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
