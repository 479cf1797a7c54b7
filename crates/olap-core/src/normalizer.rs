//! Per-column cleaning and type coercion for raw layoff rows.
//!
//! Two missing-value policies coexist and must stay separate:
//! * zero-fill: `total_laid_off` becomes `0.0` when missing, so it still
//!   contributes to sums;
//! * absent: `funds_raised` and `percentage_laid_off` become `None` when
//!   missing, never `0.0`.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{FieldError, OlapError, Result};
use crate::models::{NormalizedRecord, RawRecord};
use crate::time_utils::{self, DEFAULT_DATE_FORMAT};

/// Literal text the source data uses for "no value".
pub const NULL_MARKER: &str = "None";

// ── Missing-value detection ───────────────────────────────────────────────────

/// `true` for `None`, blank text, or the literal [`NULL_MARKER`].
pub fn is_missing(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None => true,
        Some(s) => s.is_empty() || s == NULL_MARKER,
    }
}

/// Trimmed text, or `None` when the value is missing.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    if is_missing(raw) {
        return None;
    }
    raw.map(|s| s.trim().to_string())
}

// ── Field operations ──────────────────────────────────────────────────────────

/// Parse a date under the fixed `format`. Missing values are a parse error.
pub fn parse_date(raw: Option<&str>, format: &str) -> std::result::Result<NaiveDate, FieldError> {
    let text = raw.unwrap_or_default();
    time_utils::parse_calendar_date(text, format).ok_or_else(|| FieldError::Parse {
        value: text.to_string(),
        expected: format!("date ({format})"),
    })
}

/// Deterministic `YYYYMMDD` key for `date`.
pub fn derive_date_key(date: NaiveDate) -> u32 {
    time_utils::date_key(date)
}

/// `location` when present, otherwise `country`; `None` when both are missing.
pub fn clean_location(location: Option<&str>, country: Option<&str>) -> Option<String> {
    clean_text(location).or_else(|| clean_text(country))
}

/// Strip `$` and `,` and read the rest as a number.
///
/// Empty text and [`NULL_MARKER`] map to `None`, never to `0.0`.
pub fn clean_currency(raw: Option<&str>) -> std::result::Result<Option<f64>, FieldError> {
    static CURRENCY_SYMBOLS: OnceLock<Regex> = OnceLock::new();
    let re = CURRENCY_SYMBOLS.get_or_init(|| Regex::new(r"[\$,]").expect("regex is valid"));

    let Some(text) = raw else {
        return Ok(None);
    };
    let residual = re.replace_all(text, "");
    coerce_optional(&residual, text)
}

/// Strip `%` and read the rest as a number on the 0–100 scale.
///
/// Empty text and [`NULL_MARKER`] map to `None`.
pub fn clean_percentage(raw: Option<&str>) -> std::result::Result<Option<f64>, FieldError> {
    let Some(text) = raw else {
        return Ok(None);
    };
    let residual = text.replace('%', "");
    coerce_optional(&residual, text)
}

/// Read a number, substituting `default` when the value is missing.
pub fn fill_missing_numeric(
    raw: Option<&str>,
    default: f64,
) -> std::result::Result<f64, FieldError> {
    match raw {
        Some(text) if !is_missing(Some(text)) => parse_number(text.trim(), text),
        _ => Ok(default),
    }
}

fn coerce_optional(residual: &str, raw_text: &str) -> std::result::Result<Option<f64>, FieldError> {
    if is_missing(Some(residual)) {
        return Ok(None);
    }
    parse_number(residual.trim(), raw_text).map(Some)
}

fn parse_number(text: &str, raw_text: &str) -> std::result::Result<f64, FieldError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::Coercion {
            value: raw_text.to_string(),
        })
}

// ── Normalizer ────────────────────────────────────────────────────────────────

/// Turns [`RawRecord`]s into [`NormalizedRecord`]s, one for one.
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_format: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl Normalizer {
    /// Create a normalizer that reads every date with `date_format`.
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// The date format applied to every row.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Normalize every row, preserving order and count.
    ///
    /// The first failing field aborts the whole batch with
    /// [`OlapError::Field`]; no partial output is returned.
    pub fn normalize(&self, rows: &[RawRecord]) -> Result<Vec<NormalizedRecord>> {
        let records = rows
            .iter()
            .enumerate()
            .map(|(row, raw)| self.normalize_record(row, raw))
            .collect::<Result<Vec<_>>>()?;

        let unlocated = records
            .iter()
            .filter(|r| r.location_clean.is_none())
            .count();
        if unlocated > 0 {
            warn!(
                "{} rows have neither location nor country; kept with no location",
                unlocated
            );
        }

        debug!("Normalized {} rows", records.len());
        Ok(records)
    }

    /// Normalize a single row. `row` is only used for error context.
    pub fn normalize_record(&self, row: usize, raw: &RawRecord) -> Result<NormalizedRecord> {
        let at = move |column: &'static str| move |source: FieldError| OlapError::Field {
            row,
            column,
            source,
        };

        let date = parse_date(raw.date.as_deref(), &self.date_format).map_err(at("date"))?;
        let total_laid_off =
            fill_missing_numeric(raw.total_laid_off.as_deref(), 0.0).map_err(at("total_laid_off"))?;
        let perc_laid_off_num = clean_percentage(raw.percentage_laid_off.as_deref())
            .map_err(at("percentage_laid_off"))?;
        let funds_raised =
            clean_currency(raw.funds_raised.as_deref()).map_err(at("funds_raised"))?;

        Ok(NormalizedRecord {
            date,
            date_key: derive_date_key(date),
            company: clean_text(raw.company.as_deref()),
            location: clean_text(raw.location.as_deref()),
            country: clean_text(raw.country.as_deref()),
            industry: clean_text(raw.industry.as_deref()),
            location_clean: clean_location(raw.location.as_deref(), raw.country.as_deref()),
            total_laid_off,
            perc_laid_off_num,
            funds_raised,
            year: chrono::Datelike::year(&date),
            quarter: time_utils::quarter_label(date),
        })
    }
}
