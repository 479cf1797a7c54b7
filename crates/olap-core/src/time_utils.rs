use chrono::{Datelike, NaiveDate};

/// Date format of the source data: ISO calendar date, e.g. `2023-01-15`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest and latest years that still fit an 8-digit `YYYYMMDD` key.
const MIN_KEY_YEAR: i32 = 1000;
const MAX_KEY_YEAR: i32 = 9999;

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `s` as a calendar date under exactly `format`.
///
/// Leading and trailing whitespace is ignored. Returns `None` when the text
/// does not match, has trailing input, or the year falls outside
/// 1000–9999.
pub fn parse_calendar_date(s: &str, format: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s.trim(), format).ok()?;
    (MIN_KEY_YEAR..=MAX_KEY_YEAR)
        .contains(&date.year())
        .then_some(date)
}

// ── Derived keys ──────────────────────────────────────────────────────────────

/// `YYYYMMDD` integer key for `date`.
///
/// Ordering of keys matches ordering of dates for every year accepted by
/// [`parse_calendar_date`].
pub fn date_key(date: NaiveDate) -> u32 {
    let year = date.year().clamp(0, MAX_KEY_YEAR) as u32;
    year * 10_000 + date.month() * 100 + date.day()
}

/// Quarter number 1–4 for `date`.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Quarter label in `"{year}Q{n}"` form, e.g. `"2024Q1"`.
pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), quarter_of(date))
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
