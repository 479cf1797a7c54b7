use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names every input table must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "date",
    "company",
    "location",
    "country",
    "industry",
    "total_laid_off",
    "percentage_laid_off",
    "funds_raised",
];

/// One untyped input row. `None` marks an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub total_laid_off: Option<String>,
    #[serde(default)]
    pub percentage_laid_off: Option<String>,
    #[serde(default)]
    pub funds_raised: Option<String>,
}

impl RawRecord {
    /// Build a record from string slices, mapping `""` to `None`.
    ///
    /// Argument order follows [`REQUIRED_COLUMNS`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_fields(
        date: &str,
        company: &str,
        location: &str,
        country: &str,
        industry: &str,
        total_laid_off: &str,
        percentage_laid_off: &str,
        funds_raised: &str,
    ) -> Self {
        let cell = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            date: cell(date),
            company: cell(company),
            location: cell(location),
            country: cell(country),
            industry: cell(industry),
            total_laid_off: cell(total_laid_off),
            percentage_laid_off: cell(percentage_laid_off),
            funds_raised: cell(funds_raised),
        }
    }
}

/// A cleaned, typed layoff event. One per [`RawRecord`], same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Calendar date of the event.
    pub date: NaiveDate,
    /// `YYYYMMDD` encoding of `date`.
    pub date_key: u32,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    /// `location` when present, otherwise `country`.
    pub location_clean: Option<String>,
    /// Head count; a missing value is stored as `0.0`.
    pub total_laid_off: f64,
    /// Percentage on a 0–100 scale; `None` when missing.
    pub perc_laid_off_num: Option<f64>,
    /// Funds raised in currency units; `None` when missing.
    pub funds_raised: Option<f64>,
    /// Calendar year of `date`.
    pub year: i32,
    /// Quarter label such as `"2024Q1"`.
    pub quarter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_maps_empty_to_none() {
        let raw = RawRecord::from_fields(
            "2023-01-15",
            "Acme",
            "",
            "USA",
            "AI",
            "100",
            "10%",
            "$1,000,000",
        );
        assert_eq!(raw.date.as_deref(), Some("2023-01-15"));
        assert_eq!(raw.location, None);
        assert_eq!(raw.country.as_deref(), Some("USA"));
        assert_eq!(raw.funds_raised.as_deref(), Some("$1,000,000"));
    }

    #[test]
    fn test_raw_record_deserialize_missing_fields_default_to_none() {
        let raw: RawRecord = serde_json::from_str(r#"{"date":"2024-02-01"}"#).unwrap();
        assert_eq!(raw.date.as_deref(), Some("2024-02-01"));
        assert_eq!(raw.company, None);
        assert_eq!(raw.total_laid_off, None);
    }

    #[test]
    fn test_required_columns_are_unique() {
        let mut cols = REQUIRED_COLUMNS.to_vec();
        cols.sort_unstable();
        cols.dedup();
        assert_eq!(cols.len(), REQUIRED_COLUMNS.len());
    }
}
