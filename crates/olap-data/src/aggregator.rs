//! OLAP cube views over normalized layoff records.
//!
//! Three independent views:
//! * country × year heat-map restricted to the top countries,
//! * industry × quarter slice of one year restricted to the top industries,
//! * trailing rolling sum of one industry's monthly layoffs.
//!
//! Records whose grouping key (country or industry) is missing are left out
//! of that grouping. `total_laid_off` is already zero-filled upstream.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use olap_core::error::{OlapError, Result};
use olap_core::models::NormalizedRecord;
use olap_core::settings::CubeConfig;
use olap_core::time_utils::month_start;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Output types ──────────────────────────────────────────────────────────────

/// Dense country × year matrix of summed layoffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMap {
    /// Row labels, highest total first.
    pub countries: Vec<String>,
    /// Column labels, ascending.
    pub years: Vec<i32>,
    /// `values[row][col]`; pairs without events hold `0.0`.
    pub values: Vec<Vec<f64>>,
}

impl HeatMap {
    /// Value at `(country, year)`, or `None` when either label is not in the matrix.
    pub fn get(&self, country: &str, year: i32) -> Option<f64> {
        let row = self.countries.iter().position(|c| c == country)?;
        let col = self.years.iter().position(|y| *y == year)?;
        Some(self.values[row][col])
    }

    /// Sum of each row, in row order.
    pub fn row_totals(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Summed layoffs of one industry in one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterCell {
    pub industry: String,
    pub quarter: String,
    pub total_laid_off: f64,
}

/// Summed layoffs of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the month.
    pub month: NaiveDate,
    pub total_laid_off: f64,
}

/// Trailing sum ending at `window_end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// First day of the last month inside the window.
    pub window_end: NaiveDate,
    pub rolling_sum: f64,
}

/// All three cube views of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    pub heatmap: HeatMap,
    pub industry_quarter: Vec<QuarterCell>,
    pub rolling: Vec<RollingPoint>,
}

// ── CubeAggregator ────────────────────────────────────────────────────────────

/// Builds the cube views with the parameters of a [`CubeConfig`].
#[derive(Debug, Clone)]
pub struct CubeAggregator {
    config: CubeConfig,
}

impl CubeAggregator {
    pub fn new(config: CubeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    /// Compute every view. Fails only on an invalid configuration.
    pub fn build(&self, records: &[NormalizedRecord]) -> Result<Cube> {
        self.config.validate()?;
        let heatmap = country_year_heatmap(records, self.config.top_countries);
        let industry_quarter =
            industry_quarter_slice(records, self.config.cube_year, self.config.top_industries);
        let rolling = rolling_category_sum(
            records,
            &self.config.rolling_industry,
            self.config.rolling_window,
        )?;

        Ok(Cube {
            heatmap,
            industry_quarter,
            rolling,
        })
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Country × year sums, restricted to the `top_n` countries by overall total.
///
/// Columns cover every year that has at least one event with a country,
/// including years where none of the selected countries had layoffs.
pub fn country_year_heatmap(records: &[NormalizedRecord], top_n: usize) -> HeatMap {
    let mut cells: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();

    for record in records {
        let Some(country) = record.country.as_deref() else {
            continue;
        };
        *cells.entry((country, record.year)).or_insert(0.0) += record.total_laid_off;
        years.insert(record.year);
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (&(country, _), value) in &cells {
        *totals.entry(country).or_insert(0.0) += value;
    }

    let countries = top_n_by_total(totals, top_n);
    let years: Vec<i32> = years.into_iter().collect();
    let values = countries
        .iter()
        .map(|country| {
            years
                .iter()
                .map(|&year| cells.get(&(country.as_str(), year)).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    debug!(
        "Heat-map: {} countries x {} years",
        countries.len(),
        years.len()
    );

    HeatMap {
        countries,
        years,
        values,
    }
}

/// Industry × quarter sums for `year`, restricted to the `top_n` industries.
///
/// Cells are ordered by industry name, then quarter.
pub fn industry_quarter_slice(
    records: &[NormalizedRecord],
    year: i32,
    top_n: usize,
) -> Vec<QuarterCell> {
    let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.year == year) {
        let Some(industry) = record.industry.as_deref() else {
            continue;
        };
        *cells
            .entry((industry, record.quarter.as_str()))
            .or_insert(0.0) += record.total_laid_off;
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (&(industry, _), value) in &cells {
        *totals.entry(industry).or_insert(0.0) += value;
    }
    let selected: BTreeSet<String> = top_n_by_total(totals, top_n).into_iter().collect();

    let slice: Vec<QuarterCell> = cells
        .into_iter()
        .filter(|((industry, _), _)| selected.contains(*industry))
        .map(|((industry, quarter), total)| QuarterCell {
            industry: industry.to_string(),
            quarter: quarter.to_string(),
            total_laid_off: total,
        })
        .collect();

    debug!(
        "Industry x quarter slice for {}: {} industries, {} cells",
        year,
        selected.len(),
        slice.len()
    );
    slice
}

/// Monthly sums for one industry, ascending. Months without events are absent.
pub fn monthly_totals(records: &[NormalizedRecord], industry: &str) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.industry.as_deref() == Some(industry))
    {
        *months.entry(month_start(record.date)).or_insert(0.0) += record.total_laid_off;
    }

    months
        .into_iter()
        .map(|(month, total_laid_off)| MonthlyTotal {
            month,
            total_laid_off,
        })
        .collect()
}

/// Trailing `window`-point sum over the monthly series of `industry`.
///
/// The window counts available months, not calendar months: a month with no
/// events is skipped, so one window can span more than `window` calendar
/// months. The first `window - 1` points have no output.
pub fn rolling_category_sum(
    records: &[NormalizedRecord],
    industry: &str,
    window: usize,
) -> Result<Vec<RollingPoint>> {
    let series = monthly_totals(records, industry);
    let values: Vec<f64> = series.iter().map(|m| m.total_laid_off).collect();
    let sums = rolling_sum(&values, window)?;

    if sums.is_empty() {
        warn!(
            "Only {} months of `{}` data; rolling window of {} yields no points",
            series.len(),
            industry,
            window
        );
    }

    Ok(series
        .iter()
        .skip(window - 1)
        .zip(sums)
        .map(|(month, rolling_sum)| RollingPoint {
            window_end: month.month,
            rolling_sum,
        })
        .collect())
}

/// Sum of every full `window`-length run of `values`, in order.
pub fn rolling_sum(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(OlapError::Config("rolling window must be at least 1".into()));
    }
    Ok(values.windows(window).map(|w| w.iter().sum()).collect())
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Keys of the `n` largest totals, highest first.
///
/// `totals` iterates in key order and the sort is stable, so equal totals
/// keep ascending key order.
fn top_n_by_total(totals: BTreeMap<&str, f64>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(key, _)| key.to_string())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
