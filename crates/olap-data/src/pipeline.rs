//! Single-run pipeline: normalize, model, aggregate.
//!
//! Either every output is produced or the run fails as a whole.

use std::path::Path;

use chrono::Utc;
use olap_core::error::Result;
use olap_core::models::{NormalizedRecord, RawRecord};
use olap_core::normalizer::Normalizer;
use olap_core::settings::CubeConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::{Cube, CubeAggregator};
use crate::reader::load_layoffs_csv;
use crate::star_schema::{DimensionCounts, FlowGraph, StarSchema, TableSize};

// ── Public types ──────────────────────────────────────────────────────────────

/// Bookkeeping produced alongside the pipeline outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Label of the input, usually its file name.
    pub source: String,
    /// Rows read from the input.
    pub rows_loaded: usize,
    /// Wall-clock seconds spent normalizing rows.
    pub normalize_time_seconds: f64,
    /// Wall-clock seconds spent building the star schema and cube.
    pub aggregate_time_seconds: f64,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Normalized rows; also the fact table.
    pub records: Vec<NormalizedRecord>,
    pub counts: DimensionCounts,
    pub cube: Cube,
    pub metadata: RunMetadata,
}

/// Star-schema section of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlReport {
    pub counts: DimensionCounts,
    pub table_sizes: Vec<TableSize>,
    pub flow_graph: FlowGraph,
}

/// Serializable view of a [`PipelineResult`] for downstream renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: RunMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etl: Option<EtlReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cube: Option<Cube>,
}

impl PipelineResult {
    /// Star schema over this run's records.
    pub fn star_schema(&self) -> StarSchema<'_> {
        StarSchema::build(&self.records)
    }

    /// Build a report holding the requested sections.
    pub fn report(&self, include_etl: bool, include_cube: bool) -> Report {
        let etl = include_etl.then(|| EtlReport {
            counts: self.counts,
            table_sizes: self.counts.table_sizes(),
            flow_graph: self.counts.flow_graph(&self.metadata.source),
        });
        Report {
            metadata: self.metadata.clone(),
            etl,
            cube: include_cube.then(|| self.cube.clone()),
        }
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load the CSV at `path` and run the pipeline over it.
///
/// The file name becomes the source label of the flow graph.
pub fn analyze_file(path: &Path, config: &CubeConfig) -> Result<PipelineResult> {
    let rows = load_layoffs_csv(path)?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    run_pipeline(&rows, &source, config)
}

/// Run the full pipeline over in-memory rows.
///
/// 1. Normalize every row (hard failure on the first bad field).
/// 2. Count star-schema dimensions.
/// 3. Build the three cube views.
pub fn run_pipeline(rows: &[RawRecord], source: &str, config: &CubeConfig) -> Result<PipelineResult> {
    config.validate()?;

    // ── Step 1: Normalize ─────────────────────────────────────────────────────
    let normalize_start = std::time::Instant::now();
    let records = Normalizer::new(config.date_format.as_str()).normalize(rows)?;
    let normalize_time = normalize_start.elapsed().as_secs_f64();

    // ── Step 2 & 3: Model and aggregate ───────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let counts = StarSchema::build(&records).counts();
    let cube = CubeAggregator::new(config.clone()).build(&records)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!(
        "Pipeline done: {} facts, {} heat-map rows, {} slice cells, {} rolling points",
        counts.cnt_fact,
        cube.heatmap.countries.len(),
        cube.industry_quarter.len(),
        cube.rolling.len()
    );

    let metadata = RunMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source: source.to_string(),
        rows_loaded: rows.len(),
        normalize_time_seconds: normalize_time,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(PipelineResult {
        records,
        counts,
        cube,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use olap_core::error::OlapError;
    use std::io::Write;
    use tempfile::TempDir;

    fn scenario_rows() -> Vec<RawRecord> {
        vec![
            RawRecord::from_fields(
                "2023-01-15", "Acme", "", "USA", "AI", "100", "10%", "$1,000,000",
            ),
            RawRecord::from_fields(
                "2023-02-20", "Acme", "Berlin", "Germany", "AI", "50", "None", "$500",
            ),
        ]
    }

    #[test]
    fn test_end_to_end_scenario() {
        let result = run_pipeline(&scenario_rows(), "layoffs.csv", &CubeConfig::default()).unwrap();

        assert_eq!(result.counts.cnt_company, 1);
        assert_eq!(result.counts.cnt_location, 2);
        assert_eq!(result.counts.cnt_date, 2);
        assert_eq!(result.counts.cnt_fact, 2);
        assert_eq!(result.cube.heatmap.get("USA", 2023), Some(100.0));
        assert_eq!(result.cube.heatmap.get("Germany", 2023), Some(50.0));
        assert!(result.cube.industry_quarter.is_empty());
        assert!(result.cube.rolling.is_empty());

        let first = &result.records[0];
        assert_eq!(first.location_clean.as_deref(), Some("USA"));
        assert_eq!(first.funds_raised, Some(1_000_000.0));
        assert_eq!(first.perc_laid_off_num, Some(10.0));
        let second = &result.records[1];
        assert_eq!(second.perc_laid_off_num, None);
        assert_eq!(second.funds_raised, Some(500.0));
    }

    #[test]
    fn test_fact_count_equals_input_rows() {
        let mut rows = scenario_rows();
        rows.extend(scenario_rows());
        rows.push(RawRecord::from_fields("2024-03-03", "", "", "", "", "", "", ""));
        let result = run_pipeline(&rows, "x.csv", &CubeConfig::default()).unwrap();
        assert_eq!(result.records.len(), rows.len());
        assert_eq!(result.counts.cnt_fact, rows.len());
        assert_eq!(result.counts.n_rows, rows.len());
        assert_eq!(result.metadata.rows_loaded, rows.len());
    }

    #[test]
    fn test_failure_produces_no_output() {
        let mut rows = scenario_rows();
        rows.push(RawRecord::from_fields("2023-13-01", "X", "", "USA", "AI", "1", "", ""));
        let err = run_pipeline(&rows, "x.csv", &CubeConfig::default()).unwrap_err();
        assert!(matches!(err, OlapError::Field { row: 2, column: "date", .. }));
    }

    #[test]
    fn test_star_schema_matches_counts() {
        let result = run_pipeline(&scenario_rows(), "x.csv", &CubeConfig::default()).unwrap();
        let schema = result.star_schema();
        assert_eq!(schema.counts(), result.counts);
        assert!(schema.dim_location.contains(&Some("Berlin".to_string())));
    }

    #[test]
    fn test_report_sections() {
        let result = run_pipeline(&scenario_rows(), "layoffs.csv", &CubeConfig::default()).unwrap();

        let etl_only = result.report(true, false);
        assert!(etl_only.cube.is_none());
        let etl = etl_only.etl.expect("etl section");
        assert_eq!(etl.flow_graph.nodes[0], "layoffs.csv");
        assert_eq!(etl.flow_graph.links.len(), 5);

        let json = serde_json::to_value(result.report(false, true)).unwrap();
        assert!(json.get("etl").is_none());
        assert_eq!(json["cube"]["heatmap"]["countries"][0], "USA");
        assert_eq!(json["metadata"]["source"], "layoffs.csv");
    }

    #[test]
    fn test_analyze_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layoffs.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "date,company,location,country,industry,total_laid_off,percentage_laid_off,funds_raised"
        )
        .unwrap();
        writeln!(file, "2023-01-15,Acme,,USA,AI,100,10%,\"$1,000,000\"").unwrap();
        writeln!(file, "2023-02-20,Acme,Berlin,Germany,AI,50,None,$500").unwrap();
        drop(file);

        let result = analyze_file(&path, &CubeConfig::default()).unwrap();
        assert_eq!(result.metadata.source, "layoffs.csv");
        assert_eq!(result.counts.cnt_location, 2);
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let config = CubeConfig {
            top_industries: 0,
            ..CubeConfig::default()
        };
        assert!(matches!(
            run_pipeline(&scenario_rows(), "x.csv", &config),
            Err(OlapError::Config(_))
        ));
    }
}
