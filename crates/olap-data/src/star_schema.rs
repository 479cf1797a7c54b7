//! Star-schema decomposition of normalized layoff records.
//!
//! Dimensions are the distinct values of `date_key`, `company` and
//! `location_clean`; the fact table is the full record set. Missing values
//! form a single distinct class in each dimension.

use std::collections::BTreeSet;

use olap_core::models::NormalizedRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Label of the intermediate node in the ETL flow graph.
pub const TRANSFORM_NODE: &str = "Transform ETL";

/// Names of the four output tables, in flow-graph order.
pub const TABLE_NAMES: [&str; 4] = ["dim_date", "dim_company", "dim_location", "fact_layoffs"];

// ── StarSchema ────────────────────────────────────────────────────────────────

/// Dimension tables plus a borrowed fact table.
#[derive(Debug, Clone)]
pub struct StarSchema<'a> {
    pub dim_date: BTreeSet<u32>,
    pub dim_company: BTreeSet<Option<String>>,
    pub dim_location: BTreeSet<Option<String>>,
    pub fact_layoffs: &'a [NormalizedRecord],
}

impl<'a> StarSchema<'a> {
    /// Derive every dimension from `records`. Every record is a fact.
    pub fn build(records: &'a [NormalizedRecord]) -> Self {
        let mut dim_date = BTreeSet::new();
        let mut dim_company = BTreeSet::new();
        let mut dim_location = BTreeSet::new();

        for record in records {
            dim_date.insert(record.date_key);
            dim_company.insert(record.company.clone());
            dim_location.insert(record.location_clean.clone());
        }

        debug!(
            "Star schema: {} dates, {} companies, {} locations, {} facts",
            dim_date.len(),
            dim_company.len(),
            dim_location.len(),
            records.len()
        );

        Self {
            dim_date,
            dim_company,
            dim_location,
            fact_layoffs: records,
        }
    }

    /// Cardinality of each table.
    pub fn counts(&self) -> DimensionCounts {
        DimensionCounts {
            cnt_date: self.dim_date.len(),
            cnt_company: self.dim_company.len(),
            cnt_location: self.dim_location.len(),
            cnt_fact: self.fact_layoffs.len(),
            n_rows: self.fact_layoffs.len(),
        }
    }
}

// ── DimensionCounts ───────────────────────────────────────────────────────────

/// Row counts of the source and of every star-schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCounts {
    pub cnt_date: usize,
    pub cnt_company: usize,
    pub cnt_location: usize,
    pub cnt_fact: usize,
    /// Rows in the input table.
    pub n_rows: usize,
}

impl DimensionCounts {
    /// `(table, row count)` for the four output tables, in fixed order.
    pub fn table_sizes(&self) -> Vec<TableSize> {
        let counts = [self.cnt_date, self.cnt_company, self.cnt_location, self.cnt_fact];
        TABLE_NAMES
            .iter()
            .zip(counts)
            .map(|(name, rows)| TableSize {
                table: (*name).to_string(),
                rows,
            })
            .collect()
    }

    /// Five-edge flow from the source file through the transform into each table.
    pub fn flow_graph(&self, source_label: &str) -> FlowGraph {
        let mut nodes = vec![source_label.to_string(), TRANSFORM_NODE.to_string()];
        nodes.extend(TABLE_NAMES.iter().map(|t| t.to_string()));

        let mut links = vec![FlowLink {
            source: 0,
            target: 1,
            value: self.n_rows,
        }];
        links.extend(
            self.table_sizes()
                .into_iter()
                .enumerate()
                .map(|(i, size)| FlowLink {
                    source: 1,
                    target: i + 2,
                    value: size.rows,
                }),
        );

        FlowGraph { nodes, links }
    }
}

/// Row count of one output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSize {
    pub table: String,
    pub rows: usize,
}

// ── FlowGraph ─────────────────────────────────────────────────────────────────

/// Weighted edge between two [`FlowGraph`] nodes, by node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: usize,
}

/// Node labels and weighted links describing the ETL flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<String>,
    pub links: Vec<FlowLink>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
