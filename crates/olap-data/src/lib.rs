//! Data layer of the layoffs OLAP pipeline.
//!
//! Loads layoff CSV files, decomposes normalized records into a star schema,
//! builds the cube views and runs the whole thing as one batch.

pub mod aggregator;
pub mod pipeline;
pub mod reader;
pub mod star_schema;

pub use olap_core as core;
