//! Core types for the layoffs OLAP pipeline.
//!
//! Holds the raw and normalized record models, the field normalizer, the
//! error taxonomy and run configuration. Aggregation lives in `olap-data`.

pub mod error;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod time_utils;

pub use error::{FieldError, OlapError, Result};
