//! Error types for the budget ETL pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`CsvError`] - Reading and decoding source exports
//! - [`RuleError`] - Invalid reshape rules
//! - [`WriteError`] - Writing normalized CSV/JSON outputs
//! - [`CatalogError`] - Equipment catalog generation
//! - [`LoadError`] - Dashboard asset loading
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - Static file server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading a source export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode the file content.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Malformed normalized CSV (reading back our own outputs).
    #[error("Invalid CSV format: {0}")]
    Parse(#[from] csv::Error),
}

/// A numeric token that could not be parsed.
///
/// Coerced to zero by callers; carried only so it can be counted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid numeric token: '{0}'")]
pub struct InvalidNumber(pub String);

// =============================================================================
// Rule Errors
// =============================================================================

/// Errors in a reshape rule definition.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Unknown built-in rule name.
    #[error("Unknown rule: {0}")]
    Unknown(String),

    /// A column index is not covered by the rule's minimum column count.
    #[error("Rule '{rule}': column {column} ({field}) is beyond min_columns {min_columns}")]
    ColumnOutOfRange {
        rule: String,
        field: String,
        column: usize,
        min_columns: usize,
    },

    /// A wide layout without year blocks, or similar structural issue.
    #[error("Rule '{rule}': {message}")]
    Invalid { rule: String, message: String },

    /// JSON serialization/deserialization error.
    #[error("Rule JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while loading a rule file.
    #[error("Rule IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Write Errors
// =============================================================================

/// Errors while writing outputs.
#[derive(Debug, Error)]
pub enum WriteError {
    /// IO error (directory creation, file write).
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors during equipment catalog generation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Writing the catalog failed.
    #[error("Catalog write error: {0}")]
    Write(#[from] WriteError),

    /// Reshaping a raw source failed.
    #[error("Catalog rule error: {0}")]
    Rule(#[from] RuleError),
}

// =============================================================================
// Dashboard Load Errors
// =============================================================================

/// Errors while fetching a dashboard asset.
///
/// The loader never propagates these; they are logged and the slice is empty.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Local file read failed.
    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// CSV content could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// JSON content could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline`].
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Rule error.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Output error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// Static file server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The directory to serve does not exist.
    #[error("Data directory not found: {0}")]
    MissingDir(PathBuf),

    /// Bind or serve failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV reading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type for writers.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for the catalog generator.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
