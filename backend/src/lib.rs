//! # Orcamento - Budget dashboard ETL
//!
//! Orcamento reshapes raw accounting exports (semicolon budget sheets, quoted
//! ledger exports) into the normalized long-format CSV and equipment catalog
//! JSON that the budget dashboard reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │  Raw export │────▶│   Parser    │────▶│   Engine    │────▶│ orcado.csv   │
//! │ (Latin/UTF8)│     │ (split, R$) │     │ (rule-based)│     │ catalog JSON │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orcamento::{run_rule, equipment_budget_rule};
//! use std::path::Path;
//!
//! let output = run_rule(Path::new("orcamento_2026.csv"), &equipment_budget_rule())?;
//! println!("{}", output.report.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (BudgetRecord, DetailRecord, Equipment)
//! - [`parser`] - Source decoding, line splitting, pt-BR numbers
//! - [`classify`] - Equipment and accounting class lookup tables
//! - [`transform`] - Reshape rules, engine, catalog and pipeline
//! - [`writer`] - Normalized CSV/JSON outputs
//! - [`config`] - Environment and dashboard configuration
//! - [`dashboard`] - Loading and aggregating dashboard data
//! - [`api`] - Log broadcaster and static file server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod classify;
pub mod parser;

// Transformation
pub mod transform;
pub mod writer;

// Configuration
pub mod config;

// Dashboard data
pub mod dashboard;

// HTTP + logs
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError, CsvError, InvalidNumber, LoadError, PipelineError, RuleError, ServerError,
    WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BudgetRecord, ClassMapping, DetailRecord, Equipment, EquipmentCatalog, Month,
    GENERIC_EQUIPMENT,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_source, detect_encoding, parse_date, parse_decimal, parse_valor,
    read_source, split_line, split_quoted_line, try_parse_valor, QuoteMode, SourceText,
};

pub use classify::{
    extract_equipment_category, extract_equipment_tag, is_valid_equipment_code,
    map_accounting_class, map_month_name,
};

// =============================================================================
// Re-exports - Rules and engine
// =============================================================================

pub use transform::{
    builtin_rule, collect_equipment_tags, detailed_budget_rule, equipment_budget_rule,
    general_ledger_rule, itemized_ledger_rule, reshape, reshape_lines, resolve_rule,
    ReshapeOutput, ReshapeRule, RunReport, BUILTIN_RULES,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    build_catalog, convert_budget, convert_itemized, convert_ledger, convert_with_rule,
    generate_catalog, run_rule, BudgetInputs, CatalogSource, ConversionSummary,
};

pub use writer::{read_budget_csv, write_budget_csv, write_detail_csv};

pub use config::{DashboardConfig, EtlConfig};

// Pipeline
pub mod pipeline {
    pub use crate::transform::pipeline::*;
}

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
