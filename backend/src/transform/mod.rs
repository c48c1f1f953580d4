//! Transformation module.
//!
//! This module handles raw export to normalized record transformation:
//! - Rule: Data description of a source layout
//! - Engine: Executes a rule over source lines
//! - Catalog: Equipment catalog from observed tags
//! - Pipeline: File-level conversions

pub mod catalog;
pub mod engine;
pub mod pipeline;
pub mod rule;

pub use catalog::{
    build_catalog, category_counts, scan_sources, write_catalog, CatalogScan, CatalogSource,
};
pub use engine::{
    collect_equipment_tags, reshape, reshape_lines, InvalidValue, ReshapeOutput, RunReport,
    SkipCounts, SkipReason,
};
pub use pipeline::*;
pub use rule::*;
