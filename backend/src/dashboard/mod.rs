//! Data side of the budget dashboard.
//!
//! - Loader: fetches the normalized outputs, catalog and config
//! - Aggregate: plan vs. actual comparisons and variance levels
//! - Format: pt-BR currency and percentage text

pub mod aggregate;
pub mod format;
pub mod loader;

pub use aggregate::{
    compare_by, kpis, variance_color, Comparison, Filter, GroupKey, Kpis, VarianceLevel,
    ALL_CLASS_GROUPS, ALL_EQUIPMENT,
};
pub use format::{format_currency, format_percentage};
pub use loader::{load_all, AssetSource, DashboardData, YearData, CONFIG_FILE};
