//! Dashboard asset loading.
//!
//! Fetches the fixed set of files the dashboard reads, concurrently, from a
//! local data root or over HTTP. A failed fetch is logged and leaves its slice
//! empty; loading as a whole never fails.

use serde::Serialize;

use crate::api::logs::{log_error, log_info};
use crate::config::DashboardConfig;
use crate::error::LoadError;
use crate::models::{BudgetRecord, Equipment, EquipmentCatalog};
use crate::transform::{ACTUALS_FILE, BUDGET_FILE, CATALOG_FILE};
use crate::writer::read_budget_csv;

/// Dashboard config path, relative to the data root.
pub const CONFIG_FILE: &str = "metadata/config.json";

/// Where dashboard assets live.
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// A data root on disk
    Dir(std::path::PathBuf),
    /// A base URL serving the data root (e.g. `http://localhost:3000/data`)
    Http { base: String, client: reqwest::Client },
}

impl AssetSource {
    pub fn http(base: impl Into<String>) -> Self {
        Self::Http {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Human-readable location of an asset.
    pub fn location(&self, relative: &str) -> String {
        match self {
            Self::Dir(root) => root.join(relative).display().to_string(),
            Self::Http { base, .. } => format!("{}/{}", base, relative),
        }
    }

    /// Raw bytes of one asset.
    pub async fn fetch(&self, relative: &str) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::Dir(root) => {
                let path = root.join(relative);
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| LoadError::Io(path.display().to_string(), e))
            }
            Self::Http { client, .. } => {
                let url = self.location(relative);
                let response = client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status {
                        url,
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    async fn budget_csv(&self, relative: &str) -> Result<Vec<BudgetRecord>, LoadError> {
        let bytes = self.fetch(relative).await?;
        Ok(read_budget_csv(bytes.as_slice())?)
    }

    async fn catalog(&self) -> Result<Vec<Equipment>, LoadError> {
        let bytes = self.fetch(CATALOG_FILE).await?;
        let catalog: EquipmentCatalog = serde_json::from_slice(&bytes)?;
        Ok(catalog.equipment)
    }

    async fn config(&self) -> Result<DashboardConfig, LoadError> {
        let bytes = self.fetch(CONFIG_FILE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Plan and actuals of one fiscal year.
#[derive(Debug, Clone, Default, Serialize)]
pub struct YearData {
    pub year: i32,
    pub budget: Vec<BudgetRecord>,
    pub actuals: Vec<BudgetRecord>,
}

/// Everything the dashboard renders from.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub previous: YearData,
    pub current: YearData,
    pub equipment: Vec<Equipment>,
    pub config: DashboardConfig,
}

fn or_empty<T: Default>(location: String, result: Result<T, LoadError>) -> T {
    result.unwrap_or_else(|e| {
        log_error(format!("Failed to load {}: {}", location, e));
        T::default()
    })
}

fn year_file(year: i32, file: &str) -> String {
    format!("{}/{}", year, file)
}

/// Load both years, the catalog and the optional config concurrently.
pub async fn load_all(source: &AssetSource, previous_year: i32, current_year: i32) -> DashboardData {
    let paths = [
        year_file(previous_year, BUDGET_FILE),
        year_file(previous_year, ACTUALS_FILE),
        year_file(current_year, BUDGET_FILE),
        year_file(current_year, ACTUALS_FILE),
    ];

    let csvs = futures::future::join_all(paths.iter().map(|p| source.budget_csv(p)));
    let (csvs, equipment, config) = futures::join!(csvs, source.catalog(), source.config());

    let mut csvs = paths
        .iter()
        .zip(csvs)
        .map(|(path, result)| or_empty(source.location(path), result));
    let mut next = || csvs.next().unwrap_or_default();

    let previous = YearData {
        year: previous_year,
        budget: next(),
        actuals: next(),
    };
    let current = YearData {
        year: current_year,
        budget: next(),
        actuals: next(),
    };

    let equipment = or_empty(source.location(CATALOG_FILE), equipment);
    let config = config.unwrap_or_else(|_| {
        log_info("No dashboard config found, using defaults");
        DashboardConfig::default()
    });

    DashboardData {
        previous,
        current,
        equipment,
        config,
    }
}
