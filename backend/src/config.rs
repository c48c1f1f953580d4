//! Configuration.
//!
//! - [`EtlConfig`]: where the tools read and write, from the environment
//!   (`.env` is loaded when present)
//! - [`DashboardConfig`]: the dashboard's `metadata/config.json`, every field
//!   defaulted so a missing or partial file still yields a usable config

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::api::logs::log_warning;

pub const DATA_DIR_VAR: &str = "ORCAMENTO_DATA_DIR";
pub const PUBLIC_DIR_VAR: &str = "ORCAMENTO_PUBLIC_DIR";
pub const PORT_VAR: &str = "ORCAMENTO_PORT";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PUBLIC_DIR: &str = "public/data";
pub const DEFAULT_PORT: u16 = 3000;

/// Paths and port used by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    /// Root of the normalized outputs (`<data>/<year>/orcado.csv`, ...)
    pub data_dir: PathBuf,
    /// Copy of the data root served to the dashboard
    pub public_dir: PathBuf,
    pub port: u16,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            port: DEFAULT_PORT,
        }
    }
}

impl EtlConfig {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty(PORT_VAR) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log_warning(format!("Ignoring invalid {}='{}'", PORT_VAR, raw));
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            data_dir: non_empty(DATA_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            public_dir: non_empty(PUBLIC_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            port,
        }
    }
}

// =============================================================================
// Dashboard config.json
// =============================================================================

/// Dashboard settings: currency and variance alert thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "aplicacao", default)]
    pub app: AppSettings,
    #[serde(rename = "alertas", default)]
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "nome", default = "default_app_name")]
    pub name: String,
    /// ISO 4217 code
    #[serde(rename = "moeda", default = "default_currency")]
    pub currency: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            currency: default_currency(),
        }
    }
}

/// Absolute variance percentages at which a line changes color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    #[serde(rename = "variacao_atencao_percentual", default = "default_attention")]
    pub attention_pct: f64,
    #[serde(rename = "variacao_alerta_percentual", default = "default_alert")]
    pub alert_pct: f64,
    #[serde(rename = "variacao_critica_percentual", default = "default_critical")]
    pub critical_pct: f64,
    #[serde(rename = "cores", default)]
    pub colors: AlertColors,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            attention_pct: default_attention(),
            alert_pct: default_alert(),
            critical_pct: default_critical(),
            colors: AlertColors::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertColors {
    #[serde(default = "default_normal_color")]
    pub normal: String,
    #[serde(rename = "atencao", default = "default_attention_color")]
    pub attention: String,
    #[serde(rename = "alerta", default = "default_alert_color")]
    pub alert: String,
    #[serde(rename = "critico", default = "default_critical_color")]
    pub critical: String,
}

impl Default for AlertColors {
    fn default() -> Self {
        Self {
            normal: default_normal_color(),
            attention: default_attention_color(),
            alert: default_alert_color(),
            critical: default_critical_color(),
        }
    }
}

fn default_app_name() -> String {
    "Dashboard Orçamentário".to_string()
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_attention() -> f64 {
    5.0
}

fn default_alert() -> f64 {
    10.0
}

fn default_critical() -> f64 {
    15.0
}

fn default_normal_color() -> String {
    "#10b981".to_string()
}

fn default_attention_color() -> String {
    "#eab308".to_string()
}

fn default_alert_color() -> String {
    "#f59e0b".to_string()
}

fn default_critical_color() -> String {
    "#ef4444".to_string()
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read `config.json`; a missing or malformed file yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).unwrap_or_else(|e| {
                log_warning(format!("Invalid {}: {}; using defaults", path.display(), e));
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_etl_config_defaults() {
        let config = EtlConfig::from_lookup(|_| None);
        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.public_dir, PathBuf::from("public/data"));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_etl_config_overrides() {
        let vars: HashMap<&str, &str> = [
            (DATA_DIR_VAR, "/srv/orcamento"),
            (PUBLIC_DIR_VAR, ""),
            (PORT_VAR, "8080"),
        ]
        .into_iter()
        .collect();
        let config = EtlConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/srv/orcamento"));
        assert_eq!(config.public_dir, PathBuf::from("public/data"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_etl_config_bad_port_falls_back() {
        let config = EtlConfig::from_lookup(|k| (k == PORT_VAR).then(|| "http".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_dashboard_config_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.app.currency, "BRL");
        assert_eq!(config.alerts.attention_pct, 5.0);
        assert_eq!(config.alerts.alert_pct, 10.0);
        assert_eq!(config.alerts.critical_pct, 15.0);
        assert_eq!(config.alerts.colors.normal, "#10b981");
        assert_eq!(config.alerts.colors.critical, "#ef4444");
    }

    #[test]
    fn test_dashboard_config_partial_json() {
        let json = r##"{
            "aplicacao": { "moeda": "USD" },
            "alertas": { "variacao_critica_percentual": 20, "cores": { "critico": "#000000" } }
        }"##;
        let config = DashboardConfig::from_json(json).unwrap();

        assert_eq!(config.app.currency, "USD");
        assert_eq!(config.app.name, "Dashboard Orçamentário");
        assert_eq!(config.alerts.critical_pct, 20.0);
        assert_eq!(config.alerts.attention_pct, 5.0);
        assert_eq!(config.alerts.colors.critical, "#000000");
        assert_eq!(config.alerts.colors.alert, "#f59e0b");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = DashboardConfig::load_or_default(Path::new("/nonexistent/config.json"));
        assert_eq!(config, DashboardConfig::default());
    }
}
