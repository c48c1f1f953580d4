//! Budget vs. actual comparisons.
//!
//! Baseline is the plan (or the previous year), current is what was spent.
//! All ratios are 0 when the baseline is 0.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{AlertSettings, DashboardConfig};
use crate::models::{BudgetRecord, Month};

/// Class group selector value meaning "no filter".
pub const ALL_CLASS_GROUPS: &str = "Todas";
/// Equipment selector value meaning "no filter".
pub const ALL_EQUIPMENT: &str = "Todos";

/// Class group / equipment filter as selected on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub class_group: Option<String>,
    pub equipment: Option<String>,
}

impl Filter {
    /// Build from selector values. Empty, `Todas` (class group) or `Todos`
    /// (equipment) means all.
    pub fn new(class_group: &str, equipment: &str) -> Self {
        Self {
            class_group: selection(class_group, ALL_CLASS_GROUPS),
            equipment: selection(equipment, ALL_EQUIPMENT),
        }
    }

    pub fn matches(&self, record: &BudgetRecord) -> bool {
        self.class_group
            .as_ref()
            .map_or(true, |g| *g == record.class_group)
            && self
                .equipment
                .as_ref()
                .map_or(true, |e| *e == record.equipment_tag)
    }

    pub fn apply<'a>(&self, records: &'a [BudgetRecord]) -> Vec<&'a BudgetRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn selection(value: &str, all: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == all {
        None
    } else {
        Some(value.to_string())
    }
}

/// Dimension a comparison is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Month,
    ClassGroup,
    Equipment,
}

/// Baseline against current for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub key: String,
    pub baseline: f64,
    pub current: f64,
    /// `current - baseline`
    pub variance: f64,
    pub variance_pct: f64,
    pub pct_executed: f64,
}

impl Comparison {
    pub fn new(key: impl Into<String>, baseline: f64, current: f64) -> Self {
        let variance = current - baseline;
        Self {
            key: key.into(),
            baseline,
            current,
            variance,
            variance_pct: ratio_pct(variance, baseline),
            pct_executed: ratio_pct(current, baseline),
        }
    }
}

fn ratio_pct(value: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        value / baseline * 100.0
    }
}

/// Headline totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_baseline: f64,
    pub total_current: f64,
    pub variance: f64,
    pub variance_pct: f64,
    pub pct_executed: f64,
}

pub fn kpis<'a, B, C>(baseline: B, current: C) -> Kpis
where
    B: IntoIterator<Item = &'a BudgetRecord>,
    C: IntoIterator<Item = &'a BudgetRecord>,
{
    let total_baseline: f64 = baseline.into_iter().map(|r| r.amount).sum();
    let total_current: f64 = current.into_iter().map(|r| r.amount).sum();
    let totals = Comparison::new("", total_baseline, total_current);

    Kpis {
        total_baseline,
        total_current,
        variance: totals.variance,
        variance_pct: totals.variance_pct,
        pct_executed: totals.pct_executed,
    }
}

/// Compare two record sets grouped by `key`.
///
/// Months come in calendar order and are omitted when both sides are zero;
/// class groups and equipment come in key order.
pub fn compare_by<'a, B, C>(baseline: B, current: C, key: GroupKey) -> Vec<Comparison>
where
    B: IntoIterator<Item = &'a BudgetRecord>,
    C: IntoIterator<Item = &'a BudgetRecord>,
{
    match key {
        GroupKey::Month => {
            let mut totals = [(0.0_f64, 0.0_f64); 12];
            for r in baseline {
                totals[r.month as usize].0 += r.amount;
            }
            for r in current {
                totals[r.month as usize].1 += r.amount;
            }
            Month::ALL
                .iter()
                .zip(totals)
                .filter(|(_, (b, c))| *b != 0.0 || *c != 0.0)
                .map(|(month, (b, c))| Comparison::new(month.abbreviation(), b, c))
                .collect()
        }
        GroupKey::ClassGroup | GroupKey::Equipment => {
            let field = |r: &BudgetRecord| -> String {
                match key {
                    GroupKey::ClassGroup => r.class_group.clone(),
                    _ => r.equipment_tag.clone(),
                }
            };
            let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();
            for r in baseline {
                totals.entry(field(r)).or_default().0 += r.amount;
            }
            for r in current {
                totals.entry(field(r)).or_default().1 += r.amount;
            }
            totals
                .into_iter()
                .map(|(k, (b, c))| Comparison::new(k, b, c))
                .collect()
        }
    }
}

/// Severity of a variance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceLevel {
    Normal,
    #[serde(rename = "atencao")]
    Attention,
    #[serde(rename = "alerta")]
    Alert,
    #[serde(rename = "critico")]
    Critical,
}

impl VarianceLevel {
    /// Compare `|pct|` against the thresholds, most severe first.
    pub fn from_pct(pct: f64, alerts: &AlertSettings) -> Self {
        let pct = pct.abs();
        if pct >= alerts.critical_pct {
            Self::Critical
        } else if pct >= alerts.alert_pct {
            Self::Alert
        } else if pct >= alerts.attention_pct {
            Self::Attention
        } else {
            Self::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Attention => "atencao",
            Self::Alert => "alerta",
            Self::Critical => "critico",
        }
    }

    pub fn color<'a>(&self, alerts: &'a AlertSettings) -> &'a str {
        match self {
            Self::Normal => &alerts.colors.normal,
            Self::Attention => &alerts.colors.attention,
            Self::Alert => &alerts.colors.alert,
            Self::Critical => &alerts.colors.critical,
        }
    }
}

/// Display color of a variance percentage.
pub fn variance_color(pct: f64, config: &DashboardConfig) -> &str {
    VarianceLevel::from_pct(pct, &config.alerts).color(&config.alerts)
}
