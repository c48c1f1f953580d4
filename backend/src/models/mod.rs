//! Domain models for the budget ETL.
//!
//! This module contains the core data structures produced and consumed by the
//! pipeline:
//!
//! - [`BudgetRecord`] - One (class, equipment, month) amount in long format
//! - [`DetailRecord`] - One itemized ledger line tied to a known equipment
//! - [`Equipment`] / [`EquipmentCatalog`] - The equipment metadata JSON
//! - [`Month`] - Calendar month, written with Portuguese abbreviations
//! - [`ClassMapping`] - Group/subgroup of an accounting class

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag used for costs not assigned to a specific equipment.
pub const GENERIC_EQUIPMENT: &str = "GERAL";

// =============================================================================
// Month
// =============================================================================

/// Calendar month.
///
/// Serialized as the Portuguese three-letter abbreviation used by the
/// dashboard (`Jan`, `Fev`, ..., `Dez`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    #[serde(rename = "Jan")]
    January,
    #[serde(rename = "Fev")]
    February,
    #[serde(rename = "Mar")]
    March,
    #[serde(rename = "Abr")]
    April,
    #[serde(rename = "Mai")]
    May,
    #[serde(rename = "Jun")]
    June,
    #[serde(rename = "Jul")]
    July,
    #[serde(rename = "Ago")]
    August,
    #[serde(rename = "Set")]
    September,
    #[serde(rename = "Out")]
    October,
    #[serde(rename = "Nov")]
    November,
    #[serde(rename = "Dez")]
    December,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Portuguese three-letter abbreviation.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Month::January => "Jan",
            Month::February => "Fev",
            Month::March => "Mar",
            Month::April => "Abr",
            Month::May => "Mai",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Ago",
            Month::September => "Set",
            Month::October => "Out",
            Month::November => "Nov",
            Month::December => "Dez",
        }
    }

    /// Parse an abbreviation (`"Fev"`), case-insensitive.
    pub fn from_abbreviation(abbr: &str) -> Option<Self> {
        let abbr = abbr.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.abbreviation().eq_ignore_ascii_case(abbr))
    }

    /// Month from its 1-based number.
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1..=12 => Some(Self::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    /// Month from a 0-based offset inside a twelve-column block.
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// 1-based month number.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

// =============================================================================
// Accounting class
// =============================================================================

/// Group and subgroup an accounting class code maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub group: String,
    pub subgroup: String,
}

impl ClassMapping {
    pub fn new(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            subgroup: subgroup.into(),
        }
    }
}

// =============================================================================
// Long-format budget record
// =============================================================================

/// One row of the normalized budget CSV.
///
/// `amount` is never negative and never zero: zero amounts are dropped by the
/// reshaping engine. `equipment_category` is not part of the CSV schema; it is
/// derived from the tag when records are built or read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    #[serde(rename = "ano")]
    pub year: i32,
    #[serde(rename = "mes")]
    pub month: Month,
    #[serde(rename = "classe_codigo")]
    pub class_code: String,
    #[serde(rename = "classe_orcamentaria")]
    pub class_group: String,
    #[serde(rename = "subclasse")]
    pub class_subgroup: String,
    #[serde(rename = "equipamento")]
    pub equipment_tag: String,
    #[serde(skip)]
    pub equipment_category: Option<String>,
    #[serde(rename = "centro_custo")]
    pub cost_center: String,
    #[serde(rename = "valor")]
    pub amount: f64,
}

impl BudgetRecord {
    /// Header of the normalized budget CSV, in column order.
    pub const HEADER: [&'static str; 8] = [
        "ano",
        "mes",
        "classe_codigo",
        "classe_orcamentaria",
        "subclasse",
        "equipamento",
        "centro_custo",
        "valor",
    ];
}

/// Cost center derived from an accounting class: `CC-` and its first three characters.
pub fn class_cost_center(class_code: &str) -> String {
    let prefix: String = class_code.chars().take(3).collect();
    format!("CC-{}", prefix)
}

// =============================================================================
// Itemized detail record
// =============================================================================

/// One itemized ledger line attributed to a known equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "equipamento")]
    pub equipment_tag: String,
    #[serde(rename = "produto")]
    pub product: String,
    #[serde(rename = "quantidade")]
    pub quantity: f64,
    #[serde(rename = "valorUnitario")]
    pub unit_value: f64,
    #[serde(rename = "valorTotal")]
    pub total_value: f64,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
}

impl DetailRecord {
    /// Header of the detail CSV, in column order.
    pub const HEADER: [&'static str; 7] = [
        "data",
        "equipamento",
        "produto",
        "quantidade",
        "valorUnitario",
        "valorTotal",
        "fornecedor",
    ];
}

// =============================================================================
// Equipment catalog
// =============================================================================

/// Equipment metadata entry as consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nome")]
    pub display_name: String,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "centro_custo")]
    pub cost_center: String,
    #[serde(rename = "responsavel")]
    pub owner: String,
    pub email: String,
    #[serde(rename = "ativo")]
    pub active: bool,
}

/// Top-level equipment metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCatalog {
    #[serde(rename = "equipamentos", default)]
    pub equipment: Vec<Equipment>,
}
