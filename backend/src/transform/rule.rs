//! Reshape rule definition
//!
//! A rule describes one source export layout: how lines split into fields,
//! which columns hold the accounting class, the equipment and the amounts, and
//! whether months are laid out as columns (wide) or rows (long). A single
//! engine ([`super::engine`]) executes any rule.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RuleError, RuleResult};
use crate::parser::QuoteMode;

/// A complete description of one source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshapeRule {
    /// Rule identifier (built-in name or file stem)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// How lines are split
    pub source_format: SourceFormat,

    /// Column holding the accounting class code (primary key)
    pub class_code: usize,

    /// Column holding the class description, used as fallback subgroup
    #[serde(default)]
    pub class_description: Option<usize>,

    /// Where the equipment tag comes from
    #[serde(default)]
    pub equipment: EquipmentBinding,

    /// Description values marking non-data rows (subtotals)
    #[serde(default)]
    pub skip_markers: Vec<String>,

    /// Month layout
    pub layout: Layout,

    /// Itemized detail columns, when the source carries line items
    #[serde(default)]
    pub detail: Option<DetailColumns>,
}

/// Line splitting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFormat {
    pub delimiter: char,

    #[serde(default)]
    pub quoting: QuoteMode,

    /// Leading lines to skip (headers)
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,

    /// Lines with fewer fields are skipped
    pub min_columns: usize,
}

fn default_header_rows() -> usize {
    1
}

/// Source of the equipment tag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EquipmentBinding {
    /// The export has no equipment assignment: always `GERAL`.
    #[default]
    None,
    /// A column holding the tag as-is (`GERAL` when blank).
    Column { index: usize },
    /// A free-text column that may start with a tag.
    FreeText { index: usize },
}

/// How the twelve months are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layout {
    /// One row per class, one column per month, one block per year.
    Wide { years: Vec<YearBlock> },
    /// One row per entry with its own year, month and amount.
    Long {
        year: YearSource,
        month: MonthSource,
        amount: usize,
        /// Only rows of this fiscal year are kept
        #[serde(default)]
        target_year: Option<i32>,
    },
}

/// Twelve consecutive month columns for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearBlock {
    pub year: i32,
    pub first_month_column: usize,
}

/// Where a long-format row's year comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum YearSource {
    /// A numeric fiscal year column
    Column { index: usize },
    /// The year component of a date column
    Date { index: usize },
}

/// Where a long-format row's month comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonthSource {
    /// A full Portuguese month name (`Janeiro`)
    Name { index: usize },
    /// The month component of a date column
    Date { index: usize },
}

/// Columns of an itemized ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailColumns {
    pub date: usize,
    pub product: usize,
    pub quantity: usize,
    pub unit_value: usize,
    pub total_value: usize,
    pub supplier: usize,
}

/// Number of month columns in a wide year block.
pub const MONTHS_PER_BLOCK: usize = 12;

impl ReshapeRule {
    /// Parse a rule from JSON.
    pub fn from_json(json: &str) -> RuleResult<Self> {
        let rule: Self = serde_json::from_str(json)?;
        rule.validate()?;
        Ok(rule)
    }

    /// Load a rule from a JSON file.
    pub fn from_file(path: &Path) -> RuleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> RuleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restrict a long layout to one fiscal year. No effect on wide layouts.
    pub fn with_target_year(mut self, year: i32) -> Self {
        if let Layout::Long { target_year, .. } = &mut self.layout {
            *target_year = Some(year);
        }
        self
    }

    /// Years this rule can emit, when known up front.
    pub fn years(&self) -> Vec<i32> {
        match &self.layout {
            Layout::Wide { years } => years.iter().map(|b| b.year).collect(),
            Layout::Long { target_year, .. } => target_year.iter().copied().collect(),
        }
    }

    /// Every column the rule reads, labelled by role.
    pub fn referenced_columns(&self) -> Vec<(String, usize)> {
        let mut columns = vec![("class_code".to_string(), self.class_code)];

        if let Some(i) = self.class_description {
            columns.push(("class_description".to_string(), i));
        }
        match self.equipment {
            EquipmentBinding::None => {}
            EquipmentBinding::Column { index } | EquipmentBinding::FreeText { index } => {
                columns.push(("equipment".to_string(), index));
            }
        }
        match &self.layout {
            Layout::Wide { years } => {
                for block in years {
                    columns.push((
                        format!("months {}", block.year),
                        block.first_month_column + MONTHS_PER_BLOCK - 1,
                    ));
                }
            }
            Layout::Long { year, month, amount, .. } => {
                let year_col = match year {
                    YearSource::Column { index } | YearSource::Date { index } => *index,
                };
                let month_col = match month {
                    MonthSource::Name { index } | MonthSource::Date { index } => *index,
                };
                columns.push(("year".to_string(), year_col));
                columns.push(("month".to_string(), month_col));
                columns.push(("amount".to_string(), *amount));
            }
        }
        if let Some(d) = &self.detail {
            columns.push(("detail.date".to_string(), d.date));
            columns.push(("detail.product".to_string(), d.product));
            columns.push(("detail.quantity".to_string(), d.quantity));
            columns.push(("detail.unit_value".to_string(), d.unit_value));
            columns.push(("detail.total_value".to_string(), d.total_value));
            columns.push(("detail.supplier".to_string(), d.supplier));
        }

        columns
    }

    /// Check the rule is internally consistent.
    ///
    /// Every referenced column must be guaranteed by `min_columns`, so a row
    /// that passes the length check never reads out of bounds.
    pub fn validate(&self) -> RuleResult<()> {
        if let Layout::Wide { years } = &self.layout {
            if years.is_empty() {
                return Err(RuleError::Invalid {
                    rule: self.name.clone(),
                    message: "wide layout needs at least one year block".to_string(),
                });
            }
        }

        let min_columns = self.source_format.min_columns;
        for (field, column) in self.referenced_columns() {
            if column >= min_columns {
                return Err(RuleError::ColumnOutOfRange {
                    rule: self.name.clone(),
                    field,
                    column,
                    min_columns,
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Built-in rules
// =============================================================================
//
// Column offsets below are fixed by the spreadsheet exports the dashboard is
// fed from. They are not derived from headers: a change in the export's
// column order silently changes what is read.

/// Year of the budget being planned.
pub const BUDGET_YEAR: i32 = 2026;
/// Year the detailed sheet compares against.
pub const PREVIOUS_YEAR: i32 = 2025;

/// "Orçamento 2026 - Dashboard": budget per class and equipment.
pub mod equipment_sheet {
    pub const MIN_COLUMNS: usize = 17;
    pub const CLASS: usize = 0;
    pub const DESCRIPTION: usize = 1;
    /// Column 2 is the account group, unused.
    pub const FIRST_MONTH: usize = 3;
    /// Columns 3..=14 are Jan..Dez, column 15 is the yearly total.
    pub const EQUIPMENT: usize = 16;
}

/// "orçamento detalhado 2026 - Dashboard": previous and current year side by side.
pub mod detailed_sheet {
    pub const MIN_COLUMNS: usize = 30;
    pub const CLASS: usize = 0;
    pub const DESCRIPTION: usize = 1;
    /// Columns 2..=13 are the previous year's Jan..Dez.
    pub const PREVIOUS_FIRST_MONTH: usize = 2;
    /// Columns 14 and 15 are the previous year's totals and are skipped.
    pub const CURRENT_FIRST_MONTH: usize = 16;
    /// Subtotal row interleaved with the data.
    pub const CONTRIBUTION_MARGIN: &str = "MARGEM DE CONTRIBUIÇÃO";
}

/// General-ledger export: one quoted row per posting.
pub mod general_ledger {
    pub const MIN_COLUMNS: usize = 6;
    pub const YEAR: usize = 0;
    pub const MONTH_NAME: usize = 1;
    pub const CLASS: usize = 2;
    pub const DESCRIPTION: usize = 3;
    /// Free-text history, starts with the equipment tag when assigned.
    pub const HISTORY: usize = 4;
    pub const AMOUNT: usize = 5;
}

/// Itemized ledger export: one quoted row per purchased item.
pub mod itemized_ledger {
    pub const MIN_COLUMNS: usize = 9;
    pub const DATE: usize = 0;
    pub const CLASS: usize = 1;
    pub const DESCRIPTION: usize = 2;
    pub const HISTORY: usize = 3;
    pub const PRODUCT: usize = 4;
    pub const QUANTITY: usize = 5;
    pub const UNIT_VALUE: usize = 6;
    pub const TOTAL_VALUE: usize = 7;
    pub const SUPPLIER: usize = 8;
}

pub const EQUIPMENT_BUDGET: &str = "equipment-budget";
pub const DETAILED_BUDGET: &str = "detailed-budget";
pub const GENERAL_LEDGER: &str = "general-ledger";
pub const ITEMIZED_LEDGER: &str = "itemized-ledger";

/// Names of all built-in rules.
pub const BUILTIN_RULES: [&str; 4] = [
    EQUIPMENT_BUDGET,
    DETAILED_BUDGET,
    GENERAL_LEDGER,
    ITEMIZED_LEDGER,
];

/// Budget per class and equipment, current year only.
pub fn equipment_budget_rule() -> ReshapeRule {
    use equipment_sheet::*;

    ReshapeRule {
        name: EQUIPMENT_BUDGET.to_string(),
        description: format!("Semicolon budget sheet, {} per class and equipment", BUDGET_YEAR),
        source_format: SourceFormat {
            delimiter: ';',
            quoting: QuoteMode::Plain,
            header_rows: 1,
            min_columns: MIN_COLUMNS,
        },
        class_code: CLASS,
        class_description: Some(DESCRIPTION),
        equipment: EquipmentBinding::Column { index: EQUIPMENT },
        skip_markers: Vec::new(),
        layout: Layout::Wide {
            years: vec![YearBlock {
                year: BUDGET_YEAR,
                first_month_column: FIRST_MONTH,
            }],
        },
        detail: None,
    }
}

/// Detailed budget, previous and current year, no equipment split.
pub fn detailed_budget_rule() -> ReshapeRule {
    use detailed_sheet::*;

    ReshapeRule {
        name: DETAILED_BUDGET.to_string(),
        description: format!(
            "Semicolon detailed budget sheet, {} and {} per class",
            PREVIOUS_YEAR, BUDGET_YEAR
        ),
        source_format: SourceFormat {
            delimiter: ';',
            quoting: QuoteMode::Plain,
            header_rows: 1,
            min_columns: MIN_COLUMNS,
        },
        class_code: CLASS,
        class_description: Some(DESCRIPTION),
        equipment: EquipmentBinding::None,
        skip_markers: vec![CONTRIBUTION_MARGIN.to_string()],
        layout: Layout::Wide {
            years: vec![
                YearBlock {
                    year: PREVIOUS_YEAR,
                    first_month_column: PREVIOUS_FIRST_MONTH,
                },
                YearBlock {
                    year: BUDGET_YEAR,
                    first_month_column: CURRENT_FIRST_MONTH,
                },
            ],
        },
        detail: None,
    }
}

/// General-ledger postings with a fiscal year and a month name.
pub fn general_ledger_rule() -> ReshapeRule {
    use general_ledger::*;

    ReshapeRule {
        name: GENERAL_LEDGER.to_string(),
        description: "Quoted comma general-ledger export, one row per posting".to_string(),
        source_format: SourceFormat {
            delimiter: ',',
            quoting: QuoteMode::Quoted,
            header_rows: 1,
            min_columns: MIN_COLUMNS,
        },
        class_code: CLASS,
        class_description: Some(DESCRIPTION),
        equipment: EquipmentBinding::FreeText { index: HISTORY },
        skip_markers: Vec::new(),
        layout: Layout::Long {
            year: YearSource::Column { index: YEAR },
            month: MonthSource::Name { index: MONTH_NAME },
            amount: AMOUNT,
            target_year: None,
        },
        detail: None,
    }
}

/// Itemized ledger lines dated `dd/mm/yyyy`.
pub fn itemized_ledger_rule() -> ReshapeRule {
    use itemized_ledger::*;

    ReshapeRule {
        name: ITEMIZED_LEDGER.to_string(),
        description: "Quoted comma itemized ledger, one row per item".to_string(),
        source_format: SourceFormat {
            delimiter: ',',
            quoting: QuoteMode::Quoted,
            header_rows: 1,
            min_columns: MIN_COLUMNS,
        },
        class_code: CLASS,
        class_description: Some(DESCRIPTION),
        equipment: EquipmentBinding::FreeText { index: HISTORY },
        skip_markers: Vec::new(),
        layout: Layout::Long {
            year: YearSource::Date { index: DATE },
            month: MonthSource::Date { index: DATE },
            amount: TOTAL_VALUE,
            target_year: None,
        },
        detail: Some(DetailColumns {
            date: DATE,
            product: PRODUCT,
            quantity: QUANTITY,
            unit_value: UNIT_VALUE,
            total_value: TOTAL_VALUE,
            supplier: SUPPLIER,
        }),
    }
}

/// Look up a built-in rule by name.
pub fn builtin_rule(name: &str) -> RuleResult<ReshapeRule> {
    match name {
        EQUIPMENT_BUDGET => Ok(equipment_budget_rule()),
        DETAILED_BUDGET => Ok(detailed_budget_rule()),
        GENERAL_LEDGER => Ok(general_ledger_rule()),
        ITEMIZED_LEDGER => Ok(itemized_ledger_rule()),
        other => Err(RuleError::Unknown(other.to_string())),
    }
}

/// Resolve a rule argument: a built-in name or a path to a JSON file.
pub fn resolve_rule(name_or_path: &str) -> RuleResult<ReshapeRule> {
    if BUILTIN_RULES.contains(&name_or_path) {
        return builtin_rule(name_or_path);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return ReshapeRule::from_file(path);
    }
    Err(RuleError::Unknown(name_or_path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_are_valid() {
        for name in BUILTIN_RULES {
            let rule = builtin_rule(name).unwrap();
            assert_eq!(rule.name, name);
            rule.validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(builtin_rule("payroll"), Err(RuleError::Unknown(_))));
        assert!(matches!(resolve_rule("no/such/rule.json"), Err(RuleError::Unknown(_))));
    }

    #[test]
    fn test_rule_json_roundtrip() {
        let rule = detailed_budget_rule();
        let json = rule.to_json().unwrap();
        assert!(json.contains("\"type\": \"wide\""));
        let parsed = ReshapeRule::from_json(&json).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_rule_json_defaults() {
        let json = r#"{
            "name": "custom",
            "source_format": { "delimiter": ";", "min_columns": 14 },
            "class_code": 0,
            "layout": { "type": "wide", "years": [ { "year": 2027, "first_month_column": 2 } ] }
        }"#;
        let rule = ReshapeRule::from_json(json).unwrap();
        assert_eq!(rule.source_format.header_rows, 1);
        assert_eq!(rule.source_format.quoting, QuoteMode::Plain);
        assert_eq!(rule.equipment, EquipmentBinding::None);
        assert!(rule.detail.is_none());
        assert_eq!(rule.years(), vec![2027]);
    }

    #[test]
    fn test_validate_rejects_columns_beyond_minimum() {
        let mut rule = equipment_budget_rule();
        rule.source_format.min_columns = 16;
        let err = rule.validate().unwrap_err();
        match err {
            RuleError::ColumnOutOfRange { field, column, .. } => {
                assert_eq!(field, "equipment");
                assert_eq!(column, 16);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_wide_layout() {
        let mut rule = detailed_budget_rule();
        rule.layout = Layout::Wide { years: Vec::new() };
        assert!(matches!(rule.validate(), Err(RuleError::Invalid { .. })));
    }

    #[test]
    fn test_with_target_year() {
        let rule = general_ledger_rule().with_target_year(2026);
        assert_eq!(rule.years(), vec![2026]);

        // wide layouts are unaffected
        let wide = detailed_budget_rule().with_target_year(2030);
        assert_eq!(wide.years(), vec![PREVIOUS_YEAR, BUDGET_YEAR]);
    }

    #[test]
    fn test_detailed_sheet_skips_total_columns() {
        let rule = detailed_budget_rule();
        let Layout::Wide { years } = &rule.layout else {
            panic!("detailed sheet is wide");
        };
        let previous_last = years[0].first_month_column + MONTHS_PER_BLOCK - 1;
        assert_eq!(previous_last, 13);
        assert_eq!(years[1].first_month_column, previous_last + 3);
    }
}
