//! Reshaping engine
//!
//! Executes a [`ReshapeRule`] over the lines of a source export and produces
//! long-format [`BudgetRecord`]s (plus [`DetailRecord`]s for itemized
//! sources). Rows failing a structural precondition are skipped whole and
//! counted in the [`RunReport`]; nothing is printed here.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

use super::rule::{
    DetailColumns, EquipmentBinding, Layout, MonthSource, ReshapeRule, YearSource,
    MONTHS_PER_BLOCK,
};
use crate::classify::{
    extract_equipment_category, extract_equipment_tag, map_accounting_class, map_month_name,
};
use crate::error::RuleResult;
use crate::models::{
    class_cost_center, BudgetRecord, ClassMapping, DetailRecord, Month, GENERIC_EQUIPMENT,
};
use crate::parser::{parse_date, parse_decimal, parse_valor, split_line, try_parse_valor, SourceText};

/// How many unparseable tokens are kept as samples in a report.
const MAX_INVALID_SAMPLES: usize = 10;

/// Why a row was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewColumns,
    EmptyKey,
    MarkerRow,
    YearFiltered,
    BadYear,
    BadMonth,
}

/// Skipped rows, per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub too_few_columns: usize,
    pub empty_key: usize,
    pub marker_row: usize,
    pub year_filtered: usize,
    pub bad_year: usize,
    pub bad_month: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::TooFewColumns => self.too_few_columns += 1,
            SkipReason::EmptyKey => self.empty_key += 1,
            SkipReason::MarkerRow => self.marker_row += 1,
            SkipReason::YearFiltered => self.year_filtered += 1,
            SkipReason::BadYear => self.bad_year += 1,
            SkipReason::BadMonth => self.bad_month += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.too_few_columns
            + self.empty_key
            + self.marker_row
            + self.year_filtered
            + self.bad_year
            + self.bad_month
    }
}

/// A numeric token that was coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidValue {
    /// 1-based line number in the source
    pub line: usize,
    pub column: usize,
    pub raw: String,
}

/// Counts describing one reshaping run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub rule: String,
    /// Non-empty data lines (after headers)
    pub rows_read: usize,
    /// Rows that passed every structural check
    pub rows_kept: usize,
    pub skipped: SkipCounts,
    /// Numeric tokens that could not be parsed (treated as zero)
    pub invalid_values: usize,
    /// First few invalid tokens, for diagnostics
    pub invalid_samples: Vec<InvalidValue>,
    /// Month values that were empty or zero and produced no record
    pub zero_values: usize,
    pub records_emitted: usize,
    pub details_emitted: usize,
}

impl RunReport {
    fn new(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
            ..Self::default()
        }
    }

    pub fn rows_skipped(&self) -> usize {
        self.skipped.total()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows read, {} kept, {} skipped, {} records, {} details, {} invalid values",
            self.rule,
            self.rows_read,
            self.rows_kept,
            self.rows_skipped(),
            self.records_emitted,
            self.details_emitted,
            self.invalid_values
        )
    }
}

/// Result of running a rule.
#[derive(Debug, Clone, Default)]
pub struct ReshapeOutput {
    pub records: Vec<BudgetRecord>,
    pub details: Vec<DetailRecord>,
    pub report: RunReport,
}

/// Run a rule over decoded source text.
pub fn reshape(source: &SourceText, rule: &ReshapeRule) -> RuleResult<ReshapeOutput> {
    reshape_lines(source.lines(), rule)
}

/// Run a rule over raw lines (the first `header_rows` lines are skipped).
pub fn reshape_lines<'a, I>(lines: I, rule: &ReshapeRule) -> RuleResult<ReshapeOutput>
where
    I: IntoIterator<Item = &'a str>,
{
    rule.validate()?;

    let mut output = ReshapeOutput {
        report: RunReport::new(&rule.name),
        ..ReshapeOutput::default()
    };

    for (idx, line) in lines.into_iter().enumerate() {
        if idx < rule.source_format.header_rows {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        output.report.rows_read += 1;
        let fields = split_line(line, rule.source_format.delimiter, rule.source_format.quoting);
        let row = Row::new(&fields, idx + 1);

        match row.reshape(rule, &mut output) {
            Ok(()) => output.report.rows_kept += 1,
            Err(reason) => output.report.skipped.record(reason),
        }
    }

    output.report.records_emitted = output.records.len();
    output.report.details_emitted = output.details.len();
    Ok(output)
}

/// Distinct equipment tags of every row wide enough for the rule, whatever
/// its class code or amounts.
pub fn collect_equipment_tags(source: &SourceText, rule: &ReshapeRule) -> RuleResult<BTreeSet<String>> {
    rule.validate()?;

    let mut tags = BTreeSet::new();
    for (idx, line) in source.lines().enumerate() {
        if idx < rule.source_format.header_rows || line.is_empty() {
            continue;
        }
        let fields = split_line(line, rule.source_format.delimiter, rule.source_format.quoting);
        if fields.len() >= rule.source_format.min_columns {
            tags.insert(Row::new(&fields, idx + 1).equipment_tag(&rule.equipment));
        }
    }

    Ok(tags)
}

/// Fields shared by every record a row emits.
struct RowKey {
    class_code: String,
    mapping: ClassMapping,
}

struct Row<'a> {
    fields: &'a [String],
    line: usize,
}

impl<'a> Row<'a> {
    fn new(fields: &'a [String], line: usize) -> Self {
        Self { fields, line }
    }

    /// Trimmed field; callers only pass columns covered by `min_columns`.
    fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.trim()).unwrap_or("")
    }

    /// Structural checks common to every layout.
    fn key(&self, rule: &ReshapeRule) -> Result<RowKey, SkipReason> {
        if self.fields.len() < rule.source_format.min_columns {
            return Err(SkipReason::TooFewColumns);
        }

        let class_code = self.field(rule.class_code).trim_start_matches('\u{feff}').trim();
        if class_code.is_empty() {
            return Err(SkipReason::EmptyKey);
        }

        let description = rule.class_description.map(|i| self.field(i));
        if let Some(desc) = description {
            if rule.skip_markers.iter().any(|m| m == desc) {
                return Err(SkipReason::MarkerRow);
            }
        }

        Ok(RowKey {
            class_code: class_code.to_string(),
            mapping: map_accounting_class(class_code, description),
        })
    }

    fn equipment_tag(&self, binding: &EquipmentBinding) -> String {
        match binding {
            EquipmentBinding::None => GENERIC_EQUIPMENT.to_string(),
            EquipmentBinding::Column { index } => {
                let raw = self.field(*index);
                if raw.is_empty() {
                    GENERIC_EQUIPMENT.to_string()
                } else {
                    raw.to_string()
                }
            }
            EquipmentBinding::FreeText { index } => extract_equipment_tag(self.field(*index)),
        }
    }

    /// Parse an amount, counting tokens that are not numbers.
    fn amount(&self, column: usize, report: &mut RunReport) -> f64 {
        let raw = self.field(column);
        match try_parse_valor(raw) {
            Ok(value) => value,
            Err(_) => {
                report.invalid_values += 1;
                if report.invalid_samples.len() < MAX_INVALID_SAMPLES {
                    report.invalid_samples.push(InvalidValue {
                        line: self.line,
                        column,
                        raw: raw.to_string(),
                    });
                }
                0.0
            }
        }
    }

    fn date(&self, index: usize) -> Option<NaiveDate> {
        parse_date(self.field(index))
    }

    fn reshape(&self, rule: &ReshapeRule, output: &mut ReshapeOutput) -> Result<(), SkipReason> {
        let key = self.key(rule)?;
        let tag = self.equipment_tag(&rule.equipment);
        let template = BudgetRecord {
            year: 0,
            month: Month::January,
            class_code: key.class_code.clone(),
            class_group: key.mapping.group.clone(),
            class_subgroup: key.mapping.subgroup.clone(),
            equipment_category: extract_equipment_category(Some(&tag)).map(str::to_string),
            equipment_tag: tag,
            cost_center: class_cost_center(&key.class_code),
            amount: 0.0,
        };

        match &rule.layout {
            Layout::Wide { years } => {
                for block in years {
                    for offset in 0..MONTHS_PER_BLOCK {
                        let amount = self.amount(block.first_month_column + offset, &mut output.report);
                        let Some(month) = Month::from_index(offset) else {
                            continue;
                        };
                        if amount > 0.0 {
                            output.records.push(BudgetRecord {
                                year: block.year,
                                month,
                                amount,
                                ..template.clone()
                            });
                        } else {
                            output.report.zero_values += 1;
                        }
                    }
                }
            }
            Layout::Long {
                year,
                month,
                amount,
                target_year,
            } => {
                let year = match year {
                    YearSource::Column { index } => self
                        .field(*index)
                        .parse::<i32>()
                        .map_err(|_| SkipReason::BadYear)?,
                    YearSource::Date { index } => {
                        self.date(*index).ok_or(SkipReason::BadYear)?.year()
                    }
                };
                if target_year.is_some_and(|target| target != year) {
                    return Err(SkipReason::YearFiltered);
                }

                let month = match month {
                    MonthSource::Name { index } => {
                        Month::from_abbreviation(&map_month_name(self.field(*index)))
                    }
                    MonthSource::Date { index } => {
                        self.date(*index).and_then(|d| Month::from_number(d.month()))
                    }
                }
                .ok_or(SkipReason::BadMonth)?;

                let amount = self.amount(*amount, &mut output.report);
                if amount <= 0.0 {
                    output.report.zero_values += 1;
                    return Ok(());
                }

                if let Some(columns) = &rule.detail {
                    if template.equipment_category.is_some() {
                        output.details.push(self.detail(columns, &template.equipment_tag));
                    }
                }

                output.records.push(BudgetRecord {
                    year,
                    month,
                    amount,
                    ..template
                });
            }
        }

        Ok(())
    }

    fn detail(&self, columns: &DetailColumns, tag: &str) -> DetailRecord {
        DetailRecord {
            date: self.field(columns.date).to_string(),
            equipment_tag: tag.to_string(),
            product: self.field(columns.product).to_string(),
            quantity: parse_decimal(self.field(columns.quantity)),
            unit_value: parse_valor(self.field(columns.unit_value)),
            total_value: parse_valor(self.field(columns.total_value)),
            supplier: self.field(columns.supplier).to_string(),
        }
    }
}
