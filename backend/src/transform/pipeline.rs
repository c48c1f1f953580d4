//! High-level pipeline API for the budget ETL.
//!
//! This module combines all steps: reading a source export, running its
//! reshape rule, grouping by fiscal year and writing the normalized outputs.
//!
//! # Example
//!
//! ```rust,ignore
//! use orcamento::pipeline::{convert_budget, BudgetInputs};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inputs = BudgetInputs {
//!         detailed: Some("orcamento_detalhado.csv".into()),
//!         equipment: Some("orcamento_2026.csv".into()),
//!     };
//!     let summary = convert_budget(&inputs, Path::new("data"))?;
//!     println!("Wrote {} files", summary.written.len());
//!     Ok(())
//! }
//! ```

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::catalog::{
    build_catalog, category_counts, scan_sources, write_catalog, CatalogScan, CatalogSource,
};
use super::engine::{reshape, ReshapeOutput, RunReport};
use super::rule::{
    detailed_budget_rule, equipment_budget_rule, general_ledger_rule, itemized_ledger_rule,
    ReshapeRule,
};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::{BudgetRecord, DetailRecord, EquipmentCatalog};
use crate::parser::{parse_date, read_source};
use crate::writer::{write_budget_file, write_detail_file};

/// Budget output file name, per year directory.
pub const BUDGET_FILE: &str = "orcado.csv";
/// Actuals output file name, per year directory.
pub const ACTUALS_FILE: &str = "realizado.csv";
/// Itemized details file name, per year directory.
pub const DETAILS_FILE: &str = "detalhes.csv";
/// Catalog path, relative to a data root.
pub const CATALOG_FILE: &str = "metadata/equipamentos.json";

/// Inputs of the budget conversion. Either sheet may be absent.
#[derive(Debug, Clone, Default)]
pub struct BudgetInputs {
    /// Detailed sheet (previous and current year per class)
    pub detailed: Option<PathBuf>,
    /// Per-equipment sheet (current year)
    pub equipment: Option<PathBuf>,
}

/// A file written by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Result of a conversion: one report per rule run, and the files written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionSummary {
    pub reports: Vec<RunReport>,
    pub written: Vec<WrittenFile>,
}

/// Result of a catalog generation.
#[derive(Debug, Clone)]
pub struct CatalogSummary {
    pub catalog: EquipmentCatalog,
    /// Entries per category, most frequent first
    pub category_counts: Vec<(String, usize)>,
    pub scan: CatalogScan,
    pub written: Vec<PathBuf>,
}

/// `<root>/<year>/<file>`
pub fn year_path(root: &Path, year: i32, file: &str) -> PathBuf {
    root.join(year.to_string()).join(file)
}

/// Split records by fiscal year, keeping their order within a year.
pub fn group_by_year(records: Vec<BudgetRecord>) -> BTreeMap<i32, Vec<BudgetRecord>> {
    let mut by_year: BTreeMap<i32, Vec<BudgetRecord>> = BTreeMap::new();
    for record in records {
        by_year.entry(record.year).or_default().push(record);
    }
    by_year
}

/// Read one source and run a rule over it.
pub fn run_rule(path: &Path, rule: &ReshapeRule) -> PipelineResult<ReshapeOutput> {
    log_info(format!("📖 Reading {}...", path.display()));
    let source = read_source(path)?;
    log_success(format!("Detected encoding: {}", source.encoding));

    log_info(format!("⚙️  Applying rule '{}'...", rule.name));
    let output = reshape(&source, rule)?;
    print_report(&output.report);

    Ok(output)
}

/// Convert the budget sheets into `<out>/<year>/orcado.csv`.
///
/// Detailed-sheet records come first, then per-equipment records, so the
/// current year file holds both.
pub fn convert_budget(inputs: &BudgetInputs, output_dir: &Path) -> PipelineResult<ConversionSummary> {
    let mut summary = ConversionSummary::default();
    let mut records = Vec::new();
    let mut years = Vec::new();

    if let Some(path) = &inputs.detailed {
        let rule = detailed_budget_rule();
        let output = run_rule(path, &rule)?;
        records.extend(output.records);
        years.extend(rule.years());
        summary.reports.push(output.report);
    }
    if let Some(path) = &inputs.equipment {
        let rule = equipment_budget_rule();
        let output = run_rule(path, &rule)?;
        records.extend(output.records);
        years.extend(rule.years());
        summary.reports.push(output.report);
    }

    log_info("📦 Grouping by year...");
    summary.written = write_by_year(records, &years, output_dir, BUDGET_FILE)?;
    Ok(summary)
}

/// Convert a general-ledger export into `<out>/<year>/realizado.csv`.
pub fn convert_ledger(
    input: &Path,
    year: Option<i32>,
    output_dir: &Path,
) -> PipelineResult<ConversionSummary> {
    let rule = with_year(general_ledger_rule(), year);
    let output = run_rule(input, &rule)?;

    let written = write_by_year(output.records, &rule.years(), output_dir, ACTUALS_FILE)?;
    Ok(ConversionSummary {
        reports: vec![output.report],
        written,
    })
}

/// Convert an itemized ledger into `<out>/<year>/detalhes.csv`.
///
/// With `write_actuals`, the posting totals also go to `realizado.csv`.
pub fn convert_itemized(
    input: &Path,
    year: Option<i32>,
    output_dir: &Path,
    write_actuals: bool,
) -> PipelineResult<ConversionSummary> {
    let rule = with_year(itemized_ledger_rule(), year);
    let output = run_rule(input, &rule)?;

    let mut by_year = group_details_by_year(output.details);
    for year in rule.years() {
        by_year.entry(year).or_default();
    }

    let mut written = Vec::new();
    for (year, details) in by_year {
        let path = year_path(output_dir, year, DETAILS_FILE);
        write_detail_file(&path, &details)?;
        log_success(format!("Saved {} ({} items)", path.display(), details.len()));
        written.push(WrittenFile {
            path,
            rows: details.len(),
        });
    }

    if write_actuals {
        written.extend(write_by_year(
            output.records,
            &rule.years(),
            output_dir,
            ACTUALS_FILE,
        )?);
    }

    Ok(ConversionSummary {
        reports: vec![output.report],
        written,
    })
}

/// Run any rule over a file and write its records to an explicit path.
pub fn convert_with_rule(
    input: &Path,
    rule: &ReshapeRule,
    output: &Path,
    details_output: Option<&Path>,
) -> PipelineResult<ConversionSummary> {
    let result = run_rule(input, rule)?;

    write_budget_file(output, &result.records)?;
    log_success(format!("Saved {} ({} records)", output.display(), result.records.len()));
    let mut written = vec![WrittenFile {
        path: output.to_path_buf(),
        rows: result.records.len(),
    }];

    if let Some(path) = details_output {
        write_detail_file(path, &result.details)?;
        log_success(format!("Saved {} ({} items)", path.display(), result.details.len()));
        written.push(WrittenFile {
            path: path.to_path_buf(),
            rows: result.details.len(),
        });
    }

    Ok(ConversionSummary {
        reports: vec![result.report],
        written,
    })
}

/// Scan sources, build the catalog and write it to every destination.
pub fn generate_catalog(
    sources: &[CatalogSource],
    destinations: &[PathBuf],
) -> PipelineResult<CatalogSummary> {
    log_info(format!("🔎 Scanning {} source(s) for equipment...", sources.len()));
    let scan = scan_sources(sources)?;
    if scan.sources_read == 0 {
        log_warning("No source could be read; catalog holds only GERAL");
    }

    let catalog = build_catalog(&scan.tags);
    log_success(format!("{} equipment entries", catalog.equipment.len()));

    let counts = category_counts(&catalog);
    log_info("Equipment by category:");
    for (category, count) in &counts {
        log_info_indent(format!("{}: {}", category, count), 1);
    }

    write_catalog(&catalog, destinations)?;

    Ok(CatalogSummary {
        catalog,
        category_counts: counts,
        scan,
        written: destinations.to_vec(),
    })
}

fn with_year(rule: ReshapeRule, year: Option<i32>) -> ReshapeRule {
    match year {
        Some(year) => rule.with_target_year(year),
        None => rule,
    }
}

/// Write one file per year. Every year in `declared` gets a file, header-only
/// when it produced no records, so a re-run replaces stale outputs.
fn write_by_year(
    records: Vec<BudgetRecord>,
    declared: &[i32],
    output_dir: &Path,
    file: &str,
) -> PipelineResult<Vec<WrittenFile>> {
    let mut by_year = group_by_year(records);
    for &year in declared {
        by_year.entry(year).or_default();
    }

    let mut written = Vec::new();
    for (year, records) in by_year {
        let path = year_path(output_dir, year, file);
        write_budget_file(&path, &records)?;
        log_success(format!("Saved {} ({} records)", path.display(), records.len()));
        written.push(WrittenFile {
            path,
            rows: records.len(),
        });
    }
    if written.is_empty() {
        log_warning(format!("No records to write for {}", file));
    }
    Ok(written)
}

/// Details carry their raw date; they were only emitted when it parsed.
fn group_details_by_year(details: Vec<DetailRecord>) -> BTreeMap<i32, Vec<DetailRecord>> {
    let mut by_year: BTreeMap<i32, Vec<DetailRecord>> = BTreeMap::new();
    for detail in details {
        if let Some(date) = parse_date(&detail.date) {
            by_year.entry(date.year()).or_default().push(detail);
        }
    }
    by_year
}

/// Print a run report
fn print_report(report: &RunReport) {
    log_success(format!(
        "{} rows read, {} kept, {} records",
        report.rows_read, report.rows_kept, report.records_emitted
    ));
    if report.details_emitted > 0 {
        log_success(format!("{} itemized details", report.details_emitted));
    }

    let skipped = &report.skipped;
    if skipped.total() > 0 {
        log_warning(format!("{} rows skipped", skipped.total()));
        let reasons = [
            ("too few columns", skipped.too_few_columns),
            ("empty class code", skipped.empty_key),
            ("marker row", skipped.marker_row),
            ("other year", skipped.year_filtered),
            ("bad year/date", skipped.bad_year),
            ("bad month", skipped.bad_month),
        ];
        for (reason, count) in reasons.iter().filter(|(_, n)| *n > 0) {
            log_info_indent(format!("• {}: {}", reason, count), 1);
        }
    }

    if report.invalid_values > 0 {
        log_warning(format!("{} unparseable values treated as zero", report.invalid_values));
        for sample in &report.invalid_samples {
            log_info_indent(
                format!("line {}, column {}: '{}'", sample.line, sample.column, sample.raw),
                1,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Month;
    use crate::writer::{read_budget_file, read_detail_csv};
    use std::fs;
    use tempfile::tempdir;

    fn semicolon_row(cols: usize, values: &[(usize, &str)]) -> String {
        let mut fields = vec![String::new(); cols];
        for (i, v) in values {
            fields[*i] = v.to_string();
        }
        fields.join(";")
    }

    #[test]
    fn test_group_by_year_keeps_order() {
        let make = |year, month| BudgetRecord {
            year,
            month,
            class_code: "421101".into(),
            class_group: "Pessoal".into(),
            class_subgroup: "Salários".into(),
            equipment_tag: "GERAL".into(),
            equipment_category: None,
            cost_center: "CC-421".into(),
            amount: 1.0,
        };
        let grouped = group_by_year(vec![
            make(2026, Month::March),
            make(2025, Month::January),
            make(2026, Month::January),
        ]);

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![2025, 2026]);
        let months: Vec<Month> = grouped[&2026].iter().map(|r| r.month).collect();
        assert_eq!(months, vec![Month::March, Month::January]);
    }

    #[test]
    fn test_convert_budget_combines_current_year() {
        let dir = tempdir().unwrap();
        let detailed = dir.path().join("detalhado.csv");
        let equipment = dir.path().join("equipamentos.csv");

        let detailed_row = semicolon_row(30, &[(0, "421101"), (1, "SALARIOS"), (2, "10,00"), (16, "20,00")]);
        fs::write(&detailed, format!("header\n{}\n", detailed_row)).unwrap();
        let equipment_row = semicolon_row(17, &[(0, "422103"), (3, "30,00"), (16, "CB-01")]);
        fs::write(&equipment, format!("header\n{}\n", equipment_row)).unwrap();

        let out = dir.path().join("data");
        let inputs = BudgetInputs {
            detailed: Some(detailed),
            equipment: Some(equipment),
        };
        let summary = convert_budget(&inputs, &out).unwrap();

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.written.len(), 2);

        let previous = read_budget_file(&out.join("2025").join("orcado.csv")).unwrap();
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].amount, 10.0);

        let current = read_budget_file(&out.join("2026").join("orcado.csv")).unwrap();
        let tags: Vec<&str> = current.iter().map(|r| r.equipment_tag.as_str()).collect();
        assert_eq!(tags, vec!["GERAL", "CB-01"]);
    }

    #[test]
    fn test_convert_budget_rerun_replaces_emptied_year() {
        let dir = tempdir().unwrap();
        let detailed = dir.path().join("detalhado.csv");
        let out = dir.path().join("data");
        let inputs = BudgetInputs {
            detailed: Some(detailed.clone()),
            equipment: None,
        };

        let row = semicolon_row(30, &[(0, "421101"), (2, "10,00"), (16, "20,00")]);
        fs::write(&detailed, format!("header\n{}\n", row)).unwrap();
        convert_budget(&inputs, &out).unwrap();
        assert_eq!(read_budget_file(&year_path(&out, 2025, BUDGET_FILE)).unwrap().len(), 1);

        let row = semicolon_row(30, &[(0, "421101"), (16, "20,00")]);
        fs::write(&detailed, format!("header\n{}\n", row)).unwrap();
        let summary = convert_budget(&inputs, &out).unwrap();

        assert_eq!(summary.written.len(), 2);
        assert!(read_budget_file(&year_path(&out, 2025, BUDGET_FILE)).unwrap().is_empty());
        assert_eq!(read_budget_file(&year_path(&out, 2026, BUDGET_FILE)).unwrap().len(), 1);
    }

    #[test]
    fn test_convert_ledger_target_year_without_rows_writes_header() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("razao.csv");
        fs::write(&input, "ano,mes,classe,descricao,historico,valor\n").unwrap();

        let out = dir.path().join("data");
        let summary = convert_ledger(&input, Some(2026), &out).unwrap();

        assert_eq!(summary.written.len(), 1);
        assert_eq!(summary.written[0].rows, 0);
        let text = fs::read_to_string(year_path(&out, 2026, ACTUALS_FILE)).unwrap();
        assert!(text.starts_with("ano,mes,classe_codigo"));
    }

    #[test]
    fn test_convert_budget_missing_input_fails() {
        let dir = tempdir().unwrap();
        let inputs = BudgetInputs {
            detailed: Some(dir.path().join("nope.csv")),
            equipment: None,
        };
        assert!(convert_budget(&inputs, dir.path()).is_err());
    }

    #[test]
    fn test_convert_itemized_writes_details_and_actuals() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("itens.csv");
        fs::write(
            &input,
            "data,classe,descricao,historico,produto,qtd,unit,total,fornecedor\n\
             10/01/2026,422144,PEÇAS,\"EH-12 troca\",\"Filtro\",\"2\",\"150,00\",\"300,00\",\"Auto Peças\"\n\
             11/02/2026,422125,ESCRITORIO,\"resmas\",\"Papel\",\"1\",\"25,00\",\"25,00\",\"Papelaria\"\n",
        )
        .unwrap();

        let out = dir.path().join("data");
        let summary = convert_itemized(&input, Some(2026), &out, true).unwrap();
        assert_eq!(summary.written.len(), 2);

        let details_text = fs::read_to_string(out.join("2026").join("detalhes.csv")).unwrap();
        let details = read_detail_csv(details_text.as_bytes()).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].equipment_tag, "EH-12");

        let actuals = read_budget_file(&out.join("2026").join("realizado.csv")).unwrap();
        assert_eq!(actuals.len(), 2);
        assert_eq!(actuals[1].month, Month::February);
    }

    #[test]
    fn test_generate_catalog_writes_all_destinations() {
        let dir = tempdir().unwrap();
        let budget = dir.path().join("orcado.csv");
        fs::write(
            &budget,
            "ano,mes,classe_codigo,classe_orcamentaria,subclasse,equipamento,centro_custo,valor\n\
             2026,Jan,422103,Operacional,Combustíveis,TE-02,CC-422,10\n",
        )
        .unwrap();

        let destinations = vec![
            dir.path().join("data").join(CATALOG_FILE),
            dir.path().join("public").join(CATALOG_FILE),
        ];
        let summary = generate_catalog(
            &[
                CatalogSource::Normalized(budget),
                CatalogSource::Normalized(dir.path().join("missing.csv")),
            ],
            &destinations,
        )
        .unwrap();

        assert_eq!(summary.catalog.equipment.len(), 2);
        assert_eq!(summary.scan.sources_skipped, 1);
        assert_eq!(summary.category_counts, vec![("TRATOR DE ESTEIRA".to_string(), 1)]);
        for path in &destinations {
            let parsed: EquipmentCatalog =
                serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(parsed, summary.catalog);
        }
    }
}
