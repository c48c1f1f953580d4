//! Normalized outputs: budget CSV, detail CSV and the catalog JSON.
//!
//! Fields are quoted only when needed (delimiter, quote or newline inside),
//! with embedded quotes doubled. Amounts are written in shortest form
//! (`100`, `1234.56`).

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::classify::extract_equipment_category;
use crate::error::{CsvError, CsvResult, WriteError, WriteResult};
use crate::models::{BudgetRecord, DetailRecord, EquipmentCatalog};

/// Shortest decimal rendering of an amount.
pub fn format_amount(value: f64) -> String {
    value.to_string()
}

/// Create `path` (truncating) along with its parent directories.
fn create_output(path: &Path) -> WriteResult<BufWriter<File>> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    Ok(BufWriter::new(file))
}

/// Write budget records as CSV.
pub fn write_budget_csv<W: Write>(writer: W, records: &[BudgetRecord]) -> WriteResult<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(BudgetRecord::HEADER)?;
    for r in records {
        wtr.write_record([
            r.year.to_string().as_str(),
            r.month.abbreviation(),
            r.class_code.as_str(),
            r.class_group.as_str(),
            r.class_subgroup.as_str(),
            r.equipment_tag.as_str(),
            r.cost_center.as_str(),
            format_amount(r.amount).as_str(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write budget records to a file, creating directories as needed.
pub fn write_budget_file(path: &Path, records: &[BudgetRecord]) -> WriteResult<()> {
    write_budget_csv(create_output(path)?, records)
}

/// Write itemized detail records as CSV.
pub fn write_detail_csv<W: Write>(writer: W, details: &[DetailRecord]) -> WriteResult<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(DetailRecord::HEADER)?;
    for d in details {
        wtr.write_record([
            d.date.as_str(),
            d.equipment_tag.as_str(),
            d.product.as_str(),
            format_amount(d.quantity).as_str(),
            format_amount(d.unit_value).as_str(),
            format_amount(d.total_value).as_str(),
            d.supplier.as_str(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_detail_file(path: &Path, details: &[DetailRecord]) -> WriteResult<()> {
    write_detail_csv(create_output(path)?, details)
}

/// Write the equipment catalog as pretty JSON.
pub fn write_catalog_json(path: &Path, catalog: &EquipmentCatalog) -> WriteResult<()> {
    let mut out = create_output(path)?;
    serde_json::to_writer_pretty(&mut out, catalog)?;
    out.write_all(b"\n")
        .and_then(|_| out.flush())
        .map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a normalized budget CSV back into records.
///
/// `equipment_category` is not stored in the file and is re-derived from the tag.
pub fn read_budget_csv<R: Read>(reader: R) -> CsvResult<Vec<BudgetRecord>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let mut record: BudgetRecord = row?;
        record.equipment_category =
            extract_equipment_category(Some(&record.equipment_tag)).map(str::to_string);
        records.push(record);
    }
    Ok(records)
}

pub fn read_budget_file(path: &Path) -> CsvResult<Vec<BudgetRecord>> {
    let file = File::open(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_budget_csv(file)
}

/// Read a detail CSV back into records.
pub fn read_detail_csv<R: Read>(reader: R) -> CsvResult<Vec<DetailRecord>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize()
        .collect::<Result<Vec<DetailRecord>, _>>()
        .map_err(CsvError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Equipment, Month};
    use tempfile::tempdir;

    fn record(month: Month, tag: &str, amount: f64) -> BudgetRecord {
        BudgetRecord {
            year: 2026,
            month,
            class_code: "422103".to_string(),
            class_group: "Operacional".to_string(),
            class_subgroup: "Combustíveis".to_string(),
            equipment_tag: tag.to_string(),
            equipment_category: extract_equipment_category(Some(tag)).map(str::to_string),
            cost_center: "CC-422".to_string(),
            amount,
        }
    }

    #[test]
    fn test_format_amount_shortest() {
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(1234.56), "1234.56");
        assert_eq!(format_amount(0.5), "0.5");
    }

    #[test]
    fn test_budget_csv_layout() {
        let mut buf = Vec::new();
        write_budget_csv(&mut buf, &[record(Month::March, "CB-01", 1500.0)]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ano,mes,classe_codigo,classe_orcamentaria,subclasse,equipamento,centro_custo,valor")
        );
        assert_eq!(
            lines.next(),
            Some("2026,Mar,422103,Operacional,Combustíveis,CB-01,CC-422,1500")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_budget_write_then_read_back() {
        let mut original = vec![
            record(Month::January, "CB-01", 1234.56),
            record(Month::December, "GERAL", 0.1),
            record(Month::May, "ZZ-9", 42.0),
        ];
        original[1].class_subgroup = "Taxas, emolumentos".to_string();

        let mut buf = Vec::new();
        write_budget_csv(&mut buf, &original).unwrap();
        let read = read_budget_csv(buf.as_slice()).unwrap();

        assert_eq!(read, original);
        assert_eq!(read[0].equipment_category.as_deref(), Some("CAMINHÃO BASCULANTE"));
        assert_eq!(read[2].equipment_category, None);
    }

    #[test]
    fn test_detail_csv_doubles_embedded_quotes() {
        let detail = DetailRecord {
            date: "10/01/2026".to_string(),
            equipment_tag: "EH-12".to_string(),
            product: "Filtro \"hidráulico\"".to_string(),
            quantity: 2.0,
            unit_value: 150.0,
            total_value: 300.0,
            supplier: "Auto Peças, Ltda".to_string(),
        };
        let mut buf = Vec::new();
        write_detail_csv(&mut buf, std::slice::from_ref(&detail)).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();

        assert!(text.starts_with("data,equipamento,produto,quantidade,valorUnitario,valorTotal,fornecedor\n"));
        assert!(text.contains(r#"10/01/2026,EH-12,"Filtro ""hidráulico""",2,150,300,"Auto Peças, Ltda""#));
        assert_eq!(read_detail_csv(buf.as_slice()).unwrap(), vec![detail]);
    }

    #[test]
    fn test_file_writers_create_directories() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("2026").join("orcado.csv");
        write_budget_file(&csv_path, &[record(Month::April, "GERAL", 10.0)]).unwrap();
        assert_eq!(read_budget_file(&csv_path).unwrap().len(), 1);

        let json_path = dir.path().join("metadata").join("equipamentos.json");
        let catalog = EquipmentCatalog {
            equipment: vec![Equipment {
                code: "GERAL".to_string(),
                display_name: "GERAL".to_string(),
                category: None,
                description: "Custos gerais".to_string(),
                cost_center: "CC-001".to_string(),
                owner: "A definir".to_string(),
                email: "equipamentos@empresa.com.br".to_string(),
                active: true,
            }],
        };
        write_catalog_json(&json_path, &catalog).unwrap();

        let text = fs::read_to_string(&json_path).unwrap();
        assert!(text.contains("\"equipamentos\""));
        assert!(text.contains("\"categoria\": null"));
        let parsed: EquipmentCatalog = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_budget_file(Path::new("/nonexistent/orcado.csv")).unwrap_err();
        assert!(matches!(err, CsvError::Io { .. }));
    }
}
