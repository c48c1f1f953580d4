//! Equipment catalog generation.
//!
//! Collects the equipment tags seen across outputs (or raw sheets), keeps the
//! well-formed ones, and assigns sequential cost centers in sorted order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::engine::collect_equipment_tags;
use super::rule::ReshapeRule;
use crate::api::logs::{log_info_indent, log_success, log_warning};
use crate::classify::{extract_equipment_category, is_valid_equipment_code};
use crate::error::CatalogResult;
use crate::models::{Equipment, EquipmentCatalog, GENERIC_EQUIPMENT};
use crate::parser::read_source;
use crate::writer::{read_budget_file, write_catalog_json};

pub const DEFAULT_OWNER: &str = "A definir";
pub const DEFAULT_EMAIL: &str = "equipamentos@empresa.com.br";
pub const GENERIC_DESCRIPTION: &str = "Custos gerais não alocados a equipamentos específicos";

/// Where equipment tags are collected from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// A normalized budget CSV written by this crate
    Normalized(PathBuf),
    /// A raw export read through a reshape rule
    Raw { path: PathBuf, rule: ReshapeRule },
}

impl CatalogSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            CatalogSource::Normalized(path) => path,
            CatalogSource::Raw { path, .. } => path,
        }
    }
}

/// Outcome of a catalog scan.
#[derive(Debug, Clone, Default)]
pub struct CatalogScan {
    pub tags: BTreeSet<String>,
    pub sources_read: usize,
    pub sources_skipped: usize,
}

/// Collect tags from every source. Unreadable sources are warned and skipped.
///
/// An invalid rule is still an error: it is a definition problem, not a data one.
pub fn scan_sources(sources: &[CatalogSource]) -> CatalogResult<CatalogScan> {
    let mut scan = CatalogScan::default();

    for source in sources {
        let found: Result<BTreeSet<String>, _> = match source {
            CatalogSource::Normalized(path) => read_budget_file(path)
                .map(|records| records.into_iter().map(|r| r.equipment_tag).collect()),
            CatalogSource::Raw { path, rule } => match read_source(path) {
                Ok(text) => Ok(collect_equipment_tags(&text, rule)?),
                Err(e) => Err(e),
            },
        };

        match found {
            Ok(tags) => {
                log_info_indent(
                    format!("{}: {} distinct tags", source.path().display(), tags.len()),
                    1,
                );
                scan.tags.extend(tags);
                scan.sources_read += 1;
            }
            Err(e) => {
                log_warning(format!("Skipping {}: {}", source.path().display(), e));
                scan.sources_skipped += 1;
            }
        }
    }

    Ok(scan)
}

/// Build the catalog from observed tags.
///
/// Only well-formed tags with a known prefix are kept; `GERAL` is always
/// present. Entries are sorted by code and numbered `CC-001`, `CC-002`, ...
pub fn build_catalog<I, S>(tags: I) -> EquipmentCatalog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut codes: BTreeSet<String> = tags
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| is_valid_equipment_code(t))
        .collect();
    codes.insert(GENERIC_EQUIPMENT.to_string());

    let equipment = codes
        .into_iter()
        .enumerate()
        .map(|(i, code)| catalog_entry(code, i + 1))
        .collect();

    EquipmentCatalog { equipment }
}

fn catalog_entry(code: String, sequence: usize) -> Equipment {
    let category = extract_equipment_category(Some(&code)).map(str::to_string);
    let description = match &category {
        Some(category) => format!("{} {}", category, code),
        None => GENERIC_DESCRIPTION.to_string(),
    };

    Equipment {
        display_name: code.clone(),
        code,
        category,
        description,
        cost_center: format!("CC-{:03}", sequence),
        owner: DEFAULT_OWNER.to_string(),
        email: DEFAULT_EMAIL.to_string(),
        active: true,
    }
}

/// Write the catalog to every destination.
pub fn write_catalog(catalog: &EquipmentCatalog, destinations: &[PathBuf]) -> CatalogResult<()> {
    for path in destinations {
        write_catalog_json(path, catalog)?;
        log_success(format!("Saved {}", path.display()));
    }
    Ok(())
}

/// Entries per category, most frequent first. `GERAL` is not counted.
pub fn category_counts(catalog: &EquipmentCatalog) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &catalog.equipment {
        if let Some(category) = &entry.category {
            *counts.entry(category.as_str()).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(category, n)| (category.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::rule::equipment_budget_rule;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_catalog_sorted_and_numbered() {
        let catalog = build_catalog(["VL-3", "CB-01", "EH-12", "CB-01", "ZZ-1", "eh-5", ""]);
        let codes: Vec<&str> = catalog.equipment.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["CB-01", "EH-12", "GERAL", "VL-3"]);

        let centers: Vec<&str> = catalog.equipment.iter().map(|e| e.cost_center.as_str()).collect();
        assert_eq!(centers, vec!["CC-001", "CC-002", "CC-003", "CC-004"]);

        let cb = &catalog.equipment[0];
        assert_eq!(cb.display_name, "CB-01");
        assert_eq!(cb.category.as_deref(), Some("CAMINHÃO BASCULANTE"));
        assert_eq!(cb.description, "CAMINHÃO BASCULANTE CB-01");
        assert_eq!(cb.owner, "A definir");
        assert_eq!(cb.email, "equipamentos@empresa.com.br");
        assert!(cb.active);

        let geral = &catalog.equipment[2];
        assert_eq!(geral.category, None);
        assert_eq!(geral.description, GENERIC_DESCRIPTION);
    }

    #[test]
    fn test_build_catalog_always_has_generic() {
        let catalog = build_catalog(Vec::<String>::new());
        assert_eq!(catalog.equipment.len(), 1);
        assert_eq!(catalog.equipment[0].code, "GERAL");
        assert_eq!(catalog.equipment[0].cost_center, "CC-001");
    }

    #[test]
    fn test_category_counts_descending() {
        let catalog = build_catalog(["CB-01", "CB-02", "EH-1", "VL-1", "VL-2", "VL-3"]);
        let counts = category_counts(&catalog);
        assert_eq!(
            counts,
            vec![
                ("VEICULO LEVE".to_string(), 3),
                ("CAMINHÃO BASCULANTE".to_string(), 2),
                ("ESCAVADEIRA HIDRAULICA".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_scan_skips_missing_sources() {
        let dir = tempdir().unwrap();
        let normalized = dir.path().join("orcado.csv");
        fs::write(
            &normalized,
            "ano,mes,classe_codigo,classe_orcamentaria,subclasse,equipamento,centro_custo,valor\n\
             2026,Jan,422103,Operacional,Combustíveis,CB-01,CC-422,10\n\
             2026,Fev,422103,Operacional,Combustíveis,GERAL,CC-422,5\n",
        )
        .unwrap();

        let mut fields = vec![String::new(); 17];
        fields[0] = "422103".to_string();
        fields[16] = "EH-12".to_string();
        let raw = dir.path().join("equipamentos.csv");
        fs::write(&raw, format!("header\n{}\n", fields.join(";"))).unwrap();

        let sources = vec![
            CatalogSource::Normalized(normalized),
            CatalogSource::Normalized(dir.path().join("missing.csv")),
            CatalogSource::Raw {
                path: raw,
                rule: equipment_budget_rule(),
            },
        ];
        let scan = scan_sources(&sources).unwrap();

        assert_eq!(scan.sources_read, 2);
        assert_eq!(scan.sources_skipped, 1);
        let tags: Vec<&str> = scan.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["CB-01", "EH-12", "GERAL"]);
    }
}
