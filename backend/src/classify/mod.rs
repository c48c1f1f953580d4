//! Static lookup tables and code classifiers.
//!
//! - Equipment prefixes (`CB`, `EH`, `KSS`, ...) to equipment categories
//! - 6-digit accounting class codes to group/subgroup
//! - Full Portuguese month names to abbreviations
//!
//! The tables are closed, manually curated sets. Anything not listed is
//! treated as unrecognized (generic equipment, `Outros` class).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::models::{ClassMapping, GENERIC_EQUIPMENT};

// =============================================================================
// Equipment categories
// =============================================================================

/// Recognized equipment prefixes and their categories.
pub const EQUIPMENT_CATEGORIES: &[(&str, &str)] = &[
    ("CB", "CAMINHÃO BASCULANTE"),
    ("CC", "CAMINHÃO COMBOIO"),
    ("CG", "CAMINHÃO GUINDAUTO"),
    ("CP", "CAMINHÃO PIPA"),
    ("EH", "ESCAVADEIRA HIDRAULICA"),
    ("TE", "TRATOR DE ESTEIRA"),
    ("TP", "TRATOR DE PNEUS"),
    ("PC", "PA CARREGADEIRA"),
    ("VL", "VEICULO LEVE"),
    ("CA", "COMPRESSOR DE AR"),
    ("KSS", "ORE SORTER"),
    ("TC", "TRANSPORTADOR DE CORREIA"),
    ("PM", "PENEIRA MOVEL"),
    ("PV", "PENEIRA VIBRATORIA"),
    ("BM", "BRITADOR"),
];

static CATEGORY_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| EQUIPMENT_CATEGORIES.iter().copied().collect());

static EQUIPMENT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)-(\d+)$").expect("valid equipment code regex"));

static LEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)-(\d+)").expect("valid leading tag regex"));

/// Category of an equipment code, from the prefix before the first `-`.
///
/// # Example
/// ```
/// use orcamento::extract_equipment_category;
///
/// assert_eq!(extract_equipment_category(Some("CB-01")), Some("CAMINHÃO BASCULANTE"));
/// assert_eq!(extract_equipment_category(Some("ZZ-01")), None);
/// assert_eq!(extract_equipment_category(None), None);
/// ```
pub fn extract_equipment_category(code: Option<&str>) -> Option<&'static str> {
    let code = code?.trim();
    if code.is_empty() {
        return None;
    }
    let prefix = code.split('-').next().unwrap_or(code);
    CATEGORY_TABLE.get(prefix).copied()
}

/// Whether `code` is a well-formed `PREFIX-NUMBER` tag with a known prefix.
pub fn is_valid_equipment_code(code: &str) -> bool {
    EQUIPMENT_CODE
        .captures(code)
        .and_then(|caps| caps.get(1))
        .is_some_and(|prefix| CATEGORY_TABLE.contains_key(prefix.as_str()))
}

/// Equipment tag found at the start of a free-text description.
///
/// Returns [`GENERIC_EQUIPMENT`] when no tag with a known prefix leads the text.
pub fn extract_equipment_tag(free_text: &str) -> String {
    let cleaned = free_text.replace('"', "");
    let cleaned = cleaned.trim();

    LEADING_TAG
        .captures(cleaned)
        .filter(|caps| CATEGORY_TABLE.contains_key(&caps[1]))
        .map(|caps| caps[0].to_string())
        .unwrap_or_else(|| GENERIC_EQUIPMENT.to_string())
}

// =============================================================================
// Accounting classes
// =============================================================================

const PESSOAL: &str = "Pessoal";
const OPERACIONAL: &str = "Operacional";
const TECNOLOGIA: &str = "Tecnologia";

/// Group used for class codes missing from the table.
pub const FALLBACK_CLASS_GROUP: &str = "Outros";
/// Subgroup used when an unmapped class has no description.
pub const FALLBACK_CLASS_SUBGROUP: &str = "Diversos";

/// Known accounting classes: (code, group, subgroup).
pub const ACCOUNTING_CLASSES: &[(&str, &str, &str)] = &[
    ("421101", PESSOAL, "Salários"),
    ("421201", PESSOAL, "INSS"),
    ("421202", PESSOAL, "FGTS"),
    ("421204", PESSOAL, "Vale Transporte"),
    ("421301", PESSOAL, "Convênio Médico"),
    ("421302", PESSOAL, "Outros Benefícios"),
    ("421303", PESSOAL, "Seguro de Vida"),
    ("421304", PESSOAL, "Alimentação"),
    ("421405", PESSOAL, "Saúde Ocupacional"),
    ("421406", PESSOAL, "Treinamentos"),
    ("421407", PESSOAL, "Uniformes e EPI"),
    ("422101", OPERACIONAL, "Aluguel de Equipamentos"),
    ("422102", OPERACIONAL, "Serviços Gerais"),
    ("422103", OPERACIONAL, "Combustíveis"),
    ("422104", OPERACIONAL, "Manutenção de Equipamentos"),
    ("422105", OPERACIONAL, "Manutenção de Edificações"),
    ("422109", OPERACIONAL, "Pneus"),
    ("422110", OPERACIONAL, "Embalagens"),
    ("422111", OPERACIONAL, "Armazenagem"),
    ("422112", OPERACIONAL, "Limpeza e Conservação"),
    ("422113", OPERACIONAL, "Ferramentas"),
    ("422114", OPERACIONAL, "Água e Esgoto"),
    ("422115", OPERACIONAL, "Energia Elétrica"),
    ("422116", OPERACIONAL, "Comunicações"),
    ("422117", OPERACIONAL, "Exames e Análises"),
    ("422118", OPERACIONAL, "Insumos Laboratoriais"),
    ("422119", TECNOLOGIA, "Software"),
    ("422120", OPERACIONAL, "Industrialização"),
    ("422121", OPERACIONAL, "Gás GLP"),
    ("422122", TECNOLOGIA, "Telefonia e Internet"),
    ("422123", OPERACIONAL, "Fretes e Carretos"),
    ("422124", OPERACIONAL, "Viagens"),
    ("422125", TECNOLOGIA, "Material de Escritório"),
    ("422126", OPERACIONAL, "Material de Limpeza"),
    ("422127", OPERACIONAL, "Segurança"),
    ("422128", OPERACIONAL, "Lanches e Refeições"),
    ("422129", OPERACIONAL, "Custas Cartoriais"),
    ("422130", OPERACIONAL, "Taxas"),
    ("422131", OPERACIONAL, "Assessoria Jurídica"),
    ("422137", OPERACIONAL, "Seguros"),
    ("422139", OPERACIONAL, "Móveis e Utensílios"),
    ("422141", OPERACIONAL, "Equipamentos de Segurança"),
    ("422142", OPERACIONAL, "IPVA"),
    ("422144", OPERACIONAL, "Peças"),
];

static CLASS_TABLE: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    ACCOUNTING_CLASSES
        .iter()
        .map(|&(code, group, subgroup)| (code, (group, subgroup)))
        .collect()
});

/// Group and subgroup of an accounting class.
///
/// Unmapped codes fall back to `Outros` with the original description as
/// subgroup, or `Diversos` when there is none.
pub fn map_accounting_class(code: &str, fallback_description: Option<&str>) -> ClassMapping {
    match CLASS_TABLE.get(code.trim()) {
        Some(&(group, subgroup)) => ClassMapping::new(group, subgroup),
        None => {
            let subgroup = fallback_description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(FALLBACK_CLASS_SUBGROUP);
            ClassMapping::new(FALLBACK_CLASS_GROUP, subgroup)
        }
    }
}

// =============================================================================
// Months
// =============================================================================

const MONTH_NAMES: &[(&str, &str)] = &[
    ("janeiro", "Jan"),
    ("fevereiro", "Fev"),
    ("março", "Mar"),
    ("marco", "Mar"),
    ("abril", "Abr"),
    ("maio", "Mai"),
    ("junho", "Jun"),
    ("julho", "Jul"),
    ("agosto", "Ago"),
    ("setembro", "Set"),
    ("outubro", "Out"),
    ("novembro", "Nov"),
    ("dezembro", "Dez"),
];

/// Abbreviation of a full Portuguese month name.
///
/// Unrecognized input is returned unchanged.
pub fn map_month_name(full_name: &str) -> String {
    let key = full_name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or_else(|| full_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_equipment_category() {
        assert_eq!(extract_equipment_category(Some("CB-01")), Some("CAMINHÃO BASCULANTE"));
        assert_eq!(extract_equipment_category(Some("KSS-2")), Some("ORE SORTER"));
        assert_eq!(extract_equipment_category(Some("ZZ-01")), None);
        assert_eq!(extract_equipment_category(Some("GERAL")), None);
        assert_eq!(extract_equipment_category(Some("")), None);
        assert_eq!(extract_equipment_category(None), None);
    }

    #[test]
    fn test_is_valid_equipment_code() {
        assert!(is_valid_equipment_code("EH-12"));
        assert!(is_valid_equipment_code("KSS-001"));
        assert!(!is_valid_equipment_code("EH12"));
        assert!(!is_valid_equipment_code("ZZ-12"));
        assert!(!is_valid_equipment_code("EH-12A"));
        assert!(!is_valid_equipment_code("eh-12"));
        assert!(!is_valid_equipment_code("GERAL"));
    }

    #[test]
    fn test_extract_equipment_tag() {
        assert_eq!(extract_equipment_tag("CB-03 troca de óleo"), "CB-03");
        assert_eq!(extract_equipment_tag("\"EH-12 - filtro\""), "EH-12");
        assert_eq!(extract_equipment_tag("  PV-7"), "PV-7");
        assert_eq!(extract_equipment_tag("ZZ-01 desconhecido"), GENERIC_EQUIPMENT);
        assert_eq!(extract_equipment_tag("material de escritório"), GENERIC_EQUIPMENT);
        assert_eq!(extract_equipment_tag(""), GENERIC_EQUIPMENT);
    }

    #[test]
    fn test_map_accounting_class() {
        let mapped = map_accounting_class("421101", Some("SALARIOS"));
        assert_eq!(mapped, ClassMapping::new("Pessoal", "Salários"));

        let tech = map_accounting_class("422119", None);
        assert_eq!(tech.group, "Tecnologia");

        let fallback = map_accounting_class("999999", Some("Doações"));
        assert_eq!(fallback, ClassMapping::new("Outros", "Doações"));

        let no_desc = map_accounting_class("999999", Some("  "));
        assert_eq!(no_desc, ClassMapping::new("Outros", "Diversos"));
        assert_eq!(map_accounting_class("999999", None).subgroup, "Diversos");
    }

    #[test]
    fn test_accounting_table_has_unique_codes() {
        assert_eq!(CLASS_TABLE.len(), ACCOUNTING_CLASSES.len());
    }

    #[test]
    fn test_map_month_name() {
        assert_eq!(map_month_name("Janeiro"), "Jan");
        assert_eq!(map_month_name("MARÇO"), "Mar");
        assert_eq!(map_month_name("marco"), "Mar");
        assert_eq!(map_month_name(" dezembro "), "Dez");
        assert_eq!(map_month_name("Fev"), "Fev");
        assert_eq!(map_month_name("Brumaire"), "Brumaire");
    }
}
