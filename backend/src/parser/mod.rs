//! Low-level text handling for accounting exports.
//!
//! - Reading a source file with encoding auto-detection (spreadsheet exports
//!   are frequently ISO-8859-1 / Windows-1252) and BOM stripping
//! - Splitting a delimited line, with or without quoted spans
//! - Parsing pt-BR currency and number tokens (`R$ 1.234,56`)
//!
//! No budget-specific logic here.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CsvError, CsvResult, InvalidNumber};

/// Decoded content of a source export.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// File content without byte order mark
    pub content: String,
    /// Detected encoding
    pub encoding: String,
}

impl SourceText {
    /// Lines trimmed of `\r\n` padding. Empty lines are kept so line
    /// numbers match the file.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines().map(str::trim)
    }
}

/// How a line is split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Plain split on the delimiter; quotes are kept as data.
    #[default]
    Plain,
    /// Double quotes delimit spans that may contain the delimiter.
    Quoted,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 wins; otherwise chardet decides between the Latin encodings.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        // Anything else in these exports is a Latin-1 variant
        _ => "iso-8859-1".to_string(),
    }
}

/// Decode bytes using the given encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|_| CsvError::Encoding(encoding.to_string())),
        // encoding_rs maps the Latin-1 labels to Windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned())
        }
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Decode raw export bytes, stripping a leading BOM.
pub fn decode_source(bytes: &[u8]) -> CsvResult<SourceText> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let mut content = decode_content(bytes, &encoding)?;
    if content.starts_with('\u{feff}') {
        content.replace_range(..'\u{feff}'.len_utf8(), "");
    }

    Ok(SourceText { content, encoding })
}

/// Read and decode a source export.
pub fn read_source<P: AsRef<Path>>(path: P) -> CsvResult<SourceText> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_source(&bytes)
}

/// Split a line honoring double-quoted spans.
///
/// A quote toggles the "inside quotes" state and is consumed. Doubled quotes
/// are not unescaped: `""` toggles twice and disappears.
///
/// # Example
/// ```
/// use orcamento::split_quoted_line;
///
/// let fields = split_quoted_line(r#"a,"b,c",d"#, ',');
/// assert_eq!(fields, vec!["a", "b,c", "d"]);
/// ```
pub fn split_quoted_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    fields
}

/// Split a line according to the quoting mode.
pub fn split_line(line: &str, delimiter: char, mode: QuoteMode) -> Vec<String> {
    match mode {
        QuoteMode::Plain => line.split(delimiter).map(str::to_string).collect(),
        QuoteMode::Quoted => split_quoted_line(line, delimiter),
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Longest leading float literal, like a lenient `parseFloat`.
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid numeric regex")
});

static CURRENCY_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"R\$\s*").expect("valid currency regex"));

/// Parse a pt-BR number token keeping its sign.
///
/// Empty tokens and the `R$ -` sentinel are `Ok(0.0)`; anything without a
/// leading number is an [`InvalidNumber`].
fn parse_signed(raw: &str) -> Result<f64, InvalidNumber> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let without_symbol = CURRENCY_SYMBOL.replace_all(trimmed, "");
    let mut cleaned: String = without_symbol
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(0.0);
    }
    if let Some(pos) = cleaned.find(',') {
        cleaned.replace_range(pos..pos + 1, ".");
    }

    NUMERIC_PREFIX
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidNumber(raw.to_string()))
}

/// Parse a currency token, reporting tokens that are not numbers.
///
/// The result is the absolute value: budget exports mix signs for outflows.
pub fn try_parse_valor(raw: &str) -> Result<f64, InvalidNumber> {
    parse_signed(raw).map(f64::abs)
}

/// Parse a currency token into a non-negative amount.
///
/// Never fails: malformed input is `0.0`.
///
/// # Example
/// ```
/// use orcamento::parse_valor;
///
/// assert_eq!(parse_valor("R$ 1.234,56"), 1234.56);
/// assert_eq!(parse_valor("-500,00"), 500.0);
/// assert_eq!(parse_valor("R$ -"), 0.0);
/// ```
pub fn parse_valor(raw: &str) -> f64 {
    try_parse_valor(raw).unwrap_or(0.0)
}

/// Parse a signed pt-BR decimal (quantities); malformed input is `0.0`.
pub fn parse_decimal(raw: &str) -> f64 {
    parse_signed(raw).unwrap_or(0.0)
}

// =============================================================================
// Dates
// =============================================================================

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Parse a ledger date (`dd/mm/yyyy`, `yyyy-mm-dd` or `dd-mm-yyyy`).
///
/// A trailing time component (`dd/mm/yyyy hh:mm`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.replace('"', "");
    let date_part = date_part.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valor_examples() {
        assert_eq!(parse_valor("R$ -"), 0.0);
        assert_eq!(parse_valor(""), 0.0);
        assert_eq!(parse_valor("   "), 0.0);
        assert_eq!(parse_valor("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_valor("-500,00"), 500.0);
        assert_eq!(parse_valor("100,00"), 100.0);
        assert_eq!(parse_valor("R$ 2.500.000,10"), 2500000.1);
    }

    #[test]
    fn test_parse_valor_never_negative() {
        for raw in ["-1", "R$ -3,50", "- 7", "-0,01", "12", "abc", "R$"] {
            assert!(parse_valor(raw) >= 0.0, "negative for {raw}");
        }
    }

    #[test]
    fn test_invalid_tokens_are_reported() {
        assert!(try_parse_valor("abc").is_err());
        assert!(try_parse_valor("#REF!").is_err());
        assert_eq!(parse_valor("#REF!"), 0.0);
        // sentinel is a value, not an error
        assert_eq!(try_parse_valor("R$ -").unwrap(), 0.0);
        assert_eq!(try_parse_valor("R$-").unwrap(), 0.0);
    }

    #[test]
    fn test_lenient_numeric_prefix() {
        assert_eq!(parse_valor("12abc"), 12.0);
        assert_eq!(parse_valor("1,5 un"), 1.5);
    }

    #[test]
    fn test_parse_decimal_keeps_sign() {
        assert_eq!(parse_decimal("-2,5"), -2.5);
        assert_eq!(parse_decimal("3"), 3.0);
        assert_eq!(parse_decimal("x"), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        use chrono::Datelike;

        let d = parse_date("15/03/2026").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2026, 3, 15));
        assert_eq!(parse_date("2026-03-15"), Some(d));
        assert_eq!(parse_date("15-03-2026"), Some(d));
        assert_eq!(parse_date("15/03/2026 10:42:00"), Some(d));
        assert_eq!(parse_date("31/02/2026"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("março"), None);
    }

    #[test]
    fn test_split_quoted_line() {
        assert_eq!(split_quoted_line(r#"a,"b,c",d"#, ','), vec!["a", "b,c", "d"]);
        assert_eq!(split_quoted_line("", ','), vec![""]);
        assert_eq!(split_quoted_line("a,,b", ','), vec!["a", "", "b"]);
        assert_eq!(
            split_quoted_line(r#""R$ 1.234,56";"x;y""#, ';'),
            vec!["R$ 1.234,56", "x;y"]
        );
    }

    #[test]
    fn test_split_quoted_line_does_not_unescape_doubled_quotes() {
        // Known limitation: "" toggles twice and is dropped
        assert_eq!(
            split_quoted_line(r#""say ""hi"", ok",z"#, ','),
            vec!["say hi, ok", "z"]
        );
    }

    #[test]
    fn test_split_line_plain_keeps_quotes() {
        assert_eq!(
            split_line(r#""a;b";c"#, ';', QuoteMode::Plain),
            vec!["\"a", "b\"", "c"]
        );
    }

    #[test]
    fn test_decode_latin1_as_windows_1252() {
        let decoded = decode_content(&[0xA4, b' ', 0xE7, 0xE3, b'o'], "iso-8859-1").unwrap();
        assert_eq!(decoded, "¤ ção");
    }

    #[test]
    fn test_lines_keep_empty_lines() {
        let source = decode_source(b"a;b\r\n\r\n1;2\r\n").unwrap();
        let lines: Vec<&str> = source.lines().collect();
        assert_eq!(lines, vec!["a;b", "", "1;2"]);
    }

    #[test]
    fn test_decode_source_strips_bom() {
        let bytes = "\u{feff}421101;Salários\n".as_bytes();
        let source = decode_source(bytes).unwrap();
        assert_eq!(source.encoding, "utf-8");
        assert!(source.content.starts_with("421101"));
    }

    #[test]
    fn test_decode_source_latin1() {
        // "Salários" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x61, 0x6C, 0xE1, 0x72, 0x69, 0x6F, 0x73];
        let source = decode_source(bytes).unwrap();
        assert_ne!(source.encoding, "utf-8");
        assert_eq!(source.content, "Salários");
    }

    #[test]
    fn test_decode_source_empty() {
        assert!(matches!(decode_source(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("here.csv"));
    }

    #[test]
    fn test_source_lines_trimmed() {
        let source = decode_source(b"a;b\r\n1;2\r\n").unwrap();
        let lines: Vec<&str> = source.lines().collect();
        assert_eq!(lines, vec!["a;b", "1;2"]);
    }
}
