//! pt-BR display formatting.

/// Symbol shown for an ISO currency code.
fn currency_symbol(code: &str) -> &str {
    match code {
        "BRL" => "R$",
        "USD" => "US$",
        "EUR" => "€",
        other => other,
    }
}

/// Money in pt-BR notation, rounded to cents: `R$ 1.234,56`.
///
/// The output parses back with [`crate::parse_valor`] to the same
/// (non-negative) amount.
pub fn format_currency(value: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{} {},{}", sign, currency_symbol(currency), grouped, frac_part)
}

/// Percentage with one decimal: `12.5%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}
