//! Display formatting for money and dates (pt-BR conventions).

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use time::OffsetDateTime;
use time::macros::format_description;

/// `1234.5` -> `"R$ 1.234,50"`. Rounded to cents.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_brl(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

/// `dd/mm/yyyy` in the timestamp's own offset.
#[must_use]
pub fn format_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[day]/[month]/[year]")).unwrap_or_default()
}
