//! Locale-aware value normalization.
//!
//! The source reports print Brazilian-format numbers (`80.744,20`) and
//! `DD/MM/YYYY` dates. Normalization is recovery-oriented: value-carrying
//! numeric fields fall back to `0.0` on unparseable input so table totals
//! never raise, while descriptive fields keep their original text.

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::Record;

/// Labels that can leak into a value when a delimiter rule boundary was
/// imperfect. Stripped from the start of extracted strings.
const RESIDUAL_LABELS: &[&str] = &[
    "Código:",
    "Nome:",
    "CNPJ/CPF:",
    "Endereço:",
    "Bairro:",
    "Cidade:",
    "Estado:",
    "CEP:",
    "IE:",
];

/// Parse a number that may use comma as the decimal separator.
///
/// Currency symbols and spaces are stripped first. Exactly one comma and
/// no dots means the comma is the decimal separator; dots together with
/// one comma mean the dots are thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace("R$", "").replace(['$', ' ', '\u{a0}'], "");
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let candidate = if commas == 1 && dots == 0 {
        cleaned.replace(',', ".")
    } else if dots > 0 && commas == 1 {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    candidate.parse::<f64>().ok()
}

/// Parse a value-carrying numeric field, defaulting to `0.0`.
pub fn number_or_zero(raw: &str) -> f64 {
    match parse_number(raw) {
        Some(v) => v,
        None => {
            log::debug!("unparseable numeric value {raw:?}, defaulting to 0.0");
            0.0
        }
    }
}

/// Parse a `DD/MM/YYYY` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// Inclusive day count between two `DD/MM/YYYY` dates.
///
/// `05/08/2024` to `19/08/2024` spans 15 days because both endpoints
/// belong to the period.
pub fn inclusive_days(start: &str, end: &str) -> Option<i64> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Some((end - start).num_days() + 1)
}

/// Collapse internal whitespace runs to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only ASCII digits (tax IDs are compared digits-only).
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Round a currency value to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Strip residual label prefixes and suffixes from an extracted string.
pub fn strip_labels(text: &str) -> String {
    let mut value = text.trim();
    if let Some(rest) = value.strip_prefix(':') {
        value = rest.trim_start();
    }
    for label in RESIDUAL_LABELS {
        if let Some(rest) = value.strip_prefix(label) {
            value = rest.trim_start();
        }
    }
    if let Some(rest) = value.strip_suffix(" IM:") {
        value = rest.trim_end();
    }
    value.to_string()
}

/// Walk a record and strip residual labels from every string field.
pub fn clean_record(record: &mut Record) {
    for (_, value) in record.as_map_mut() {
        clean_value(value);
    }
}

fn clean_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let cleaned = strip_labels(s);
            if cleaned != *s {
                *s = cleaned;
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                clean_value(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                clean_value(item);
            }
        }
        _ => {}
    }
}
