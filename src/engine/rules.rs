//! Field extraction rules and multi-line continuation merging.
//!
//! Two interchangeable strategies pull a named field out of a line:
//! a column range over token X coordinates, or a pair of textual
//! delimiters. Rules are declarative data; layouts hold them as static
//! configuration.

use serde_json::Value;

use crate::model::{Line, Record};

/// A declarative instruction for extracting one field from a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    /// Select tokens whose left edge lies within `[x0, x1]`.
    Column {
        /// Left bound of the column window
        x0: f32,
        /// Right bound of the column window
        x1: f32,
    },
    /// Slice the line text between a start marker and an optional end
    /// marker. The value begins immediately after `start`; with no `end`
    /// it runs to the end of the line.
    Delimiter {
        /// Substring that opens the value
        start: &'static str,
        /// Substring that closes the value, if any
        end: Option<&'static str>,
    },
}

/// Apply a rule to a line.
///
/// A missing start marker or an empty column window yields `None` - a
/// normal "field absent" outcome, not an error.
pub fn apply_rule(line: &Line, rule: &FieldRule) -> Option<String> {
    match rule {
        FieldRule::Column { x0, x1 } => {
            let text = line.text_in_span(*x0, *x1);
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        FieldRule::Delimiter { .. } => apply_to_text(&line.text(), rule),
    }
}

/// Apply a delimiter rule to already-concatenated line text.
///
/// Used by line-number layouts that operate on the text dump instead of
/// token geometry. Column rules cannot apply without geometry and yield
/// `None`.
pub fn apply_to_text(text: &str, rule: &FieldRule) -> Option<String> {
    let FieldRule::Delimiter { start, end } = rule else {
        return None;
    };

    let start_pos = text.find(start)? + start.len();
    let rest = &text[start_pos..];
    let value = match end {
        Some(end_marker) => match rest.find(end_marker) {
            Some(end_pos) => &rest[..end_pos],
            None => rest,
        },
        None => rest,
    };
    Some(value.trim().to_string())
}

/// Extract one row record by applying every column rule to a line.
///
/// Absent fields are recorded as `null` so downstream consumers see every
/// declared column.
pub fn extract_row(line: &Line, columns: &[(&str, FieldRule)]) -> Record {
    let mut row = Record::new();
    for (name, rule) in columns {
        match apply_rule(line, rule) {
            Some(value) => row.set(*name, value),
            None => row.set(*name, Value::Null),
        }
    }
    row
}

/// The "new record" test: which extracted fields mark the start of a
/// fresh data row rather than a continuation of the previous one.
///
/// A row opens a new record when its key columns carry an
/// identifier-like token of minimum length (a tax ID), a slash-delimited
/// date, and a sufficiently long equipment code.
#[derive(Debug, Clone, Copy)]
pub struct RowSignature {
    /// Field holding the tax-ID-like identifier
    pub id_field: &'static str,
    /// Minimum identifier length to count as present
    pub id_min_len: usize,
    /// Field holding a slash-delimited date
    pub date_field: &'static str,
    /// Field holding the equipment code
    pub code_field: &'static str,
    /// Minimum equipment-code length to count as present
    pub code_min_len: usize,
}

impl RowSignature {
    /// Whether the row looks like the start of a new record.
    pub fn is_new_record(&self, row: &Record) -> bool {
        let id_ok = row
            .get_str(self.id_field)
            .is_some_and(|v| v.trim().len() > self.id_min_len);
        let date_ok = row
            .get_str(self.date_field)
            .is_some_and(|v| v.contains('/'));
        let code_ok = row
            .get_str(self.code_field)
            .is_some_and(|v| v.trim().len() > self.code_min_len);
        id_ok && date_ok && code_ok
    }

    /// Whether the row carries all three key fields at all (presence
    /// only, no length test). Rows failing this are not committed.
    pub fn is_complete(&self, row: &Record) -> bool {
        [self.id_field, self.date_field, self.code_field]
            .iter()
            .all(|field| row.get_str(field).is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Stop conditions for the continuation lookahead.
pub struct ContinuationGuard<'a> {
    /// New-record signature of the table being scanned
    pub signature: &'a RowSignature,
    /// Header-line test (keyword vocabulary match)
    pub is_header: &'a dyn Fn(&str) -> bool,
    /// Y of the next section marker on the page, if any
    pub next_marker_y: Option<f32>,
    /// Footer Y threshold of the page
    pub footer_y: f32,
}

/// Merge continuation lines into a committed row.
///
/// Looks ahead from `start` and appends each continuable column's text
/// (space-joined) until a line matches the new-record signature, a header
/// line, the next section marker, or the footer boundary. Returns the
/// index of the first line not consumed.
pub fn merge_continuations(
    row: &mut Record,
    columns: &[(&str, FieldRule)],
    lines: &[Line],
    start: usize,
    guard: &ContinuationGuard<'_>,
) -> usize {
    let mut k = start;
    while k < lines.len() {
        let line = &lines[k];
        if guard.next_marker_y.is_some_and(|y| line.y >= y) {
            break;
        }
        if line.y >= guard.footer_y {
            break;
        }
        let text = line.text();
        if (guard.is_header)(&text) {
            break;
        }

        let candidate = extract_row(line, columns);
        if guard.signature.is_new_record(&candidate) {
            break;
        }

        for (name, _) in columns {
            let Some(extra) = candidate.get_str(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            let merged = match row.get_str(name) {
                Some(existing) if !existing.is_empty() => format!("{existing} {extra}"),
                _ => extra.to_string(),
            };
            row.set(*name, merged);
        }
        k += 1;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Token;

    fn text_line(y: f32, parts: &[(&str, f32, f32)]) -> Line {
        Line {
            page: 0,
            y,
            tokens: parts
                .iter()
                .map(|(text, x0, x1)| Token::new(*text, *x0, *x1, y))
                .collect(),
        }
    }

    #[test]
    fn test_delimiter_with_end_marker() {
        let rule = FieldRule::Delimiter {
            start: "Código:",
            end: Some("Nome:"),
        };
        let value = apply_to_text("Código: 123 Nome: Acme CNPJ/CPF: 999", &rule);
        assert_eq!(value.as_deref(), Some("123"));
    }

    #[test]
    fn test_delimiter_without_end_runs_to_line_end() {
        let rule = FieldRule::Delimiter {
            start: "Código:",
            end: None,
        };
        let value = apply_to_text("Código: 123 Nome: Acme CNPJ/CPF: 999", &rule);
        assert_eq!(value.as_deref(), Some("123 Nome: Acme CNPJ/CPF: 999"));
    }

    #[test]
    fn test_delimiter_missing_start_is_absent() {
        let rule = FieldRule::Delimiter {
            start: "Regime:",
            end: None,
        };
        assert_eq!(apply_to_text("Código: 123", &rule), None);
    }

    #[test]
    fn test_delimiter_missing_end_falls_back_to_line_end() {
        let rule = FieldRule::Delimiter {
            start: "Nome:",
            end: Some("CNPJ/CPF:"),
        };
        assert_eq!(
            apply_to_text("Nome: Acme Ltda", &rule).as_deref(),
            Some("Acme Ltda")
        );
    }

    #[test]
    fn test_column_extraction_is_idempotent() {
        let line = text_line(
            10.0,
            &[("05/08/2024", 8.0, 39.0), ("TCLU1234567", 87.0, 127.0)],
        );
        let rule = FieldRule::Column { x0: 7.2, x1: 40.6 };
        let first = apply_rule(&line, &rule);
        let second = apply_rule(&line, &rule);
        assert_eq!(first.as_deref(), Some("05/08/2024"));
        assert_eq!(first, second);
    }

    const TEST_COLUMNS: &[(&str, FieldRule)] = &[
        ("start", FieldRule::Column { x0: 0.0, x1: 40.0 }),
        ("container", FieldRule::Column { x0: 80.0, x1: 130.0 }),
        ("id", FieldRule::Column { x0: 300.0, x1: 400.0 }),
        ("notes", FieldRule::Column { x0: 600.0, x1: 750.0 }),
    ];

    const TEST_SIGNATURE: RowSignature = RowSignature {
        id_field: "id",
        id_min_len: 10,
        date_field: "start",
        code_field: "container",
        code_min_len: 5,
    };

    #[test]
    fn test_continuation_stops_at_new_record() {
        // Line 1 is the committed row, line 2 a continuation, line 3 a
        // fresh record carrying tax ID + date + container.
        let row_line = text_line(
            100.0,
            &[
                ("05/08/2024", 8.0, 39.0),
                ("TCLU1234567", 87.0, 127.0),
                ("12345678000195", 305.0, 380.0),
                ("DESOVA DE", 610.0, 660.0),
            ],
        );
        let continuation = text_line(112.0, &[("CONTAINER", 610.0, 660.0)]);
        let new_record = text_line(
            124.0,
            &[
                ("06/08/2024", 8.0, 39.0),
                ("MSKU7654321", 87.0, 127.0),
                ("99888777000166", 305.0, 380.0),
            ],
        );
        let lines = vec![row_line.clone(), continuation, new_record];

        let mut row = extract_row(&row_line, TEST_COLUMNS);
        let guard = ContinuationGuard {
            signature: &TEST_SIGNATURE,
            is_header: &|_| false,
            next_marker_y: None,
            footer_y: 515.0,
        };
        let next = merge_continuations(&mut row, TEST_COLUMNS, &lines, 1, &guard);

        assert_eq!(next, 2);
        assert_eq!(row.get_str("notes"), Some("DESOVA DE CONTAINER"));
    }

    #[test]
    fn test_continuation_stops_at_footer_and_header() {
        let cont = text_line(520.0, &[("IGNORED", 610.0, 660.0)]);
        let mut row = Record::new();
        row.set("notes", "KEEP");
        let guard = ContinuationGuard {
            signature: &TEST_SIGNATURE,
            is_header: &|_| false,
            next_marker_y: None,
            footer_y: 515.0,
        };
        let next = merge_continuations(&mut row, TEST_COLUMNS, &[cont], 0, &guard);
        assert_eq!(next, 0);
        assert_eq!(row.get_str("notes"), Some("KEEP"));

        let header = text_line(130.0, &[("Data Inicial", 8.0, 39.0)]);
        let guard = ContinuationGuard {
            signature: &TEST_SIGNATURE,
            is_header: &|t: &str| t.contains("Data Inicial"),
            next_marker_y: None,
            footer_y: 515.0,
        };
        let next = merge_continuations(&mut row, TEST_COLUMNS, &[header], 0, &guard);
        assert_eq!(next, 0);
    }

    #[test]
    fn test_signature_tests() {
        let mut complete = Record::new();
        complete.set("id", "12345678000195");
        complete.set("start", "05/08/2024");
        complete.set("container", "TCLU1234567");
        assert!(TEST_SIGNATURE.is_new_record(&complete));
        assert!(TEST_SIGNATURE.is_complete(&complete));

        let mut partial = Record::new();
        partial.set("id", "123");
        partial.set("start", "05/08/2024");
        partial.set("container", "TCLU1234567");
        assert!(!TEST_SIGNATURE.is_new_record(&partial));
        assert!(TEST_SIGNATURE.is_complete(&partial));
    }
}
