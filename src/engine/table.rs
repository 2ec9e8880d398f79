//! Bounded table scanning as an explicit finite-state machine.
//!
//! The scan over a section's body is `SeekHeader -> InTable -> Done`.
//! Header lines are recognized by keyword vocabulary (a primary header
//! plus an optional translated header immediately below both match);
//! a literal terminator phrase ends the table. Row parsing itself is
//! supplied by the layout, so coordinate tables and token tables share
//! one scan loop and one set of guard conditions.

use crate::model::{Line, Record};

/// State of the bounded table scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Skipping column-header lines below the section marker
    SeekHeader,
    /// Committing data rows
    InTable,
    /// A terminator phrase ended the table
    Done,
}

/// A table's scan vocabulary: what is a header, what ends the table.
#[derive(Debug, Clone, Copy)]
pub struct TableScan<'a> {
    /// A line containing any of these (case-insensitive) is a header line
    pub header_vocab: &'a [&'a str],
    /// Lines containing any of these are data even when the header
    /// vocabulary matches (e.g. running "AmountTotal" rows)
    pub header_exempt: &'a [&'a str],
    /// Literal phrases that terminate the table
    pub terminators: &'a [&'a str],
}

impl<'a> TableScan<'a> {
    /// Whether a line is a column-header line.
    pub fn is_header_line(&self, text: &str) -> bool {
        if self.header_exempt.iter().any(|kw| text.contains(kw)) {
            return false;
        }
        let lower = text.to_lowercase();
        self.header_vocab
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()))
    }

    /// Whether a line terminates the table.
    pub fn is_terminator(&self, text: &str) -> bool {
        self.terminators.iter().any(|t| text.contains(t))
    }

    /// Run the scan over a section body already clipped to its scope.
    ///
    /// `parse_row` receives the body slice and the current index and
    /// returns the committed row plus the number of lines it consumed
    /// (more than one when continuations were merged); `None` skips the
    /// line. Returns the committed rows and the final state - `Done` only
    /// when a terminator was seen, otherwise the scope ran out first.
    pub fn run<F>(&self, lines: &[Line], mut parse_row: F) -> (Vec<Record>, ScanState)
    where
        F: FnMut(&[Line], usize) -> Option<(Record, usize)>,
    {
        let mut state = ScanState::SeekHeader;
        let mut rows = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let text = lines[i].text();

            if self.is_terminator(&text) {
                log::debug!("table terminator at index {i}: {text:?}");
                state = ScanState::Done;
                break;
            }
            if self.is_header_line(&text) {
                // Primary and secondary (translated) headers both land here.
                i += 1;
                continue;
            }

            state = ScanState::InTable;
            match parse_row(lines, i) {
                Some((row, consumed)) => {
                    rows.push(row);
                    i += consumed.max(1);
                }
                None => i += 1,
            }
        }

        (rows, state)
    }

    /// Text-based variant of [`run`](Self::run) for layouts that scan the
    /// line-text dump instead of token geometry.
    pub fn run_texts<F>(&self, texts: &[String], mut parse_row: F) -> (Vec<Record>, ScanState)
    where
        F: FnMut(&str) -> Option<Record>,
    {
        let mut state = ScanState::SeekHeader;
        let mut rows = Vec::new();

        for text in texts {
            if self.is_terminator(text) {
                log::debug!("table terminator: {text:?}");
                state = ScanState::Done;
                break;
            }
            if self.is_header_line(text) {
                continue;
            }
            state = ScanState::InTable;
            if let Some(row) = parse_row(text) {
                rows.push(row);
            }
        }

        (rows, state)
    }
}
