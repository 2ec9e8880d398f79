//! Document classification and dispatch over known report layouts.
//!
//! Each known report template is a [`Layout`]: a static, declarative
//! rule-set (signature, field rules, section vocabulary, terminators)
//! plus an extraction pipeline parametrized over it. The classifier
//! reads the first non-blank line of the document, matches it against
//! layout signatures in priority order, and dispatches; no signature
//! match is a failure *value*, never a panic or an `Err` at the public
//! boundary.

pub mod services;
pub mod statement;

use crate::engine::{FieldRule, LineAssembler};
use crate::error::Result;
use crate::model::{DocumentResult, LineSet, PageContent, Record};

/// How a layout's title signature matches the document's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Title must equal the signature exactly
    Exact(&'static str),
    /// Title must contain the signature as a substring
    Contains(&'static str),
}

impl Signature {
    /// Test a document title against this signature.
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Signature::Exact(s) => title == *s,
            Signature::Contains(s) => title.contains(s),
        }
    }
}

/// Everything a layout pipeline may consume.
pub struct ExtractionInput<'a> {
    /// Raw pages, for layouts needing drawn geometry
    pub pages: &'a [PageContent],
    /// Assembled lines of the whole document
    pub lines: &'a LineSet,
}

/// A named, versioned rule-set describing one known report template.
pub struct Layout {
    /// Layout identifier; becomes the `document_type` tag
    pub id: &'static str,
    /// Title signature used by the classifier
    pub signature: Signature,
    /// Column rules used by this layout, for configuration validation
    /// (empty when the layout is delimiter-only)
    pub columns: &'static [(&'static str, FieldRule)],
    /// The extraction pipeline
    pub extract: fn(&ExtractionInput<'_>) -> Result<Record>,
}

impl Layout {
    /// Verify that no two column rules of this layout overlap.
    ///
    /// Column disjointness is assumed by extraction (a token is assigned
    /// to the range containing its left edge); an overlap is a
    /// configuration bug, so this runs in tests and debug builds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (i, (name_a, rule_a)) in self.columns.iter().enumerate() {
            let FieldRule::Column { x0: a0, x1: a1 } = rule_a else {
                continue;
            };
            if a0 > a1 {
                return Err(format!("{}: column {name_a} has x0 > x1", self.id));
            }
            for (name_b, rule_b) in &self.columns[i + 1..] {
                let FieldRule::Column { x0: b0, x1: b1 } = rule_b else {
                    continue;
                };
                if a0.max(*b0) <= a1.min(*b1) {
                    return Err(format!(
                        "{}: columns {name_a} and {name_b} overlap",
                        self.id
                    ));
                }
            }
        }
        Ok(())
    }
}

/// All known layouts, in classification priority order (exact signatures
/// before substring ones).
pub static LAYOUTS: &[Layout] = &[services::LAYOUT, statement::LAYOUT];

/// The enumerated list of supported layout identifiers.
pub fn supported_types() -> Vec<String> {
    LAYOUTS.iter().map(|l| l.id.to_string()).collect()
}

/// Read the document title: the first non-blank line.
///
/// When the first line merely contains the services signature (trailing
/// print artifacts around it), the canonical signature is returned.
pub fn extract_document_title(lines: &LineSet) -> Option<String> {
    let first = lines.first_non_blank()?.text();
    if first.contains(services::SERVICES_TYPE) {
        return Some(services::SERVICES_TYPE.to_string());
    }
    Some(first)
}

/// Match a title against the known layouts, in priority order.
pub fn classify(title: &str) -> Option<&'static Layout> {
    LAYOUTS.iter().find(|layout| layout.signature.matches(title))
}

/// Classify a document and run the matching pipeline.
///
/// This is the dispatcher boundary: it always returns a well-formed
/// [`DocumentResult`], converting unknown titles and any deeper pipeline
/// error into the failure shape.
pub fn analyze_pages(pages: &[PageContent]) -> DocumentResult {
    let lines = LineAssembler::new().assemble(pages);
    analyze_lines(pages, &lines)
}

/// [`analyze_pages`] over pre-assembled lines.
pub fn analyze_lines(pages: &[PageContent], lines: &LineSet) -> DocumentResult {
    let Some(title) = extract_document_title(lines) else {
        return DocumentResult::failed("Could not extract document title", None, supported_types());
    };

    let Some(layout) = classify(&title) else {
        log::debug!("no layout signature matches title {title:?}");
        return DocumentResult::failed(
            "Document type not recognized",
            Some(title),
            supported_types(),
        );
    };
    debug_assert!(layout.validate().is_ok(), "invalid layout configuration");

    let input = ExtractionInput { pages, lines };
    match (layout.extract)(&input) {
        Ok(body) => DocumentResult::Extracted {
            document_type: layout.id.to_string(),
            body,
        },
        Err(err) => {
            log::warn!("pipeline for {} failed: {err}", layout.id);
            DocumentResult::failed(err.to_string(), Some(title), supported_types())
        }
    }
}
