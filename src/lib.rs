//! # demex
//!
//! Layout-driven field extraction for logistics cost statements.
//!
//! demex consumes positioned text tokens and drawn page geometry produced
//! by an upstream PDF text extractor, classifies the document against a
//! registry of known report layouts, and extracts a structured JSON body:
//! header fields, repeated sections, dynamic tables with derived totals.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> demex::Result<()> {
//!     // Token dump produced by the extraction step
//!     let result = demex::analyze_file("statement.tokens.json")?;
//!
//!     if result.is_failed() {
//!         eprintln!("not a known report: {}", result.to_value());
//!     } else {
//!         println!("{}", serde_json::to_string_pretty(&result)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout registry**: declarative per-template rule-sets, classified
//!   by document title signature
//! - **Geometry-aware parsing**: column windows, colored section markers,
//!   multi-line row continuation
//! - **Line-number layouts**: delimiter rules over the assembled text dump
//! - **Derived totals**: table totals re-computed from committed rows
//! - **Failure as data**: unknown documents yield a structured error
//!   value, never a panic
//! - **Parallel line assembly**: uses Rayon across pages

pub mod engine;
pub mod error;
pub mod layout;
pub mod model;
pub mod normalize;

// Re-export commonly used types
pub use engine::LineAssembler;
pub use error::{Error, Result};
pub use layout::{
    analyze_lines, analyze_pages, classify, extract_document_title, supported_types, Layout,
    LAYOUTS,
};
pub use model::{
    Color, DocumentResult, DrawnShape, Line, LineSet, PageContent, Record, ShapeKind, TableResult,
    Token,
};

use std::io::Read;
use std::path::Path;

/// Analyze a token dump given as a JSON string.
///
/// The dump is an array of pages, each with `tokens` and optional
/// `shapes`, in document order.
///
/// # Example
///
/// ```
/// let dump = r#"[{"tokens":[
///     {"text":"DEMONSTRATIVO DE CÁLCULO","x0":10.0,"x1":200.0,"top":20.0,"bottom":28.0}
/// ]}]"#;
/// let result = demex::analyze_json(dump).unwrap();
/// assert_eq!(result.document_type(), Some("DEMONSTRATIVO DE CÁLCULO"));
/// ```
pub fn analyze_json(data: &str) -> Result<DocumentResult> {
    let pages: Vec<PageContent> = serde_json::from_str(data)?;
    Ok(layout::analyze_pages(&pages))
}

/// Analyze a token dump read from a file.
///
/// # Example
///
/// ```no_run
/// let result = demex::analyze_file("statement.tokens.json").unwrap();
/// println!("type: {:?}", result.document_type());
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<DocumentResult> {
    let data = std::fs::read_to_string(path)?;
    analyze_json(&data)
}

/// Analyze a token dump from a reader.
pub fn analyze_reader<R: Read>(reader: R) -> Result<DocumentResult> {
    let pages: Vec<PageContent> = serde_json::from_reader(reader)?;
    Ok(layout::analyze_pages(&pages))
}
