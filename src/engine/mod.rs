//! The layout-driven extraction engine.
//!
//! Components are layered leaves-first: the assembler turns tokens into
//! lines, the section scanner finds colored markers, the rule engine pulls
//! named fields out of lines, and the table scanner drives the bounded
//! row-by-row parse.

pub mod assembler;
pub mod rules;
pub mod section;
pub mod table;

pub use assembler::LineAssembler;
pub use rules::{
    apply_rule, apply_to_text, extract_row, merge_continuations, ContinuationGuard, FieldRule,
    RowSignature,
};
pub use section::{
    has_marked_rule, MarkerSpec, PageBounds, SectionCarry, SectionMarker, SectionScanner,
    RULE_Y_TOLERANCE,
};
pub use table::{ScanState, TableScan};
