//! Data model for positioned text and extraction results.

mod line;
mod record;
mod result;
mod token;

pub use line::{Line, LineSet};
pub use record::Record;
pub use result::{DocumentResult, TableResult};
pub use token::{Color, DrawnShape, PageContent, ShapeKind, Token};
