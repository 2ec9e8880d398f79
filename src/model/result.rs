//! Extraction output types.

use serde::Serialize;
use serde_json::{json, Value};

use super::record::Record;
use crate::normalize;

/// A parsed dynamic table: row records plus the accumulated total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableResult {
    /// One record per committed table row
    pub fields: Vec<Record>,
    /// Running total over the designated column, rounded to 2 decimals
    pub total: f64,
}

impl TableResult {
    /// Build a table result, deriving the total from the rows.
    ///
    /// The total is always `round2(sum of row[total_field])`, so it stays
    /// re-derivable from the rows; unparsed cells contribute 0.0.
    pub fn from_rows(fields: Vec<Record>, total_field: &str) -> Self {
        let total = normalize::round2(
            fields
                .iter()
                .map(|row| row.get_f64(total_field).unwrap_or(0.0))
                .sum(),
        );
        Self { fields, total }
    }

    /// Number of committed rows.
    pub fn row_count(&self) -> usize {
        self.fields.len()
    }
}

/// The finished output for one document.
///
/// Either a complete extraction tagged with the matched layout identifier,
/// or a failure value carrying the observed title and the supported-type
/// list. Partial section data is never exposed.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentResult {
    /// Classification and extraction succeeded
    Extracted {
        /// The matched layout identifier
        document_type: String,
        /// Header fields, sections and tables, merged per layout
        body: Record,
    },
    /// Classification failed or the pipeline faulted
    Failed {
        /// Human-readable failure reason
        error: String,
        /// The observed title, when one could be read
        document_title: Option<String>,
        /// The enumerated list of supported layout identifiers
        supported_types: Vec<String>,
    },
}

impl DocumentResult {
    /// Build a failure result.
    pub fn failed(
        error: impl Into<String>,
        document_title: Option<String>,
        supported_types: Vec<String>,
    ) -> Self {
        Self::Failed {
            error: error.into(),
            document_title,
            supported_types,
        }
    }

    /// Whether this is a failure value.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The matched layout identifier, if extraction succeeded.
    pub fn document_type(&self) -> Option<&str> {
        match self {
            Self::Extracted { document_type, .. } => Some(document_type),
            Self::Failed { .. } => None,
        }
    }

    /// The extracted body, if extraction succeeded.
    pub fn body(&self) -> Option<&Record> {
        match self {
            Self::Extracted { body, .. } => Some(body),
            Self::Failed { .. } => None,
        }
    }

    /// Flatten into the output-boundary JSON mapping.
    ///
    /// Success: the body's fields plus a `document_type` tag. Failure:
    /// `{error, document_title?, supported_types}` with no section data.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Extracted {
                document_type,
                body,
            } => {
                let mut map = body.clone().into_value();
                map["document_type"] = json!(document_type);
                map
            }
            Self::Failed {
                error,
                document_title,
                supported_types,
            } => {
                let mut map = json!({
                    "error": error,
                    "supported_types": supported_types,
                });
                if let Some(title) = document_title {
                    map["document_title"] = json!(title);
                }
                map
            }
        }
    }
}

impl Serialize for DocumentResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
