//! Extraction output structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name to raw string value, uncoerced.
///
/// A `None` value means the field was addressed by a blueprint but did not
/// match. Type coercion is left to downstream consumers.
pub type FieldMap = BTreeMap<String, Option<String>>;

/// One job's raw extraction result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawJobRecord {
    /// Merged fields from the fixed sections (header, client, itinerary)
    pub fixed_fields: FieldMap,

    /// Canonically renamed fields from the price table
    pub price_fields: FieldMap,

    /// One field map per repeated address section, in document order
    pub addresses: Vec<FieldMap>,
}

/// Structured record of a field- or structure-level extraction miss.
///
/// Diagnostics are returned, never thrown; they carry enough context
/// (including the observed line contents) to triage a miss without
/// re-fetching the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Section kind the miss occurred in (header, client, address, ...)
    pub section: String,

    /// Field that missed, if the miss is field-level
    pub field: Option<String>,

    /// Signed line index the field spec addressed
    pub line_index: Option<i32>,

    /// Resolved absolute index, if it was in range
    pub resolved_index: Option<usize>,

    /// Pattern that failed to match
    pub pattern: Option<String>,

    /// Full line sequence observed at failure time
    pub snapshot: Vec<String>,

    /// Human-readable summary of the miss
    pub message: String,
}

impl Diagnostic {
    /// A required field failed to resolve or match.
    pub fn field_miss(
        section: &str,
        field: &str,
        line_index: i32,
        resolved_index: Option<usize>,
        pattern: &str,
        snapshot: Vec<String>,
    ) -> Self {
        let message = match resolved_index {
            Some(resolved) => format!(
                "field '{field}' in section '{section}': pattern '{pattern}' \
                 did not match line {resolved}"
            ),
            None => format!(
                "field '{field}' in section '{section}': line index {line_index} \
                 is out of range for {} line(s)",
                snapshot.len()
            ),
        };
        Self {
            section: section.to_string(),
            field: Some(field.to_string()),
            line_index: Some(line_index),
            resolved_index,
            pattern: Some(pattern.to_string()),
            snapshot,
            message,
        }
    }

    /// A mandatory section anchor was not found in the document.
    pub fn structural(section: &str, message: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            field: None,
            line_index: None,
            resolved_index: None,
            pattern: None,
            snapshot: Vec::new(),
            message: message.into(),
        }
    }

    /// A document could not be retrieved at all.
    pub fn transport(uuid: &str, message: impl Into<String>) -> Self {
        Self {
            section: "document".to_string(),
            field: None,
            line_index: None,
            resolved_index: None,
            pattern: None,
            snapshot: Vec::new(),
            message: format!("job {uuid}: {}", message.into()),
        }
    }

    /// True for misses that abort assembly of the item.
    pub fn is_fatal(&self) -> bool {
        self.field.is_none()
    }
}
