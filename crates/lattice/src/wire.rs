//! Parsing and validation of untrusted request payloads.
//!
//! Every facade operation receives raw JSON. The functions here turn that
//! JSON into typed values or a [`ValidationError`]; nothing downstream ever
//! sees an unvalidated shape. Validation is a hard rejection, distinct from
//! the soft "session not found" results of the facade itself.

use lsp_types::{Position, Uri};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::HierarchyItem;

/// A document identifier plus a position inside it, the prepare-request
/// payload.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPosition {
    /// Target document.
    pub uri: Uri,
    /// Zero-based cursor position.
    pub position: Position,
}

/// Parses a serialized hierarchy node.
///
/// Shape errors (missing fields, a string `kind`, an invalid `uri`) and
/// geometric violations (ill-formed or uncontained ranges) are both hard
/// rejections.
///
/// # Errors
///
/// Returns [`ValidationError`] when the payload is not a well-formed node.
pub fn parse_item(value: Value) -> Result<HierarchyItem, ValidationError> {
    let item: HierarchyItem =
        serde_json::from_value(value).map_err(|err| ValidationError::Malformed {
            context: "hierarchy item",
            reason: err.to_string(),
        })?;
    item.symbol.validate()?;
    Ok(item)
}

/// Parses a prepare-request location reference.
///
/// # Errors
///
/// Returns [`ValidationError`] when the payload is not a document/position
/// pair.
pub fn parse_location(value: Value) -> Result<DocumentPosition, ValidationError> {
    serde_json::from_value(value).map_err(|err| ValidationError::Malformed {
        context: "location reference",
        reason: err.to_string(),
    })
}
