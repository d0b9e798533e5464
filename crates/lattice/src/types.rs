//! Core data model: session identifiers and hierarchy symbol nodes.

use lsp_types::{Position, Range, SymbolKind, SymbolTag, Uri};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Opaque identifier for one hierarchy session.
///
/// Issued by the session store at insertion time. Stable for the session's
/// lifetime and never derived from provider-controlled fields, so two
/// unrelated prepares can never collide on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One provider-produced entry in a type hierarchy, not yet bound to a
/// session.
///
/// Providers mint these during preparation and expansion; the hierarchy
/// model binds each one to a [`SessionId`] before it leaves the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSymbol {
    /// Provider-defined identity of this node within its session.
    pub item_id: String,
    /// Display name of the symbol.
    pub name: String,
    /// Symbol category, numeric on the wire.
    pub kind: SymbolKind,
    /// Qualifier shown next to the name, such as a module path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Presentation tags such as deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<SymbolTag>>,
    /// Document that declares the symbol.
    pub uri: Uri,
    /// Full declaration range.
    pub range: Range,
    /// Name sub-range, contained in `range`.
    pub selection_range: Range,
}

impl TypeSymbol {
    /// Binds this symbol to the session that minted it.
    #[must_use]
    pub fn bind(self, session_id: SessionId) -> HierarchyItem {
        HierarchyItem {
            session_id,
            symbol: self,
        }
    }

    /// Checks the geometric invariants: both ranges well-formed and the
    /// selection range contained in the declaration range.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !range_is_well_formed(&self.range) {
            return Err(ValidationError::IllFormedRange { field: "range" });
        }
        if !range_is_well_formed(&self.selection_range) {
            return Err(ValidationError::IllFormedRange {
                field: "selectionRange",
            });
        }
        if !range_contains(&self.range, &self.selection_range) {
            return Err(ValidationError::SelectionOutsideRange);
        }
        Ok(())
    }
}

/// A [`TypeSymbol`] bound to the session that produced it.
///
/// This is the facade's wire unit: expansion requests carry one back, and
/// the embedded `sessionId` routes the request to the right live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyItem {
    /// Session that minted this node.
    pub session_id: SessionId,
    /// The symbol payload, flattened on the wire.
    #[serde(flatten)]
    pub symbol: TypeSymbol,
}

/// Whether `range` does not end before it starts.
#[must_use]
pub fn range_is_well_formed(range: &Range) -> bool {
    position_le(range.start, range.end)
}

/// Whether `inner` lies entirely within `outer`.
#[must_use]
pub fn range_contains(outer: &Range, inner: &Range) -> bool {
    position_le(outer.start, inner.start) && position_le(inner.end, outer.end)
}

/// Whether `position` falls inside `range`. End-inclusive, so a cursor
/// sitting right after the last character still hits the declaration.
#[must_use]
pub fn range_contains_position(range: &Range, position: Position) -> bool {
    position_le(range.start, position) && position_le(position, range.end)
}

fn position_le(a: Position, b: Position) -> bool {
    (a.line, a.character) <= (b.line, b.character)
}
