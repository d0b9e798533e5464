//! The JSON shape a type index is loaded from.

use lattice::TypeSymbol;
use lsp_types::{Range, SymbolKind, SymbolTag, Uri};
use serde::{Deserialize, Serialize};

/// One type declaration in the index.
///
/// The `name` is the record's identity: `extends` edges reference it and
/// it doubles as the hierarchy item id handed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRecord {
    /// Unique type name within the index.
    pub name: String,
    /// Symbol category, numeric on the wire.
    pub kind: SymbolKind,
    /// Qualifier shown next to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Presentation tags such as deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<SymbolTag>>,
    /// Document that declares the type.
    pub uri: Uri,
    /// Full declaration range.
    pub range: Range,
    /// Name sub-range, contained in `range`.
    pub selection_range: Range,
}

impl TypeRecord {
    pub(crate) fn to_symbol(&self) -> TypeSymbol {
        TypeSymbol {
            item_id: self.name.clone(),
            name: self.name.clone(),
            kind: self.kind,
            detail: self.detail.clone(),
            tags: self.tags.clone(),
            uri: self.uri.clone(),
            range: self.range,
            selection_range: self.selection_range,
        }
    }
}

/// Top-level index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexData {
    /// Every type the index knows about.
    pub types: Vec<TypeRecord>,
    /// Subtype-to-supertype edges, as `[child, parent]` name pairs.
    #[serde(default)]
    pub extends: Vec<(String, String)>,
}
