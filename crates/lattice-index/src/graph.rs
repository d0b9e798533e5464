//! The loaded type graph and its position and edge queries.
//!
//! Edges point from subtype to supertype, so outgoing neighbors of a node
//! are its supertypes and incoming neighbors are its subtypes.

use std::collections::HashMap;
use std::path::Path;

use lattice::types::range_contains_position;
use lattice::TypeSymbol;
use lsp_types::{Position, Range, Uri};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;
use tracing::debug;

use crate::record::{IndexData, TypeRecord};

/// Errors from loading or validating an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Two records share a name.
    #[error("duplicate type '{0}' in index")]
    DuplicateType(String),

    /// An extends edge references a type the index does not define.
    #[error("extends edge references unknown type '{0}'")]
    UnknownType(String),

    /// A record's ranges are not valid symbol geometry.
    #[error("invalid record '{name}': {reason}")]
    InvalidRecord {
        /// Name of the offending record.
        name: String,
        /// Which geometric invariant it violates.
        reason: String,
    },

    /// The index text is not valid JSON in the expected shape.
    #[error("malformed index: {0}")]
    Json(#[from] serde_json::Error),

    /// The index file could not be read.
    #[error("unreadable index: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable graph of type declarations and their extends edges.
#[derive(Debug)]
pub struct TypeIndex {
    graph: DiGraph<TypeRecord, ()>,
    nodes: HashMap<String, NodeIndex>,
    by_uri: HashMap<String, Vec<NodeIndex>>,
}

impl TypeIndex {
    /// Builds an index from already-deserialized data.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when a record's geometry is invalid, a name
    /// is defined twice, or an extends edge references an unknown name.
    pub fn from_data(data: IndexData) -> Result<Self, IndexError> {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let mut by_uri: HashMap<String, Vec<NodeIndex>> = HashMap::new();

        for record in data.types {
            record
                .to_symbol()
                .validate()
                .map_err(|error| IndexError::InvalidRecord {
                    name: record.name.clone(),
                    reason: error.to_string(),
                })?;
            let name = record.name.clone();
            let uri = record.uri.as_str().to_owned();
            let node = graph.add_node(record);
            if nodes.insert(name.clone(), node).is_some() {
                return Err(IndexError::DuplicateType(name));
            }
            by_uri.entry(uri).or_default().push(node);
        }

        // Edges point child -> parent.
        for (child, parent) in data.extends {
            let from = *nodes
                .get(&child)
                .ok_or_else(|| IndexError::UnknownType(child.clone()))?;
            let to = *nodes
                .get(&parent)
                .ok_or_else(|| IndexError::UnknownType(parent.clone()))?;
            graph.add_edge(from, to, ());
        }

        debug!(
            types = graph.node_count(),
            edges = graph.edge_count(),
            "loaded type index"
        );
        Ok(Self {
            graph,
            nodes,
            by_uri,
        })
    }

    /// Parses and builds an index from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Json`] for malformed text, plus everything
    /// [`from_data`](TypeIndex::from_data) rejects.
    pub fn from_json(text: &str) -> Result<Self, IndexError> {
        Self::from_data(serde_json::from_str(text)?)
    }

    /// Reads and builds an index from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] when the file cannot be read, plus
    /// everything [`from_json`](TypeIndex::from_json) rejects.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    /// Whether any indexed type is declared in `uri`.
    #[must_use]
    pub fn tracks_uri(&self, uri: &Uri) -> bool {
        self.by_uri.contains_key(uri.as_str())
    }

    /// Number of indexed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the index holds no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The type declared at `position` in `uri`, if any.
    ///
    /// A position on a type's name wins outright; otherwise the smallest
    /// declaration range containing the position is chosen, so a cursor
    /// inside a nested type resolves to the nested one.
    #[must_use]
    pub fn symbol_at(&self, uri: &Uri, position: Position) -> Option<TypeSymbol> {
        let nodes = self.by_uri.get(uri.as_str())?;
        if let Some(&node) = nodes
            .iter()
            .find(|&&node| range_contains_position(&self.graph[node].selection_range, position))
        {
            return Some(self.graph[node].to_symbol());
        }
        nodes
            .iter()
            .filter(|&&node| range_contains_position(&self.graph[node].range, position))
            .min_by_key(|&&node| range_extent(&self.graph[node].range))
            .map(|&node| self.graph[node].to_symbol())
    }

    /// Direct supertypes of the named type, in declaration order.
    /// `None` when the name is not in the index.
    #[must_use]
    pub fn supertypes_of(&self, name: &str) -> Option<Vec<TypeSymbol>> {
        Some(self.neighbors(*self.nodes.get(name)?, Direction::Outgoing))
    }

    /// Direct subtypes of the named type, in declaration order.
    /// `None` when the name is not in the index.
    #[must_use]
    pub fn subtypes_of(&self, name: &str) -> Option<Vec<TypeSymbol>> {
        Some(self.neighbors(*self.nodes.get(name)?, Direction::Incoming))
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<TypeSymbol> {
        let mut symbols: Vec<TypeSymbol> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|neighbor| self.graph[neighbor].to_symbol())
            .collect();
        // neighbors_directed walks edges newest-first; flip back to the
        // order the extends list declared them in.
        symbols.reverse();
        symbols
    }
}

// Ranges are validated well-formed at load, so end never precedes start
// line-wise; characters may regress across lines.
fn range_extent(range: &Range) -> (u32, u32) {
    (
        range.end.line - range.start.line,
        range.end.character.saturating_sub(range.start.character),
    )
}
