//! The static-index hierarchy provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lattice::{
    Document, HierarchyItem, HierarchyProvider, ProviderError, ProviderSession, TypeSymbol,
};
use lsp_types::Position;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::graph::TypeIndex;

/// Hierarchy provider answering from a pre-built [`TypeIndex`].
///
/// Handles exactly the documents the index tracks. Expansion never does
/// IO, but an item whose id is not in the index is an error: it can only
/// come from a different index generation or a corrupted payload.
pub struct IndexProvider {
    index: Arc<TypeIndex>,
    open: Arc<AtomicUsize>,
}

impl IndexProvider {
    /// Provider over `index`.
    #[must_use]
    pub fn new(index: Arc<TypeIndex>) -> Self {
        Self {
            index,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sessions prepared and not yet disposed.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

struct IndexSession {
    roots: Vec<TypeSymbol>,
    open: Arc<AtomicUsize>,
}

impl ProviderSession for IndexSession {
    fn roots(&self) -> &[TypeSymbol] {
        &self.roots
    }

    fn dispose(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!("closed index hierarchy session");
    }
}

#[async_trait]
impl HierarchyProvider for IndexProvider {
    fn name(&self) -> &str {
        "static-index"
    }

    fn handles(&self, document: &dyn Document) -> bool {
        self.index.tracks_uri(document.uri())
    }

    async fn prepare(
        &self,
        document: &dyn Document,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn ProviderSession>>, ProviderError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let Some(root) = self.index.symbol_at(document.uri(), position) else {
            return Ok(None);
        };
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Box::new(IndexSession {
            roots: vec![root],
            open: Arc::clone(&self.open),
        })))
    }

    async fn supertypes(
        &self,
        item: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        match self.index.supertypes_of(&item.symbol.item_id) {
            Some(symbols) => Ok(Some(symbols)),
            None => Err(unknown_type(&item.symbol.item_id)),
        }
    }

    async fn subtypes(
        &self,
        item: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        match self.index.subtypes_of(&item.symbol.item_id) {
            Some(symbols) => Ok(Some(symbols)),
            None => Err(unknown_type(&item.symbol.item_id)),
        }
    }
}

fn unknown_type(item_id: &str) -> ProviderError {
    ProviderError::new(format!("unknown type '{item_id}' for this index"))
}
