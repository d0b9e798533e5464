//! Provider capability contracts.
//!
//! A [`HierarchyProvider`] is the language-specific collaborator that
//! resolves the symbol under a cursor into a session and expands nodes to
//! their direct supertypes and subtypes. Providers are registered in a
//! [`ProviderRegistry`]; the first registered provider that handles a
//! document wins, and results are never merged across providers.

use std::sync::Arc;

use async_trait::async_trait;
use lsp_types::Position;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::document::Document;
use crate::types::{HierarchyItem, TypeSymbol};

/// Error raised by a hierarchy provider.
///
/// During preparation this propagates to the facade caller; during
/// expansion it is reported to the log sink and swallowed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates an error carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A live provider-held resource backing the nodes of one session.
///
/// Whatever state backs the session's nodes is freed in
/// [`dispose`](ProviderSession::dispose); the owning lease guarantees that
/// call happens exactly once, after which no expansion against the
/// session's nodes is valid.
pub trait ProviderSession: Send + Sync {
    /// Root symbols resolved during preparation, in provider order.
    /// Non-empty for any session a provider hands out.
    fn roots(&self) -> &[TypeSymbol];

    /// Releases provider resources backing this session.
    fn dispose(&mut self);
}

/// A language-specific capability that prepares hierarchy sessions and
/// expands nodes.
#[async_trait]
pub trait HierarchyProvider: Send + Sync {
    /// Short provider name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this provider can serve `document`.
    fn handles(&self, document: &dyn Document) -> bool;

    /// Resolves the symbol(s) at `position` and opens a session backing
    /// them. `Ok(None)` means there is no hierarchy at the position.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when preparation fails outright.
    async fn prepare(
        &self,
        document: &dyn Document,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn ProviderSession>>, ProviderError>;

    /// Direct supertypes of `item`. `Ok(None)` means the provider has no
    /// answer for the node; the model normalizes it to an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on failure. Expansion errors never reach
    /// the facade caller.
    async fn supertypes(
        &self,
        item: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError>;

    /// Direct subtypes of `item`, with the same contract as
    /// [`supertypes`](HierarchyProvider::supertypes).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on failure. Expansion errors never reach
    /// the facade caller.
    async fn subtypes(
        &self,
        item: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError>;
}

/// Registration-ordered collection of providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn HierarchyProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Appends a provider; earlier registrations take precedence.
    pub fn register(&mut self, provider: Arc<dyn HierarchyProvider>) {
        self.providers.push(provider);
    }

    /// First registered provider that handles `document`.
    #[must_use]
    pub fn first_matching(&self, document: &dyn Document) -> Option<Arc<dyn HierarchyProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.handles(document))
            .cloned()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
