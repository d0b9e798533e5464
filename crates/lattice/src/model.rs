//! Hierarchy session orchestration.
//!
//! A [`HierarchyModel`] ties one store token to one provider session. It is
//! immutable after construction except for its one-shot disposal; pivoting
//! to another node happens by [`fork`](HierarchyModel::fork)ing, which
//! shares the underlying session through the reference-counted lease rather
//! than re-running preparation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lsp_types::Position;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::document::Document;
use crate::error::DisposedError;
use crate::provider::{HierarchyProvider, ProviderError, ProviderRegistry};
use crate::session::SessionLease;
use crate::types::{HierarchyItem, SessionId, TypeSymbol};

/// One live type-hierarchy session focused on a set of nodes.
///
/// Expansion is total for callers: provider failures are reported to the
/// log sink and normalized to an empty list, never propagated. The only
/// model-level error is using it after disposal.
pub struct HierarchyModel {
    id: SessionId,
    provider: Arc<dyn HierarchyProvider>,
    focused: Vec<HierarchyItem>,
    lease: SessionLease,
    disposed: AtomicBool,
}

impl HierarchyModel {
    /// Prepares a session at `position` in `document`.
    ///
    /// Picks the first registered provider that handles the document and
    /// asks it to prepare. `Ok(None)` when no provider matches, the
    /// provider finds nothing at the position, the provider hands back a
    /// session without roots, or `cancel` fires before the session is
    /// usable. A session produced by a provider racing cancellation is
    /// disposed before returning, so a cancelled create never leaks.
    ///
    /// # Errors
    ///
    /// Propagates [`ProviderError`] from the provider's prepare call.
    pub async fn create(
        providers: &ProviderRegistry,
        document: &dyn Document,
        position: Position,
        id: SessionId,
        cancel: &CancellationToken,
    ) -> Result<Option<Self>, ProviderError> {
        let Some(provider) = providers.first_matching(document) else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let Some(mut session) = provider.prepare(document, position, cancel).await? else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            session.dispose();
            return Ok(None);
        }
        let focused: Vec<HierarchyItem> = session
            .roots()
            .iter()
            .cloned()
            .map(|symbol| symbol.bind(id.clone()))
            .collect();
        if focused.is_empty() {
            // Sessions expose a non-empty root list; a provider breaking
            // that contract gets its session closed instead of a model
            // nothing can expand.
            warn!(provider = provider.name(), "provider session has no roots");
            session.dispose();
            return Ok(None);
        }
        Ok(Some(Self::from_parts(
            id,
            provider,
            focused,
            SessionLease::new(session),
        )))
    }

    pub(crate) fn from_parts(
        id: SessionId,
        provider: Arc<dyn HierarchyProvider>,
        focused: Vec<HierarchyItem>,
        lease: SessionLease,
    ) -> Self {
        Self {
            id,
            provider,
            focused,
            lease,
            disposed: AtomicBool::new(false),
        }
    }

    /// Store token identifying this session.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Nodes this model is focused on: every root for a created model,
    /// exactly one node for a fork.
    #[must_use]
    pub fn focused(&self) -> &[HierarchyItem] {
        &self.focused
    }

    /// Whether this model has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Releases this model's reference to the underlying session.
    ///
    /// The provider session itself is freed when the last model
    /// referencing it is disposed.
    ///
    /// # Errors
    ///
    /// Returns [`DisposedError`] when the model was already disposed.
    pub fn dispose(&self) -> Result<(), DisposedError> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(DisposedError(self.id.clone()));
        }
        self.lease.release();
        Ok(())
    }

    /// Pivots focus to `node`, sharing the underlying session.
    ///
    /// The fork owns its own session reference; forks and the original can
    /// be disposed in any order and the provider session is freed exactly
    /// once, when the last reference goes. Forks are not registered in any
    /// store automatically.
    ///
    /// # Errors
    ///
    /// Returns [`DisposedError`] when this model was already disposed.
    pub fn fork(&self, node: HierarchyItem) -> Result<Self, DisposedError> {
        self.ensure_live()?;
        let lease = self
            .lease
            .acquire()
            .ok_or_else(|| DisposedError(self.id.clone()))?;
        Ok(Self {
            id: self.id.clone(),
            provider: Arc::clone(&self.provider),
            focused: vec![node],
            lease,
            disposed: AtomicBool::new(false),
        })
    }

    /// Direct supertypes of `node`, bound to this session.
    ///
    /// # Errors
    ///
    /// Returns [`DisposedError`] when the model was already disposed.
    /// Provider failures do not error: they are logged and produce an
    /// empty list.
    pub async fn supertypes(
        &self,
        node: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Vec<HierarchyItem>, DisposedError> {
        self.ensure_live()?;
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let outcome = self.provider.supertypes(node, cancel).await;
        Ok(self.normalize("supertypes", outcome, cancel))
    }

    /// Direct subtypes of `node`, bound to this session. Same contract as
    /// [`supertypes`](HierarchyModel::supertypes).
    ///
    /// # Errors
    ///
    /// Returns [`DisposedError`] when the model was already disposed.
    pub async fn subtypes(
        &self,
        node: &HierarchyItem,
        cancel: &CancellationToken,
    ) -> Result<Vec<HierarchyItem>, DisposedError> {
        self.ensure_live()?;
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let outcome = self.provider.subtypes(node, cancel).await;
        Ok(self.normalize("subtypes", outcome, cancel))
    }

    fn ensure_live(&self) -> Result<(), DisposedError> {
        if self.is_disposed() {
            return Err(DisposedError(self.id.clone()));
        }
        Ok(())
    }

    fn normalize(
        &self,
        direction: &'static str,
        outcome: Result<Option<Vec<TypeSymbol>>, ProviderError>,
        cancel: &CancellationToken,
    ) -> Vec<HierarchyItem> {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match outcome {
            Ok(Some(symbols)) => symbols
                .into_iter()
                .map(|symbol| symbol.bind(self.id.clone()))
                .collect(),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(
                    session = %self.id,
                    provider = self.provider.name(),
                    direction,
                    error = %error,
                    "type hierarchy expansion failed"
                );
                Vec::new()
            }
        }
    }
}

impl Drop for HierarchyModel {
    fn drop(&mut self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            warn!(session = %self.id, "hierarchy model dropped without dispose");
            self.lease.release();
        }
    }
}

impl std::fmt::Debug for HierarchyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyModel")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .field("focused", &self.focused)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering as AtomicOrdering;

    use super::*;
    use crate::testing::{
        fixture_uri, item, symbol, ExpandScript, PrepareScript, ScriptedProvider, StaticDocument,
    };

    fn registry_with(provider: &Arc<ScriptedProvider>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::clone(provider) as Arc<dyn HierarchyProvider>);
        registry
    }

    fn rust_document() -> StaticDocument {
        StaticDocument::new(fixture_uri("animals.rs"), "rust", "struct Animal;")
    }

    fn cursor() -> Position {
        Position {
            line: 4,
            character: 9,
        }
    }

    async fn prepared_model(provider: &Arc<ScriptedProvider>) -> HierarchyModel {
        let registry = registry_with(provider);
        HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await
        .expect("prepare does not fail")
        .expect("provider yields a session")
    }

    #[tokio::test]
    async fn create_returns_none_without_matching_provider() {
        let provider = Arc::new(ScriptedProvider::new("python"));
        let registry = registry_with(&provider);
        let created = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await
        .expect("no provider is not an error");
        assert!(created.is_none());
        assert_eq!(provider.prepare_calls(), 0);
    }

    #[tokio::test]
    async fn create_returns_none_when_provider_finds_nothing() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Absent);
        let registry = registry_with(&provider);
        let created = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await
        .expect("absent is not an error");
        assert!(created.is_none());
        assert_eq!(provider.prepare_calls(), 1);
    }

    #[tokio::test]
    async fn create_propagates_prepare_failure() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Fail("language server crashed".into()));
        let registry = registry_with(&provider);
        let result = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await;
        let error = result.expect_err("prepare failures propagate");
        assert_eq!(error.to_string(), "language server crashed");
    }

    #[tokio::test]
    async fn create_binds_roots_to_the_store_token() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![
            symbol("zoo::Animal", "Animal"),
            symbol("zoo::Plant", "Plant"),
        ]));
        let model = prepared_model(&provider).await;

        assert_eq!(model.id().as_str(), "sess-test0001");
        assert_eq!(model.focused().len(), 2);
        assert!(model
            .focused()
            .iter()
            .all(|node| node.session_id.as_str() == "sess-test0001"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_create() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Animal", "Animal")]));
        let registry = registry_with(&provider);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let created = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &cancel,
        )
        .await
        .expect("cancellation is not an error");
        assert!(created.is_none());
        assert_eq!(provider.prepare_calls(), 0);
    }

    #[tokio::test]
    async fn session_racing_cancellation_is_disposed() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::CancelThenRoots(vec![symbol(
            "zoo::Animal",
            "Animal",
        )]));
        let registry = registry_with(&provider);
        let created = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await
        .expect("cancellation is not an error");
        assert!(created.is_none());
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn rootless_session_is_closed_and_absent() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::EmptyRoots);
        let registry = registry_with(&provider);
        let created = HierarchyModel::create(
            &registry,
            &rust_document(),
            cursor(),
            SessionId::from("sess-test0001"),
            &CancellationToken::new(),
        )
        .await
        .expect("broken provider is not an error here");
        assert!(created.is_none());
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn expansion_binds_results_to_the_session() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        provider.push_supertypes(ExpandScript::Symbols(vec![symbol("zoo::Animal", "Animal")]));
        let model = prepared_model(&provider).await;
        let node = model.focused()[0].clone();

        let parents = model
            .supertypes(&node, &CancellationToken::new())
            .await
            .expect("model is live");
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].symbol.name, "Animal");
        assert_eq!(parents[0].session_id.as_str(), "sess-test0001");

        model.dispose().expect("first dispose succeeds");
    }

    #[tokio::test]
    async fn provider_expansion_failure_becomes_empty() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        provider.push_supertypes(ExpandScript::Fail("index corrupted".into()));
        provider.push_subtypes(ExpandScript::Fail("index corrupted".into()));
        let model = prepared_model(&provider).await;
        let node = model.focused()[0].clone();
        let cancel = CancellationToken::new();

        assert!(model
            .supertypes(&node, &cancel)
            .await
            .expect("model is live")
            .is_empty());
        assert!(model
            .subtypes(&node, &cancel)
            .await
            .expect("model is live")
            .is_empty());

        model.dispose().expect("first dispose succeeds");
    }

    #[tokio::test]
    async fn absent_expansion_normalizes_to_empty() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        provider.push_subtypes(ExpandScript::Absent);
        let model = prepared_model(&provider).await;
        let node = model.focused()[0].clone();

        let children = model
            .subtypes(&node, &CancellationToken::new())
            .await
            .expect("model is live");
        assert!(children.is_empty());

        model.dispose().expect("first dispose succeeds");
    }

    #[tokio::test]
    async fn cancelled_expansion_is_empty_without_calling_the_provider() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;
        let node = model.focused()[0].clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let parents = model
            .supertypes(&node, &cancel)
            .await
            .expect("model is live");
        assert!(parents.is_empty());
        assert_eq!(provider.expand_calls(), 0);

        model.dispose().expect("first dispose succeeds");
    }

    #[tokio::test]
    async fn fork_and_original_free_the_session_exactly_once() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;

        let pivot = item("sess-test0001", "zoo::Animal", "Animal");
        let fork = model.fork(pivot).expect("model is live");
        assert_eq!(fork.id(), model.id());
        assert_eq!(fork.focused().len(), 1);
        assert_eq!(fork.focused()[0].symbol.name, "Animal");

        fork.dispose().expect("first dispose of the fork succeeds");
        assert_eq!(provider.disposals(), 0);
        model.dispose().expect("first dispose of the model succeeds");
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn many_forks_disposed_in_any_order_free_once() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;

        let forks: Vec<HierarchyModel> = (0..4)
            .map(|n| {
                model
                    .fork(item("sess-test0001", "zoo::Animal", &format!("A{n}")))
                    .expect("model is live")
            })
            .collect();

        model.dispose().expect("first dispose succeeds");
        assert_eq!(provider.disposals(), 0);
        for fork in forks.iter().rev() {
            fork.dispose().expect("each fork disposes once");
        }
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn double_dispose_is_a_detectable_misuse() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;

        model.dispose().expect("first dispose succeeds");
        let error = model.dispose().expect_err("second dispose must fail");
        assert_eq!(error.0.as_str(), "sess-test0001");
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn disposed_model_rejects_expansion_and_fork() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;
        let node = model.focused()[0].clone();
        model.dispose().expect("first dispose succeeds");

        let cancel = CancellationToken::new();
        assert!(model.supertypes(&node, &cancel).await.is_err());
        assert!(model.subtypes(&node, &cancel).await.is_err());
        assert!(model.fork(node).is_err());
        assert_eq!(provider.expand_calls(), 0);
    }

    #[tokio::test]
    async fn dropping_an_undisposed_model_still_releases() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let model = prepared_model(&provider).await;
        drop(model);
        assert_eq!(provider.disposals(), 1);
    }

    #[tokio::test]
    async fn shared_disposal_counter_observes_teardown() {
        let provider = Arc::new(ScriptedProvider::new("rust"));
        provider.push_prepare(PrepareScript::Roots(vec![symbol("zoo::Dog", "Dog")]));
        let counter = provider.disposal_counter();
        let model = prepared_model(&provider).await;
        model.dispose().expect("first dispose succeeds");
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
    }
}
