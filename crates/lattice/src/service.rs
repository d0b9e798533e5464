//! Request-facing facade.
//!
//! [`HierarchyService`] is the seam a request handler talks to: it takes
//! raw JSON payloads, validates them before touching any session state,
//! resolves documents for preparation, and keeps the session store
//! current. Wire-shaped errors come back as [`Error`](crate::Error); a
//! vanished or disposed session is reported as an absent result instead.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::document::DocumentResolver;
use crate::error::Result;
use crate::model::HierarchyModel;
use crate::provider::ProviderRegistry;
use crate::store::SessionStore;
use crate::types::HierarchyItem;
use crate::wire::{parse_item, parse_location};

/// Entry point tying providers, documents, and the session store together.
pub struct HierarchyService {
    providers: ProviderRegistry,
    documents: Arc<dyn DocumentResolver>,
    store: Arc<SessionStore>,
}

impl HierarchyService {
    /// Builds a service over the given providers and document source.
    #[must_use]
    pub fn new(
        providers: ProviderRegistry,
        documents: Arc<dyn DocumentResolver>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            providers,
            documents,
            store,
        }
    }

    /// The store this service registers sessions in.
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Opens a type-hierarchy session at the requested position.
    ///
    /// Returns the session's root items, each stamped with the newly
    /// issued session token, or an empty list when no provider produces a
    /// session there or `cancel` fires first. The document is held open
    /// only for the duration of the call.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`](crate::Error::Validation) when `request` is
    /// not a well-formed location,
    /// [`Error::Document`](crate::Error::Document) when the document
    /// cannot be resolved, and
    /// [`Error::Provider`](crate::Error::Provider) when preparation
    /// itself fails.
    pub async fn prepare(
        &self,
        request: Value,
        cancel: &CancellationToken,
    ) -> Result<Vec<HierarchyItem>> {
        let location = parse_location(request)?;
        let lease = self.documents.open(&location.uri).await?;
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        let token = self.store.issue_token();
        let Some(model) = HierarchyModel::create(
            &self.providers,
            lease.document(),
            location.position,
            token,
            cancel,
        )
        .await?
        else {
            return Ok(Vec::new());
        };
        let model = self.store.insert(model);
        debug!(
            session = %model.id(),
            roots = model.focused().len(),
            "prepared hierarchy session"
        );
        Ok(model.focused().to_vec())
    }

    /// Direct supertypes of the item in `request`.
    ///
    /// `Ok(None)` when the item's session is no longer registered or was
    /// disposed while the request was in flight.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`](crate::Error::Validation) when `request` is
    /// not a well-formed hierarchy item. Malformed payloads are rejected
    /// before the session lookup, so they never read session state.
    pub async fn supertypes(
        &self,
        request: Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<HierarchyItem>>> {
        let item = parse_item(request)?;
        let Some(model) = self.store.get(&item.session_id) else {
            return Ok(None);
        };
        match model.supertypes(&item, cancel).await {
            Ok(items) => Ok(Some(items)),
            Err(disposed) => {
                debug!(session = %disposed.0, "session disposed mid-request");
                Ok(None)
            }
        }
    }

    /// Direct subtypes of the item in `request`. Same contract as
    /// [`supertypes`](HierarchyService::supertypes).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`](crate::Error::Validation) when `request` is
    /// not a well-formed hierarchy item.
    pub async fn subtypes(
        &self,
        request: Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<HierarchyItem>>> {
        let item = parse_item(request)?;
        let Some(model) = self.store.get(&item.session_id) else {
            return Ok(None);
        };
        match model.subtypes(&item, cancel).await {
            Ok(items) => Ok(Some(items)),
            Err(disposed) => {
                debug!(session = %disposed.0, "session disposed mid-request");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for HierarchyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyService")
            .field("providers", &self.providers.len())
            .field("sessions", &self.store.len())
            .finish_non_exhaustive()
    }
}
