//! Document access seam.
//!
//! The core never touches an editor buffer directly. Embedders implement
//! [`DocumentResolver`] to hand out scoped read access; the returned
//! [`DocumentLease`] releases that access when dropped, which covers every
//! exit path of a facade operation, including early error returns.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lsp_types::Uri;
use thiserror::Error;

/// Read surface of one open source document.
pub trait Document: Send + Sync {
    /// Document identity.
    fn uri(&self) -> &Uri;

    /// Language identifier, e.g. `rust` or `typescript`.
    fn language_id(&self) -> &str;

    /// Full document text.
    fn text(&self) -> &str;
}

/// Failure to resolve a document reference.
#[derive(Debug, Error)]
#[error("cannot open document {uri}: {reason}")]
pub struct DocumentError {
    /// The reference that failed to resolve.
    pub uri: String,
    /// Resolver-specific description of the failure.
    pub reason: String,
}

impl DocumentError {
    /// Creates a resolution error for `uri`.
    #[must_use]
    pub fn new(uri: &Uri, reason: impl Into<String>) -> Self {
        Self {
            uri: uri.as_str().to_owned(),
            reason: reason.into(),
        }
    }
}

/// Resolves document references on behalf of the hierarchy service.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Opens a scoped read reference to the document at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when no document can be produced for the
    /// reference.
    async fn open(&self, uri: &Uri) -> Result<DocumentLease, DocumentError>;
}

/// Scoped read access to a document.
///
/// Dropping the lease runs the resolver's release hook exactly once.
pub struct DocumentLease {
    document: Arc<dyn Document>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DocumentLease {
    /// Leases `document` with no release action.
    #[must_use]
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            release: None,
        }
    }

    /// Leases `document`, running `release` when the lease drops.
    #[must_use]
    pub fn with_release(
        document: Arc<dyn Document>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            document,
            release: Some(Box::new(release)),
        }
    }

    /// The leased document.
    #[must_use]
    pub fn document(&self) -> &dyn Document {
        self.document.as_ref()
    }
}

impl Drop for DocumentLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for DocumentLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLease")
            .field("uri", &self.document.uri().as_str())
            .finish_non_exhaustive()
    }
}
