//! Error types for hierarchy session operations.
//!
//! The facade distinguishes three failure classes: malformed input
//! ([`ValidationError`], rejected before any session lookup), document
//! resolution failures, and provider failures during preparation. "Session
//! not found" is deliberately not an error anywhere in this crate; it
//! surfaces as an empty or absent result.

use thiserror::Error;

use crate::document::DocumentError;
use crate::provider::ProviderError;
use crate::types::SessionId;

/// Errors surfaced by facade operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Request input failed shape validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The document resolver could not produce a readable document.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A provider failed while preparing a session.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Rejection of untrusted request input.
///
/// Raised synchronously, before the session store or any provider is
/// touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The input JSON does not deserialize into the expected shape.
    #[error("malformed {context}: {reason}")]
    Malformed {
        /// Which request payload was being parsed.
        context: &'static str,
        /// Deserializer message describing the mismatch.
        reason: String,
    },

    /// A range ends before it starts.
    #[error("{field} is ill-formed: end position precedes start position")]
    IllFormedRange {
        /// Name of the offending range field.
        field: &'static str,
    },

    /// The name sub-range must sit inside the full declaration range.
    #[error("selectionRange is not contained in range")]
    SelectionOutsideRange,
}

/// Misuse of a hierarchy model that has already been disposed.
///
/// Disposal is one-shot: the second `dispose`, or any expansion or fork
/// after the first, reports this instead of silently over-releasing the
/// shared session.
#[derive(Debug, Error)]
#[error("hierarchy session {0} is already disposed")]
pub struct DisposedError(pub SessionId);
