//! Lattice - ephemeral, provider-backed type-hierarchy sessions.
//!
//! A client prepares a hierarchy at a document position; the first
//! registered provider that handles the document builds a session whose
//! root items come back stamped with a store-issued token. Expansion
//! requests carry an item back in, and its token routes them to the live
//! session. The store is bounded, evicting and disposing the oldest
//! session on overflow, so an abandoned client cannot pin provider state
//! forever.
//!
//! # Modules
//!
//! - [`types`] - session tokens, hierarchy symbols, range helpers
//! - [`wire`] - validation of raw request payloads
//! - [`document`] - document access seam used during preparation
//! - [`provider`] - the provider contract and registry
//! - [`model`] - one live session: expansion, forking, disposal
//! - [`store`] - bounded session registry and token issuance
//! - [`service`] - request-facing facade
//! - [`error`] - crate error taxonomy
//! - `testing` - deterministic fixtures, behind the `test-util` feature

#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;
pub mod types;
pub mod wire;

// Internal modules (not exposed as public API)
mod session;
mod token;

// Test fixtures, shared with downstream crates via the feature
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use document::{Document, DocumentError, DocumentLease, DocumentResolver};
pub use error::{DisposedError, Error, Result, ValidationError};
pub use model::HierarchyModel;
pub use provider::{HierarchyProvider, ProviderError, ProviderRegistry, ProviderSession};
pub use service::HierarchyService;
pub use store::{SessionStore, StoreConfig, DEFAULT_CAPACITY};
pub use types::{HierarchyItem, SessionId, TypeSymbol};
