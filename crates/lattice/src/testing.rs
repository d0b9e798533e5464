//! Test fixtures for exercising the hierarchy machinery.
//!
//! Everything here is deterministic: documents are fixed strings,
//! providers replay scripted outcomes, and sessions count their
//! disposals so tests can assert that teardown ran exactly once.
//!
//! # Availability
//!
//! This module is available when:
//! - Running this crate's own tests (`#[cfg(test)]`)
//! - The `test-util` feature is enabled
//!
//! Downstream crates enable it with:
//!
//! ```toml
//! [dev-dependencies]
//! lattice = { version = "...", features = ["test-util"] }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lsp_types::{Position, Range, SymbolKind, Uri};
use tokio_util::sync::CancellationToken;

use crate::document::{Document, DocumentError, DocumentLease, DocumentResolver};
use crate::provider::{HierarchyProvider, ProviderError, ProviderSession};
use crate::types::{HierarchyItem, SessionId, TypeSymbol};

/// Range from `(start_line, start_character)` to `(end_line, end_character)`.
#[must_use]
pub fn span(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Range {
    Range {
        start: Position {
            line: start_line,
            character: start_character,
        },
        end: Position {
            line: end_line,
            character: end_character,
        },
    }
}

/// `file:///fixtures/{file}` as a parsed URI.
#[must_use]
pub fn fixture_uri(file: &str) -> Uri {
    format!("file:///fixtures/{file}")
        .parse()
        .expect("fixture URI is valid")
}

/// Class symbol with valid fixture geometry.
#[must_use]
pub fn symbol(item_id: &str, name: &str) -> TypeSymbol {
    TypeSymbol {
        item_id: item_id.to_owned(),
        name: name.to_owned(),
        kind: SymbolKind::CLASS,
        detail: None,
        tags: None,
        uri: fixture_uri("lib.rs"),
        range: span(4, 0, 9, 1),
        selection_range: span(4, 7, 4, 20),
    }
}

/// [`symbol`] already bound to `session_id`.
#[must_use]
pub fn item(session_id: &str, item_id: &str, name: &str) -> HierarchyItem {
    symbol(item_id, name).bind(SessionId::from(session_id))
}

/// In-memory document with a fixed language and text.
pub struct StaticDocument {
    uri: Uri,
    language_id: String,
    text: String,
}

impl StaticDocument {
    /// Document at `uri` with the given language id and content.
    #[must_use]
    pub fn new(uri: Uri, language_id: &str, text: &str) -> Self {
        Self {
            uri,
            language_id: language_id.to_owned(),
            text: text.to_owned(),
        }
    }
}

impl Document for StaticDocument {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Resolver over a fixed set of documents, with an open-lease gauge.
///
/// Every lease handed out decrements the gauge when dropped, so a test
/// asserting [`open_leases`](FixedDocuments::open_leases) is zero proves
/// the code under test did not hold a document past its request.
#[derive(Default)]
pub struct FixedDocuments {
    documents: HashMap<String, Arc<StaticDocument>>,
    open: Arc<AtomicUsize>,
}

impl FixedDocuments {
    /// Empty resolver; add documents before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `document` under its own URI.
    pub fn add(&mut self, document: StaticDocument) {
        self.documents
            .insert(document.uri.as_str().to_owned(), Arc::new(document));
    }

    /// Number of leases currently outstanding.
    #[must_use]
    pub fn open_leases(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentResolver for FixedDocuments {
    async fn open(&self, uri: &Uri) -> Result<DocumentLease, DocumentError> {
        let Some(document) = self.documents.get(uri.as_str()) else {
            return Err(DocumentError::new(uri, "not in the fixture set"));
        };
        self.open.fetch_add(1, Ordering::SeqCst);
        let gauge = Arc::clone(&self.open);
        Ok(DocumentLease::with_release(
            Arc::clone(document) as Arc<dyn Document>,
            move || {
                gauge.fetch_sub(1, Ordering::SeqCst);
            },
        ))
    }
}

/// Provider session that counts its disposals on a shared counter.
pub struct CountingSession {
    roots: Vec<TypeSymbol>,
    disposals: Arc<AtomicUsize>,
}

impl CountingSession {
    /// Session over `roots` that bumps `disposals` when disposed.
    #[must_use]
    pub fn new(roots: Vec<TypeSymbol>, disposals: Arc<AtomicUsize>) -> Self {
        Self { roots, disposals }
    }
}

impl ProviderSession for CountingSession {
    fn roots(&self) -> &[TypeSymbol] {
        &self.roots
    }

    fn dispose(&mut self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// One scripted outcome for a prepare call.
#[derive(Debug, Clone)]
pub enum PrepareScript {
    /// Session whose roots are the given symbols.
    Roots(Vec<TypeSymbol>),
    /// No hierarchy at the position.
    Absent,
    /// Preparation fails with this message.
    Fail(String),
    /// Session that breaks the non-empty-roots contract.
    EmptyRoots,
    /// Suspends until the request token is cancelled, then reports no
    /// hierarchy.
    AwaitCancel,
    /// Cancels the request token itself, then hands back a session, to
    /// model a provider racing cancellation.
    CancelThenRoots(Vec<TypeSymbol>),
}

/// One scripted outcome for a supertypes or subtypes call.
#[derive(Debug, Clone)]
pub enum ExpandScript {
    /// Expansion yields these symbols.
    Symbols(Vec<TypeSymbol>),
    /// The provider has no answer for the node.
    Absent,
    /// Expansion fails with this message.
    Fail(String),
}

/// Provider that replays scripted outcomes in push order.
///
/// Each prepare pops one [`PrepareScript`]; each supertypes or subtypes
/// call pops one [`ExpandScript`] from its own queue. An exhausted queue
/// behaves as `Absent`. Sessions produced here are [`CountingSession`]s
/// sharing one disposal counter, so a test can assert the session was
/// freed exactly once no matter how many forks touched it. Call counters
/// distinguish "the provider answered absent" from "the provider was
/// never consulted".
pub struct ScriptedProvider {
    language_id: String,
    prepare_scripts: Mutex<VecDeque<PrepareScript>>,
    up_scripts: Mutex<VecDeque<ExpandScript>>,
    down_scripts: Mutex<VecDeque<ExpandScript>>,
    disposals: Arc<AtomicUsize>,
    prepare_calls: AtomicUsize,
    expand_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider that handles documents with the given language id.
    #[must_use]
    pub fn new(language_id: &str) -> Self {
        Self {
            language_id: language_id.to_owned(),
            prepare_scripts: Mutex::new(VecDeque::new()),
            up_scripts: Mutex::new(VecDeque::new()),
            down_scripts: Mutex::new(VecDeque::new()),
            disposals: Arc::new(AtomicUsize::new(0)),
            prepare_calls: AtomicUsize::new(0),
            expand_calls: AtomicUsize::new(0),
        }
    }

    /// Queues the outcome of the next prepare call.
    pub fn push_prepare(&self, script: PrepareScript) {
        lock(&self.prepare_scripts).push_back(script);
    }

    /// Queues the outcome of the next supertypes call.
    pub fn push_supertypes(&self, script: ExpandScript) {
        lock(&self.up_scripts).push_back(script);
    }

    /// Queues the outcome of the next subtypes call.
    pub fn push_subtypes(&self, script: ExpandScript) {
        lock(&self.down_scripts).push_back(script);
    }

    /// Sessions disposed so far, across every session this provider made.
    #[must_use]
    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    /// The shared disposal counter itself.
    #[must_use]
    pub fn disposal_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.disposals)
    }

    /// Number of prepare calls that reached this provider.
    #[must_use]
    pub fn prepare_calls(&self) -> usize {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    /// Number of supertypes and subtypes calls that reached this provider.
    #[must_use]
    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    fn session(&self, roots: Vec<TypeSymbol>) -> Box<dyn ProviderSession> {
        Box::new(CountingSession::new(roots, Arc::clone(&self.disposals)))
    }

    fn resolve(script: Option<ExpandScript>) -> Result<Option<Vec<TypeSymbol>>, ProviderError> {
        match script.unwrap_or(ExpandScript::Absent) {
            ExpandScript::Symbols(symbols) => Ok(Some(symbols)),
            ExpandScript::Absent => Ok(None),
            ExpandScript::Fail(message) => Err(ProviderError::new(message)),
        }
    }
}

#[async_trait]
impl HierarchyProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn handles(&self, document: &dyn Document) -> bool {
        document.language_id() == self.language_id
    }

    async fn prepare(
        &self,
        _document: &dyn Document,
        _position: Position,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn ProviderSession>>, ProviderError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        // The guard must not live across the await below.
        let script = lock(&self.prepare_scripts)
            .pop_front()
            .unwrap_or(PrepareScript::Absent);
        match script {
            PrepareScript::Roots(roots) => Ok(Some(self.session(roots))),
            PrepareScript::Absent => Ok(None),
            PrepareScript::Fail(message) => Err(ProviderError::new(message)),
            PrepareScript::EmptyRoots => Ok(Some(self.session(Vec::new()))),
            PrepareScript::AwaitCancel => {
                cancel.cancelled().await;
                Ok(None)
            }
            PrepareScript::CancelThenRoots(roots) => {
                cancel.cancel();
                Ok(Some(self.session(roots)))
            }
        }
    }

    async fn supertypes(
        &self,
        _item: &HierarchyItem,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        Self::resolve(lock(&self.up_scripts).pop_front())
    }

    async fn subtypes(
        &self,
        _item: &HierarchyItem,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vec<TypeSymbol>>, ProviderError> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        Self::resolve(lock(&self.down_scripts).pop_front())
    }
}

fn lock<T>(queue: &Mutex<VecDeque<T>>) -> std::sync::MutexGuard<'_, VecDeque<T>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}
