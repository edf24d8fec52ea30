//! Documents, references and their resolution.
//!
//! A [`Document`] is one unit of page content backed by a YAML source file.
//! Every document is identified by its path, and a [`ResolutionContext`]
//! holds exactly one canonical instance per path: looking a path up twice
//! returns the same `Arc<Document>`.
//!
//! Looking a document up never loads it. [`Document::resolve`] fetches the
//! raw content (at most once per path, through the context's content cache),
//! parses it with the context's [`ReferenceSchema`] and then resolves every
//! document reachable from its fields. Once `resolve` returns `Ok`, the whole
//! reachable graph is materialized.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use grow_cli::document::ResolutionContext;
//! use grow_cli::source::FsSource;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ctx = ResolutionContext::new(Arc::new(FsSource::new("./pod")));
//! let doc = ctx.resolve("/content/pages/home.yaml").await?;
//! println!("{doc} uses view {}", doc.view("/views/base.html"));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod fields;
pub mod reference;
pub mod resolver;
pub mod value;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Notify;

pub use context::{CyclePolicy, ResolutionContext, ResolutionContextBuilder};
pub use fields::{Fields, SIGIL, VIEW_FIELD, strip_sigil};
pub use reference::{DocReference, ReferenceSchema, ReferenceType, StaticReference};
pub use value::{Mapping, Value};

use crate::core::GrowError;

/// A path that stringifies to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlHandle {
    path: String,
}

impl UrlHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for UrlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A static file referenced by path. Needs no resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    path: String,
    url: UrlHandle,
}

impl StaticAsset {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            url: UrlHandle::new(path.clone()),
            path,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &UrlHandle {
        &self.url
    }
}

/// Public view of a document's resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    /// Content is being fetched and parsed
    Loading,
    /// Fields are loaded, nested references are being resolved
    Walking,
    Resolved,
    Failed,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Unresolved => "unresolved",
            ResolutionState::Loading => "loading",
            ResolutionState::Walking => "walking",
            ResolutionState::Resolved => "resolved",
            ResolutionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub(crate) enum DocState {
    Unresolved,
    Loading(Arc<Notify>),
    /// Fields are loaded. `dependents` closed a reference cycle back to this
    /// document and settle together with its walk.
    Walking {
        fields: Arc<Fields>,
        dependents: Vec<Arc<Document>>,
    },
    Resolved(Arc<Fields>),
    Failed(String),
}

/// One resolvable unit of content, canonical per path within a context.
pub struct Document {
    path: String,
    url: UrlHandle,
    state: RwLock<DocState>,
}

impl Document {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            url: UrlHandle::new(path),
            state: RwLock::new(DocState::Unresolved),
        }
    }

    /// Canonical document for `path` in `ctx`. Never resolves.
    pub fn get(ctx: &ResolutionContext, path: &str) -> Arc<Document> {
        ctx.document(path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &UrlHandle {
        &self.url
    }

    pub fn state(&self) -> ResolutionState {
        match &*self.read_state() {
            DocState::Unresolved => ResolutionState::Unresolved,
            DocState::Loading(_) => ResolutionState::Loading,
            DocState::Walking { .. } => ResolutionState::Walking,
            DocState::Resolved(_) => ResolutionState::Resolved,
            DocState::Failed(_) => ResolutionState::Failed,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.read_state(), DocState::Resolved(_))
    }

    /// Parsed fields, available once loading has finished.
    ///
    /// A document that is still walking its nested references already has
    /// fields; a failed document has none.
    pub fn fields(&self) -> Option<Arc<Fields>> {
        match &*self.read_state() {
            DocState::Walking { fields, .. } | DocState::Resolved(fields) => Some(Arc::clone(fields)),
            _ => None,
        }
    }

    /// Message of the last failed resolution, if the document is failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.read_state() {
            DocState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Resolve this document and everything reachable from it.
    ///
    /// Returns immediately when already resolved. On failure the document is
    /// left without fields and a later call starts over.
    ///
    /// When another task is walking this document at the same time, the
    /// call walks the already loaded fields itself and returns `Ok` once
    /// everything reachable from them is resolved. The document only turns
    /// [`ResolutionState::Resolved`] when the other task's walk finishes, so
    /// [`is_resolved`](Self::is_resolved) may briefly report `false` after
    /// such a call succeeds.
    pub async fn resolve(self: &Arc<Self>, ctx: &ResolutionContext) -> Result<(), GrowError> {
        let mut chain = Vec::new();
        resolver::resolve_in_chain(self, ctx, &mut chain).await.map(|_| ())
    }

    /// View template for this document.
    ///
    /// Uses the `$view` field or `default`, with the first `/views` turned
    /// into the template namespace `views`.
    pub fn view(&self, default: &str) -> String {
        let view = self.fields().and_then(|f| f.view().map(str::to_string));
        view.as_deref().unwrap_or(default).replacen("/views", "views", 1)
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, DocState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, DocState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "<Doc [path={}]>", self.path)
        } else {
            write!(f, "<Doc* [path={}]>", self.path)
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("path", &self.path).field("state", &self.state()).finish()
    }
}
