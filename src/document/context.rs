//! Resolution context: the explicitly passed owner of all resolution state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::reference::ReferenceSchema;
use super::{Document, StaticAsset};
use crate::cache::KeyedCache;
use crate::core::GrowError;
use crate::source::ContentSource;

/// What to do when a document is reached again through its own resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Stop following the cycle: the revisited document's fields are already
    /// loaded and its own walk completes the closure.
    #[default]
    Break,
    /// Fail with [`GrowError::CyclicReference`].
    Error,
}

/// Owns the document registry, the raw content cache and the content source.
///
/// Cloning is cheap and every clone shares the same caches. Each context is an
/// isolated world: documents looked up through one context are never visible
/// through another.
#[derive(Clone)]
pub struct ResolutionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    documents: KeyedCache<Arc<Document>>,
    contents: KeyedCache<Arc<str>>,
    source: Arc<dyn ContentSource>,
    schema: ReferenceSchema,
    cycle_policy: CyclePolicy,
}

impl ResolutionContext {
    /// Context with the built-in reference types and the default cycle policy.
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self::builder(source).build()
    }

    pub fn builder(source: Arc<dyn ContentSource>) -> ResolutionContextBuilder {
        ResolutionContextBuilder::new(source)
    }

    /// Canonical document for `path`, created and registered on first lookup.
    ///
    /// Never resolves the document.
    pub fn document(&self, path: &str) -> Arc<Document> {
        self.inner.documents.get_or_insert_with(path, || Arc::new(Document::new(path)))
    }

    /// Fresh static asset for `path`. Assets are not registered.
    pub fn static_asset(&self, path: &str) -> StaticAsset {
        StaticAsset::new(path)
    }

    /// Look up and fully resolve the document at `path`.
    pub async fn resolve(&self, path: &str) -> Result<Arc<Document>, GrowError> {
        let doc = self.document(path);
        doc.resolve(self).await?;
        Ok(doc)
    }

    /// Raw content for `path`, fetched through the source at most once.
    ///
    /// Only successful fetches are cached.
    pub async fn fetch(&self, path: &str) -> Result<Arc<str>, GrowError> {
        if let Some(content) = self.inner.contents.get(path) {
            return Ok(content);
        }
        let content: Arc<str> = self.inner.source.fetch(path).await?.into();
        self.inner.contents.set(path, Arc::clone(&content));
        Ok(content)
    }

    pub fn schema(&self) -> &ReferenceSchema {
        &self.inner.schema
    }

    pub fn cycle_policy(&self) -> CyclePolicy {
        self.inner.cycle_policy
    }

    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.inner.source
    }

    /// The document registry.
    pub fn documents(&self) -> &KeyedCache<Arc<Document>> {
        &self.inner.documents
    }

    /// The raw content cache.
    pub fn contents(&self) -> &KeyedCache<Arc<str>> {
        &self.inner.contents
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("source", &self.inner.source.name())
            .field("documents", &self.inner.documents)
            .field("contents", &self.inner.contents)
            .field("schema", &self.inner.schema)
            .field("cycle_policy", &self.inner.cycle_policy)
            .finish()
    }
}

/// Builder for [`ResolutionContext`].
pub struct ResolutionContextBuilder {
    source: Arc<dyn ContentSource>,
    schema: ReferenceSchema,
    cycle_policy: CyclePolicy,
}

impl ResolutionContextBuilder {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            schema: ReferenceSchema::default(),
            cycle_policy: CyclePolicy::default(),
        }
    }

    pub fn schema(mut self, schema: ReferenceSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.cycle_policy = cycle_policy;
        self
    }

    pub fn build(self) -> ResolutionContext {
        ResolutionContext {
            inner: Arc::new(ContextInner {
                documents: KeyedCache::new("documents"),
                contents: KeyedCache::new("content"),
                source: self.source,
                schema: self.schema,
                cycle_policy: self.cycle_policy,
            }),
        }
    }
}
