//! Deep resolution of documents.
//!
//! Resolving a document fetches and parses its source, then walks its field
//! tree depth-first and resolves every nested document reference, awaiting
//! each one before starting the next (traversal order). Static references
//! need no resolution.
//!
//! # State machine
//!
//! ```text
//! Unresolved ──► Loading ──► Walking ──► Resolved
//!      ▲            │           │
//!      └── Failed ◄─┴───────────┘
//! ```
//!
//! - `Loading` is single-flight. A second resolve of the same document while
//!   its content is being fetched and parsed waits for that load instead of
//!   starting another one.
//! - A document reached again while it is `Walking` in the *same* chain is a
//!   reference cycle, handled according to [`CyclePolicy`]. When a cycle is
//!   broken, every document on the loop below the revisited ancestor stays
//!   `Walking` as a dependent of that ancestor and settles with it: resolved
//!   when the ancestor resolves, failed when it fails.
//! - A document `Walking` under another chain already has its fields; the
//!   caller walks those fields itself, so no fetch or parse is repeated and
//!   no chain ever waits on another chain's walk.
//! - `Failed` holds no fields. The next resolve starts over.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Notify;

use super::context::{CyclePolicy, ResolutionContext};
use super::fields::Fields;
use super::value::Value;
use super::{DocState, Document};
use crate::core::GrowError;

/// Depth-first traversal of a value tree.
///
/// `visit` is called for every node, containers before their children.
/// Referenced documents are leaves: their fields belong to their own walk.
pub fn walk<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&'a Value),
{
    visit(value);
    match value {
        Value::Sequence(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        Value::Mapping(mapping) => {
            for (_, child) in mapping.iter() {
                walk(child, visit);
            }
        }
        _ => {}
    }
}

/// Documents referenced anywhere in `fields`, in traversal order, without duplicates.
pub fn nested_documents(fields: &Fields) -> Vec<Arc<Document>> {
    let mut found: Vec<Arc<Document>> = Vec::new();
    for (_, value) in fields.iter() {
        walk(value, &mut |node| {
            if let Value::Doc(doc) = node {
                if !found.iter().any(|seen| seen.path() == doc.path()) {
                    found.push(Arc::clone(doc));
                }
            }
        });
    }
    found
}

enum Snapshot {
    Idle,
    Loading(Arc<Notify>),
    Walking(Arc<Fields>),
}

enum Step<'n> {
    Load(Arc<Notify>),
    Wait(tokio::sync::futures::Notified<'n>),
    Rewalk(Arc<Fields>),
}

/// Index into the resolution chain of the outermost ancestor a walk broke a
/// reference cycle against. `None` when the walk closed every cycle it met.
pub(crate) type CycleRoot = Option<usize>;

/// Resolve `doc` as part of `chain` (the documents currently walking above it).
pub(crate) fn resolve_in_chain<'a>(
    doc: &'a Arc<Document>,
    ctx: &'a ResolutionContext,
    chain: &'a mut Vec<Arc<Document>>,
) -> BoxFuture<'a, Result<CycleRoot, GrowError>> {
    Box::pin(async move {
        loop {
            let pending: Arc<Notify>;
            let step = {
                let mut state = doc.write_state();
                let snapshot = match &*state {
                    DocState::Resolved(_) => return Ok(None),
                    DocState::Walking { fields, .. } => Snapshot::Walking(Arc::clone(fields)),
                    DocState::Loading(notify) => Snapshot::Loading(Arc::clone(notify)),
                    DocState::Unresolved | DocState::Failed(_) => Snapshot::Idle,
                };
                match snapshot {
                    Snapshot::Walking(fields) => {
                        if let Some(index) = chain.iter().position(|walking| walking.path() == doc.path()) {
                            return break_cycle(index, ctx, chain);
                        }
                        Step::Rewalk(fields)
                    }
                    Snapshot::Loading(notify) => {
                        // Register as a waiter before releasing the lock so the
                        // loader's notification cannot be missed
                        pending = notify;
                        Step::Wait(pending.notified())
                    }
                    Snapshot::Idle => {
                        let notify = Arc::new(Notify::new());
                        *state = DocState::Loading(Arc::clone(&notify));
                        Step::Load(notify)
                    }
                }
            };

            match step {
                Step::Wait(notified) => {
                    tracing::trace!("Waiting for in-flight load of {}", doc.path());
                    notified.await;
                }
                Step::Rewalk(fields) => return walk_fields(doc, &fields, ctx, chain).await,
                Step::Load(notify) => return load_and_walk(doc, notify, ctx, chain).await,
            }
        }
    })
}

fn break_cycle(index: usize, ctx: &ResolutionContext, chain: &[Arc<Document>]) -> Result<CycleRoot, GrowError> {
    match ctx.cycle_policy() {
        CyclePolicy::Break => {
            tracing::debug!("Reference cycle back to {}, not following", chain[index].path());
            Ok(Some(index))
        }
        CyclePolicy::Error => {
            let mut cycle: Vec<String> = chain.iter().map(|walking| walking.path().to_string()).collect();
            cycle.push(chain[index].path().to_string());
            Err(GrowError::CyclicReference {
                chain: cycle,
            })
        }
    }
}

async fn load_and_walk(
    doc: &Arc<Document>,
    notify: Arc<Notify>,
    ctx: &ResolutionContext,
    chain: &mut Vec<Arc<Document>>,
) -> Result<CycleRoot, GrowError> {
    let mut guard = LoadGuard {
        doc,
        notify,
        finished: false,
    };

    tracing::debug!("Resolving {}", doc.path());
    let fields = match load_fields(doc, ctx).await {
        Ok(fields) => Arc::new(fields),
        Err(e) => {
            guard.finish(&Outcome::Failed(e.to_string()));
            return Err(e);
        }
    };

    guard.start_walking(Arc::clone(&fields));

    match walk_fields(doc, &fields, ctx, chain).await {
        Ok(None) => {
            guard.finish(&Outcome::Resolved);
            Ok(None)
        }
        Ok(Some(index)) => {
            // Part of a cycle through an ancestor that is still walking: this
            // document is only complete once that ancestor is
            guard.detach();
            if let Some(outcome) = defer_to(doc, &chain[index]) {
                settle(doc, &outcome);
            }
            Ok(Some(index))
        }
        Err(e) => {
            guard.finish(&Outcome::Failed(e.to_string()));
            Err(e)
        }
    }
}

async fn load_fields(doc: &Document, ctx: &ResolutionContext) -> Result<Fields, GrowError> {
    let raw = ctx.fetch(doc.path()).await?;
    let mapping = ctx.schema().parse_document(doc.path(), &raw, ctx)?;
    Fields::from_mapping(doc.path(), mapping)
}

async fn walk_fields(
    doc: &Arc<Document>,
    fields: &Fields,
    ctx: &ResolutionContext,
    chain: &mut Vec<Arc<Document>>,
) -> Result<CycleRoot, GrowError> {
    let depth = chain.len();
    chain.push(Arc::clone(doc));

    let mut cycle_root: CycleRoot = None;
    let mut result = Ok(());
    for nested in nested_documents(fields) {
        match resolve_in_chain(&nested, ctx, chain).await {
            Ok(root) => {
                cycle_root = match (cycle_root, root) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    chain.pop();

    // A cycle back to `doc` itself is closed by this walk
    result.map(|()| cycle_root.filter(|&index| index < depth))
}

/// Final state applied to a document and, transitively, its dependents.
enum Outcome {
    Resolved,
    Failed(String),
    Reset,
}

/// Move `doc` out of `Walking` according to `outcome` and settle every
/// document that was waiting on its walk the same way.
fn settle(doc: &Document, outcome: &Outcome) {
    let dependents = {
        let mut state = doc.write_state();
        let (fields, dependents) = match std::mem::replace(&mut *state, DocState::Unresolved) {
            DocState::Walking {
                fields,
                dependents,
            } => (Some(fields), dependents),
            _ => (None, Vec::new()),
        };
        *state = match (outcome, fields) {
            (Outcome::Resolved, Some(fields)) => DocState::Resolved(fields),
            (Outcome::Failed(reason), _) => DocState::Failed(reason.clone()),
            _ => DocState::Unresolved,
        };
        dependents
    };

    for dependent in dependents {
        tracing::trace!("Settling {} with {}", dependent.path(), doc.path());
        settle(&dependent, outcome);
    }
}

/// Attach `doc` to the walk of `root`.
///
/// Returns the outcome to apply immediately when `root` already finished
/// walking (possible when `root` belongs to another task's chain).
fn defer_to(doc: &Arc<Document>, root: &Document) -> Option<Outcome> {
    let mut state = root.write_state();
    match &mut *state {
        DocState::Walking {
            dependents,
            ..
        } => {
            dependents.push(Arc::clone(doc));
            None
        }
        DocState::Resolved(_) => Some(Outcome::Resolved),
        _ => Some(Outcome::Reset),
    }
}

/// Owns a document's state while this task loads and walks it.
///
/// If the future is dropped before finishing, the document and its
/// dependents go back to `Unresolved` and waiters are woken so one of them
/// can take over.
struct LoadGuard<'a> {
    doc: &'a Document,
    notify: Arc<Notify>,
    finished: bool,
}

impl LoadGuard<'_> {
    fn start_walking(&mut self, fields: Arc<Fields>) {
        *self.doc.write_state() = DocState::Walking {
            fields,
            dependents: Vec::new(),
        };
        self.notify.notify_waiters();
    }

    fn finish(&mut self, outcome: &Outcome) {
        settle(self.doc, outcome);
        self.finished = true;
        self.notify.notify_waiters();
    }

    /// Hand the document over to an ancestor's walk.
    fn detach(&mut self) {
        self.finished = true;
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            settle(self.doc, &Outcome::Reset);
            self.notify.notify_waiters();
        }
    }
}
