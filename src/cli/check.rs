//! `grow check`: resolve a request path without rendering it.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::document::resolver::nested_documents;
use crate::document::{Document, ResolutionState};
use crate::pod::Pod;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Request path, e.g. `/blog/hello`
    path: String,
}

impl CheckCommand {
    pub async fn execute(self, pod: &Pod) -> Result<()> {
        let routes = pod.routes().await.context("Failed to resolve the routes manifest")?;
        let doc = routes.match_path(&self.path)?;
        let result = doc.resolve(pod.context()).await;

        println!("{} {}", self.path.bold(), "->".dimmed());
        for (depth, doc) in reachable_documents(&doc) {
            println!("{}{} {}", "  ".repeat(depth + 1), doc, state_label(&doc));
        }

        result.with_context(|| format!("Failed to resolve {}", self.path))?;
        Ok(())
    }
}

fn state_label(doc: &Document) -> String {
    match doc.state() {
        ResolutionState::Resolved => "resolved".green().to_string(),
        ResolutionState::Failed => {
            let reason = doc.failure().unwrap_or_default();
            format!("{} {}", "failed".red(), reason.dimmed())
        }
        other => other.to_string().yellow().to_string(),
    }
}

/// Breadth-first listing of `root` and every document reachable from it,
/// each with its distance from `root`.
pub(crate) fn reachable_documents(root: &Arc<Document>) -> Vec<(usize, Arc<Document>)> {
    let mut seen = HashSet::from([root.path().to_string()]);
    let mut queue = VecDeque::from([(0, Arc::clone(root))]);
    let mut found = Vec::new();

    while let Some((depth, doc)) = queue.pop_front() {
        if let Some(fields) = doc.fields() {
            for nested in nested_documents(&fields) {
                if seen.insert(nested.path().to_string()) {
                    queue.push_back((depth + 1, nested));
                }
            }
        }
        found.push((depth, doc));
    }
    found
}
