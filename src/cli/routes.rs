//! `grow routes`: list the registered routes.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::constants::BASE_PARAM;
use crate::pod::Pod;
use crate::routes::{RouteEntry, RouteTarget};

#[derive(Args, Debug)]
pub struct RoutesCommand {}

impl RoutesCommand {
    pub async fn execute(self, pod: &Pod) -> Result<()> {
        let routes = pod.routes().await.context("Failed to resolve the routes manifest")?;
        let entries = routes.entries();
        if entries.is_empty() {
            println!("{}", format!("No routes in {}", routes.manifest().path()).yellow());
            return Ok(());
        }

        let width = entries.iter().map(|entry| entry.pattern.len()).max().unwrap_or(0);
        for entry in entries {
            let pattern = format!("{:width$}", entry.pattern);
            println!("{}  {}", pattern.bold(), describe_target(entry, routes.document_suffix()));
        }
        Ok(())
    }
}

/// Where a route's documents come from, e.g. `/content/blog/:base.yaml`.
pub(crate) fn describe_target(entry: &RouteEntry, document_suffix: &str) -> String {
    match &entry.target {
        RouteTarget::Doc(doc) => doc.path().to_string(),
        RouteTarget::Collection(collection) => format!("{collection}:{BASE_PARAM}{document_suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::ResolutionContext;
    use crate::routes::RouteTable;
    use crate::test_utils::MemorySource;
    use crate::test_utils::fixtures::BLOG_ROUTES;

    #[tokio::test]
    async fn test_describe_targets() {
        let source = Arc::new(MemorySource::new().with_file("/routes.yaml", BLOG_ROUTES));
        let table = RouteTable::new(ResolutionContext::new(source), "/routes.yaml");
        table.resolve().await.unwrap();

        let described: Vec<String> = table.entries().iter().map(|entry| describe_target(entry, ".yaml")).collect();
        assert!(described.contains(&"/content/pages/home.yaml".to_string()));
        assert!(described.contains(&"/content/blog/:base.yaml".to_string()));
    }
}
