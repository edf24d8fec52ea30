//! `grow render`: render one request path to HTML.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::pod::Pod;

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Request path, e.g. `/blog/hello`
    path: String,

    /// Write the page to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderCommand {
    pub async fn execute(self, pod: &Pod) -> Result<()> {
        let page = pod.render(&self.path).await.with_context(|| format!("Failed to render {}", self.path))?;

        match &self.output {
            Some(output) => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                tokio::fs::write(output, page.html.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                eprintln!(
                    "{} {} -> {} ({})",
                    "Rendered".green().bold(),
                    page.request_path,
                    output.display(),
                    page.view.dimmed()
                );
            }
            None => {
                let mut stdout = io::stdout().lock();
                page.write_to(&mut stdout).context("Failed to write page to stdout")?;
            }
        }
        Ok(())
    }
}
