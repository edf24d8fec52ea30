//! Grow CLI entry point
//!
//! Parses arguments, runs the selected command and turns failures into
//! colored diagnostics with suggestions:
//! - `render` - Render the page for a request path
//! - `check` - Resolve a request path and report reachable documents
//! - `routes` - List the routes registered by the manifest

use anyhow::Result;
use clap::Parser;
use grow_cli::cli;
use grow_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
