//! Page rendering pipeline.
//!
//! [`Pod::render`] turns a request path into HTML:
//!
//! 1. resolve the routes manifest (once per pod)
//! 2. match the request path to a document
//! 3. resolve that document and everything it references
//! 4. render it through its view
//!
//! Any failure aborts the render; there is no partial page.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PodConfig;
use crate::core::GrowError;
use crate::document::{Document, ResolutionContext};
use crate::routes::RouteTable;
use crate::source::ContentSource;
use crate::templating::TemplateRenderer;

/// A pod: configuration, resolution context, routes and renderer.
pub struct Pod {
    config: PodConfig,
    ctx: ResolutionContext,
    routes: RouteTable,
    renderer: TemplateRenderer,
}

/// Output of one render.
#[derive(Debug)]
pub struct RenderedPage {
    pub request_path: String,
    pub document: Arc<Document>,
    pub view: String,
    pub html: String,
}

impl RenderedPage {
    /// Write the rendered HTML to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.html.as_bytes())?;
        writer.flush()
    }
}

impl Pod {
    /// Pod reading content from the source `config` selects.
    pub fn new(config: PodConfig) -> Self {
        let source = config.build_source();
        Self::with_source(config, source)
    }

    /// Pod reading content from `source`.
    pub fn with_source(config: PodConfig, source: Arc<dyn ContentSource>) -> Self {
        let ctx = ResolutionContext::builder(source).cycle_policy(config.render.cycle_policy).build();
        let routes =
            RouteTable::new(ctx.clone(), &config.pod.routes).with_document_suffix(config.pod.document_suffix.clone());
        let renderer = TemplateRenderer::new(ctx.clone()).with_autoescape(config.render.autoescape);
        Self {
            config,
            ctx,
            routes,
            renderer,
        }
    }

    pub fn config(&self) -> &PodConfig {
        &self.config
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.ctx
    }

    /// Route table, resolved on first use.
    pub async fn routes(&self) -> Result<&RouteTable, GrowError> {
        self.routes.resolve().await?;
        Ok(&self.routes)
    }

    /// Resolve the document serving `request_path`.
    pub async fn resolve_document(&self, request_path: &str) -> Result<Arc<Document>, GrowError> {
        let routes = self.routes().await?;
        let doc = routes.match_path(request_path)?;
        doc.resolve(&self.ctx).await?;
        Ok(doc)
    }

    /// Render the page for `request_path`.
    pub async fn render(&self, request_path: &str) -> Result<RenderedPage, GrowError> {
        let started = Instant::now();
        let document = self.resolve_document(request_path).await?;
        tracing::info!("Loaded: {} ms", started.elapsed().as_millis());

        let view = document.view(&self.config.pod.default_view);
        let started = Instant::now();
        let html = self.renderer.render(&view, &document).await?;
        tracing::info!("Rendered: {} ms", started.elapsed().as_millis());

        Ok(RenderedPage {
            request_path: request_path.to_string(),
            document,
            view,
            html,
        })
    }
}

impl std::fmt::Debug for Pod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pod").field("config", &self.config).field("routes", &self.routes).finish()
    }
}
