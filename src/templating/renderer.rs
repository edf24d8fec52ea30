//! Template rendering engine with Tera.
//!
//! Views live in the pod like documents do: the view `views/post.html` is
//! fetched from `/views/post.html` through the resolution context. Before
//! rendering, the renderer loads the requested view and every template it
//! extends, includes or imports, registers them all in a fresh Tera
//! instance, and renders with the document bound as `doc`.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::context::{available_variables, build_context};
use super::error::{ErrorLocation, TemplateError};
use super::filters;
use crate::constants::MAX_TEMPLATE_DEPTH;
use crate::document::{Document, ResolutionContext};

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Template names referenced by `extends`, `include` and `import` tags.
static TEMPLATE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+["']([^"']+)["']"#).unwrap()
});

/// Renders documents through pod views.
pub struct TemplateRenderer {
    ctx: ResolutionContext,
    autoescape: bool,
}

impl TemplateRenderer {
    pub fn new(ctx: ResolutionContext) -> Self {
        Self {
            ctx,
            autoescape: true,
        }
    }

    /// Enable or disable HTML escaping of `.html`, `.htm` and `.xml` views.
    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    /// Pod path a template name is fetched from.
    pub fn template_path(name: &str) -> String {
        format!("/{}", name.trim_start_matches('/'))
    }

    /// Template names referenced from `content`, in order of appearance.
    pub fn referenced_templates(content: &str) -> Vec<String> {
        TEMPLATE_REFERENCE.captures_iter(content).map(|caps| caps[1].to_string()).collect()
    }

    /// Fetch `view` and every template reachable from it.
    pub async fn load_templates(
        &self,
        view: &str,
        document: Option<&str>,
    ) -> Result<Vec<(String, Arc<str>)>, TemplateError> {
        let mut loaded = Vec::new();
        let mut seen = HashSet::from([view.to_string()]);
        let mut frontier = vec![view.to_string()];

        for depth in 0..=MAX_TEMPLATE_DEPTH {
            if frontier.is_empty() {
                return Ok(loaded);
            }
            if depth == MAX_TEMPLATE_DEPTH {
                break;
            }

            let mut next = Vec::new();
            for name in frontier {
                let content = self.ctx.fetch(&Self::template_path(&name)).await.map_err(|e| {
                    TemplateError::TemplateNotFound {
                        template: name.clone(),
                        reason: e.to_string(),
                        location: Box::new(Self::location(view, document, None, None)),
                    }
                })?;
                for reference in Self::referenced_templates(&content) {
                    if seen.insert(reference.clone()) {
                        next.push(reference);
                    }
                }
                tracing::trace!("Loaded template {name}");
                loaded.push((name, content));
            }
            frontier = next;
        }

        Err(TemplateError::TooDeep {
            template: view.to_string(),
            depth: MAX_TEMPLATE_DEPTH,
            location: Box::new(Self::location(view, document, None, None)),
        })
    }

    /// Render `doc` through `view`.
    pub async fn render(&self, view: &str, doc: &Document) -> Result<String, TemplateError> {
        tracing::debug!("Rendering {} with {view}", doc.path());
        let templates = self.load_templates(view, Some(doc.path())).await?;

        // Fresh Tera instance per render (very cheap - just empty HashMaps)
        let mut tera = Tera::default();
        if self.autoescape {
            tera.autoescape_on(vec![".html", ".htm", ".xml"]);
        } else {
            tera.autoescape_on(vec![]);
        }
        filters::register(&mut tera, &self.ctx);

        let sources: Vec<(&str, &str)> =
            templates.iter().map(|(name, content)| (name.as_str(), &**content)).collect();
        tera.add_raw_templates(sources).map_err(|e| {
            let (failing, content) = Self::failing_template(&e, &templates, view);
            Self::parse_tera_error(&e, content, &TeraContext::new(), failing, Some(doc.path()))
        })?;

        let context = build_context(doc);
        tera.render(view, &context).map_err(|e| {
            let (failing, content) = Self::failing_template(&e, &templates, view);
            Self::parse_tera_error(&e, content, &context, failing, Some(doc.path()))
        })
    }

    /// Template named in a Tera error, falling back to the requested view.
    fn failing_template<'a>(
        error: &tera::Error,
        templates: &'a [(String, Arc<str>)],
        view: &'a str,
    ) -> (&'a str, &'a str) {
        let message = Self::format_tera_error(error);
        templates
            .iter()
            .find(|(name, _)| message.contains(&format!("'{name}'")))
            .or_else(|| templates.iter().find(|(name, _)| name == view))
            .map(|(name, content)| (name.as_str(), &**content))
            .unwrap_or((view, ""))
    }

    fn location(
        view: &str,
        document: Option<&str>,
        line_number: Option<usize>,
        context_lines: Option<Vec<(usize, String)>>,
    ) -> ErrorLocation {
        ErrorLocation {
            view: view.to_string(),
            document: document.map(str::to_string),
            line_number,
            context_lines,
        }
    }

    /// Parse a Tera error into a structured TemplateError
    fn parse_tera_error(
        error: &tera::Error,
        template_content: &str,
        context: &TeraContext,
        view: &str,
        document: Option<&str>,
    ) -> TemplateError {
        let line_number = Self::extract_line_from_tera_error(error);
        let context_lines = line_number
            .map(|line| Self::extract_context_lines(template_content, line, 3))
            .filter(|lines| !lines.is_empty());
        let location = Box::new(Self::location(view, document, line_number, context_lines));

        let message = Self::format_tera_error(error);
        if let Some(name) = Self::extract_variable_name(&message) {
            let available_variables = available_variables(context);
            let suggestions = Self::find_similar_variables(&name, &available_variables);
            return TemplateError::VariableNotFound {
                variable: name,
                available_variables: Box::new(available_variables),
                suggestions: Box::new(suggestions),
                location,
            };
        }

        TemplateError::SyntaxError {
            message,
            location,
        }
    }

    /// Extract variable name from "Variable `foo` not found" message
    fn extract_variable_name(error_msg: &str) -> Option<String> {
        static PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
            [r"Variable `([^`]+)` not found", r"Unknown variable `([^`]+)`"].map(|pattern| Regex::new(pattern).unwrap())
        });
        PATTERNS.iter().find_map(|re| re.captures(error_msg).map(|caps| caps[1].to_string()))
    }

    /// Find similar variable names using Levenshtein distance
    fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
        let mut scored: Vec<_> = available.iter().map(|var| (var.clone(), levenshtein(target, var))).collect();
        scored.sort_by_key(|(_, dist)| *dist);

        scored
            .into_iter()
            .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(var, _)| var)
            .collect()
    }

    /// Up to `context_size` lines before and after the 1-indexed `error_line`.
    fn extract_context_lines(content: &str, error_line: usize, context_size: usize) -> Vec<(usize, String)> {
        let lines: Vec<&str> = content.lines().collect();
        if error_line == 0 || error_line > lines.len() {
            return Vec::new();
        }

        let start = error_line.saturating_sub(context_size + 1);
        let end = (error_line + context_size).min(lines.len());
        lines[start..end].iter().enumerate().map(|(idx, line)| (start + idx + 1, line.to_string())).collect()
    }

    /// Tera reports parse errors with a `line:column` position.
    fn extract_line_from_tera_error(error: &tera::Error) -> Option<usize> {
        static POSITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+):(\d+)").unwrap());
        let error_msg = format!("{error:?}");
        POSITION.captures(&error_msg).and_then(|caps| caps[1].parse::<usize>().ok())
    }

    /// Flatten a Tera error and its sources into one message.
    pub fn format_tera_error(error: &tera::Error) -> String {
        use std::error::Error;

        let mut messages = vec![error.to_string()];
        let mut current: Option<&dyn Error> = error.source();
        while let Some(err) = current {
            messages.push(err.to_string());
            current = err.source();
        }

        let messages: Vec<String> =
            messages.into_iter().map(|m| m.trim().to_string()).filter(|m| !m.is_empty()).collect();
        if messages.is_empty() {
            "Template error (no details available)".to_string()
        } else {
            messages.join("\n  -> ")
        }
    }
}
