//! Error handling for Grow
//!
//! This module provides the error taxonomy for document resolution, routing and
//! rendering, together with user-friendly error reporting for the CLI. The error
//! system follows two principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`GrowError`] - Enumerated error types for every failure in the resolution chain
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Propagation
//!
//! None of the errors below are recovered locally. A failure at any nested
//! reference aborts the resolution chain and therefore the whole page render;
//! the CLI turns it into diagnostics with [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use grow_cli::core::{GrowError, user_friendly_error};
//!
//! let error = GrowError::NoRouteMatch {
//!     path: "/nonexistent".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for Grow operations
///
/// # Error Categories
///
/// ## Resolution
/// - [`Fetch`] - Raw content for a path could not be retrieved
/// - [`Parse`] - Malformed YAML or an unregistered reference tag
/// - [`MalformedReference`] - A reference scalar does not name a usable path
/// - [`CyclicReference`] - A document reaches itself while the `error` cycle policy is active
///
/// ## Routing
/// - [`NoRouteMatch`] - The request path matches no registered pattern
/// - [`InvalidRoute`] - A routes manifest entry cannot be registered
/// - [`RoutesNotResolved`] - Matching was attempted before the manifest was resolved
///
/// ## Rendering and Configuration
/// - [`Render`] - The template engine failed for a view
/// - [`Config`] - `grow.toml` is unreadable or inconsistent
///
/// [`Fetch`]: GrowError::Fetch
/// [`Parse`]: GrowError::Parse
/// [`MalformedReference`]: GrowError::MalformedReference
/// [`CyclicReference`]: GrowError::CyclicReference
/// [`NoRouteMatch`]: GrowError::NoRouteMatch
/// [`InvalidRoute`]: GrowError::InvalidRoute
/// [`RoutesNotResolved`]: GrowError::RoutesNotResolved
/// [`Render`]: GrowError::Render
/// [`Config`]: GrowError::Config
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrowError {
    /// Content for a path is unavailable (network or IO failure)
    #[error("Failed to fetch '{path}': {reason}")]
    Fetch {
        /// Path passed to the content source
        path: String,
        /// Underlying failure as reported by the backend
        reason: String,
    },

    /// Raw content is not valid YAML, or uses an unknown tag
    #[error("Failed to parse '{path}': {reason}")]
    Parse {
        /// Document path whose content failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// A reference scalar resolves to an invalid path
    #[error("Malformed !{tag} reference '{value}': {reason}")]
    MalformedReference {
        /// Tag of the reference type, without the leading `!`
        tag: String,
        /// Offending value as written in the YAML source
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The request path matches no pattern of the routes manifest
    #[error("No pattern in the routes manifest matches -> {path}")]
    NoRouteMatch {
        /// The unmatched request path
        path: String,
    },

    /// A document references itself, directly or transitively
    #[error("Cyclic document reference: {}", chain.join(" -> "))]
    CyclicReference {
        /// Resolution chain from the root document back to the revisited one
        chain: Vec<String>,
    },

    /// A routes manifest entry is malformed
    #[error("Invalid route '{pattern}': {reason}")]
    InvalidRoute {
        /// Pattern of the entry (or `<missing>`)
        pattern: String,
        /// Why the entry was rejected
        reason: String,
    },

    /// `match` was called before the routes manifest was resolved
    #[error("Routes manifest '{path}' has not been resolved")]
    RoutesNotResolved {
        /// Path of the routes manifest document
        path: String,
    },

    /// Template rendering failed
    #[error("Failed to render view '{view}': {message}")]
    Render {
        /// View identifier handed to the template engine
        view: String,
        /// Formatted template error
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {reason}")]
    Config {
        /// What is wrong with the configuration
        reason: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`GrowError`] with an optional suggestion (an actionable step) and
/// optional details (why the error happened).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error, or `None` for free-form failures
    pub error: Option<GrowError>,
    /// Message used when there is no typed error
    pub message: Option<String>,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`GrowError`]
    #[must_use]
    pub const fn new(error: GrowError) -> Self {
        Self {
            error: Some(error),
            message: None,
            suggestion: None,
            details: None,
        }
    }

    /// Create an error context for an untyped failure
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(message.into()),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn headline(&self) -> String {
        match (&self.error, &self.message) {
            (Some(error), _) => error.to_string(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.headline());

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`GrowError`] anywhere in the `anyhow` chain, [`std::io::Error`]
/// and [`toml::de::Error`]; everything else is shown with its full context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(grow_error) = error.chain().find_map(|cause| cause.downcast_ref::<GrowError>()) {
        let ctx = create_error_context(grow_error.clone());
        // Outer anyhow context (e.g. which request failed) replaces the generic details
        return if error.chain().count() > 1 {
            ctx.with_details(format!("{error:#}"))
        } else {
            ctx
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let ctx = ErrorContext::from_message(format!("{error:#}"));
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => ctx
                .with_suggestion("Check the permissions of the output path and the pod directory"),
            std::io::ErrorKind::NotFound => {
                ctx.with_suggestion("Check that the file or directory exists and the path is correct")
            }
            _ => ctx,
        };
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::from_message(format!("{error:#}"))
            .with_suggestion("Check the TOML syntax in grow.toml. Verify quotes, brackets, and table names");
    }

    ErrorContext::from_message(format!("{error:#}"))
}

fn create_error_context(error: GrowError) -> ErrorContext {
    match &error {
        GrowError::Fetch { path, .. } => {
            let suggestion = format!(
                "Check that '{path}' exists below the pod root (or is served by the configured base_url)"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Every document and view is fetched through the content source configured in grow.toml")
        }
        GrowError::Parse { .. } => ErrorContext::new(error)
            .with_suggestion("Check the YAML syntax. References must use the !g.doc or !g.static tags")
            .with_details("Unknown tags are rejected rather than silently treated as strings"),
        GrowError::MalformedReference { .. } => ErrorContext::new(error)
            .with_suggestion("Write references as a scalar path, e.g. `image: !g.static /static/img/logo.png`"),
        GrowError::NoRouteMatch { .. } => ErrorContext::new(error)
            .with_suggestion("Add a pattern for this path to the routes manifest, e.g. `- pattern: /blog/:base`")
            .with_details("Patterns are matched segment by segment; static segments win over :params and *catch-alls"),
        GrowError::CyclicReference { .. } => ErrorContext::new(error)
            .with_suggestion("Remove one of the references, or set `cycle_policy = \"break\"` in the [render] section of grow.toml"),
        GrowError::InvalidRoute { .. } => ErrorContext::new(error)
            .with_suggestion("Each route needs a `pattern` and exactly one of `doc` or `collection`; collection patterns must capture :base"),
        GrowError::RoutesNotResolved { .. } => ErrorContext::new(error)
            .with_details("The routes manifest must be resolved before request paths can be matched"),
        GrowError::Render { .. } => ErrorContext::new(error)
            .with_suggestion("Check the view template syntax and the variables it uses"),
        GrowError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Check grow.toml, or pass a different file with --config"),
    }
}
