//! Tera templating for rendered pages.
//!
//! A page is rendered by handing a resolved [`Document`](crate::document::Document)
//! to a view template. Views are pod files (`/views/post.html` is the view
//! `views/post.html`) loaded through the resolution context, so a view is
//! fetched at most once per context.
//!
//! # Template Context
//!
//! - `doc`: the rendered document, see [`context`] for its shape
//!
//! # Filters and Functions
//!
//! - `{{ doc.title | localize }}`: localization hook, currently a pass-through
//! - `{{ doc | json(pretty=true) }}`: JSON dump, handy while writing views
//! - `{{ _(text="Read more") }}`: translatable text, currently a pass-through
//! - `{% set d = get_doc(path="/content/pages/about.yaml") %}`: document by path
//! - `{% set s = get_static(path="/static/img/logo.png") %}`: static asset by path
//!
//! # Template Inheritance
//!
//! `{% extends %}`, `{% include %}` and `{% import %}` name other views by
//! template name:
//!
//! ```jinja
//! {% extends "views/base.html" %}
//! {% block body %}<h1>{{ doc.title }}</h1>{% endblock %}
//! ```

pub mod context;
pub mod error;
pub mod filters;
pub mod renderer;

pub use context::{build_context, document_to_json};
pub use error::{ErrorLocation, TemplateError};
pub use renderer::TemplateRenderer;
