//! Constants shared across modules.
//!
//! Defaults here are what `grow.toml` falls back to when a setting is absent.

/// Pod configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "grow.toml";

/// Default path of the routes manifest document.
pub const DEFAULT_ROUTES_PATH: &str = "/routes.yaml";

/// Default view for documents without a `$view` field.
pub const DEFAULT_VIEW: &str = "/views/base.html";

/// Suffix appended to collection paths when synthesizing a document path.
pub const DEFAULT_DOCUMENT_SUFFIX: &str = ".yaml";

/// Manifest field holding the route entries.
pub const ROUTES_FIELD: &str = "routes";

/// Route parameter naming the collection member.
pub const BASE_PARAM: &str = "base";

/// Base URL used by the HTTP source when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Number of nested `extends`/`include`/`import` levels followed when
/// loading view templates.
pub const MAX_TEMPLATE_DEPTH: usize = 16;
