//! Structured template errors
//!
//! Tera reports failures as loosely formatted messages. The renderer turns
//! them into a [`TemplateError`] carrying the view, the failing line and, for
//! unknown variables, "did you mean" suggestions. [`TemplateError`] converts
//! into [`GrowError::Render`] for the rest of the crate.

use crate::core::GrowError;

/// Template errors with location details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    VariableNotFound {
        variable: String,
        available_variables: Box<Vec<String>>,
        suggestions: Box<Vec<String>>,
        location: Box<ErrorLocation>,
    },

    SyntaxError {
        message: String,
        location: Box<ErrorLocation>,
    },

    /// A view (or a template it extends, includes or imports) could not be loaded
    TemplateNotFound {
        template: String,
        reason: String,
        location: Box<ErrorLocation>,
    },

    /// Template references nest deeper than the loader follows
    TooDeep {
        template: String,
        depth: usize,
        location: Box<ErrorLocation>,
    },
}

/// Where a template error happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    /// View being rendered
    pub view: String,
    /// Path of the document bound as `doc`
    pub document: Option<String>,
    /// Line number if available from Tera
    pub line_number: Option<usize>,
    /// Numbered source lines around the error
    pub context_lines: Option<Vec<(usize, String)>>,
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::VariableNotFound {
                variable,
                ..
            } => write!(f, "Template variable not found: '{variable}'"),
            TemplateError::SyntaxError {
                message,
                ..
            } => write!(f, "Template syntax error: {message}"),
            TemplateError::TemplateNotFound {
                template,
                reason,
                ..
            } => write!(f, "Template '{template}' could not be loaded: {reason}"),
            TemplateError::TooDeep {
                template,
                depth,
                ..
            } => write!(f, "Template '{template}' nests more than {depth} levels of templates"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl TemplateError {
    pub fn location(&self) -> &ErrorLocation {
        match self {
            TemplateError::VariableNotFound {
                location,
                ..
            }
            | TemplateError::SyntaxError {
                location,
                ..
            }
            | TemplateError::TemplateNotFound {
                location,
                ..
            }
            | TemplateError::TooDeep {
                location,
                ..
            } => location,
        }
    }

    /// Generate user-friendly error message with context and suggestions
    pub fn format_with_context(&self) -> String {
        match self {
            TemplateError::VariableNotFound {
                variable,
                available_variables,
                suggestions,
                location,
            } => format_variable_not_found_error(variable, available_variables, suggestions, location),
            TemplateError::SyntaxError {
                message,
                location,
            } => format_syntax_error(message, location),
            TemplateError::TemplateNotFound {
                template,
                reason,
                location,
            } => {
                let mut msg = String::from("ERROR: Template Not Found\n\n");
                msg.push_str(&format!("Template: {template}\n"));
                msg.push_str(&format!("Error: {reason}\n"));
                push_location(&mut msg, location);
                msg.push_str(
                    "\nSUGGESTION: Template names are pod paths without the leading slash, e.g. \"views/base.html\".\n",
                );
                msg
            }
            TemplateError::TooDeep {
                template,
                depth,
                location,
            } => {
                let mut msg = String::from("ERROR: Template Nesting Too Deep\n\n");
                msg.push_str(&format!("Template: {template}\nLimit: {depth}\n"));
                push_location(&mut msg, location);
                msg
            }
        }
    }
}

impl From<TemplateError> for GrowError {
    fn from(error: TemplateError) -> Self {
        GrowError::Render {
            view: error.location().view.clone(),
            message: error.format_with_context().trim_end().to_string(),
        }
    }
}

fn push_location(msg: &mut String, location: &ErrorLocation) {
    msg.push_str(&format!("View: {}\n", location.view));
    if let Some(document) = &location.document {
        msg.push_str(&format!("Document: {document}\n"));
    }
    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {line}\n"));
    }
    if let Some(lines) = &location.context_lines {
        msg.push('\n');
        for (number, text) in lines {
            let marker = if Some(*number) == location.line_number {
                ">"
            } else {
                " "
            };
            msg.push_str(&format!("{marker} {number:>4} | {text}\n"));
        }
    }
}

/// Format a detailed "variable not found" error message
fn format_variable_not_found_error(
    variable: &str,
    available_variables: &[String],
    suggestions: &[String],
    location: &ErrorLocation,
) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {variable}\n"));
    push_location(&mut msg, location);
    msg.push('\n');

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {suggestion}\n"));
        }
        msg.push('\n');
    }

    if !available_variables.is_empty() {
        msg.push_str("Available variables in this context:\n");
        for var in available_variables.iter().take(10) {
            msg.push_str(&format!("  {var}\n"));
        }
        if available_variables.len() > 10 {
            msg.push_str(&format!("  ... and {} more\n", available_variables.len() - 10));
        }
        msg.push('\n');
    }

    msg
}

fn format_syntax_error(message: &str, location: &ErrorLocation) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Syntax Error\n\n");
    msg.push_str(&format!("Error: {message}\n"));
    push_location(&mut msg, location);

    msg.push_str("\nSUGGESTION: Check template syntax for unclosed tags or invalid expressions.\n");
    msg.push_str("Common issues:\n");
    msg.push_str("  - Unclosed {{ }} or {% %} delimiters\n");
    msg.push_str("  - Invalid filter names\n");
    msg.push_str("  - Missing quotes around string values\n\n");

    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Box<ErrorLocation> {
        Box::new(ErrorLocation {
            view: "views/post.html".to_string(),
            document: Some("/content/blog/hello.yaml".to_string()),
            line_number: Some(2),
            context_lines: Some(vec![(1, "<h1>".to_string()), (2, "{{ doc.titel }}".to_string())]),
        })
    }

    #[test]
    fn test_variable_not_found_formatting() {
        let error = TemplateError::VariableNotFound {
            variable: "doc.titel".to_string(),
            available_variables: Box::new(vec!["doc.title".to_string(), "doc.path".to_string()]),
            suggestions: Box::new(vec!["doc.title".to_string()]),
            location: location(),
        };

        let formatted = error.format_with_context();
        assert!(formatted.contains("Variable: doc.titel"));
        assert!(formatted.contains("Did you mean one of these?\n  - doc.title"));
        assert!(formatted.contains(">    2 | {{ doc.titel }}"));
        assert!(formatted.contains("Document: /content/blog/hello.yaml"));
    }

    #[test]
    fn test_converts_to_render_error() {
        let error = TemplateError::SyntaxError {
            message: "unexpected end".to_string(),
            location: location(),
        };
        match GrowError::from(error) {
            GrowError::Render {
                view,
                message,
            } => {
                assert_eq!(view, "views/post.html");
                assert!(message.starts_with("ERROR: Template Syntax Error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
