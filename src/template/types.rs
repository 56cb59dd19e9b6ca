//! Template types and error definitions

use std::fmt;

use thiserror::Error;

/// The three sections every template bundle must define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Subject,
    PlainBody,
    HtmlBody,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Subject, Section::PlainBody, Section::HtmlBody];

    /// Macro name inside the template source.
    pub fn name(&self) -> &'static str {
        match self {
            Section::Subject => "subject",
            Section::PlainBody => "plainBody",
            Section::HtmlBody => "htmlBody",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template {name} failed to parse: {source}")]
    Parse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Template {name} does not define section {section}")]
    MissingSection { name: String, section: Section },

    #[error("Template {name} failed to render {section}: {source}")]
    Render {
        name: String,
        section: Section,
        #[source]
        source: minijinja::Error,
    },
}

impl TemplateError {
    /// Errors raised while loading or parsing, before any payload is involved.
    pub fn is_resolution(&self) -> bool {
        !matches!(self, TemplateError::Render { .. })
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;
