//! Email template resolution.
//!
//! A template bundle is a single MiniJinja source defining three top-level
//! macros, one per message section:
//!
//! ```text
//! {% macro subject() %}Welcome, {{ name }}!{% endmacro %}
//! {% macro plainBody() %}Hi {{ name }}, ...{% endmacro %}
//! {% macro htmlBody() %}{% autoescape "html" %}<p>Hi {{ name }}</p>{% endautoescape %}{% endmacro %}
//! ```
//!
//! Sources come from a [`TemplateSource`]: the build-time embedded
//! `templates/` directory in production, or an in-memory store in tests.
//!
//! # Example
//!
//! ```ignore
//! let resolver = TemplateResolver::embedded();
//! let bundle = resolver.resolve("user_welcome.tmpl")?;
//! let subject = bundle.render(Section::Subject, &json!({"user_id": 7}))?;
//! ```

mod resolver;
mod source;
mod types;

pub use resolver::{TemplateBundle, TemplateResolver};
pub use source::{EmbeddedTemplates, InMemoryTemplates, TemplateSource};
pub use types::{Section, TemplateError, TemplateResult};
