//! Resolves template names into parsed, renderable bundles.

use std::sync::Arc;

use minijinja::{context, AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;

use super::source::{EmbeddedTemplates, TemplateSource};
use super::types::{Section, TemplateError, TemplateResult};

/// Looks up template sources and parses them into [`TemplateBundle`]s.
///
/// Bundles are parsed on every call; nothing is cached between calls.
#[derive(Clone)]
pub struct TemplateResolver {
    source: Arc<dyn TemplateSource>,
}

impl TemplateResolver {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self { source }
    }

    /// Resolver over the templates compiled into the binary.
    pub fn embedded() -> Self {
        Self::new(Arc::new(EmbeddedTemplates::new()))
    }

    pub fn resolve(&self, name: &str) -> TemplateResult<TemplateBundle> {
        let source = self
            .source
            .load(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        TemplateBundle::parse(name, source.into_owned())
    }
}

/// A parsed template exposing the `subject`, `plainBody` and `htmlBody`
/// sections. Each section is a top-level macro in the source.
pub struct TemplateBundle {
    name: String,
    env: Environment<'static>,
}

impl std::fmt::Debug for TemplateBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateBundle")
            .field("name", &self.name)
            .finish()
    }
}

impl TemplateBundle {
    /// Parse `source` and check that every section is defined.
    pub fn parse(name: &str, source: String) -> TemplateResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        // Sections opt into HTML escaping with {% autoescape %}
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_template_owned(name.to_string(), source)
            .map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source,
            })?;

        let bundle = Self {
            name: name.to_string(),
            env,
        };
        bundle.check_sections()?;
        Ok(bundle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render one section against `payload`.
    pub fn render<P>(&self, section: Section, payload: &P) -> TemplateResult<String>
    where
        P: Serialize + ?Sized,
    {
        let render_err = |source| TemplateError::Render {
            name: self.name.clone(),
            section,
            source,
        };

        let template = self.env.get_template(&self.name).map_err(render_err)?;
        // Top-level evaluation only defines the section macros.
        let state = template
            .eval_to_state(Value::from_serialize(payload))
            .map_err(render_err)?;

        let section_macro = state
            .lookup(section.name())
            .ok_or_else(|| TemplateError::MissingSection {
                name: self.name.clone(),
                section,
            })?;

        let output = section_macro.call(&state, &[]).map_err(render_err)?;
        Ok(output.to_string())
    }

    /// Top-level code that reads the payload cannot be evaluated without one.
    /// Such templates skip the check here; a missing section then surfaces
    /// from [`TemplateBundle::render`].
    fn check_sections(&self) -> TemplateResult<()> {
        let parse_err = |source| TemplateError::Parse {
            name: self.name.clone(),
            source,
        };

        let template = self.env.get_template(&self.name).map_err(parse_err)?;
        let state = match template.eval_to_state(context! {}) {
            Ok(state) => state,
            Err(e) if e.kind() == ErrorKind::UndefinedError => {
                tracing::debug!(
                    template = %self.name,
                    "top-level code reads the payload, sections checked at render"
                );
                return Ok(());
            }
            Err(e) => return Err(parse_err(e)),
        };

        for section in Section::ALL {
            if state.lookup(section.name()).is_none() {
                return Err(TemplateError::MissingSection {
                    name: self.name.clone(),
                    section,
                });
            }
        }
        Ok(())
    }
}
