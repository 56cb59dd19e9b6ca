//! Template stores the resolver reads raw sources from.

use std::borrow::Cow;

use dashmap::DashMap;
use rust_embed::RustEmbed;

/// Read-only lookup of raw template sources by name.
pub trait TemplateSource: Send + Sync {
    fn load(&self, name: &str) -> Option<Cow<'static, str>>;
}

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

/// Templates compiled into the binary from the `templates/` directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    pub fn new() -> Self {
        Self
    }

    /// Names of all embedded templates.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = TemplateAssets::iter().map(Cow::into_owned).collect();
        names.sort();
        names
    }
}

impl TemplateSource for EmbeddedTemplates {
    fn load(&self, name: &str) -> Option<Cow<'static, str>> {
        let file = TemplateAssets::get(name)?;
        Some(match file.data {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }
}

/// In-memory template storage, useful for tests and for injecting templates
/// that are not part of the build.
#[derive(Debug, Default)]
pub struct InMemoryTemplates {
    templates: DashMap<String, String>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Insert or replace a template source.
    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    /// Remove a template, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.templates.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

impl TemplateSource for InMemoryTemplates {
    fn load(&self, name: &str) -> Option<Cow<'static, str>> {
        self.templates
            .get(name)
            .map(|entry| Cow::Owned(entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_templates_present() {
        let store = EmbeddedTemplates::new();
        let names = store.names();
        assert!(names.contains(&"user_welcome.tmpl".to_string()));
        assert!(names.contains(&"token_activation.tmpl".to_string()));
        assert!(names.contains(&"token_password_reset.tmpl".to_string()));

        let source = store.load("user_welcome.tmpl").unwrap();
        assert!(source.contains("macro subject"));
    }

    #[test]
    fn test_embedded_missing_template() {
        assert!(EmbeddedTemplates::new().load("nope.tmpl").is_none());
    }

    #[test]
    fn test_in_memory_insert_remove() {
        let store = InMemoryTemplates::new().with("a.tmpl", "first");
        assert!(store.contains("a.tmpl"));
        assert_eq!(store.load("a.tmpl").as_deref(), Some("first"));

        store.insert("a.tmpl", "second");
        assert_eq!(store.count(), 1);
        assert_eq!(store.load("a.tmpl").as_deref(), Some("second"));

        assert!(store.remove("a.tmpl"));
        assert!(!store.remove("a.tmpl"));
        assert!(store.load("a.tmpl").is_none());
    }
}
