//! Template resolution for templated option values.
//!
//! Option values may contain Handlebars expressions (`{{ field }}`) that are
//! resolved against the triggering event's payload. Resolution walks maps
//! and arrays and renders every string leaf; keys and non-string scalars
//! are left untouched.

use handlebars::Handlebars;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error rendering a template.
#[derive(Debug, Error)]
#[error("Template error in '{template}': {reason}")]
pub struct TemplateError {
    /// The template source that failed
    pub template: String,
    /// Renderer message
    pub reason: String,
}

/// Resolves templated values against a context.
pub trait TemplateResolver: Send + Sync {
    /// Returns `value` with every template expression resolved against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if a template is malformed.
    fn resolve(&self, value: &Value, context: &Map<String, Value>) -> Result<Value, TemplateError>;
}

/// Renders a JSON value as plain text: strings verbatim, null as empty,
/// everything else as JSON.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Returns true if the string contains a template expression.
#[must_use]
pub fn is_template(s: &str) -> bool {
    s.contains("{{")
}

/// Handlebars-backed resolver.
///
/// HTML escaping is disabled since values end up in URLs, headers and
/// request bodies. Missing fields render as empty strings.
#[derive(Debug)]
pub struct HandlebarsResolver {
    registry: Handlebars<'static>,
}

impl HandlebarsResolver {
    /// Creates a resolver with escaping disabled.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        self.registry
            .render_template(template, context)
            .map_err(|e| TemplateError {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }

    fn resolve_in(&self, value: &Value, context: &Value) -> Result<Value, TemplateError> {
        match value {
            Value::String(s) if is_template(s) => Ok(Value::String(self.render(s, context)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_in(item, context))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = Map::new();
                for (key, item) in map {
                    resolved.insert(key.clone(), self.resolve_in(item, context)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }
}

impl Default for HandlebarsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver for HandlebarsResolver {
    fn resolve(&self, value: &Value, context: &Map<String, Value>) -> Result<Value, TemplateError> {
        let context = Value::Object(context.clone());
        self.resolve_in(value, &context)
    }
}
