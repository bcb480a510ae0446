use std::{fmt, sync::Arc};

use ramhorns::{Content, Section, encoding::Encoder, traits::ContentSequence};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::TemplateError;

pub type SqlCallback = Arc<dyn Fn(&FragmentContext<'_>) -> String + Send + Sync>;

/// Generates an SQL fragment (expression, join predicate, filter) from the table aliases
/// chosen by the query planner.
///
/// Templates use mustache syntax. `{{table}}`, `{{parent}}` and `{{child}}` render the
/// corresponding alias as-is, `{{args.id}}` renders a field argument as an SQL literal and
/// `{{{args.id}}}` renders it raw. Inside an `{{#args}}...{{/args}}` section arguments are
/// referenced by their bare name. Any other tag is rejected when the template is compiled.
#[derive(Clone)]
pub enum SqlFragment {
    Template(SqlTemplate),
    Callback(SqlCallback),
}

impl SqlFragment {
    pub fn template(source: impl Into<String>) -> Result<Self, TemplateError> {
        SqlTemplate::new(source).map(SqlFragment::Template)
    }

    pub fn callback(callback: impl Fn(&FragmentContext<'_>) -> String + Send + Sync + 'static) -> Self {
        SqlFragment::Callback(Arc::new(callback))
    }

    pub fn render(&self, ctx: &FragmentContext<'_>) -> String {
        match self {
            SqlFragment::Template(template) => template.render(ctx),
            SqlFragment::Callback(callback) => callback(ctx),
        }
    }

    pub fn as_template(&self) -> Option<&SqlTemplate> {
        match self {
            SqlFragment::Template(template) => Some(template),
            SqlFragment::Callback(_) => None,
        }
    }
}

impl fmt::Debug for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlFragment::Template(template) => f.debug_tuple("Template").field(&template.source()).finish(),
            SqlFragment::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl PartialEq for SqlFragment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SqlFragment::Template(left), SqlFragment::Template(right)) => left.source() == right.source(),
            (SqlFragment::Callback(left), SqlFragment::Callback(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for SqlFragment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        SqlFragment::template(source).map_err(|err| serde::de::Error::custom(format!("Invalid SQL template: {err}")))
    }
}

/// A compiled mustache template.
#[derive(Clone)]
pub struct SqlTemplate {
    source: Arc<str>,
    inner: Arc<ramhorns::Template<'static>>,
}

impl SqlTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source: String = source.into();
        let inner = ramhorns::Template::new(source.clone())?;
        check_tags(&source)?;

        Ok(SqlTemplate {
            source: source.into(),
            inner: Arc::new(inner),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, ctx: &FragmentContext<'_>) -> String {
        self.inner.render(ctx)
    }
}

/// Accepts only the placeholders [FragmentContext] renders, and requires every section to be
/// closed.
fn check_tags(source: &str) -> Result<(), TemplateError> {
    let mut sections = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let (tag, close) = match after.strip_prefix('{') {
            Some(tag) => (tag, "}}}"),
            None => (after, "}}"),
        };
        // Unbalanced delimiters are already reported by ramhorns.
        let Some(end) = tag.find(close) else {
            break;
        };
        let body = tag[..end].trim();
        rest = &tag[end + close.len()..];

        match body.as_bytes().first() {
            Some(b'#') => {
                let name = body[1..].trim();
                if sections.is_empty() && name != "args" {
                    return Err(TemplateError::UnknownPlaceholder { name: name.to_owned() });
                }
                sections.push(name);
            }
            Some(b'/') => {
                let name = body[1..].trim();
                match sections.pop() {
                    Some(open) if open != name => {
                        return Err(TemplateError::UnclosedSection { name: open.to_owned() });
                    }
                    _ => (),
                }
            }
            Some(b'!') => (),
            Some(b'^' | b'>' | b'=') => return Err(TemplateError::UnsupportedTag { tag: body.to_owned() }),
            Some(b'&') => check_variable(body[1..].trim(), &sections)?,
            _ => check_variable(body, &sections)?,
        }
    }

    match sections.pop() {
        Some(name) => Err(TemplateError::UnclosedSection { name: name.to_owned() }),
        None => Ok(()),
    }
}

fn check_variable(name: &str, sections: &[&str]) -> Result<(), TemplateError> {
    // Inside `{{#args}}` every name refers to an argument.
    if !sections.is_empty() {
        return Ok(());
    }

    let known = matches!(name, "table" | "parent" | "child")
        || name.strip_prefix("args.").is_some_and(|path| !path.is_empty());

    if known {
        Ok(())
    } else {
        Err(TemplateError::UnknownPlaceholder { name: name.to_owned() })
    }
}

/// What the query planner knows when it asks for a fragment.
#[derive(Clone, Copy, Debug, Default)]
pub struct FragmentContext<'a> {
    /// Alias of the table the field belongs to, for expressions and filters.
    pub table: Option<&'a str>,
    /// Aliases of both sides of a join.
    pub parent: Option<&'a str>,
    pub child: Option<&'a str>,
    /// Arguments of the requested field.
    pub args: Option<&'a Map<String, Value>>,
}

impl<'a> FragmentContext<'a> {
    pub fn table(table: &'a str) -> Self {
        FragmentContext {
            table: Some(table),
            ..Default::default()
        }
    }

    pub fn join(parent: &'a str, child: &'a str) -> Self {
        FragmentContext {
            parent: Some(parent),
            child: Some(child),
            ..Default::default()
        }
    }

    pub fn with_args(self, args: &'a Map<String, Value>) -> Self {
        FragmentContext {
            args: Some(args),
            ..self
        }
    }

    fn alias(&self, name: &str) -> Option<&'a str> {
        match name {
            "table" => self.table,
            "parent" => self.parent,
            "child" => self.child,
            _ => None,
        }
    }

    fn argument(&self, path: &str) -> Option<&'a Value> {
        let args = self.args?;
        let mut keys = path.split('.');
        let first = args.get(keys.next()?)?;
        keys.try_fold(first, |parent, key| parent.as_object().and_then(|obj| obj.get(key)))
    }
}

impl Content for FragmentContext<'_> {
    fn render_field_escaped<E>(&self, _: u64, name: &str, encoder: &mut E) -> Result<bool, E::Error>
    where
        E: Encoder,
    {
        if let Some(alias) = self.alias(name) {
            return encoder.write_unescaped(alias).map(|_| true);
        }
        match name.strip_prefix("args.").and_then(|path| self.argument(path)) {
            Some(value) => write_literal(value, encoder).map(|_| true),
            None => Ok(false),
        }
    }

    fn render_field_unescaped<E>(&self, _: u64, name: &str, encoder: &mut E) -> Result<bool, E::Error>
    where
        E: Encoder,
    {
        if let Some(alias) = self.alias(name) {
            return encoder.write_unescaped(alias).map(|_| true);
        }
        match name.strip_prefix("args.").and_then(|path| self.argument(path)) {
            Some(value) => write_raw(value, encoder).map(|_| true),
            None => Ok(false),
        }
    }

    fn render_field_section<C, E>(
        &self,
        _: u64,
        name: &str,
        section: Section<'_, C>,
        encoder: &mut E,
    ) -> Result<bool, E::Error>
    where
        C: ContentSequence,
        E: Encoder,
    {
        match (name, self.args) {
            ("args", Some(args)) => section.with(&ArgumentsContent(args)).render(encoder).map(|_| true),
            _ => Ok(false),
        }
    }
}

struct ArgumentsContent<'a>(&'a Map<String, Value>);

impl Content for ArgumentsContent<'_> {
    fn render_field_escaped<E>(&self, _: u64, name: &str, encoder: &mut E) -> Result<bool, E::Error>
    where
        E: Encoder,
    {
        match self.0.get(name) {
            Some(value) => write_literal(value, encoder).map(|_| true),
            None => Ok(false),
        }
    }

    fn render_field_unescaped<E>(&self, _: u64, name: &str, encoder: &mut E) -> Result<bool, E::Error>
    where
        E: Encoder,
    {
        match self.0.get(name) {
            Some(value) => write_raw(value, encoder).map(|_| true),
            None => Ok(false),
        }
    }
}

fn write_literal<E: Encoder>(value: &Value, encoder: &mut E) -> Result<(), E::Error> {
    match value {
        Value::Null => encoder.write_unescaped("NULL"),
        Value::Bool(b) => encoder.write_unescaped(if *b { "TRUE" } else { "FALSE" }),
        Value::Number(n) => encoder.format_unescaped(n),
        Value::String(s) => write_quoted(s, encoder),
        Value::Array(_) | Value::Object(_) => write_quoted(&value.to_string(), encoder),
    }
}

fn write_quoted<E: Encoder>(s: &str, encoder: &mut E) -> Result<(), E::Error> {
    encoder.write_unescaped("'")?;
    encoder.write_unescaped(&s.replace('\'', "''"))?;
    encoder.write_unescaped("'")
}

fn write_raw<E: Encoder>(value: &Value, encoder: &mut E) -> Result<(), E::Error> {
    match value {
        Value::String(s) => encoder.write_unescaped(s),
        Value::Null => encoder.write_unescaped("NULL"),
        other => encoder.format_unescaped(other),
    }
}
