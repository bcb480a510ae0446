use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    BatchKeys, ColumnList, ConfigError, Extensions, FieldDirectives, SqlFragment, TypeDirectives, TypeResolver,
};

/// The configuration tree: per type name, the planner metadata to attach.
///
/// ```toml
/// [User]
/// sqlTable = "accounts"
/// uniqueKey = "id"
///
/// [User.fields.email]
/// sqlColumn = "email_address"
///
/// [User.fields.posts]
/// sqlJoin = "{{parent}}.id = {{child}}.author_id"
///
/// [Comment.extensions.Planner]
/// sqlTable = "comments"
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct AnnotationConfig {
    types: IndexMap<String, TypeConfig>,
}

impl AnnotationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Loads a `.toml` or `.json` configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let format = path.extension().and_then(|extension| extension.to_str());
        if !matches!(format, Some("toml" | "json")) {
            return Err(ConfigError::UnsupportedFormat { path: path.to_owned() });
        }

        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_owned(),
            err,
        })?;

        tracing::debug!(path = %path.display(), "loading annotation config");

        match format {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    pub fn with_type(mut self, name: impl Into<String>, config: TypeConfig) -> Self {
        self.types.insert(name.into(), config);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeConfig> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = (&str, &TypeConfig)> {
        self.types.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Metadata for a single type, in either the flat legacy shape, the namespaced `extensions`
/// shape, or both.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(from = "TypeConfigRecord")]
pub struct TypeConfig {
    pub directives: TypeDirectives,
    pub extensions: Option<Extensions<TypeDirectives>>,
    pub fields: IndexMap<String, FieldConfig>,
}

impl TypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql_table(mut self, table: impl Into<String>) -> Self {
        self.directives.sql_table = Some(table.into());
        self
    }

    pub fn unique_key(mut self, key: impl Into<ColumnList>) -> Self {
        self.directives.unique_key = Some(key.into());
        self
    }

    pub fn always_fetch(mut self, columns: impl Into<ColumnList>) -> Self {
        self.directives.always_fetch = Some(columns.into());
        self
    }

    pub fn type_hint(mut self, hint: impl Into<String>) -> Self {
        self.directives.type_hint = Some(hint.into());
        self
    }

    pub fn resolve_type(mut self, resolver: TypeResolver) -> Self {
        self.directives.resolve_type = Some(resolver);
        self
    }

    pub fn extensions(mut self, extensions: Extensions<TypeDirectives>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Sets the planner directives of the `extensions` entry.
    pub fn planner(mut self, directives: TypeDirectives) -> Self {
        let mut extensions = self.extensions.take().unwrap_or_default();
        extensions.planner = Some(directives);
        self.extensions(extensions)
    }

    /// Adds an extension namespace. A [crate::PLANNER_NAMESPACE] value is validated as planner
    /// directives.
    pub fn extension(mut self, namespace: impl Into<String>, value: Value) -> Result<Self, ConfigError> {
        let extensions = self.extensions.take().unwrap_or_default();
        self.extensions = Some(extensions.with_namespace(namespace, value)?);
        Ok(self)
    }

    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    /// Whether any flat, legacy-shaped key is set on the type or one of its fields.
    pub(crate) fn uses_flat_keys(&self) -> bool {
        !self.directives.is_empty() || self.fields.values().any(|field| !field.directives.is_empty())
    }

    /// Whether an `extensions` entry is present on the type or one of its fields.
    pub(crate) fn uses_extensions(&self) -> bool {
        self.extensions.is_some() || self.fields.values().any(|field| field.extensions.is_some())
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TypeConfigRecord {
    sql_table: Option<String>,
    unique_key: Option<ColumnList>,
    always_fetch: Option<ColumnList>,
    type_hint: Option<String>,
    resolve_type: Option<TypeResolver>,
    extensions: Option<Extensions<TypeDirectives>>,
    #[serde(default)]
    fields: IndexMap<String, FieldConfig>,
}

impl From<TypeConfigRecord> for TypeConfig {
    fn from(record: TypeConfigRecord) -> Self {
        let TypeConfigRecord {
            sql_table,
            unique_key,
            always_fetch,
            type_hint,
            resolve_type,
            extensions,
            fields,
        } = record;

        TypeConfig {
            directives: TypeDirectives {
                sql_table,
                unique_key,
                always_fetch,
                type_hint,
                resolve_type,
            },
            extensions,
            fields,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(from = "FieldConfigRecord")]
pub struct FieldConfig {
    pub directives: FieldDirectives,
    pub extensions: Option<Extensions<FieldDirectives>>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql_column(mut self, column: impl Into<String>) -> Self {
        self.directives.sql_column = Some(column.into());
        self
    }

    pub fn sql_expr(mut self, expression: SqlFragment) -> Self {
        self.directives.sql_expr = Some(expression);
        self
    }

    pub fn sql_join(mut self, predicate: SqlFragment) -> Self {
        self.directives.sql_join = Some(predicate);
        self
    }

    pub fn sql_batch(mut self, keys: BatchKeys) -> Self {
        self.directives.sql_batch = Some(keys);
        self
    }

    pub fn sql_deps(mut self, columns: impl Into<ColumnList>) -> Self {
        self.directives.sql_deps = Some(columns.into());
        self
    }

    pub fn filter(mut self, predicate: SqlFragment) -> Self {
        self.directives.filter = Some(predicate);
        self
    }

    pub fn extensions(mut self, extensions: Extensions<FieldDirectives>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Sets the planner directives of the `extensions` entry.
    pub fn planner(mut self, directives: FieldDirectives) -> Self {
        let mut extensions = self.extensions.take().unwrap_or_default();
        extensions.planner = Some(directives);
        self.extensions(extensions)
    }

    /// Adds an extension namespace. A [crate::PLANNER_NAMESPACE] value is validated as planner
    /// directives.
    pub fn extension(mut self, namespace: impl Into<String>, value: Value) -> Result<Self, ConfigError> {
        let extensions = self.extensions.take().unwrap_or_default();
        self.extensions = Some(extensions.with_namespace(namespace, value)?);
        Ok(self)
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldConfigRecord {
    sql_column: Option<String>,
    sql_expr: Option<SqlFragment>,
    sql_join: Option<SqlFragment>,
    sql_batch: Option<BatchKeys>,
    sql_deps: Option<ColumnList>,
    #[serde(rename = "where")]
    filter: Option<SqlFragment>,
    extensions: Option<Extensions<FieldDirectives>>,
}

impl From<FieldConfigRecord> for FieldConfig {
    fn from(record: FieldConfigRecord) -> Self {
        let FieldConfigRecord {
            sql_column,
            sql_expr,
            sql_join,
            sql_batch,
            sql_deps,
            filter,
            extensions,
        } = record;

        FieldConfig {
            directives: FieldDirectives {
                sql_column,
                sql_expr,
                sql_join,
                sql_batch,
                sql_deps,
                filter,
            },
            extensions,
        }
    }
}
