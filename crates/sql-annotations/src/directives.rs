mod columns;

pub use columns::ColumnList;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::SqlFragment;

/// Shallow, key-wise merge: every key present in `other` overwrites the same key in `self`,
/// keys absent from `other` are left untouched.
pub trait Merge {
    fn merge(&mut self, other: &Self);
}

fn overwrite<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

/// Planner metadata attached to a type.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeDirectives {
    /// Table name, or a parenthesised sub-select.
    pub sql_table: Option<String>,
    pub unique_key: Option<ColumnList>,
    /// Columns fetched even when no requested field depends on them.
    pub always_fetch: Option<ColumnList>,
    pub type_hint: Option<String>,
    pub resolve_type: Option<TypeResolver>,
}

impl TypeDirectives {
    pub fn is_empty(&self) -> bool {
        let TypeDirectives {
            sql_table,
            unique_key,
            always_fetch,
            type_hint,
            resolve_type,
        } = self;

        sql_table.is_none()
            && unique_key.is_none()
            && always_fetch.is_none()
            && type_hint.is_none()
            && resolve_type.is_none()
    }
}

impl Merge for TypeDirectives {
    fn merge(&mut self, other: &Self) {
        overwrite(&mut self.sql_table, &other.sql_table);
        overwrite(&mut self.unique_key, &other.unique_key);
        overwrite(&mut self.always_fetch, &other.always_fetch);
        overwrite(&mut self.type_hint, &other.type_hint);
        overwrite(&mut self.resolve_type, &other.resolve_type);
    }
}

/// Planner metadata attached to a field. See [FieldDirective] for the meaning of each entry.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDirectives {
    pub sql_column: Option<String>,
    pub sql_expr: Option<SqlFragment>,
    pub sql_join: Option<SqlFragment>,
    pub sql_batch: Option<BatchKeys>,
    pub sql_deps: Option<ColumnList>,
    #[serde(rename = "where")]
    pub filter: Option<SqlFragment>,
}

impl FieldDirectives {
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldDirective<'_>> {
        let FieldDirectives {
            sql_column,
            sql_expr,
            sql_join,
            sql_batch,
            sql_deps,
            filter,
        } = self;

        [
            sql_column.as_deref().map(FieldDirective::Column),
            sql_expr.as_ref().map(FieldDirective::Expression),
            sql_join.as_ref().map(FieldDirective::Join),
            sql_batch.as_ref().map(FieldDirective::Batch),
            sql_deps.as_ref().map(FieldDirective::Dependencies),
            filter.as_ref().map(FieldDirective::Where),
        ]
        .into_iter()
        .flatten()
    }
}

impl Merge for FieldDirectives {
    fn merge(&mut self, other: &Self) {
        overwrite(&mut self.sql_column, &other.sql_column);
        overwrite(&mut self.sql_expr, &other.sql_expr);
        overwrite(&mut self.sql_join, &other.sql_join);
        overwrite(&mut self.sql_batch, &other.sql_batch);
        overwrite(&mut self.sql_deps, &other.sql_deps);
        overwrite(&mut self.filter, &other.filter);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldDirective<'a> {
    /// The field maps to this column of its parent's table.
    Column(&'a str),
    /// The field is computed by an SQL expression over its parent's table alias.
    Expression(&'a SqlFragment),
    /// The field's type is fetched by joining on the predicate generated from the parent and
    /// child table aliases.
    Join(&'a SqlFragment),
    /// The field's type is fetched in a separate batch query.
    Batch(&'a BatchKeys),
    /// Columns the field's resolver needs from its parent's row.
    Dependencies(&'a ColumnList),
    /// Filter predicate applied to the field's table.
    Where(&'a SqlFragment),
}

impl FieldDirective<'_> {
    /// The configuration key of this directive.
    pub fn key(&self) -> &'static str {
        match self {
            FieldDirective::Column(_) => "sqlColumn",
            FieldDirective::Expression(_) => "sqlExpr",
            FieldDirective::Join(_) => "sqlJoin",
            FieldDirective::Batch(_) => "sqlBatch",
            FieldDirective::Dependencies(_) => "sqlDeps",
            FieldDirective::Where(_) => "where",
        }
    }
}

/// Key pair for batch fetching: rows of the child table whose `this_key` matches the parent's
/// `parent_key`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchKeys {
    pub this_key: String,
    pub parent_key: String,
}

impl BatchKeys {
    pub fn new(this_key: impl Into<String>, parent_key: impl Into<String>) -> Self {
        BatchKeys {
            this_key: this_key.into(),
            parent_key: parent_key.into(),
        }
    }
}

/// Determines the concrete type of a row fetched for an interface or a union.
///
/// The value of `column` names the type, optionally through the `values` mapping.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeResolver {
    pub column: String,
    #[serde(default)]
    pub values: IndexMap<String, String>,
}

impl TypeResolver {
    pub fn new(column: impl Into<String>) -> Self {
        TypeResolver {
            column: column.into(),
            values: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.values.insert(value.into(), type_name.into());
        self
    }

    pub fn resolve<'a>(&'a self, row: &'a Map<String, Value>) -> Option<&'a str> {
        let value = row.get(&self.column)?.as_str()?;
        Some(self.values.get(value).map(String::as_str).unwrap_or(value))
    }

    /// Type names explicitly referenced by the mapping.
    pub fn target_types(&self) -> impl Iterator<Item = &str> {
        self.values.values().map(String::as_str)
    }
}
