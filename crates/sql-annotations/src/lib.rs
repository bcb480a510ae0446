//! Attaches SQL query-planning metadata to the types and fields of a GraphQL schema.
//!
//! The metadata comes from an [AnnotationConfig], keyed by type and field name, in either the
//! flat legacy shape (`sqlTable`, `sqlColumn`, ... directly on the entry) or nested under
//! `extensions.Planner`. Annotating never mutates the [Schema]: [annotate] returns a new
//! [AnnotatedSchema] whose lookups resolve both shapes to the same effective values.

mod annotate;
mod annotated;
mod annotations;
mod config;
mod directives;
mod error;
mod extensions;
mod fragment;
mod schema;

pub use annotate::{annotate, validate};
pub use annotated::{AnnotatedField, AnnotatedSchema, AnnotatedType};
pub use annotations::{Annotations, Convention, FieldAnnotation, TypeAnnotation};
pub use config::{AnnotationConfig, FieldConfig, TypeConfig};
pub use directives::{BatchKeys, ColumnList, FieldDirective, FieldDirectives, Merge, TypeDirectives, TypeResolver};
pub use error::{AnnotationError, ConfigError, SchemaError, TemplateError};
pub use extensions::{Extensions, PLANNER_NAMESPACE};
pub use fragment::{FragmentContext, SqlCallback, SqlFragment, SqlTemplate};
pub use schema::{FieldDefinition, Schema, SchemaBuilder, TypeDefinition, TypeKind};
