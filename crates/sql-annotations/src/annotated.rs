use std::sync::Arc;

use serde_json::Value;

use crate::{
    AnnotationConfig, AnnotationError, Annotations, BatchKeys, ColumnList, Convention, FieldAnnotation,
    FieldDefinition, FieldDirectives, Merge, Schema, SqlFragment, TypeAnnotation, TypeDefinition, TypeDirectives,
    TypeKind, TypeResolver,
};

/// A structural schema together with the planner metadata attached to it.
///
/// Snapshots are cheap to clone and never change: annotating returns a new snapshot sharing
/// the same [Schema].
#[derive(Clone, Debug, Default)]
pub struct AnnotatedSchema {
    schema: Arc<Schema>,
    annotations: Arc<Annotations>,
}

impl From<Schema> for AnnotatedSchema {
    fn from(schema: Schema) -> Self {
        AnnotatedSchema::new(schema)
    }
}

impl AnnotatedSchema {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        AnnotatedSchema {
            schema: schema.into(),
            annotations: Default::default(),
        }
    }

    pub(crate) fn with_annotations(&self, annotations: Annotations) -> Self {
        AnnotatedSchema {
            schema: self.schema.clone(),
            annotations: Arc::new(annotations),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// See [crate::annotate].
    pub fn annotate(&self, config: &AnnotationConfig) -> Result<AnnotatedSchema, AnnotationError> {
        crate::annotate(self, config)
    }

    pub fn ty(&self, name: &str) -> Option<AnnotatedType<'_>> {
        let definition = self.schema.get(name)?;
        Some(AnnotatedType {
            definition,
            annotation: self.annotations.get(name),
        })
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<AnnotatedField<'_>> {
        self.ty(type_name)?.field(field_name)
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = AnnotatedType<'_>> {
        self.schema.types().map(|definition| AnnotatedType {
            definition,
            annotation: self.annotations.get(definition.name()),
        })
    }
}

/// A type definition seen through its annotation. Accessors return the effective value: the
/// `Planner` extension wins over the flat key.
#[derive(Clone, Copy, Debug)]
pub struct AnnotatedType<'a> {
    definition: &'a TypeDefinition,
    annotation: Option<&'a TypeAnnotation>,
}

impl<'a> AnnotatedType<'a> {
    pub fn name(&self) -> &'a str {
        self.definition.name()
    }

    pub fn kind(&self) -> TypeKind {
        self.definition.kind()
    }

    pub fn definition(&self) -> &'a TypeDefinition {
        self.definition
    }

    pub fn annotation(&self) -> Option<&'a TypeAnnotation> {
        self.annotation
    }

    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = AnnotatedField<'a>> + 'a {
        let annotation = self.annotation;
        self.definition.fields().map(move |definition| AnnotatedField {
            definition,
            annotation: annotation.and_then(|annotation| annotation.field(definition.name())),
        })
    }

    pub fn field(&self, name: &str) -> Option<AnnotatedField<'a>> {
        let definition = self.definition.field(name)?;
        Some(AnnotatedField {
            definition,
            annotation: self.annotation.and_then(|annotation| annotation.field(name)),
        })
    }

    pub fn sql_table(&self) -> Option<&'a str> {
        self.lookup(|directives| directives.sql_table.as_deref())
    }

    pub fn unique_key(&self) -> Option<&'a ColumnList> {
        self.lookup(|directives| directives.unique_key.as_ref())
    }

    pub fn always_fetch(&self) -> Option<&'a ColumnList> {
        self.lookup(|directives| directives.always_fetch.as_ref())
    }

    pub fn type_hint(&self) -> Option<&'a str> {
        self.lookup(|directives| directives.type_hint.as_deref())
    }

    pub fn resolve_type(&self) -> Option<&'a TypeResolver> {
        self.lookup(|directives| directives.resolve_type.as_ref())
    }

    pub fn planner(&self) -> Option<&'a TypeDirectives> {
        self.annotation?.extensions.planner.as_ref()
    }

    /// An opaque extension namespace, from the annotation or, for a type that was never
    /// annotated, from the schema builder.
    pub fn extension(&self, namespace: &str) -> Option<&'a Value> {
        match self.annotation {
            Some(annotation) => annotation.extensions.namespace(namespace),
            None => self.definition.extensions().get(namespace),
        }
    }

    pub fn convention(&self) -> Option<Convention> {
        self.annotation?.convention()
    }

    /// Flat directives with the planner extension applied on top.
    pub fn effective_directives(&self) -> TypeDirectives {
        let Some(annotation) = self.annotation else {
            return TypeDirectives::default();
        };

        let mut directives = annotation.directives.clone();
        if let Some(planner) = &annotation.extensions.planner {
            directives.merge(planner);
        }
        directives
    }

    fn lookup<T: ?Sized>(&self, get: impl Fn(&'a TypeDirectives) -> Option<&'a T>) -> Option<&'a T> {
        let annotation = self.annotation?;
        annotation
            .extensions
            .planner
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&annotation.directives))
    }
}

/// A field definition seen through its annotation, with the same precedence as
/// [AnnotatedType].
#[derive(Clone, Copy, Debug)]
pub struct AnnotatedField<'a> {
    definition: &'a FieldDefinition,
    annotation: Option<&'a FieldAnnotation>,
}

impl<'a> AnnotatedField<'a> {
    pub fn name(&self) -> &'a str {
        self.definition.name()
    }

    pub fn ty(&self) -> &'a str {
        self.definition.ty()
    }

    pub fn definition(&self) -> &'a FieldDefinition {
        self.definition
    }

    pub fn annotation(&self) -> Option<&'a FieldAnnotation> {
        self.annotation
    }

    pub fn sql_column(&self) -> Option<&'a str> {
        self.lookup(|directives| directives.sql_column.as_deref())
    }

    pub fn sql_expr(&self) -> Option<&'a SqlFragment> {
        self.lookup(|directives| directives.sql_expr.as_ref())
    }

    pub fn sql_join(&self) -> Option<&'a SqlFragment> {
        self.lookup(|directives| directives.sql_join.as_ref())
    }

    pub fn sql_batch(&self) -> Option<&'a BatchKeys> {
        self.lookup(|directives| directives.sql_batch.as_ref())
    }

    pub fn sql_deps(&self) -> Option<&'a ColumnList> {
        self.lookup(|directives| directives.sql_deps.as_ref())
    }

    pub fn filter(&self) -> Option<&'a SqlFragment> {
        self.lookup(|directives| directives.filter.as_ref())
    }

    pub fn planner(&self) -> Option<&'a FieldDirectives> {
        self.annotation?.extensions.planner.as_ref()
    }

    pub fn extension(&self, namespace: &str) -> Option<&'a Value> {
        match self.annotation {
            Some(annotation) => annotation.extensions.namespace(namespace),
            None => self.definition.extensions().get(namespace),
        }
    }

    pub fn effective_directives(&self) -> FieldDirectives {
        let Some(annotation) = self.annotation else {
            return FieldDirectives::default();
        };

        let mut directives = annotation.directives.clone();
        if let Some(planner) = &annotation.extensions.planner {
            directives.merge(planner);
        }
        directives
    }

    fn lookup<T: ?Sized>(&self, get: impl Fn(&'a FieldDirectives) -> Option<&'a T>) -> Option<&'a T> {
        let annotation = self.annotation?;
        annotation
            .extensions
            .planner
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&annotation.directives))
    }
}
