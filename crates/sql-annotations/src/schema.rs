mod sdl;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::SchemaError;

/// The structural GraphQL schema: a type registry and, per type, a field registry.
///
/// A schema is built once and never modified by the annotation pass. Metadata lives in
/// [crate::Annotations] and is composed with the schema by [crate::AnnotatedSchema].
#[derive(Clone, Debug, Default)]
pub struct Schema {
    types: IndexMap<String, TypeDefinition>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Instantiate a [Schema] from a GraphQL type system document.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        sdl::from_sdl(sdl)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDefinition>,
}

impl SchemaBuilder {
    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        self.types.push(definition);
        self
    }

    pub fn push_type(&mut self, definition: TypeDefinition) {
        self.types.push(definition);
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut types = IndexMap::with_capacity(self.types.len());

        for definition in self.types {
            if types.contains_key(&definition.name) {
                return Err(SchemaError::DuplicateType { name: definition.name });
            }
            types.insert(definition.name.clone(), definition);
        }

        Ok(Schema { types })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    InputObject,
    Enum,
    Scalar,
}

#[derive(Clone, Debug)]
pub struct TypeDefinition {
    name: String,
    kind: TypeKind,
    fields: IndexMap<String, FieldDefinition>,
    /// Extension data attached by whoever built the schema, keyed by namespace.
    extensions: Map<String, Value>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        TypeDefinition {
            name: name.into(),
            kind,
            fields: IndexMap::new(),
            extensions: Map::new(),
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Adds a field, replacing any field with the same name.
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_extension(mut self, namespace: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(namespace.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    pub(crate) fn insert_field(&mut self, field: FieldDefinition) -> Result<(), SchemaError> {
        if self.fields.contains_key(&field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: self.name.clone(),
                field_name: field.name,
            });
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FieldDefinition {
    name: String,
    ty: String,
    extensions: Map<String, Value>,
}

impl FieldDefinition {
    /// `ty` is the GraphQL type reference as written in SDL, e.g. `[Post!]!`.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        FieldDefinition {
            name: name.into(),
            ty: ty.into(),
            extensions: Map::new(),
        }
    }

    pub fn with_extension(mut self, namespace: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(namespace.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}
