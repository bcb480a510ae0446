use indexmap::IndexMap;

use crate::{Extensions, FieldDefinition, FieldDirectives, TypeDefinition, TypeDirectives};

/// The metadata side-table produced by the annotation pass, keyed by type name and, for
/// fields, by type and field name.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    types: IndexMap<String, TypeAnnotation>,
}

impl Annotations {
    pub fn get(&self, type_name: &str) -> Option<&TypeAnnotation> {
        self.types.get(type_name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldAnnotation> {
        self.get(type_name)?.field(field_name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &TypeAnnotation)> {
        self.types.iter().map(|(name, annotation)| (name.as_str(), annotation))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Annotation slot of `definition`, created on first use with the extensions the schema
    /// builder attached to it.
    pub(crate) fn entry(&mut self, definition: &TypeDefinition) -> &mut TypeAnnotation {
        self.types
            .entry(definition.name().to_owned())
            .or_insert_with(|| TypeAnnotation {
                extensions: Extensions::seeded(definition.extensions()),
                ..Default::default()
            })
    }
}

/// Which configuration shape was used to annotate a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    /// Flat keys directly on the type and field entries.
    Legacy,
    /// Keys nested under `extensions`.
    Namespaced,
    Mixed,
}

impl Convention {
    pub(crate) fn detect(flat: bool, namespaced: bool) -> Option<Self> {
        match (flat, namespaced) {
            (true, true) => Some(Convention::Mixed),
            (true, false) => Some(Convention::Legacy),
            (false, true) => Some(Convention::Namespaced),
            (false, false) => None,
        }
    }

    pub(crate) fn combine(current: Option<Self>, detected: Option<Self>) -> Option<Self> {
        match (current, detected) {
            (None, detected) => detected,
            (current, None) => current,
            (Some(current), Some(detected)) if current == detected => Some(current),
            (Some(_), Some(_)) => Some(Convention::Mixed),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TypeAnnotation {
    pub directives: TypeDirectives,
    pub extensions: Extensions<TypeDirectives>,
    pub(crate) fields: IndexMap<String, FieldAnnotation>,
    pub(crate) convention: Option<Convention>,
}

impl TypeAnnotation {
    pub fn field(&self, name: &str) -> Option<&FieldAnnotation> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = (&str, &FieldAnnotation)> {
        self.fields.iter().map(|(name, annotation)| (name.as_str(), annotation))
    }

    /// `None` when only empty entries were ever applied to the type.
    pub fn convention(&self) -> Option<Convention> {
        self.convention
    }

    pub(crate) fn field_entry(&mut self, definition: &FieldDefinition) -> &mut FieldAnnotation {
        self.fields
            .entry(definition.name().to_owned())
            .or_insert_with(|| FieldAnnotation {
                extensions: Extensions::seeded(definition.extensions()),
                ..Default::default()
            })
    }
}

#[derive(Clone, Debug, Default)]
pub struct FieldAnnotation {
    pub directives: FieldDirectives,
    pub extensions: Extensions<FieldDirectives>,
}
