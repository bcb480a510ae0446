use cynic_parser::type_system as ast;

use super::{FieldDefinition, Schema, TypeDefinition, TypeKind};
use crate::SchemaError;

pub(super) fn from_sdl(sdl: &str) -> Result<Schema, SchemaError> {
    let document = cynic_parser::parse_type_system_document(sdl).map_err(|err| SchemaError::Parse(err.to_string()))?;

    let mut builder = Schema::builder();
    for definition in document.definitions() {
        if let ast::Definition::Type(type_definition) = definition {
            builder.push_type(ingest_type_definition(type_definition)?);
        }
    }
    let mut schema = builder.build()?;

    // Extensions may appear before the type they extend, so they are applied once every
    // definition is known.
    for definition in document.definitions() {
        if let ast::Definition::TypeExtension(type_definition) = definition {
            let name = type_definition.name();
            let Some(target) = schema.types.get_mut(name) else {
                return Err(SchemaError::UnknownExtendedType { name: name.to_owned() });
            };
            for field in fields_of(type_definition) {
                target.insert_field(field)?;
            }
        }
    }

    Ok(schema)
}

fn ingest_type_definition(type_definition: ast::TypeDefinition<'_>) -> Result<TypeDefinition, SchemaError> {
    let kind = match type_definition {
        ast::TypeDefinition::Object(_) => TypeKind::Object,
        ast::TypeDefinition::Interface(_) => TypeKind::Interface,
        ast::TypeDefinition::Union(_) => TypeKind::Union,
        ast::TypeDefinition::InputObject(_) => TypeKind::InputObject,
        ast::TypeDefinition::Enum(_) => TypeKind::Enum,
        ast::TypeDefinition::Scalar(_) => TypeKind::Scalar,
    };

    let mut definition = TypeDefinition::new(type_definition.name(), kind);
    for field in fields_of(type_definition) {
        definition.insert_field(field)?;
    }

    Ok(definition)
}

fn fields_of(type_definition: ast::TypeDefinition<'_>) -> Vec<FieldDefinition> {
    match type_definition {
        ast::TypeDefinition::Object(object) => object
            .fields()
            .map(|field| FieldDefinition::new(field.name(), render_type(field.ty())))
            .collect(),
        ast::TypeDefinition::Interface(interface) => interface
            .fields()
            .map(|field| FieldDefinition::new(field.name(), render_type(field.ty())))
            .collect(),
        ast::TypeDefinition::InputObject(input_object) => input_object
            .fields()
            .map(|field| FieldDefinition::new(field.name(), render_type(field.ty())))
            .collect(),
        ast::TypeDefinition::Union(_) | ast::TypeDefinition::Enum(_) | ast::TypeDefinition::Scalar(_) => Vec::new(),
    }
}

fn render_type(ty: ast::Type<'_>) -> String {
    use cynic_parser::common::WrappingType;

    // Wrappers are listed from the outermost to the innermost one.
    let wrappers = ty.wrappers().collect::<Vec<_>>();

    wrappers
        .into_iter()
        .rev()
        .fold(ty.name().to_owned(), |rendered, wrapper| match wrapper {
            WrappingType::NonNull => rendered + "!",
            WrappingType::List => format!("[{rendered}]"),
        })
}
