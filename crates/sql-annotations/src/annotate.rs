use crate::{
    AnnotatedSchema, AnnotationConfig, AnnotationError, Convention, Merge, Schema, TypeConfig, TypeDefinition,
};

/// Attaches the metadata of `config` to the types and fields of `schema`.
///
/// Configured keys overwrite existing ones, keys the configuration doesn't mention are kept.
/// Extension namespaces are merged the same way. Fails on the first configuration entry that
/// doesn't match the schema, in which case `schema` is left as it was.
pub fn annotate(schema: &AnnotatedSchema, config: &AnnotationConfig) -> Result<AnnotatedSchema, AnnotationError> {
    let _span = tracing::debug_span!("annotate", types = config.len()).entered();

    let mut annotations = schema.annotations().clone();

    for (type_name, type_config) in config.types() {
        let definition = schema
            .schema()
            .get(type_name)
            .ok_or_else(|| AnnotationError::type_not_found(type_name))?;

        let annotation = annotations.entry(definition);
        annotation.directives.merge(&type_config.directives);
        if let Some(extensions) = &type_config.extensions {
            annotation.extensions.merge(extensions);
        }

        for (field_name, field_config) in &type_config.fields {
            let field = definition
                .field(field_name)
                .ok_or_else(|| AnnotationError::field_not_found(type_name, field_name))?;

            let field_annotation = annotation.field_entry(field);
            field_annotation.directives.merge(&field_config.directives);
            if let Some(extensions) = &field_config.extensions {
                field_annotation.extensions.merge(extensions);
            }

            tracing::trace!(
                type_name,
                field = field_name,
                directives = ?field_config.directives.iter().map(|directive| directive.key()).collect::<Vec<_>>(),
                "annotated field"
            );
        }

        if let Some(missing) = resolved_types(type_config).find(|name| !schema.schema().contains(name)) {
            return Err(AnnotationError::type_not_found(missing));
        }

        let detected = Convention::detect(type_config.uses_flat_keys(), type_config.uses_extensions());
        annotation.convention = Convention::combine(annotation.convention, detected);

        tracing::debug!(
            type_name,
            fields = type_config.fields.len(),
            convention = ?annotation.convention,
            "annotated type"
        );
    }

    Ok(schema.with_annotations(annotations))
}

/// Checks `config` against `schema` without annotating anything, reporting every entry that
/// references a missing type or field.
pub fn validate(schema: &Schema, config: &AnnotationConfig) -> Vec<AnnotationError> {
    let mut errors = Vec::new();

    for (type_name, type_config) in config.types() {
        match schema.get(type_name) {
            Some(definition) => validate_fields(definition, type_config, &mut errors),
            None => errors.push(AnnotationError::type_not_found(type_name)),
        }

        errors.extend(
            resolved_types(type_config)
                .filter(|name| !schema.contains(name))
                .map(AnnotationError::type_not_found),
        );
    }

    errors
}

fn validate_fields(definition: &TypeDefinition, config: &TypeConfig, errors: &mut Vec<AnnotationError>) {
    errors.extend(
        config
            .fields
            .keys()
            .filter(|name| definition.field(name).is_none())
            .map(|name| AnnotationError::field_not_found(definition.name(), name)),
    );
}

/// Concrete types named by the `resolveType` mappings of a type entry, flat and namespaced.
fn resolved_types(config: &TypeConfig) -> impl Iterator<Item = &str> {
    let namespaced = config
        .extensions
        .as_ref()
        .and_then(|extensions| extensions.planner.as_ref())
        .and_then(|planner| planner.resolve_type.as_ref());

    config
        .directives
        .resolve_type
        .iter()
        .chain(namespaced)
        .flat_map(|resolver| resolver.target_types())
}
