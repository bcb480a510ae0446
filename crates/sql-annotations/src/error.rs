use std::path::PathBuf;

/// A configuration entry references a schema element that does not exist.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Type with name {type_name} not found in schema.")]
    TypeNotFound { type_name: String },
    #[error("Field \"{field_name}\" not found in type \"{type_name}\".")]
    FieldNotFound { type_name: String, field_name: String },
}

impl AnnotationError {
    pub(crate) fn type_not_found(type_name: &str) -> Self {
        AnnotationError::TypeNotFound {
            type_name: type_name.to_owned(),
        }
    }

    pub(crate) fn field_not_found(type_name: &str, field_name: &str) -> Self {
        AnnotationError::FieldNotFound {
            type_name: type_name.to_owned(),
            field_name: field_name.to_owned(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not read annotation config at '{}': {err}", path.display())]
    Io { path: PathBuf, err: std::io::Error },
    #[error("Invalid TOML annotation config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid JSON annotation config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported annotation config format at '{}', expected a .toml or .json file", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Invalid Planner extension: {0}")]
    Planner(serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Could not parse the schema: {0}")]
    Parse(String),
    #[error("Type '{name}' is defined more than once")]
    DuplicateType { name: String },
    #[error("Field '{type_name}.{field_name}' is defined more than once")]
    DuplicateField { type_name: String, field_name: String },
    #[error("Cannot extend type '{name}', it is not defined")]
    UnknownExtendedType { name: String },
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Syntax(#[from] ramhorns::Error),
    #[error("Section '{name}' is never closed")]
    UnclosedSection { name: String },
    #[error("Unknown placeholder '{name}', expected one of table, parent, child or args.<name>")]
    UnknownPlaceholder { name: String },
    #[error("Unsupported tag '{tag}'")]
    UnsupportedTag { tag: String },
}
