use thiserror::Error;

use crate::FieldKind;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("'{property}' is not a property of {schema}")]
    InvalidProperty {
        schema: &'static str,
        property: String,
    },
    #[error("{schema}.{property} must be {expected}, found {found}")]
    InvalidValue {
        schema: &'static str,
        property: String,
        expected: FieldKind,
        found: &'static str,
    },
    #[error("{schema}.{property} is required")]
    MissingProperty {
        schema: &'static str,
        property: &'static str,
    },
    #[error("{schema} must be imported from an object, found {found}")]
    NotAnObject {
        schema: &'static str,
        found: &'static str,
    },
    #[error("pagination {field} must be at least {minimum}, got {value}")]
    InvalidPagination {
        field: &'static str,
        minimum: i64,
        value: i64,
    },
    #[error("failed to encode {schema}: {source}")]
    Encode {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
