use std::fmt;

use crate::value::ValueKind;

/// Error raised by generated field setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// No queryable field with that name.
    Unknown { collection: String, field: String },
    /// The value does not fit the field's type.
    TypeMismatch {
        field: String,
        expected: ValueKind,
        found: Option<ValueKind>,
    },
    /// The field cannot be written (the identifier).
    Immutable { field: String },
    /// NaN or an infinity in a float field. Such values cannot be stored.
    NotFinite { field: String },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Unknown { collection, field } => {
                write!(f, "unknown field {} on {}", field, collection)
            }
            FieldError::TypeMismatch {
                field,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "field {} expects {} but got {}",
                    field, expected, found
                ),
                None => write!(f, "field {} expects {} but got null", field, expected),
            },
            FieldError::Immutable { field } => write!(f, "field {} is immutable", field),
            FieldError::NotFinite { field } => {
                write!(f, "field {} must hold a finite number", field)
            }
        }
    }
}

impl std::error::Error for FieldError {}
