use thiserror::Error;

/// Errores del modelo de esquemas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported field type '{0}'")]
    UnsupportedFieldType(String),
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
    #[error("invalid bit mask: {0}")]
    InvalidBitMask(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_field_type_format() {
        let err = DomainError::UnsupportedFieldType("JsonField".into());
        assert_eq!(err.to_string(), "unsupported field type 'JsonField'");
    }

    #[test]
    fn invalid_identifier_format() {
        let err = DomainError::InvalidIdentifier { name: "1x".into(),
                                                   reason: "must start with a letter or '_'".into() };
        assert_eq!(err.to_string(), "invalid identifier '1x': must start with a letter or '_'");
    }
}
