//! Errores del motor y su forma estructurada hacia el exterior.
//!
//! Toda falla que cruza la frontera externa se reporta como `ErrorPayload`
//! (`kind` + `message`), nunca como el error interno.

use std::fmt;

use forma_domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Falla de validación de un campo concreto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FieldError { field: field.into(),
                                      reason: reason.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut out = Self::default();
        out.push(field, reason);
        out
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| format!("{}: {}", e.field, e.reason)).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
    #[error("unsupported field type '{0}'")]
    UnsupportedFieldType(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("record #{index} rejected: {errors}")]
    RecordRejected { index: usize, errors: ValidationErrors },
    #[error("unknown field '{field}' for schema '{schema}'")]
    UnknownField { schema: String, field: String },
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Clasificación estable para la capa externa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SchemaNotFound,
    UnsupportedFieldType,
    ValidationError,
    UnknownField,
    InvalidDefinition,
    StorageError,
    SerializationError,
}

/// Carga estructurada de error (lo único que ve el llamador externo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::SchemaNotFound(_) => ErrorKind::SchemaNotFound,
            EngineError::UnsupportedFieldType(_) => ErrorKind::UnsupportedFieldType,
            EngineError::Validation(_) | EngineError::RecordRejected { .. } => ErrorKind::ValidationError,
            EngineError::UnknownField { .. } => ErrorKind::UnknownField,
            EngineError::InvalidDefinition(_) => ErrorKind::InvalidDefinition,
            EngineError::Storage(_) => ErrorKind::StorageError,
            EngineError::Serialization(_) => ErrorKind::SerializationError,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let fields = match self {
            EngineError::Validation(v) | EngineError::RecordRejected { errors: v, .. } => v.errors.clone(),
            _ => Vec::new(),
        };
        ErrorPayload { kind: self.kind(),
                       message: self.to_string(),
                       fields }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        EngineError::Storage(format!("{what} lock poisoned"))
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnsupportedFieldType(t) => EngineError::UnsupportedFieldType(t),
            other => EngineError::InvalidDefinition(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
