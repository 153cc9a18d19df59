//! Errores de la capa de adaptación.

use forma_core::{EngineError, ErrorKind, ErrorPayload};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Documento con forma inesperada (no es el error de un campo concreto).
    #[error("invalid document: {0}")]
    Format(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn payload(&self) -> ErrorPayload {
        match self {
            AdapterError::Engine(e) => e.payload(),
            AdapterError::Format(_) => ErrorPayload { kind: ErrorKind::InvalidDefinition,
                                                      message: self.to_string(),
                                                      fields: Vec::new() },
            AdapterError::Json(_) => ErrorPayload { kind: ErrorKind::SerializationError,
                                                    message: self.to_string(),
                                                    fields: Vec::new() },
        }
    }
}
