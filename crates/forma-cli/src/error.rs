//! Errores de la CLI y su código de salida.

use std::path::PathBuf;

use forma_adapters::AdapterError;
use forma_core::{EngineError, ErrorKind, ErrorPayload};
use forma_persistence::PersistenceError;
use thiserror::Error;

pub const EXIT_USAGE: i32 = 2;
pub const EXIT_INPUT: i32 = 3;
pub const EXIT_NOT_FOUND: i32 = 4;
pub const EXIT_STORAGE: i32 = 5;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io { path: path.into(),
                       source }
    }

    pub fn payload(&self) -> ErrorPayload {
        let plain = |kind| ErrorPayload { kind,
                                          message: self.to_string(),
                                          fields: Vec::new() };
        match self {
            CliError::Engine(e) => e.payload(),
            CliError::Adapter(e) => e.payload(),
            CliError::Persistence(_) => plain(ErrorKind::StorageError),
            CliError::Usage(_) => plain(ErrorKind::InvalidDefinition),
            CliError::Io { .. } | CliError::Json(_) => plain(ErrorKind::SerializationError),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if let CliError::Usage(_) = self {
            return EXIT_USAGE;
        }
        match self.payload().kind {
            ErrorKind::SchemaNotFound => EXIT_NOT_FOUND,
            ErrorKind::StorageError => EXIT_STORAGE,
            ErrorKind::UnsupportedFieldType
            | ErrorKind::ValidationError
            | ErrorKind::UnknownField
            | ErrorKind::InvalidDefinition
            | ErrorKind::SerializationError => EXIT_INPUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), EXIT_USAGE);
        assert_eq!(CliError::from(EngineError::SchemaNotFound("s".into())).exit_code(), EXIT_NOT_FOUND);
        assert_eq!(CliError::from(EngineError::Storage("down".into())).exit_code(), EXIT_STORAGE);
        assert_eq!(CliError::from(PersistenceError::TransientIo("pool".into())).exit_code(), EXIT_STORAGE);
        assert_eq!(CliError::from(AdapterError::Format("bad".into())).exit_code(), EXIT_INPUT);
    }

    #[test]
    fn io_errors_are_input_errors() {
        let err = CliError::io("missing.json", std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.payload().message.contains("missing.json"));
    }
}
