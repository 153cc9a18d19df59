//! FormaFlow
//!
//! Fachada del motor de esquemas dinámicos:
//! - Re-exporta los crates del workspace (`domain`, `core`, `adapters`,
//!   `persistence`).
//! - `open_in_memory` / `open_postgres_from_env` arman un `SchemaEngine` listo
//!   para usar.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub use forma_adapters as adapters;
pub use forma_core as core;
pub use forma_domain as domain;
pub use forma_persistence as persistence;

pub use forma_core::{EngineError, ErrorPayload, InMemoryEngine, PipelineConfig, SchemaEngine, Submission};
pub use forma_domain::{FieldDraft, FieldType, FieldValue, Record, Schema};

use forma_core::{InMemoryBackend, InMemorySchemaStore};
use forma_persistence::{build_pool, DbConfig, PgBackend, PgSchemaStore, PoolProvider};

/// Motor respaldado por Postgres.
pub type PgEngine = SchemaEngine<PgSchemaStore<PoolProvider>, PgBackend<PoolProvider>>;

pub fn open_in_memory() -> Result<InMemoryEngine, EngineError> {
    InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new())
}

/// Construye el pool (corre migraciones) y reconstruye el registro de modelos.
pub fn open_postgres(cfg: &DbConfig) -> Result<PgEngine, EngineError> {
    let pool = build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)?;
    let provider = PoolProvider { pool };
    SchemaEngine::new(PgSchemaStore::new(provider.clone()), PgBackend::new(provider))
}

/// Igual que `open_postgres` con la configuración de `.env` / entorno.
pub fn open_postgres_from_env() -> Result<PgEngine, EngineError> {
    let cfg = DbConfig::from_env()?;
    open_postgres(&cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_engine_starts_empty() {
        let engine = open_in_memory().unwrap();
        assert!(engine.list_schemas().unwrap().is_empty());
        assert!(engine.registry().names().unwrap().is_empty());
    }
}
