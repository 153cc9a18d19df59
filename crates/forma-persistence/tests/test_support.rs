#![allow(dead_code)]

use forma_core::SchemaEngine;
use forma_persistence::config::DbConfig;
use forma_persistence::pg::{build_pool, PgBackend, PgPool, PgSchemaStore, PoolProvider};
use once_cell::sync::Lazy;

pub type PgEngine = SchemaEngine<PgSchemaStore<PoolProvider>, PgBackend<PoolProvider>>;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 2) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    TEST_POOL.as_ref().map(f)
}

/// Motor Postgres sobre el pool de test; `None` si no hay DATABASE_URL.
pub fn engine() -> Option<PgEngine> {
    with_pool(|pool| {
        let provider = PoolProvider { pool: pool.clone() };
        SchemaEngine::new(PgSchemaStore::new(provider.clone()), PgBackend::new(provider)).expect("engine")
    })
}

/// Nombre de esquema único por test (las pruebas comparten base de datos).
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}
