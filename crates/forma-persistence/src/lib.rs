//! forma-persistence
//!
//! Implementaciones Postgres (Diesel + r2d2) de los traits del motor:
//! `SchemaStore` sobre las tablas de catálogo `forma_schemas` /
//! `forma_schema_fields`, y `TableCatalog` + `RecordStore` sobre las tablas
//! dinámicas. Paridad 1:1 con los backends en memoria de `forma-core`.
//!
//! Módulos:
//! - `pg`: pool, proveedor de conexiones, reintentos y los backends.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel del catálogo.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgBackend, PgPool, PgSchemaStore, PoolProvider};
