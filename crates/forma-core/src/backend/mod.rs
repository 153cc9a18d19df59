//! Traits de almacenamiento de tablas dinámicas.
//!
//! `TableCatalog` cubre el catálogo vivo y el DDL; `RecordStore` las filas.
//! Las implementaciones en memoria y Postgres deben mantener paridad 1:1.

mod memory;

pub use memory::InMemoryBackend;

use forma_domain::{FieldValue, Record, Schema};
use indexmap::IndexMap;

use crate::ddl::SyncPlan;
use crate::errors::EngineError;

/// Valores por columna, en orden de esquema.
pub type RowValues = IndexMap<String, FieldValue>;

/// Operador de comparación de una condición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Textos sin distinguir mayúsculas; el resto por igualdad tipada.
    IExact,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: FieldValue,
    pub op: Match,
}

impl Condition {
    pub fn iexact(field: impl Into<String>, value: FieldValue) -> Self {
        Self { field: field.into(),
               value,
               op: Match::IExact }
    }

    pub fn exact(field: impl Into<String>, value: FieldValue) -> Self {
        Self { field: field.into(),
               value,
               op: Match::Exact }
    }
}

pub trait TableCatalog: Send + Sync {
    fn table_exists(&self, table: &str) -> Result<bool, EngineError>;
    /// Columnas físicas en orden de creación; `None` si la tabla no existe.
    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, EngineError>;
    /// Ejecuta el plan en una transacción y devuelve las sentencias emitidas.
    fn apply(&self, plan: &SyncPlan) -> Result<Vec<String>, EngineError>;
}

/// Acceso a filas. Las lecturas devuelven los campos del esquema en su orden
/// (`Null` si la columna aún no existe) y siempre ordenadas por `id`.
/// Operar sobre una tabla inexistente es `SchemaNotFound`.
pub trait RecordStore: Send + Sync {
    fn insert(&self, schema: &Schema, values: &RowValues) -> Result<Record, EngineError>;
    /// Todo o nada: una fila fallida revierte el lote completo.
    fn insert_batch(&self, schema: &Schema, rows: &[RowValues]) -> Result<Vec<Record>, EngineError>;
    /// Sin condiciones devuelve todas las filas.
    fn select(&self, schema: &Schema, conditions: &[Condition]) -> Result<Vec<Record>, EngineError>;
    /// Actualiza las filas que cumplen las condiciones (y su `updated_at`) y las
    /// relee dentro de la misma transacción.
    fn update_matching(&self,
                       schema: &Schema,
                       conditions: &[Condition],
                       assignments: &RowValues)
                       -> Result<Vec<Record>, EngineError>;
}
