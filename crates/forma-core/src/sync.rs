//! Table Synchronizer: reconciliación aditiva de tablas dinámicas.
//!
//! Estados por esquema: `Absent` -> `Consistent` (CREATE) y
//! `Drifted` -> `Consistent` (ADD COLUMN por cada campo sin columna). Nunca se
//! elimina ni se cambia el tipo de una columna. El DDL contra una misma tabla
//! se serializa con un mutex por tabla; el catálogo Postgres además toma un
//! advisory lock dentro de la transacción.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use forma_domain::Schema;
use log::{debug, info};
use serde::Serialize;

use crate::backend::TableCatalog;
use crate::ddl::{SyncPlan, TableDefinition};
use crate::errors::EngineError;
use crate::registry::{fingerprint, TableHandle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    Absent,
    Consistent,
    Drifted { missing_columns: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    ColumnsAdded(Vec<String>),
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub table: String,
    pub action: SyncAction,
    /// Sentencias efectivamente emitidas (vacío si no hubo cambios).
    pub ddl: Vec<String>,
    /// Columnas de la tabla sin campo en el esquema. Sólo informativo.
    pub orphaned_columns: Vec<String>,
}

pub struct TableSynchronizer<C: ?Sized> {
    catalog: Arc<C>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// tabla -> huella del último esquema sincronizado con éxito
    synced: DashMap<String, String>,
}

impl<C: TableCatalog + ?Sized> TableSynchronizer<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog,
               locks: DashMap::new(),
               synced: DashMap::new() }
    }

    fn table_lock(&self, table: &str) -> Arc<Mutex<()>> {
        self.locks.entry(table.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub fn state(&self, schema: &Schema) -> Result<SyncState, EngineError> {
        let table = schema.table_name();
        let existing = self.catalog.table_columns(&table)?;
        Ok(match SyncPlan::plan(schema, existing.as_deref()) {
            SyncPlan::Create(_) => SyncState::Absent,
            SyncPlan::Noop { .. } => SyncState::Consistent,
            SyncPlan::AddColumns { columns, .. } => {
                SyncState::Drifted { missing_columns: columns.into_iter().map(|c| c.name).collect() }
            }
        })
    }

    /// Lleva la tabla a `Consistent`. Idempotente: una segunda llamada sin
    /// cambios en el esquema no emite DDL.
    pub fn sync(&self, schema: &Schema) -> Result<SyncReport, EngineError> {
        let table = schema.table_name();
        let lock = self.table_lock(&table);
        let _guard = lock.lock().map_err(|_| EngineError::lock_poisoned("table sync"))?;

        let existing = self.catalog.table_columns(&table)?;
        let plan = SyncPlan::plan(schema, existing.as_deref());
        let orphaned_columns = existing.as_deref().map(|cols| orphaned(schema, cols)).unwrap_or_default();
        let action = match &plan {
            SyncPlan::Create(_) => SyncAction::Created,
            SyncPlan::AddColumns { columns, .. } => SyncAction::ColumnsAdded(columns.iter().map(|c| c.name.clone()).collect()),
            SyncPlan::Noop { .. } => SyncAction::Unchanged,
        };
        debug!("sync:plan table={table} action={action:?}");
        let ddl = if plan.is_noop() { Vec::new() } else { self.catalog.apply(&plan)? };
        if !orphaned_columns.is_empty() {
            info!("sync:orphaned table={table} columns={orphaned_columns:?}");
        }
        self.synced.insert(table.clone(), fingerprint(schema));
        Ok(SyncReport { table,
                        action,
                        ddl,
                        orphaned_columns })
    }

    /// Sincroniza sólo si la forma del handle no se sincronizó antes en este
    /// proceso. Usado antes de escribir filas.
    pub fn ensure(&self, handle: &TableHandle) -> Result<Option<SyncReport>, EngineError> {
        if self.synced.get(&handle.table).is_some_and(|fp| *fp == handle.fingerprint) {
            return Ok(None);
        }
        self.sync(&handle.schema).map(Some)
    }

    /// Crea la tabla sólo si no existe; nunca altera una existente.
    pub fn create_table_if_missing(&self, schema: &Schema) -> Result<SyncReport, EngineError> {
        let table = schema.table_name();
        let lock = self.table_lock(&table);
        let _guard = lock.lock().map_err(|_| EngineError::lock_poisoned("table sync"))?;

        if let Some(cols) = self.catalog.table_columns(&table)? {
            debug!("sync:create_skip table={table}");
            return Ok(SyncReport { orphaned_columns: orphaned(schema, &cols),
                                   table,
                                   action: SyncAction::Unchanged,
                                   ddl: Vec::new() });
        }
        let ddl = self.catalog.apply(&SyncPlan::Create(TableDefinition::for_schema(schema)))?;
        Ok(SyncReport { table,
                        action: SyncAction::Created,
                        ddl,
                        orphaned_columns: Vec::new() })
    }
}

fn orphaned(schema: &Schema, existing: &[String]) -> Vec<String> {
    let expected: HashSet<String> = TableDefinition::for_schema(schema).column_names().into_iter().collect();
    existing.iter().filter(|c| !expected.contains(*c)).cloned().collect()
}
