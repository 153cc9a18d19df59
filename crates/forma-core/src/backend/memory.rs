use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use forma_domain::{FieldValue, Record, Schema};
use log::info;

use super::{Condition, Match, RecordStore, RowValues, TableCatalog};
use crate::ddl::SyncPlan;
use crate::errors::EngineError;

struct MemRow {
    id: i64,
    values: HashMap<String, FieldValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemRow {
    fn matches(&self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|c| {
                             let current = self.values.get(&c.field).unwrap_or(&FieldValue::Null);
                             current.matches(&c.value, c.op == Match::IExact)
                         })
    }

    fn to_record(&self, schema: &Schema) -> Record {
        let values = schema.fields
                           .iter()
                           .map(|f| (f.name.clone(), self.values.get(&f.name).cloned().unwrap_or(FieldValue::Null)))
                           .collect();
        Record { id: Some(self.id),
                 values,
                 created_at: Some(self.created_at),
                 updated_at: Some(self.updated_at) }
    }
}

struct MemTable {
    columns: Vec<String>,
    rows: Vec<MemRow>,
    next_id: i64,
}

impl MemTable {
    fn check_columns<'a>(&self, table: &str, names: impl Iterator<Item = &'a String>) -> Result<(), EngineError> {
        for name in names {
            if !self.columns.iter().any(|c| c == name) {
                return Err(EngineError::Storage(format!("column \"{name}\" of relation \"{table}\" does not exist")));
            }
        }
        Ok(())
    }

    fn push(&mut self, values: &RowValues) -> &MemRow {
        self.next_id += 1;
        let now = Utc::now();
        self.rows.push(MemRow { id: self.next_id,
                                values: values.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                                created_at: now,
                                updated_at: now });
        &self.rows[self.rows.len() - 1]
    }
}

/// Catálogo + filas en memoria. Registra cada sentencia DDL aplicada para que
/// los tests puedan comprobar idempotencia.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, MemTable>>,
    ddl_log: Mutex<Vec<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia de todas las sentencias DDL aplicadas hasta ahora.
    pub fn ddl_log(&self) -> Vec<String> {
        self.ddl_log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn read_table<T>(&self, schema: &Schema, f: impl FnOnce(&MemTable) -> T) -> Result<T, EngineError> {
        let tables = self.tables.read().map_err(|_| EngineError::lock_poisoned("memory backend"))?;
        let table = tables.get(&schema.table_name())
                          .ok_or_else(|| EngineError::SchemaNotFound(schema.name.clone()))?;
        Ok(f(table))
    }

    fn write_table<T>(&self,
                      schema: &Schema,
                      f: impl FnOnce(&str, &mut MemTable) -> Result<T, EngineError>)
                      -> Result<T, EngineError> {
        let table_name = schema.table_name();
        let mut tables = self.tables.write().map_err(|_| EngineError::lock_poisoned("memory backend"))?;
        let table = tables.get_mut(&table_name)
                          .ok_or_else(|| EngineError::SchemaNotFound(schema.name.clone()))?;
        f(&table_name, table)
    }
}

impl TableCatalog for InMemoryBackend {
    fn table_exists(&self, table: &str) -> Result<bool, EngineError> {
        let tables = self.tables.read().map_err(|_| EngineError::lock_poisoned("memory backend"))?;
        Ok(tables.contains_key(table))
    }

    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, EngineError> {
        let tables = self.tables.read().map_err(|_| EngineError::lock_poisoned("memory backend"))?;
        Ok(tables.get(table).map(|t| t.columns.clone()))
    }

    fn apply(&self, plan: &SyncPlan) -> Result<Vec<String>, EngineError> {
        let statements = plan.statements();
        let mut tables = self.tables.write().map_err(|_| EngineError::lock_poisoned("memory backend"))?;
        match plan {
            SyncPlan::Noop { .. } => return Ok(statements),
            SyncPlan::Create(def) => {
                tables.entry(def.table.clone()).or_insert_with(|| MemTable { columns: def.column_names(),
                                                                             rows: Vec::new(),
                                                                             next_id: 0 });
            }
            SyncPlan::AddColumns { table, columns } => {
                let current = tables.get_mut(table)
                                    .ok_or_else(|| EngineError::Storage(format!("relation \"{table}\" does not exist")))?;
                for col in columns {
                    if !current.columns.iter().any(|c| c == &col.name) {
                        current.columns.push(col.name.clone());
                    }
                }
            }
        }
        let mut log = self.ddl_log.lock().map_err(|_| EngineError::lock_poisoned("ddl log"))?;
        for sql in &statements {
            info!("ddl:apply backend=memory sql={sql}");
            log.push(sql.clone());
        }
        Ok(statements)
    }
}

impl RecordStore for InMemoryBackend {
    fn insert(&self, schema: &Schema, values: &RowValues) -> Result<Record, EngineError> {
        self.write_table(schema, |name, table| {
                table.check_columns(name, values.keys())?;
                Ok(table.push(values).to_record(schema))
            })
    }

    fn insert_batch(&self, schema: &Schema, rows: &[RowValues]) -> Result<Vec<Record>, EngineError> {
        self.write_table(schema, |name, table| {
                // Se comprueba todo antes de escribir para no dejar lotes a medias.
                for values in rows {
                    table.check_columns(name, values.keys())?;
                }
                Ok(rows.iter().map(|values| table.push(values).to_record(schema)).collect())
            })
    }

    fn select(&self, schema: &Schema, conditions: &[Condition]) -> Result<Vec<Record>, EngineError> {
        self.read_table(schema, |table| {
                table.check_columns(&schema.table_name(), conditions.iter().map(|c| &c.field))?;
                Ok(table.rows
                        .iter()
                        .filter(|row| row.matches(conditions))
                        .map(|row| row.to_record(schema))
                        .collect())
            })?
    }

    fn update_matching(&self,
                       schema: &Schema,
                       conditions: &[Condition],
                       assignments: &RowValues)
                       -> Result<Vec<Record>, EngineError> {
        self.write_table(schema, |name, table| {
                table.check_columns(name, conditions.iter().map(|c| &c.field).chain(assignments.keys()))?;
                let now = Utc::now();
                let mut updated = Vec::new();
                for row in table.rows.iter_mut().filter(|row| row.matches(conditions)) {
                    for (k, v) in assignments {
                        row.values.insert(k.clone(), v.clone());
                    }
                    row.updated_at = now;
                    updated.push(row.to_record(schema));
                }
                Ok(updated)
            })
    }
}
