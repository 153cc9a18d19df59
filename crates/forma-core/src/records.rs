//! Record Accessor: crear, listar y filtrar filas de un esquema.

use forma_domain::Record;
use log::debug;

use crate::backend::{Condition, RecordStore, TableCatalog};
use crate::engine::SchemaEngine;
use crate::errors::EngineError;
use crate::form::{clean_values, coerce_assignments, filter_conditions, Submission};
use crate::registry::TableHandle;
use crate::store::SchemaStore;

pub struct RecordAccessor<'a, S: ?Sized, B: ?Sized> {
    engine: &'a SchemaEngine<S, B>,
}

impl<'a, S, B> RecordAccessor<'a, S, B>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    pub fn new(engine: &'a SchemaEngine<S, B>) -> Self {
        Self { engine }
    }

    /// Valida y persiste una fila. La tabla se sincroniza antes de la
    /// primera escritura de cada forma de esquema.
    pub fn create(&self, schema_name: &str, submitted: &Submission) -> Result<Record, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        let values = clean_values(&handle.schema, submitted).map_err(EngineError::Validation)?;
        self.engine.synchronizer().ensure(&handle)?;
        let record = self.engine.backend().insert(&handle.schema, &values)?;
        debug!("records:create table={} id={:?}", handle.table, record.id);
        Ok(record)
    }

    /// Todo o nada: se valida el lote completo antes de escribir y la
    /// primera fila inválida aborta con `RecordRejected`.
    pub fn create_many(&self, schema_name: &str, batch: &[Submission]) -> Result<Vec<Record>, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        let mut rows = Vec::with_capacity(batch.len());
        for (index, submitted) in batch.iter().enumerate() {
            let values = clean_values(&handle.schema, submitted).map_err(|errors| EngineError::RecordRejected { index,
                                                                                                               errors })?;
            rows.push(values);
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.engine.synchronizer().ensure(&handle)?;
        let records = self.engine.backend().insert_batch(&handle.schema, &rows)?;
        debug!("records:create_many table={} count={}", handle.table, records.len());
        Ok(records)
    }

    pub fn list(&self, schema_name: &str) -> Result<Vec<Record>, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        self.engine.backend().select(&handle.schema, &[])
    }

    /// Las condiciones deben referirse a campos declarados.
    pub fn filter(&self, schema_name: &str, conditions: &[Condition]) -> Result<Vec<Record>, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        if let Some(c) = conditions.iter().find(|c| handle.schema.field(&c.field).is_none()) {
            return Err(EngineError::UnknownField { schema: handle.schema.name.clone(),
                                                   field: c.field.clone() });
        }
        self.sync_if_present(&handle)?;
        self.engine.backend().select(&handle.schema, conditions)
    }

    /// Filtro a partir de valores enviados por formulario (vacíos ignorados).
    pub fn search(&self, schema_name: &str, submitted: &Submission) -> Result<Vec<Record>, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        let conditions = filter_conditions(&handle.schema, submitted)?;
        self.sync_if_present(&handle)?;
        self.engine.backend().select(&handle.schema, &conditions)
    }

    /// Actualización masiva + relectura en una transacción.
    pub fn update_matching(&self,
                           schema_name: &str,
                           conditions: &[Condition],
                           assignments: &Submission)
                           -> Result<Vec<Record>, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        if let Some(c) = conditions.iter().find(|c| handle.schema.field(&c.field).is_none()) {
            return Err(EngineError::UnknownField { schema: handle.schema.name.clone(),
                                                   field: c.field.clone() });
        }
        let values = coerce_assignments(&handle.schema, assignments)?;
        self.sync_if_present(&handle)?;
        let updated = self.engine.backend().update_matching(&handle.schema, conditions, &values)?;
        debug!("records:update_matching table={} rows={}", handle.table, updated.len());
        Ok(updated)
    }

    /// Una tabla existente pero atrasada respecto del esquema se completa
    /// antes de consultar campos declarados; una tabla ausente sigue siendo
    /// `SchemaNotFound` en lectura.
    fn sync_if_present(&self, handle: &TableHandle) -> Result<(), EngineError> {
        if self.engine.backend().table_exists(&handle.table)? {
            self.engine.synchronizer().ensure(handle)?;
        }
        Ok(())
    }
}
