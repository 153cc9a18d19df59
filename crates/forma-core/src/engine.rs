//! `SchemaEngine`: punto de entrada del motor.
//!
//! Une Schema Store, backend de tablas, registro de modelos y sincronizador.
//! Toda mutación de esquema hecha aquí refresca el registro; ninguna emite
//! DDL salvo las operaciones de sincronización explícitas y la escritura
//! perezosa del Record Accessor.

use std::sync::Arc;

use forma_domain::{FieldDraft, Schema};
use log::info;

use crate::backend::{RecordStore, TableCatalog};
use crate::errors::EngineError;
use crate::form::FormBuilder;
use crate::pipeline::{PipelineConfig, RecognitionPipeline};
use crate::records::RecordAccessor;
use crate::registry::{ModelRegistry, TableHandle};
use crate::store::SchemaStore;
use crate::sync::{SyncReport, SyncState, TableSynchronizer};

pub struct SchemaEngine<S: ?Sized, B: ?Sized> {
    store: Arc<S>,
    backend: Arc<B>,
    registry: Arc<ModelRegistry>,
    synchronizer: Arc<TableSynchronizer<B>>,
}

impl<S: ?Sized, B: ?Sized> Clone for SchemaEngine<S, B> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(),
               backend: self.backend.clone(),
               registry: self.registry.clone(),
               synchronizer: self.synchronizer.clone() }
    }
}

impl<S, B> SchemaEngine<S, B>
    where S: SchemaStore,
          B: TableCatalog + RecordStore
{
    pub fn new(store: S, backend: B) -> Result<Self, EngineError> {
        Self::from_shared(Arc::new(store), Arc::new(backend))
    }
}

impl<S, B> SchemaEngine<S, B>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    /// Construye el motor y reconstruye el registro desde el store.
    pub fn from_shared(store: Arc<S>, backend: Arc<B>) -> Result<Self, EngineError> {
        let registry = Arc::new(ModelRegistry::new());
        let count = registry.rebuild(store.as_ref())?;
        info!("engine:start schemas={count}");
        Ok(Self { synchronizer: Arc::new(TableSynchronizer::new(backend.clone())),
                  store,
                  backend,
                  registry })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn synchronizer(&self) -> &TableSynchronizer<B> {
        &self.synchronizer
    }

    pub fn handle(&self, name: &str) -> Result<Arc<TableHandle>, EngineError> {
        self.registry.resolve(self.store.as_ref(), name)
    }

    pub fn get_schema(&self, name: &str) -> Result<Schema, EngineError> {
        Ok(self.handle(name)?.schema.clone())
    }

    pub fn list_schemas(&self) -> Result<Vec<Schema>, EngineError> {
        self.store.list_schemas()
    }

    /// Fusión de campos por nombre (los ausentes quedan intactos).
    pub fn upsert_schema(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let schema = self.store.upsert_schema(name, description, fields)?;
        self.registry.refresh(&schema)?;
        info!("schema:upsert name={} fields={}", schema.name, schema.fields.len());
        Ok(schema)
    }

    /// Reemplaza todos los campos del esquema en una transacción.
    pub fn replace_fields(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let schema = self.store.replace_fields(name, description, fields)?;
        self.registry.refresh(&schema)?;
        info!("schema:replace_fields name={} fields={}", schema.name, schema.fields.len());
        Ok(schema)
    }

    /// Relee el esquema del store, refresca el registro y sincroniza su tabla.
    pub fn register_or_sync_schema(&self, name: &str) -> Result<SyncReport, EngineError> {
        let schema = self.store.require_schema(name)?;
        self.registry.refresh(&schema)?;
        self.synchronizer.sync(&schema)
    }

    pub fn create_table_if_missing(&self, name: &str) -> Result<SyncReport, EngineError> {
        let schema = self.store.require_schema(name)?;
        self.registry.refresh(&schema)?;
        self.synchronizer.create_table_if_missing(&schema)
    }

    pub fn sync_all(&self) -> Result<Vec<SyncReport>, EngineError> {
        let schemas = self.store.list_schemas()?;
        let mut reports = Vec::with_capacity(schemas.len());
        for schema in schemas {
            self.registry.refresh(&schema)?;
            reports.push(self.synchronizer.sync(&schema)?);
        }
        Ok(reports)
    }

    pub fn sync_state(&self, name: &str) -> Result<SyncState, EngineError> {
        let schema = self.store.require_schema(name)?;
        self.synchronizer.state(&schema)
    }

    pub fn records(&self) -> RecordAccessor<'_, S, B> {
        RecordAccessor::new(self)
    }

    pub fn forms(&self) -> FormBuilder<'_, S, B> {
        FormBuilder::new(self)
    }

    pub fn recognition(&self, config: PipelineConfig) -> RecognitionPipeline<'_, S, B> {
        RecognitionPipeline::new(self, config)
    }
}
