//! Registro de modelos: nombre de esquema -> handle de tabla.
//!
//! Se reconstruye desde el Schema Store al arrancar el motor y se refresca
//! tras cada mutación de esquema hecha a través del motor. Nada fuera del
//! motor lo modifica.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use forma_domain::Schema;
use log::debug;

use crate::errors::EngineError;
use crate::hashing::hash_value;
use crate::store::SchemaStore;

#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    pub table: String,
    pub schema: Schema,
    /// blake3 del JSON canónico de la forma del esquema.
    pub fingerprint: String,
}

impl TableHandle {
    pub fn new(schema: Schema) -> Self {
        Self { table: schema.table_name(),
               fingerprint: fingerprint(&schema),
               schema }
    }
}

pub fn fingerprint(schema: &Schema) -> String {
    hash_value(&schema.shape_json())
}

#[derive(Default)]
pub struct ModelRegistry {
    handles: RwLock<HashMap<String, Arc<TableHandle>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reemplaza el contenido completo con lo que hay en el store.
    pub fn rebuild<S: SchemaStore + ?Sized>(&self, store: &S) -> Result<usize, EngineError> {
        let schemas = store.list_schemas()?;
        let fresh: HashMap<String, Arc<TableHandle>> =
            schemas.into_iter()
                   .map(|s| (s.name.to_lowercase(), Arc::new(TableHandle::new(s))))
                   .collect();
        let count = fresh.len();
        *self.handles.write().map_err(|_| EngineError::lock_poisoned("model registry"))? = fresh;
        debug!("registry:rebuild count={count}");
        Ok(count)
    }

    pub fn refresh(&self, schema: &Schema) -> Result<Arc<TableHandle>, EngineError> {
        let handle = Arc::new(TableHandle::new(schema.clone()));
        self.handles
            .write()
            .map_err(|_| EngineError::lock_poisoned("model registry"))?
            .insert(schema.name.to_lowercase(), handle.clone());
        debug!("registry:refresh schema={} fingerprint={}", schema.name, handle.fingerprint);
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Result<Option<Arc<TableHandle>>, EngineError> {
        let handles = self.handles.read().map_err(|_| EngineError::lock_poisoned("model registry"))?;
        Ok(handles.get(&name.to_lowercase()).cloned())
    }

    /// Handle del registro o, si falta, el del store (que queda registrado).
    pub fn resolve<S: SchemaStore + ?Sized>(&self, store: &S, name: &str) -> Result<Arc<TableHandle>, EngineError> {
        if let Some(handle) = self.get(name)? {
            return Ok(handle);
        }
        let schema = store.require_schema(name)?;
        self.refresh(&schema)
    }

    pub fn names(&self) -> Result<Vec<String>, EngineError> {
        let handles = self.handles.read().map_err(|_| EngineError::lock_poisoned("model registry"))?;
        let mut names: Vec<String> = handles.values().map(|h| h.schema.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    /// Esquemas cuya huella registrada ya no coincide con el store.
    pub fn stale<S: SchemaStore + ?Sized>(&self, store: &S) -> Result<Vec<String>, EngineError> {
        let mut out = Vec::new();
        for schema in store.list_schemas()? {
            match self.get(&schema.name)? {
                Some(handle) if handle.fingerprint == fingerprint(&schema) => {}
                _ => out.push(schema.name),
            }
        }
        Ok(out)
    }
}
