//! Schema Store: metadatos de esquemas y campos.
//!
//! Contrato común a todos los backends:
//! - `upsert_schema` fusiona por (esquema, nombre de campo): actualiza en sitio,
//!   agrega los nuevos al final y deja intactos los ausentes.
//! - `replace_fields` borra todos los campos del esquema y luego inserta el
//!   nuevo conjunto, en una sola transacción.
//! - Ninguna operación toca las tablas dinámicas.

mod memory;

pub use memory::InMemorySchemaStore;

use forma_domain::schema::validate_drafts;
use forma_domain::{FieldDef, FieldDraft, Schema};
use log::debug;

use crate::errors::EngineError;

pub trait SchemaStore: Send + Sync {
    /// Búsqueda sin distinguir mayúsculas (los nombres son únicos así).
    fn get_schema(&self, name: &str) -> Result<Option<Schema>, EngineError>;
    fn list_schemas(&self) -> Result<Vec<Schema>, EngineError>;
    fn upsert_schema(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError>;
    fn replace_fields(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError>;

    /// Igual que `get_schema` pero la ausencia es `SchemaNotFound`.
    fn require_schema(&self, name: &str) -> Result<Schema, EngineError> {
        self.get_schema(name)?.ok_or_else(|| EngineError::SchemaNotFound(name.to_string()))
    }
}

/// Resultado de fusionar borradores contra los campos existentes.
#[derive(Debug, Default, PartialEq)]
pub struct FieldMergePlan {
    /// (id del campo existente, nueva definición)
    pub updates: Vec<(i64, FieldDraft)>,
    /// (posición asignada, nueva definición)
    pub inserts: Vec<(i32, FieldDraft)>,
}

/// Calcula la fusión por nombre (sin distinguir mayúsculas). Los borradores
/// deben venir ya validados con `validate_drafts`. Un campo existente conserva
/// su nombre guardado: la columna física se llama así.
pub fn plan_field_merge(existing: &[FieldDef], drafts: &[FieldDraft]) -> FieldMergePlan {
    let mut plan = FieldMergePlan::default();
    let mut next_position = existing.iter().map(|f| f.position).max().map(|p| p + 1).unwrap_or(0);
    for draft in drafts {
        match existing.iter().find(|f| f.name.eq_ignore_ascii_case(&draft.name)) {
            Some(current) => plan.updates.push((current.id,
                                                FieldDraft { name: current.name.clone(),
                                                             ..draft.clone() })),
            None => {
                plan.inserts.push((next_position, draft.clone()));
                next_position += 1;
            }
        }
    }
    plan
}

/// Para `replace_fields`: los borradores que sólo difieren en mayúsculas de un
/// campo existente toman el nombre guardado.
pub fn keep_stored_names(existing: &[FieldDef], drafts: Vec<FieldDraft>) -> Vec<FieldDraft> {
    drafts.into_iter()
          .map(|draft| match existing.iter().find(|f| f.name.eq_ignore_ascii_case(&draft.name)) {
              Some(current) if current.name != draft.name => {
                  debug!("schema_store:keep_name stored={} submitted={}", current.name, draft.name);
                  FieldDraft { name: current.name.clone(),
                               ..draft }
              }
              _ => draft,
          })
          .collect()
}

/// Validación previa compartida por todos los backends.
pub fn prepare_upsert(name: &str, fields: &[FieldDraft]) -> Result<Vec<FieldDraft>, EngineError> {
    forma_domain::ident::validate_schema_name(name)?;
    Ok(validate_drafts(fields)?)
}
