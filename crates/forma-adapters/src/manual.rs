//! Registro manual desde un mapa `{campo: tipo}`.
//!
//! Camino indulgente: un tipo desconocido se registra como `long_text` con un
//! warning, y todos los campos son opcionales.

use forma_core::{EngineError, RecordStore, SchemaEngine, SchemaStore, SyncReport, TableCatalog};
use forma_domain::{FieldDraft, FieldType};
use log::info;

pub fn manual_register<S, B, I, K, T>(engine: &SchemaEngine<S, B>, name: &str, fields: I) -> Result<SyncReport, EngineError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized,
          I: IntoIterator<Item = (K, T)>,
          K: Into<String>,
          T: AsRef<str>
{
    let drafts: Vec<FieldDraft> = fields.into_iter()
                                        .map(|(field, ty)| {
                                            let field: String = field.into();
                                            info!("manual_register:field schema={name} field={field} type={}", ty.as_ref());
                                            FieldDraft::new(field, FieldType::parse_lenient(ty.as_ref()))
                                        })
                                        .collect();
    engine.upsert_schema(name, None, &drafts)?;
    engine.register_or_sync_schema(name)
}
