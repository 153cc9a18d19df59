//! Documentos de esquema en JSON.
//!
//! Forma: `{"schema": {"id", "name", "description"}, "fields": [{"id",
//! "field_name", "field_type", "is_required", "choices"}]}`. La importación
//! acepta también un array (se usa el primer elemento). Un campo sin
//! `field_name` o `field_type` se omite con un warning; un tipo desconocido
//! aborta la importación completa.

use forma_core::{RecordStore, SchemaEngine, SchemaStore, TableCatalog};
use forma_domain::{parse_choices, FieldDraft, FieldType, Schema};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdapterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaHeader {
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: Option<i64>,
    pub schema_id: Option<i64>,
    pub field_name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub schema: SchemaHeader,
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Fusión por nombre; los campos ausentes quedan intactos.
    #[default]
    Merge,
    /// Borra los campos existentes y los reemplaza por los del documento.
    ReplaceFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub schema: Schema,
    pub skipped_fields: usize,
}

pub fn export_schema(schema: &Schema) -> SchemaDocument {
    SchemaDocument { schema: SchemaHeader { id: Some(schema.id),
                                            name: schema.name.clone(),
                                            description: schema.description.clone() },
                     fields: schema.fields
                                   .iter()
                                   .map(|f| FieldEntry { id: Some(f.id),
                                                         schema_id: Some(f.schema_id),
                                                         field_name: f.name.clone(),
                                                         field_type: f.field_type,
                                                         is_required: f.is_required,
                                                         choices: f.choices.clone() })
                                   .collect() }
}

/// Resultado de interpretar un documento antes de tocar el store.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDraft>,
    pub skipped_fields: usize,
}

pub fn parse_schema_document(raw: &Value) -> Result<ParsedSchema, AdapterError> {
    let doc = match raw {
        Value::Array(items) => items.first()
                                    .ok_or_else(|| AdapterError::Format("empty schema document list".into()))?,
        other => other,
    };
    let (Some(header), Some(fields)) = (doc.get("schema"), doc.get("fields")) else {
        return Err(AdapterError::Format("expected 'schema' and 'fields' keys".into()));
    };
    let name = header.get("name")
                     .and_then(Value::as_str)
                     .ok_or_else(|| AdapterError::Format("schema.name must be a string".into()))?
                     .to_string();
    let description = header.get("description").and_then(Value::as_str).map(str::to_string);
    let entries = fields.as_array()
                        .ok_or_else(|| AdapterError::Format("'fields' must be an array".into()))?;

    let mut drafts = Vec::with_capacity(entries.len());
    let mut skipped_fields = 0;
    for (index, entry) in entries.iter().enumerate() {
        let field_name = entry.get("field_name").and_then(Value::as_str);
        let field_type = entry.get("field_type").and_then(Value::as_str);
        let (Some(field_name), Some(field_type)) = (field_name, field_type) else {
            warn!("schema_import:skip schema={name} index={index} reason=missing field_name/field_type");
            skipped_fields += 1;
            continue;
        };
        let field_type = FieldType::parse_strict(field_type).map_err(forma_core::EngineError::from)?;
        let mut draft = FieldDraft::new(field_name, field_type);
        draft.is_required = entry.get("is_required").and_then(Value::as_bool).unwrap_or(false);
        draft.choices = entry.get("choices").map(parse_choices).unwrap_or_default();
        drafts.push(draft);
    }
    Ok(ParsedSchema { name,
                      description,
                      fields: drafts,
                      skipped_fields })
}

/// Importa un documento. El store aplica cabecera y campos en una sola
/// transacción: o entra todo o nada.
pub fn import_schema<S, B>(engine: &SchemaEngine<S, B>, raw: &Value, mode: ImportMode) -> Result<ImportReport, AdapterError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    let parsed = parse_schema_document(raw)?;
    let schema = match mode {
        ImportMode::Merge => engine.upsert_schema(&parsed.name, parsed.description.as_deref(), &parsed.fields)?,
        ImportMode::ReplaceFields => engine.replace_fields(&parsed.name, parsed.description.as_deref(), &parsed.fields)?,
    };
    info!("schema_import:done schema={} mode={mode:?} fields={} skipped={}",
          schema.name,
          schema.fields.len(),
          parsed.skipped_fields);
    Ok(ImportReport { schema,
                      skipped_fields: parsed.skipped_fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_documents_use_first_element() {
        let raw = json!([{"schema": {"name": "Shop"}, "fields": []}, {"schema": {"name": "Other"}, "fields": []}]);
        assert_eq!(parse_schema_document(&raw).unwrap().name, "Shop");
        assert!(matches!(parse_schema_document(&json!([])), Err(AdapterError::Format(_))));
    }

    #[test]
    fn incomplete_fields_are_skipped() {
        let raw = json!({"schema": {"id": 3, "name": "Shop", "description": "d"},
                         "fields": [{"field_name": "name", "field_type": "CharField", "is_required": true},
                                    {"field_name": "broken"},
                                    {"field_name": "week", "field_type": "choice", "choices": "Mon, Tue"}]});
        let parsed = parse_schema_document(&raw).unwrap();
        assert_eq!(parsed.skipped_fields, 1);
        assert_eq!(parsed.fields[0], FieldDraft::new("name", FieldType::Text).required());
        assert_eq!(parsed.fields[1].choices, vec!["Mon", "Tue"]);
    }

    #[test]
    fn unknown_type_aborts_the_import() {
        let raw = json!({"schema": {"name": "Shop"}, "fields": [{"field_name": "x", "field_type": "JSONField"}]});
        match parse_schema_document(&raw) {
            Err(AdapterError::Engine(e)) => assert_eq!(e.kind(), forma_core::ErrorKind::UnsupportedFieldType),
            other => panic!("unexpected {other:?}"),
        }
    }
}
