//! Definiciones de los esquemas del pipeline.

use forma_domain::{FieldDraft, FieldType};
use log::info;

use super::PipelineConfig;
use crate::backend::{RecordStore, TableCatalog};
use crate::engine::SchemaEngine;
use crate::errors::EngineError;
use crate::store::SchemaStore;
use crate::sync::SyncReport;

pub const EVALUATION_INPUT_FIELDS: [&str; 4] = ["alert", "week", "retail", "wholesale"];
pub const DECISION_ACTION_FIELDS: [&str; 3] = ["PhoneAction", "EDIAction", "RecordAction"];

pub fn evaluation_fields(config: &PipelineConfig) -> Vec<FieldDraft> {
    judge_first(config, &EVALUATION_INPUT_FIELDS)
}

pub fn decision_fields(config: &PipelineConfig) -> Vec<FieldDraft> {
    judge_first(config, &DECISION_ACTION_FIELDS)
}

fn judge_first(config: &PipelineConfig, names: &[&str]) -> Vec<FieldDraft> {
    let mut fields = vec![FieldDraft::new(config.judge_field.clone(), FieldType::Text)];
    fields.extend(names.iter().map(|name| FieldDraft::new(*name, FieldType::Text)));
    fields
}

/// Upsert + sync de `evaluation` y `decision`. `recognition` no tiene campos
/// propios: se sincroniza sólo si ya está declarado en el store.
pub fn register_recognition_schemas<S, B>(engine: &SchemaEngine<S, B>,
                                          config: &PipelineConfig)
                                          -> Result<Vec<SyncReport>, EngineError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    engine.upsert_schema(&config.evaluation_schema, Some("recognition stage 1"), &evaluation_fields(config))?;
    engine.upsert_schema(&config.decision_schema, Some("recognition stage 2"), &decision_fields(config))?;
    let mut reports = vec![engine.register_or_sync_schema(&config.evaluation_schema)?,
                           engine.register_or_sync_schema(&config.decision_schema)?];
    if engine.store().get_schema(&config.recognition_schema)?.is_some() {
        reports.push(engine.register_or_sync_schema(&config.recognition_schema)?);
    } else {
        info!("recognition:skip schema={} reason=not declared", config.recognition_schema);
    }
    Ok(reports)
}
