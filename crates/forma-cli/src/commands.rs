//! Ejecución de subcomandos contra un `SchemaEngine` cualquiera.
//!
//! Cada comando devuelve un `serde_json::Value` que `main` imprime; la
//! exportación CSV es la única salida en texto plano.

use std::fs;
use std::path::Path;

use forma_adapters::{csv, export_records, export_schema, import_records, import_schema, ImportMode};
use forma_core::{register_recognition_schemas, EngineError, PipelineConfig, RecordStore, SchemaEngine, SchemaStore,
                 Submission, TableCatalog};
use forma_domain::evaluate_bitwise_or;
use log::info;
use serde_json::{json, Value};

use crate::cli::Command;
use crate::error::CliError;

/// Resultado de un comando.
#[derive(Debug)]
pub enum Output {
    Json(Value),
    Text(String),
    /// Ya escrito en un archivo.
    Written,
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let raw = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn submission(fields: Vec<(String, String)>) -> Submission {
    fields.into_iter().map(|(name, value)| (name, Value::String(value))).collect()
}

/// OR de máscara de 8 bits; no toca ningún backend.
pub fn evaluate_mask(target: &str, mask: &str) -> Result<Output, CliError> {
    let covered = evaluate_bitwise_or(target, mask).map_err(EngineError::from)?;
    Ok(Output::Json(json!({ "target": target, "mask": mask, "covered": covered })))
}

pub fn execute<S, B>(engine: &SchemaEngine<S, B>, command: Command) -> Result<Output, CliError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    let output = match command {
        Command::RegisterOrSync { schema } => Output::Json(serde_json::to_value(engine.register_or_sync_schema(&schema)?)?),
        Command::SyncAll => {
            let reports = engine.sync_all()?;
            Output::Json(json!({
                "schemas": engine.registry().names()?,
                "reports": reports,
            }))
        }
        Command::CreateTable { schema } => Output::Json(serde_json::to_value(engine.create_table_if_missing(&schema)?)?),
        Command::ExportFieldsCsv { schema, output } => {
            let header = csv::export_fields_csv(engine, &schema)?;
            match output {
                Some(path) => {
                    fs::write(&path, header).map_err(|e| CliError::io(&path, e))?;
                    info!("export_fields_csv:written schema={schema} path={}", path.display());
                    Output::Written
                }
                None => Output::Text(header),
            }
        }
        Command::ImportSchema { file, replace } => {
            let mode = if replace { ImportMode::ReplaceFields } else { ImportMode::Merge };
            let report = import_schema(engine, &read_json(&file)?, mode)?;
            Output::Json(json!({
                "schema": report.schema.name,
                "fields": report.schema.field_names(),
                "skipped_fields": report.skipped_fields,
            }))
        }
        Command::ExportSchema { schema } => Output::Json(serde_json::to_value(export_schema(&engine.get_schema(&schema)?))?),
        Command::ImportRecords { schema, file } => {
            let records = import_records(engine, &schema, &read_json(&file)?)?;
            Output::Json(json!({
                "schema": schema,
                "imported": records.len(),
                "ids": records.iter().filter_map(|r| r.id).collect::<Vec<_>>(),
            }))
        }
        Command::ExportRecords { schema } => Output::Json(export_records(engine, &schema)?),
        Command::RegisterRecognition => {
            let reports = register_recognition_schemas(engine, &PipelineConfig::from_env())?;
            Output::Json(serde_json::to_value(reports)?)
        }
        Command::Recognize { fields } => {
            let outcome = engine.recognition(PipelineConfig::from_env()).run(&submission(fields))?;
            Output::Json(serde_json::to_value(outcome)?)
        }
        Command::Status { schema } => {
            let handle = engine.handle(&schema)?;
            let state = engine.sync_state(&schema)?;
            Output::Json(json!({
                "schema": handle.schema.name,
                "table": handle.table,
                "fingerprint": handle.fingerprint,
                "sync": state,
            }))
        }
        Command::EvaluateMask { target, mask } => evaluate_mask(&target, &mask)?,
    };
    Ok(output)
}
