//! Demo: registra un esquema, escribe y filtra registros y corre el pipeline
//! de reconocimiento. Con la feature `pg_demo` usa Postgres (`DATABASE_URL`).

use formaflow::core::{register_recognition_schemas, Condition, RecordStore, SchemaStore, TableCatalog};
use formaflow::{EngineError, FieldDraft, FieldType, FieldValue, PipelineConfig, SchemaEngine, Submission};
use log::info;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn submission(value: serde_json::Value) -> Submission {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Submission::new(),
    }
}

fn run_demo<S, B>(engine: &SchemaEngine<S, B>) -> Result<(), EngineError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    engine.upsert_schema("Shop",
                         Some("store master"),
                         &[FieldDraft::new("name", FieldType::Text).required(),
                           FieldDraft::new("week", FieldType::Choice).with_choices(["Mon", "Tue", "Wed"]),
                           FieldDraft::new("sales", FieldType::Decimal)])?;
    let report = engine.register_or_sync_schema("Shop")?;
    info!("demo:sync table={} action={:?}", report.table, report.action);

    let records = engine.records();
    records.create("Shop", &submission(json!({"name": "Central", "week": "Mon", "sales": "1200.50"})))?;
    records.create("Shop", &submission(json!({"name": "North", "week": "Tue", "sales": "310"})))?;
    let monday = records.filter("Shop", &[Condition::iexact("week", FieldValue::Text("mon".into()))])?;
    println!("shops on monday: {}", monday.len());

    let config = PipelineConfig::from_env();
    register_recognition_schemas(engine, &config)?;
    let mut decision = submission(json!({"PhoneAction": "call the store"}));
    decision.insert(config.judge_field.clone(), json!(config.judge_unmatched));
    records.create(&config.decision_schema, &decision)?;
    let outcome = engine.recognition(config)
                        .run(&submission(json!({"alert": "A1", "week": "Mon", "retail": "100", "wholesale": "50"})))?;
    println!("judge: {} ({})", outcome.judge.value, outcome.judge.ui_label());
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    #[cfg(feature = "pg_demo")]
    let result = formaflow::open_postgres_from_env().and_then(|engine| run_demo(&engine));
    #[cfg(not(feature = "pg_demo"))]
    let result = formaflow::open_in_memory().and_then(|engine| run_demo(&engine));

    if let Err(e) = result {
        match serde_json::to_string(&e.payload()) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!("{e}"),
        }
        std::process::exit(1);
    }
}
