use forma_adapters::csv::export_fields_csv;
use forma_adapters::{export_records, export_schema, import_records, import_schema, manual_register, AdapterError, ImportMode};
use forma_core::{ErrorKind, InMemoryBackend, InMemoryEngine, InMemorySchemaStore, SyncAction};
use forma_domain::{FieldDraft, FieldType};
use serde_json::json;

fn engine() -> InMemoryEngine {
    InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new()).unwrap()
}

fn shape(schema: &forma_domain::Schema) -> Vec<(String, FieldType, bool, Vec<String>)> {
    schema.fields
          .iter()
          .map(|f| (f.name.clone(), f.field_type, f.is_required, f.choices.clone()))
          .collect()
}

#[test]
fn export_then_replace_import_round_trips_the_field_set() {
    let source = engine();
    let original = source.upsert_schema("Shop",
                                        Some("shops"),
                                        &[FieldDraft::new("name", FieldType::Text).required(),
                                          FieldDraft::new("week", FieldType::Choice).with_choices(["Mon", "Tue"]),
                                          FieldDraft::new("retail", FieldType::Decimal),
                                          FieldDraft::new("seen", FieldType::DateTime)])
                         .unwrap();
    let doc = serde_json::to_value(export_schema(&original)).unwrap();

    let target = engine();
    target.upsert_schema("Shop", None, &[FieldDraft::new("legacy", FieldType::Integer)]).unwrap();
    let report = import_schema(&target, &doc, ImportMode::ReplaceFields).unwrap();
    assert_eq!(report.skipped_fields, 0);
    assert_eq!(shape(&report.schema), shape(&original));
    assert_eq!(report.schema.description.as_deref(), Some("shops"));
}

#[test]
fn merge_import_keeps_existing_fields() {
    let engine = engine();
    engine.upsert_schema("Shop", None, &[FieldDraft::new("legacy", FieldType::Integer)]).unwrap();
    let doc = json!({"schema": {"name": "Shop"}, "fields": [{"field_name": "name", "field_type": "text"}]});
    let report = import_schema(&engine, &doc, ImportMode::Merge).unwrap();
    assert_eq!(report.schema.field_names(), vec!["legacy", "name"]);
}

#[test]
fn failed_import_leaves_store_untouched() {
    let engine = engine();
    let doc = json!({"schema": {"name": "Shop"},
                     "fields": [{"field_name": "a", "field_type": "text"}, {"field_name": "a", "field_type": "text"}]});
    let err = import_schema(&engine, &doc, ImportMode::Merge).unwrap_err();
    assert_eq!(err.payload().kind, ErrorKind::InvalidDefinition);
    assert!(engine.list_schemas().unwrap().is_empty());
}

#[test]
fn record_import_is_all_or_nothing_and_export_round_trips() {
    let engine = engine();
    engine.upsert_schema("Shop",
                         None,
                         &[FieldDraft::new("name", FieldType::Text).required(),
                           FieldDraft::new("visits", FieldType::Integer)])
          .unwrap();

    let bad = json!([{"name": "Acme"}, {"visits": 3}]);
    match import_records(&engine, "Shop", &bad) {
        Err(AdapterError::Engine(e)) => assert_eq!(e.kind(), ErrorKind::ValidationError),
        other => panic!("unexpected {other:?}"),
    }

    let dummy = export_records(&engine, "Shop").unwrap();
    assert_eq!(dummy[0]["id"], 1);
    assert_eq!(dummy[0]["name"], "sample_name");
    assert_eq!(dummy[0]["visits"], 0);

    import_records(&engine, "Shop", &json!({"name": "Acme", "visits": "4"})).unwrap();
    let exported = export_records(&engine, "Shop").unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 1);
    assert_eq!(exported[0]["visits"], 4);
    let keys: Vec<&String> = exported[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "name", "visits", "created_at", "updated_at"]);

    let again = import_records(&engine, "Shop", &exported).unwrap();
    assert_eq!(again[0].id, Some(2));
}

#[test]
fn manual_register_defaults_unknown_types() {
    let engine = engine();
    let report = manual_register(&engine, "Evaluation", [("judge", "TextField"), ("week", "MysteryField")]).unwrap();
    assert_eq!(report.action, SyncAction::Created);
    let schema = engine.get_schema("evaluation").unwrap();
    assert_eq!(schema.fields[1].field_type, FieldType::LongText);
    assert!(schema.fields.iter().all(|f| !f.is_required));
}

#[test]
fn csv_header_follows_field_order() {
    let engine = engine();
    engine.upsert_schema("Shop",
                         None,
                         &[FieldDraft::new("week", FieldType::Text), FieldDraft::new("alert", FieldType::Text)])
          .unwrap();
    assert_eq!(export_fields_csv(&engine, "Shop").unwrap(), "week,alert\r\n");
    assert_eq!(export_fields_csv(&engine, "nope").unwrap_err().kind(), ErrorKind::SchemaNotFound);
}
