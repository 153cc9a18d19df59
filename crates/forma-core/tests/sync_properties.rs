use forma_core::{Condition, InMemoryBackend, InMemoryEngine, InMemorySchemaStore, SyncAction, SyncState};
use forma_domain::{FieldDraft, FieldType, FieldValue};
use serde_json::json;

fn engine() -> InMemoryEngine {
    InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new()).unwrap()
}

#[test]
fn second_sync_on_unchanged_schema_emits_no_ddl() {
    let engine = engine();
    engine.upsert_schema("Shop",
                         Some("retail shops"),
                         &[FieldDraft::new("name", FieldType::Text).required(),
                           FieldDraft::new("opened", FieldType::Date)])
          .unwrap();
    let first = engine.register_or_sync_schema("Shop").unwrap();
    assert_eq!(first.action, SyncAction::Created);
    let ddl_after_first = engine.backend().ddl_log().len();

    let second = engine.register_or_sync_schema("shop").unwrap();
    assert_eq!(second.action, SyncAction::Unchanged);
    assert!(second.ddl.is_empty());
    assert_eq!(engine.backend().ddl_log().len(), ddl_after_first);
}

#[test]
fn removing_a_field_never_drops_its_column() {
    let engine = engine();
    engine.upsert_schema("Shop",
                         None,
                         &[FieldDraft::new("name", FieldType::Text), FieldDraft::new("city", FieldType::Text)])
          .unwrap();
    engine.register_or_sync_schema("Shop").unwrap();

    engine.replace_fields("Shop", None, &[FieldDraft::new("name", FieldType::Text)]).unwrap();
    let report = engine.register_or_sync_schema("Shop").unwrap();
    assert_eq!(report.orphaned_columns, vec!["city".to_string()]);
    assert!(engine.backend().ddl_log().iter().all(|sql| !sql.contains("DROP")));
    assert_eq!(engine.sync_state("Shop").unwrap(), SyncState::Consistent);
}

#[test]
fn added_fields_drift_then_reconcile() {
    let engine = engine();
    engine.upsert_schema("Shop", None, &[FieldDraft::new("name", FieldType::Text)]).unwrap();
    engine.register_or_sync_schema("Shop").unwrap();
    engine.upsert_schema("Shop", None, &[FieldDraft::new("visits", FieldType::Integer)]).unwrap();

    assert_eq!(engine.sync_state("Shop").unwrap(),
               SyncState::Drifted { missing_columns: vec!["visits".into()] });
    let report = engine.register_or_sync_schema("Shop").unwrap();
    assert_eq!(report.action, SyncAction::ColumnsAdded(vec!["visits".into()]));
    assert_eq!(report.ddl, vec!["ALTER TABLE \"shop\" ADD COLUMN IF NOT EXISTS \"visits\" INTEGER NULL".to_string()]);
}

#[test]
fn upsert_keeps_fields_missing_from_the_import() {
    let engine = engine();
    engine.upsert_schema("Shop",
                         Some("v1"),
                         &[FieldDraft::new("name", FieldType::Text), FieldDraft::new("city", FieldType::Text)])
          .unwrap();
    let schema = engine.upsert_schema("Shop", None, &[FieldDraft::new("name", FieldType::LongText).required()])
                       .unwrap();
    assert_eq!(schema.field_names(), vec!["name", "city"]);
    assert_eq!(schema.fields[0].field_type, FieldType::LongText);
    assert!(schema.fields[0].is_required);
    assert_eq!(schema.description.as_deref(), Some("v1"));
    assert!(engine.backend().ddl_log().is_empty());
}

#[test]
fn sync_all_covers_every_schema() {
    let engine = engine();
    engine.upsert_schema("A", None, &[FieldDraft::new("x", FieldType::Boolean)]).unwrap();
    engine.upsert_schema("B", None, &[FieldDraft::new("y", FieldType::Decimal)]).unwrap();
    let reports = engine.sync_all().unwrap();
    let tables: Vec<&str> = reports.iter().map(|r| r.table.as_str()).collect();
    assert_eq!(tables, vec!["a", "b"]);
}

#[test]
fn unknown_schema_is_reported_not_defaulted() {
    let engine = engine();
    let err = engine.register_or_sync_schema("ghost").unwrap_err();
    assert_eq!(err.payload().kind, forma_core::ErrorKind::SchemaNotFound);
    assert!(engine.create_table_if_missing("ghost").is_err());
}

#[test]
fn case_only_rename_keeps_the_existing_column() {
    let engine = engine();
    engine.upsert_schema("Shop", None, &[FieldDraft::new("week", FieldType::Text)]).unwrap();
    engine.register_or_sync_schema("Shop").unwrap();
    engine.records()
          .create("Shop", &json!({"week": "Mon"}).as_object().cloned().unwrap())
          .unwrap();

    let merged = engine.upsert_schema("Shop", None, &[FieldDraft::new("WEEK", FieldType::Text).required()]).unwrap();
    assert_eq!(merged.field_names(), vec!["week"]);
    assert!(merged.fields[0].is_required);

    let report = engine.register_or_sync_schema("Shop").unwrap();
    assert_eq!(report.action, SyncAction::Unchanged);
    assert!(report.orphaned_columns.is_empty());
    let hits = engine.records()
                     .filter("Shop", &[Condition::iexact("week", FieldValue::from("mon"))])
                     .unwrap();
    assert_eq!(hits.len(), 1);

    let replaced = engine.replace_fields("Shop", None, &[FieldDraft::new("Week", FieldType::Text)]).unwrap();
    assert_eq!(replaced.field_names(), vec!["week"]);
}

#[test]
fn concurrent_syncs_of_one_table_emit_ddl_once() {
    let engine = engine();
    engine.upsert_schema("Shop", None, &[FieldDraft::new("name", FieldType::Text)]).unwrap();

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| engine.register_or_sync_schema("Shop").unwrap()))
                                    .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(engine.backend().ddl_log().len(), 1);
    assert_eq!(reports.iter().filter(|r| r.action == SyncAction::Created).count(), 1);
    assert!(reports.iter().all(|r| r.action == SyncAction::Created || r.ddl.is_empty()));
}
