use forma_core::{register_recognition_schemas, DecisionOutcome, EvaluationOutcome, InMemoryBackend, InMemoryEngine,
                 InMemorySchemaStore, PipelineConfig, Submission, SyncAction, TableCatalog};
use forma_domain::{FieldDraft, FieldType, FieldValue};
use serde_json::{json, Value};

fn submission(v: Value) -> Submission {
    v.as_object().cloned().unwrap()
}

fn engine() -> InMemoryEngine {
    let engine = InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new()).unwrap();
    register_recognition_schemas(&engine, &PipelineConfig::default()).unwrap();
    engine
}

fn seed_decision(engine: &InMemoryEngine, judge: &str, phone: &str) {
    engine.records()
          .create("decision",
                  &submission(json!({"judge": judge, "PhoneAction": phone, "EDIAction": "none", "RecordAction": "log"})))
          .unwrap();
}

fn input() -> Submission {
    submission(json!({"alert": "A1", "week": "Mon", "retail": "100", "wholesale": "50"}))
}

#[test]
fn unmatched_input_yields_virtual_needs_contact_record() {
    let engine = engine();
    seed_decision(&engine, "needs-contact", "call back");
    let outcome = engine.recognition(PipelineConfig::default()).run(&input()).unwrap();

    assert_eq!(outcome.judge.value, "needs-contact");
    assert_eq!(outcome.judge.ui_label(), "連絡あり");
    match &outcome.evaluation {
        EvaluationOutcome::Unmatched { record } => {
            assert!(!record.is_persisted());
            assert_eq!(record.text("judge"), Some("needs-contact"));
            assert_eq!(record.text("alert"), Some("A1"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match &outcome.decision {
        DecisionOutcome::Decided(decision) => {
            assert_eq!(decision.judge, "needs-contact");
            assert_eq!(decision.action("PhoneAction"), Some("call back"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(engine.records().list("evaluation").unwrap().is_empty());
}

#[test]
fn matched_row_gets_judge_persisted() {
    let engine = engine();
    seed_decision(&engine, "has-contact-record", "no call");
    engine.records()
          .create("evaluation",
                  &submission(json!({"alert": "a1", "week": "MON", "retail": "100", "wholesale": "50"})))
          .unwrap();

    let outcome = engine.recognition(PipelineConfig::default()).run(&input()).unwrap();
    assert_eq!(outcome.judge.value, "has-contact-record");
    assert!(outcome.evaluation.is_matched());
    assert_eq!(outcome.evaluation.record().id, Some(1));

    let stored = engine.records().list("evaluation").unwrap();
    assert_eq!(stored[0].get("judge"), Some(&FieldValue::Text("has-contact-record".into())));
    match &outcome.decision {
        DecisionOutcome::Decided(decision) => assert_eq!(decision.action("PhoneAction"), Some("no call")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn ambiguous_matches_update_all_and_lowest_id_wins() {
    let engine = engine();
    for _ in 0..2 {
        engine.records()
              .create("evaluation",
                      &submission(json!({"alert": "A1", "week": "Mon", "retail": "100", "wholesale": "50"})))
              .unwrap();
    }
    let outcome = engine.recognition(PipelineConfig::default()).run(&input()).unwrap();
    match &outcome.evaluation {
        EvaluationOutcome::Matched { record, matched_rows } => {
            assert_eq!(*matched_rows, 2);
            assert_eq!(record.id, Some(1));
        }
        other => panic!("unexpected {other:?}"),
    }
    let stored = engine.records().list("evaluation").unwrap();
    assert!(stored.iter().all(|r| r.text("judge") == Some("has-contact-record")));
}

#[test]
fn missing_decision_row_is_reported_not_raised() {
    let engine = engine();
    seed_decision(&engine, "Needs-Contact", "case differs");
    let outcome = engine.recognition(PipelineConfig::default()).run(&input()).unwrap();
    match outcome.decision {
        DecisionOutcome::NoDecision { judge, message } => {
            assert_eq!(judge, "needs-contact");
            assert_eq!(message, "no decision data found for judge=needs-contact");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn submitted_judge_and_empty_fields_are_ignored() {
    let engine = engine();
    engine.records()
          .create("evaluation", &submission(json!({"alert": "A1", "week": "Tue"})))
          .unwrap();
    let outcome = engine.recognition(PipelineConfig::default())
                        .run(&submission(json!({"judge": "forged", "alert": "A1", "week": "", "retail": null})))
                        .unwrap();
    assert!(outcome.evaluation.is_matched());

    let blank = engine.recognition(PipelineConfig::default())
                      .run(&submission(json!({"alert": "", "judge": "x"})))
                      .unwrap();
    assert!(!blank.evaluation.is_matched());
}

#[test]
fn outcome_serializes_for_rendering() {
    let engine = engine();
    let outcome = engine.recognition(PipelineConfig::default()).run(&input()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["judge"]["value"], "needs-contact");
    assert_eq!(json["evaluation"]["state"], "unmatched");
    assert_eq!(json["decision"]["state"], "no_decision");
    assert!(json["run_id"].is_string());
}

#[test]
fn declared_recognition_schema_is_synced_with_the_other_two() {
    let engine = InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new()).unwrap();
    let reports = register_recognition_schemas(&engine, &PipelineConfig::default()).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(engine.list_schemas().unwrap().iter().all(|s| s.name != "recognition"));

    engine.upsert_schema("recognition", None, &[FieldDraft::new("note", FieldType::Text)])
          .unwrap();
    let reports = register_recognition_schemas(&engine, &PipelineConfig::default()).unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[2].action, SyncAction::Created);
    assert!(engine.backend().table_exists(&reports[2].table).unwrap());
}
