use forma_domain::{FieldDef, FieldDraft, FieldType, FieldValue, Record, Schema};
use serde_json::json;

fn evaluation_schema() -> Schema {
    let names = ["judge", "alert", "week", "retail", "wholesale"];
    Schema { id: 1,
             name: "evaluation".into(),
             description: None,
             fields: names.iter()
                          .enumerate()
                          .map(|(i, n)| FieldDef { id: i as i64 + 1,
                                                   schema_id: 1,
                                                   position: i as i32,
                                                   name: n.to_string(),
                                                   field_type: FieldType::Text,
                                                   is_required: false,
                                                   choices: vec![] })
                          .collect() }
}

#[test]
fn schema_shape_ignores_ids() {
    let a = evaluation_schema();
    let mut b = evaluation_schema();
    for f in &mut b.fields {
        f.id += 100;
    }
    assert_eq!(a.shape_json(), b.shape_json());
    assert_eq!(a.table_name(), "evaluation");
    assert_eq!(a.field_names(), vec!["judge", "alert", "week", "retail", "wholesale"]);
}

#[test]
fn field_def_round_trips_to_draft() {
    let schema = evaluation_schema();
    let draft = schema.fields[1].to_draft();
    assert_eq!(draft, FieldDraft::new("alert", FieldType::Text));
    let spec = schema.fields[1].input_spec().expect("spec");
    assert!(!spec.required);
    assert_eq!(spec.clean(&json!("")).unwrap(), FieldValue::Null);
}

#[test]
fn record_json_keeps_field_order_and_marks_virtual_rows() {
    let mut record = Record::default();
    record.set("week", FieldValue::from("Mon"));
    record.set("alert", FieldValue::from("A1"));
    assert!(!record.is_persisted());
    let json = record.to_json();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "week", "alert", "created_at", "updated_at"]);
    assert_eq!(json["id"], serde_json::Value::Null);
    assert_eq!(record.text("week"), Some("Mon"));
}
