//! Form/Filter Builder.
//!
//! A partir del esquema produce la superficie de entrada validada (un
//! `InputSpec` por campo) y las condiciones de filtro. Un esquema inexistente
//! o sin campos es `SchemaNotFound` en ambas operaciones.

use forma_domain::{FieldValue, InputSpec, Schema};
use serde_json::{Map, Value};

use crate::backend::{Condition, RecordStore, RowValues, TableCatalog};
use crate::engine::SchemaEngine;
use crate::errors::{EngineError, ValidationErrors};
use crate::store::SchemaStore;

pub type Submission = Map<String, Value>;

/// Un `InputSpec` por campo, en el orden del esquema.
pub fn input_specs(schema: &Schema) -> Result<Vec<InputSpec>, EngineError> {
    require_fields(schema)?;
    schema.fields
          .iter()
          .map(|f| f.input_spec().map_err(EngineError::from))
          .collect()
}

/// Igualdad sin distinguir mayúsculas por cada valor no vacío. Las claves
/// desconocidas se rechazan.
pub fn filter_conditions(schema: &Schema, submitted: &Submission) -> Result<Vec<Condition>, EngineError> {
    require_fields(schema)?;
    reject_unknown(schema, submitted)?;
    let mut errors = ValidationErrors::default();
    let mut conditions = Vec::new();
    for field in &schema.fields {
        let Some(raw) = submitted.get(&field.name) else { continue };
        match field.coerce(raw) {
            Ok(FieldValue::Null) => {}
            Ok(value) => conditions.push(Condition::iexact(field.name.clone(), value)),
            Err(reason) => errors.push(field.name.clone(), reason),
        }
    }
    if errors.is_empty() { Ok(conditions) } else { Err(EngineError::Validation(errors)) }
}

/// Valida una entrega completa acumulando todos los errores. Los campos
/// ausentes vuelven como `Null`.
pub fn clean_values(schema: &Schema, submitted: &Submission) -> Result<RowValues, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for key in submitted.keys() {
        if schema.field(key).is_none() {
            errors.push(key.clone(), "unknown field");
        }
    }
    let mut values = RowValues::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let raw = submitted.get(&field.name).unwrap_or(&Value::Null);
        let cleaned = field.input_spec()
                           .map_err(|e| e.to_string())
                           .and_then(|spec| spec.clean(raw));
        match cleaned {
            Ok(value) => {
                values.insert(field.name.clone(), value);
            }
            Err(reason) => errors.push(field.name.clone(), reason),
        }
    }
    if errors.is_empty() { Ok(values) } else { Err(errors) }
}

/// Coerción tipada de asignaciones parciales (sin reglas de obligatoriedad).
pub fn coerce_assignments(schema: &Schema, submitted: &Submission) -> Result<RowValues, EngineError> {
    reject_unknown(schema, submitted)?;
    let mut errors = ValidationErrors::default();
    let mut values = RowValues::with_capacity(submitted.len());
    for (key, raw) in submitted {
        if let Some(field) = schema.field(key) {
            match field.coerce(raw) {
                Ok(value) => {
                    values.insert(key.clone(), value);
                }
                Err(reason) => errors.push(key.clone(), reason),
            }
        }
    }
    if errors.is_empty() { Ok(values) } else { Err(EngineError::Validation(errors)) }
}

pub(crate) fn reject_unknown(schema: &Schema, submitted: &Submission) -> Result<(), EngineError> {
    match submitted.keys().find(|k| schema.field(k).is_none()) {
        Some(field) => Err(EngineError::UnknownField { schema: schema.name.clone(),
                                                       field: field.clone() }),
        None => Ok(()),
    }
}

fn require_fields(schema: &Schema) -> Result<(), EngineError> {
    if schema.fields.is_empty() {
        return Err(EngineError::SchemaNotFound(schema.name.clone()));
    }
    Ok(())
}

pub struct FormBuilder<'a, S: ?Sized, B: ?Sized> {
    engine: &'a SchemaEngine<S, B>,
}

impl<'a, S, B> FormBuilder<'a, S, B>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    pub fn new(engine: &'a SchemaEngine<S, B>) -> Self {
        Self { engine }
    }

    pub fn build_input_spec(&self, schema_name: &str) -> Result<Vec<InputSpec>, EngineError> {
        input_specs(&self.engine.handle(schema_name)?.schema)
    }

    pub fn build_filter_conditions(&self, schema_name: &str, submitted: &Submission) -> Result<Vec<Condition>, EngineError> {
        filter_conditions(&self.engine.handle(schema_name)?.schema, submitted)
    }

    pub fn clean(&self, schema_name: &str, submitted: &Submission) -> Result<RowValues, EngineError> {
        let handle = self.engine.handle(schema_name)?;
        clean_values(&handle.schema, submitted).map_err(EngineError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_domain::{FieldDef, FieldType, Widget};
    use serde_json::json;

    fn schema() -> Schema {
        let field = |id: i64, name: &str, ty, required, choices: &[&str]| FieldDef { id,
                                                                                    schema_id: 1,
                                                                                    position: id as i32,
                                                                                    name: name.into(),
                                                                                    field_type: ty,
                                                                                    is_required: required,
                                                                                    choices: choices.iter().map(|c| c.to_string()).collect() };
        Schema { id: 1,
                 name: "Shop".into(),
                 description: None,
                 fields: vec![field(0, "name", FieldType::Text, true, &[]),
                              field(1, "week", FieldType::Choice, false, &["Mon", "Tue"]),
                              field(2, "visits", FieldType::Integer, false, &[])] }
    }

    fn submission(v: Value) -> Submission {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn one_spec_per_field_with_constraints() {
        let specs = input_specs(&schema()).unwrap();
        assert_eq!(specs.len(), 3);
        assert!(specs[0].required);
        assert_eq!(specs[1].widget, Widget::Select);
        assert_eq!(specs[1].choices, vec!["Mon", "Tue"]);
        assert_eq!(specs[2].widget, Widget::NumberInput);
    }

    #[test]
    fn empty_schema_is_not_found() {
        let mut s = schema();
        s.fields.clear();
        assert_eq!(input_specs(&s).unwrap_err().kind(), crate::ErrorKind::SchemaNotFound);
        assert_eq!(filter_conditions(&s, &Submission::new()).unwrap_err().kind(),
                   crate::ErrorKind::SchemaNotFound);
    }

    #[test]
    fn filters_drop_empty_values() {
        let conds = filter_conditions(&schema(), &submission(json!({"name": "", "week": "mon", "visits": "3"}))).unwrap();
        assert_eq!(conds,
                   vec![Condition::iexact("week", "mon".into()), Condition::iexact("visits", FieldValue::Integer(3))]);
    }

    #[test]
    fn filters_reject_unknown_keys() {
        let err = filter_conditions(&schema(), &submission(json!({"ghost": "x"}))).unwrap_err();
        assert_eq!(err,
                   EngineError::UnknownField { schema: "Shop".into(),
                                               field: "ghost".into() });
    }

    #[test]
    fn clean_collects_every_error() {
        let errors = clean_values(&schema(), &submission(json!({"week": "Sun", "visits": "x", "extra": 1}))).unwrap_err();
        let fields: Vec<&str> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["extra", "name", "week", "visits"]);
    }

    #[test]
    fn clean_fills_missing_with_null() {
        let values = clean_values(&schema(), &submission(json!({"name": "Acme"}))).unwrap();
        assert_eq!(values.get("week"), Some(&FieldValue::Null));
        assert_eq!(values.get("name"), Some(&FieldValue::Text("Acme".into())));
    }
}
