//! Etapa 1: buscar coincidencias en la tabla de evaluación.

use forma_domain::{FieldValue, Record, Schema};
use serde::Serialize;

use crate::backend::Condition;
use crate::errors::EngineError;
use crate::form::{filter_conditions, Submission};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// `record` es la fila canónica (menor `id`) ya actualizada.
    Matched { record: Record, matched_rows: usize },
    /// Registro virtual, no persistido.
    Unmatched { record: Record },
}

impl EvaluationOutcome {
    pub fn record(&self) -> &Record {
        match self {
            EvaluationOutcome::Matched { record, .. } | EvaluationOutcome::Unmatched { record } => record,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, EvaluationOutcome::Matched { .. })
    }
}

/// Condiciones sobre los campos no-judge enviados (vacíos excluidos).
pub fn match_conditions(schema: &Schema, judge_field: &str, submitted: &Submission) -> Result<Vec<Condition>, EngineError> {
    let mut without_judge = submitted.clone();
    without_judge.remove(judge_field);
    filter_conditions(schema, &without_judge)
}

/// Registro virtual con los valores enviados y el token de "sin coincidencia".
pub fn virtual_record(schema: &Schema, judge_field: &str, judge: &str, submitted: &Submission) -> Record {
    let values = schema.fields
                       .iter()
                       .map(|f| {
                           let value = if f.name == judge_field {
                               FieldValue::Text(judge.to_string())
                           } else {
                               submitted.get(&f.name)
                                        .and_then(|raw| f.coerce(raw).ok())
                                        .unwrap_or(FieldValue::Null)
                           };
                           (f.name.clone(), value)
                       })
                       .collect();
    Record::virtual_record(values)
}
