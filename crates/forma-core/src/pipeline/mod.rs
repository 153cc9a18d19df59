//! Pipeline de reconocimiento (evaluación -> decisión).
//!
//! `Submitted` -> `Matched | Unmatched` -> `Decided | NoDecision`. Sin
//! reintentos: cada envío vuelve a empezar desde `Submitted`.

pub mod bootstrap;
pub mod config;
pub mod decision;
pub mod evaluation;

pub use bootstrap::{decision_fields, evaluation_fields, register_recognition_schemas};
pub use config::PipelineConfig;
pub use decision::{DecisionOutcome, DecisionRecord};
pub use evaluation::EvaluationOutcome;

use forma_domain::FieldValue;
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::backend::{Condition, RecordStore, RowValues, TableCatalog};
use crate::constants::{JUDGE_MATCHED_LABEL, JUDGE_UNMATCHED_LABEL};
use crate::engine::SchemaEngine;
use crate::errors::EngineError;
use crate::form::Submission;
use crate::store::SchemaStore;

/// Token de clasificación producido por la etapa 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeValue {
    pub value: String,
    pub matched: bool,
}

impl JudgeValue {
    /// Texto de interfaz asociado al token.
    pub fn ui_label(&self) -> &'static str {
        if self.matched { JUDGE_MATCHED_LABEL } else { JUDGE_UNMATCHED_LABEL }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionOutcome {
    pub run_id: Uuid,
    pub judge: JudgeValue,
    pub evaluation: EvaluationOutcome,
    pub decision: DecisionOutcome,
}

pub struct RecognitionPipeline<'a, S: ?Sized, B: ?Sized> {
    engine: &'a SchemaEngine<S, B>,
    config: PipelineConfig,
}

impl<'a, S, B> RecognitionPipeline<'a, S, B>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    pub fn new(engine: &'a SchemaEngine<S, B>, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, submitted: &Submission) -> Result<RecognitionOutcome, EngineError> {
        let run_id = Uuid::new_v4();
        info!("recognize:start run_id={run_id}");
        let evaluation = self.evaluate(run_id, submitted)?;
        let judge = match &evaluation {
            EvaluationOutcome::Matched { .. } => JudgeValue { value: self.config.judge_matched.clone(),
                                                              matched: true },
            EvaluationOutcome::Unmatched { .. } => JudgeValue { value: self.config.judge_unmatched.clone(),
                                                                matched: false },
        };
        let decision = self.decide(run_id, &judge.value)?;
        info!("recognize:done run_id={run_id} judge={} decided={}", judge.value, decision.is_decided());
        Ok(RecognitionOutcome { run_id,
                                judge,
                                evaluation,
                                decision })
    }

    /// Etapa 1. La actualización masiva y la relectura son una sola
    /// operación transaccional del backend.
    pub fn evaluate(&self, run_id: Uuid, submitted: &Submission) -> Result<EvaluationOutcome, EngineError> {
        let cfg = &self.config;
        let handle = self.engine.handle(&cfg.evaluation_schema)?;
        if handle.schema.field(&cfg.judge_field).is_none() {
            return Err(EngineError::InvalidDefinition(format!("schema '{}' has no '{}' field",
                                                              handle.schema.name, cfg.judge_field)));
        }
        let conditions = evaluation::match_conditions(&handle.schema, &cfg.judge_field, submitted)?;
        let unmatched = || EvaluationOutcome::Unmatched { record: evaluation::virtual_record(&handle.schema,
                                                                                             &cfg.judge_field,
                                                                                             &cfg.judge_unmatched,
                                                                                             submitted) };
        if conditions.is_empty() {
            info!("recognize:evaluate run_id={run_id} conditions=0 outcome=unmatched");
            return Ok(unmatched());
        }

        self.engine.synchronizer().ensure(&handle)?;
        let mut assignment = RowValues::new();
        assignment.insert(cfg.judge_field.clone(), FieldValue::Text(cfg.judge_matched.clone()));
        let mut rows = self.engine.backend().update_matching(&handle.schema, &conditions, &assignment)?;
        if rows.len() > 1 {
            warn!("recognize:ambiguous run_id={run_id} matched_rows={} canonical_id={:?}",
                  rows.len(),
                  rows[0].id);
        }
        if rows.is_empty() {
            info!("recognize:evaluate run_id={run_id} outcome=unmatched");
            return Ok(unmatched());
        }
        let matched_rows = rows.len();
        let record = rows.swap_remove(0);
        info!("recognize:evaluate run_id={run_id} outcome=matched rows={matched_rows}");
        Ok(EvaluationOutcome::Matched { record, matched_rows })
    }

    /// Etapa 2: búsqueda exacta (distingue mayúsculas) por judge.
    pub fn decide(&self, run_id: Uuid, judge: &str) -> Result<DecisionOutcome, EngineError> {
        let cfg = &self.config;
        let handle = self.engine.handle(&cfg.decision_schema)?;
        if handle.schema.field(&cfg.judge_field).is_none() {
            return Err(EngineError::InvalidDefinition(format!("schema '{}' has no '{}' field",
                                                              handle.schema.name, cfg.judge_field)));
        }
        self.engine.synchronizer().ensure(&handle)?;
        let conditions = [Condition::exact(cfg.judge_field.clone(), FieldValue::Text(judge.to_string()))];
        let rows = self.engine.backend().select(&handle.schema, &conditions)?;
        match rows.into_iter().next() {
            Some(record) => Ok(DecisionOutcome::Decided(DecisionRecord { judge: judge.to_string(),
                                                                         record })),
            None => {
                warn!("recognize:no_decision run_id={run_id} judge={judge}");
                Ok(DecisionOutcome::no_decision(judge))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_labels_follow_match_state() {
        let matched = JudgeValue { value: "has-contact-record".into(),
                                   matched: true };
        let unmatched = JudgeValue { value: "needs-contact".into(),
                                     matched: false };
        assert_eq!(matched.ui_label(), "連絡なし");
        assert_eq!(unmatched.ui_label(), "連絡あり");
    }

    #[test]
    fn no_decision_message_names_judge() {
        match DecisionOutcome::no_decision("needs-contact") {
            DecisionOutcome::NoDecision { message, .. } => {
                assert_eq!(message, "no decision data found for judge=needs-contact")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
