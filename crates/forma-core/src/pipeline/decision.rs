//! Etapa 2: acción asociada al valor judge.

use forma_domain::Record;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub judge: String,
    /// Fila completa de la tabla de decisión (PhoneAction, EDIAction, ...).
    pub record: Record,
}

impl DecisionRecord {
    pub fn action(&self, field: &str) -> Option<&str> {
        self.record.text(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Decided(DecisionRecord),
    /// Condición recuperable de cara al usuario, no un error.
    NoDecision { judge: String, message: String },
}

impl DecisionOutcome {
    pub fn no_decision(judge: &str) -> Self {
        DecisionOutcome::NoDecision { judge: judge.to_string(),
                                      message: format!("no decision data found for judge={judge}") }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, DecisionOutcome::Decided(_))
    }
}
