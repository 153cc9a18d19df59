//! Nombres usados por el pipeline de reconocimiento.

use std::env;

use serde::{Deserialize, Serialize};

use crate::constants::{DECISION_SCHEMA, EVALUATION_SCHEMA, JUDGE_FIELD, JUDGE_MATCHED, JUDGE_UNMATCHED,
                       RECOGNITION_SCHEMA};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub evaluation_schema: String,
    pub decision_schema: String,
    /// Esquema opcional; sin campos declarados no se crea tabla.
    pub recognition_schema: String,
    pub judge_field: String,
    /// Token persistido en filas coincidentes.
    pub judge_matched: String,
    /// Token del registro virtual cuando nada coincide (nunca se persiste).
    pub judge_unmatched: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { evaluation_schema: EVALUATION_SCHEMA.into(),
               decision_schema: DECISION_SCHEMA.into(),
               recognition_schema: RECOGNITION_SCHEMA.into(),
               judge_field: JUDGE_FIELD.into(),
               judge_matched: JUDGE_MATCHED.into(),
               judge_unmatched: JUDGE_UNMATCHED.into() }
    }
}

impl PipelineConfig {
    /// Valores por defecto con overrides `FORMA_*` del entorno.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, fallback: String| lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(fallback);
        Self { evaluation_schema: pick("FORMA_EVALUATION_SCHEMA", defaults.evaluation_schema),
               decision_schema: pick("FORMA_DECISION_SCHEMA", defaults.decision_schema),
               recognition_schema: pick("FORMA_RECOGNITION_SCHEMA", defaults.recognition_schema),
               judge_field: pick("FORMA_JUDGE_FIELD", defaults.judge_field),
               judge_matched: pick("FORMA_JUDGE_MATCHED", defaults.judge_matched),
               judge_unmatched: pick("FORMA_JUDGE_UNMATCHED", defaults.judge_unmatched) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_non_empty_keys() {
        let cfg = PipelineConfig::from_lookup(|k| match k {
                                                  "FORMA_JUDGE_FIELD" => Some("verdict".into()),
                                                  "FORMA_DECISION_SCHEMA" => Some("  ".into()),
                                                  "FORMA_RECOGNITION_SCHEMA" => Some("triage".into()),
                                                  _ => None,
                                              });
        assert_eq!(cfg.judge_field, "verdict");
        assert_eq!(cfg.decision_schema, "decision");
        assert_eq!(cfg.recognition_schema, "triage");
        assert_eq!(cfg.judge_unmatched, "needs-contact");
    }
}
