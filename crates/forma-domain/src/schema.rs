//! Definiciones de esquema (metadatos) y borradores de campo.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::field_type::{form_field, FieldOptions, InputSpec, TEXT_MAX_LEN};
use crate::ident::{table_name_for, validate_field_name};
use crate::{DomainError, FieldType, FieldValue};

/// Esquema persistido con sus campos ordenados por `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: i64,
    pub schema_id: i64,
    pub position: i32,
    pub name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// Campo tal como llega a `upsert_schema` / `replace_fields` (sin ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub choices: Vec<String>,
}

impl Schema {
    pub fn table_name(&self) -> String {
        table_name_for(&self.name)
    }

    /// Busca un campo por su nombre exacto.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Vista estable de la forma del esquema (sin ids) para calcular huellas.
    pub fn shape_json(&self) -> Value {
        let fields: Vec<Value> = self.fields
                                     .iter()
                                     .map(|f| {
                                         json!({
                                             "name": f.name,
                                             "type": f.field_type.as_str(),
                                             "required": f.is_required,
                                             "choices": f.choices,
                                         })
                                     })
                                     .collect();
        json!({ "name": self.name, "fields": fields })
    }
}

impl FieldDef {
    pub fn input_spec(&self) -> Result<InputSpec, DomainError> {
        form_field(self.field_type,
                   &self.name,
                   FieldOptions { label: None,
                                  required: self.is_required,
                                  choices: self.choices.clone() })
    }

    pub fn to_draft(&self) -> FieldDraft {
        FieldDraft { name: self.name.clone(),
                     field_type: self.field_type,
                     is_required: self.is_required,
                     choices: self.choices.clone() }
    }

    /// Coerción tipada sin reglas de formulario (usada por los filtros).
    pub fn coerce(&self, raw: &Value) -> Result<FieldValue, String> {
        self.field_type.coerce(raw)
    }
}

impl FieldDraft {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(),
               field_type,
               is_required: false,
               choices: Vec::new() }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Normaliza opciones y valida nombre + invariantes del tipo.
    pub fn normalized(&self) -> Result<FieldDraft, DomainError> {
        validate_field_name(&self.name)?;
        let choices = if self.field_type == FieldType::Choice { normalize_choices(&self.choices) } else { Vec::new() };
        if self.field_type == FieldType::Choice {
            if choices.is_empty() {
                return Err(DomainError::InvalidDefinition(format!("choice field '{}' needs at least one choice",
                                                                  self.name)));
            }
            if let Some(long) = choices.iter().find(|c| c.chars().count() > TEXT_MAX_LEN) {
                return Err(DomainError::InvalidDefinition(format!("choice '{long}' exceeds {TEXT_MAX_LEN} characters")));
            }
        }
        Ok(FieldDraft { name: self.name.clone(),
                        field_type: self.field_type,
                        is_required: self.is_required,
                        choices })
    }
}

/// Valida un conjunto de borradores: cada uno normalizado y sin nombres
/// repetidos (comparación sin distinguir mayúsculas).
pub fn validate_drafts(drafts: &[FieldDraft]) -> Result<Vec<FieldDraft>, DomainError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let normalized = draft.normalized()?;
        if !seen.insert(normalized.name.to_ascii_lowercase()) {
            return Err(DomainError::InvalidDefinition(format!("duplicate field name '{}'", normalized.name)));
        }
        out.push(normalized);
    }
    Ok(out)
}

/// Conjunto ordenado: recorta espacios, descarta vacíos y duplicados
/// conservando la primera aparición.
pub fn normalize_choices(choices: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    choices.iter()
           .map(|c| c.trim())
           .filter(|c| !c.is_empty())
           .filter(|c| seen.insert(c.to_string()))
           .map(str::to_string)
           .collect()
}

/// Acepta opciones como lista JSON o como string separado por comas.
pub fn parse_choices(raw: &Value) -> Vec<String> {
    let items: Vec<String> = match raw {
        Value::Array(items) => items.iter()
                                    .filter_map(|v| match v {
                                        Value::String(s) => Some(s.clone()),
                                        Value::Number(n) => Some(n.to_string()),
                                        _ => None,
                                    })
                                    .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    normalize_choices(&items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_reject_duplicates_case_insensitively() {
        let drafts = vec![FieldDraft::new("Week", FieldType::Text), FieldDraft::new("week", FieldType::Text)];
        let err = validate_drafts(&drafts).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn choice_drafts_need_choices() {
        let bad = FieldDraft::new("week", FieldType::Choice).with_choices([" ", ""]);
        assert!(bad.normalized().is_err());
        let ok = FieldDraft::new("week", FieldType::Choice).with_choices(["Mon", " Tue ", "Mon"])
                                                           .normalized()
                                                           .unwrap();
        assert_eq!(ok.choices, vec!["Mon", "Tue"]);
    }

    #[test]
    fn non_choice_drafts_drop_choices() {
        let d = FieldDraft::new("alert", FieldType::Text).with_choices(["x"]).normalized().unwrap();
        assert!(d.choices.is_empty());
    }

    #[test]
    fn parse_choices_accepts_csv_and_lists() {
        assert_eq!(parse_choices(&json!("a, b,,c")), vec!["a", "b", "c"]);
        assert_eq!(parse_choices(&json!(["x", 1, null])), vec!["x", "1"]);
        assert!(parse_choices(&Value::Null).is_empty());
    }
}
