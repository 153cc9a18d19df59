//! Filas de tablas dinámicas.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::FieldValue;

/// Una fila de la tabla de respaldo de un esquema. `id == None` marca un
/// registro virtual (no persistido).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: Option<i64>,
    pub values: IndexMap<String, FieldValue>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn virtual_record(values: IndexMap<String, FieldValue>) -> Self {
        Self { values, ..Default::default() }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.values.insert(field.into(), value);
    }

    /// Objeto JSON plano: `id`, campos en orden de esquema, `created_at`,
    /// `updated_at`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), self.id.map(Value::from).unwrap_or(Value::Null));
        for (name, value) in &self.values {
            map.insert(name.clone(), value.to_json());
        }
        let ts = |t: &Option<DateTime<Utc>>| {
            t.map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, false)))
             .unwrap_or(Value::Null)
        };
        map.insert("created_at".into(), ts(&self.created_at));
        map.insert("updated_at".into(), ts(&self.updated_at));
        Value::Object(map)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
