//! Valores tipados de las tablas dinámicas.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Representación textual usada para enlazar parámetros en SQL
    /// (`None` para `Null`). El backend castea al tipo de la columna.
    pub fn sql_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Igualdad usada por los filtros. Los textos pueden compararse sin
    /// distinguir mayúsculas; `Null` nunca coincide (igual que `= NULL` en SQL).
    pub fn matches(&self, other: &FieldValue, ignore_case: bool) -> bool {
        match (self, other) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => false,
            (FieldValue::Text(a), FieldValue::Text(b)) if ignore_case => a.to_lowercase() == b.to_lowercase(),
            (a, b) => a == b,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Boolean(b) => Value::Bool(*b),
            // Como string para no perder escala ni precisión.
            FieldValue::Decimal(d) => Value::String(d.to_string()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str(""),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Decimal(d) => write!(f, "{d}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn text_matching_can_ignore_case() {
        let stored = FieldValue::from("Mon");
        assert!(stored.matches(&FieldValue::from("mon"), true));
        assert!(!stored.matches(&FieldValue::from("mon"), false));
        assert!(!stored.matches(&FieldValue::from("Tues"), true));
        assert!(!FieldValue::Null.matches(&FieldValue::Null, true));
    }

    #[test]
    fn decimal_equality_is_numeric() {
        let a = FieldValue::Decimal(Decimal::from_str("100.00").unwrap());
        let b = FieldValue::Decimal(Decimal::from_str("100").unwrap());
        assert!(a.matches(&b, false));
        assert_eq!(a.to_json(), Value::String("100.00".into()));
    }

    #[test]
    fn null_has_no_sql_text() {
        assert_eq!(FieldValue::Null.sql_text(), None);
        assert_eq!(FieldValue::Boolean(true).sql_text().as_deref(), Some("true"));
    }
}
