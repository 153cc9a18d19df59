//! Registro de tipos de campo.
//!
//! El conjunto de tipos es cerrado: cada variante de `FieldType` conoce su
//! columna de almacenamiento (`storage_type`), su widget de formulario y cómo
//! convertir un valor crudo (JSON o texto de formulario) en un `FieldValue`.
//! No hay inferencia: un nombre desconocido es un error (`parse_strict`) salvo
//! en los caminos de importación tolerantes (`parse_lenient`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DomainError, FieldValue};

/// Longitud máxima de los campos de texto acotado (y de las opciones).
pub const TEXT_MAX_LEN: usize = 255;
/// Precisión total de los campos decimales.
pub const DECIMAL_PRECISION: u8 = 10;
/// Dígitos fraccionarios de los campos decimales.
pub const DECIMAL_SCALE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FieldType {
    Text,
    LongText,
    Integer,
    Boolean,
    Decimal,
    Date,
    DateTime,
    Choice,
}

/// Tipo concreto de columna (dialecto Postgres).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Varchar(u16),
    Text,
    Integer,
    Boolean,
    Numeric { precision: u8, scale: u8 },
    Date,
    Timestamptz,
}

impl ColumnType {
    pub fn sql(&self) -> String {
        match self {
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::Numeric { precision, scale } => format!("NUMERIC({precision},{scale})"),
            ColumnType::Date => "DATE".into(),
            ColumnType::Timestamptz => "TIMESTAMPTZ".into(),
        }
    }
}

/// Widget sugerido para la capa de presentación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    TextArea,
    NumberInput,
    DecimalInput,
    Checkbox,
    DateInput,
    DateTimeInput,
    Select,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [FieldType::Text,
                                     FieldType::LongText,
                                     FieldType::Integer,
                                     FieldType::Boolean,
                                     FieldType::Decimal,
                                     FieldType::Date,
                                     FieldType::DateTime,
                                     FieldType::Choice];

    /// Nombre canónico (el que se persiste en metadatos y exportaciones).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::LongText => "long_text",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Choice => "choice",
        }
    }

    /// Acepta nombres canónicos y los nombres heredados (`CharField`,
    /// `TextField`, ...) sin distinguir mayúsculas.
    pub fn parse_strict(raw: &str) -> Result<FieldType, DomainError> {
        let key = raw.trim().to_ascii_lowercase();
        let ty = match key.as_str() {
            "text" | "char" | "charfield" | "string" => FieldType::Text,
            "long_text" | "longtext" | "textfield" => FieldType::LongText,
            "integer" | "int" | "integerfield" => FieldType::Integer,
            "boolean" | "bool" | "booleanfield" => FieldType::Boolean,
            "decimal" | "decimalfield" => FieldType::Decimal,
            "date" | "datefield" => FieldType::Date,
            "datetime" | "date_time" | "datetimefield" => FieldType::DateTime,
            "choice" | "choicefield" => FieldType::Choice,
            _ => return Err(DomainError::UnsupportedFieldType(raw.to_string())),
        };
        Ok(ty)
    }

    /// Variante tolerante para importaciones de datos: lo desconocido cae en
    /// `LongText` con un warning.
    pub fn parse_lenient(raw: &str) -> FieldType {
        match FieldType::parse_strict(raw) {
            Ok(ty) => ty,
            Err(_) => {
                warn!("unsupported field type '{raw}', defaulting to long_text");
                FieldType::LongText
            }
        }
    }

    pub fn storage_type(&self) -> ColumnType {
        match self {
            FieldType::Text | FieldType::Choice => ColumnType::Varchar(TEXT_MAX_LEN as u16),
            FieldType::LongText => ColumnType::Text,
            FieldType::Integer => ColumnType::Integer,
            FieldType::Boolean => ColumnType::Boolean,
            FieldType::Decimal => ColumnType::Numeric { precision: DECIMAL_PRECISION,
                                                        scale: DECIMAL_SCALE },
            FieldType::Date => ColumnType::Date,
            FieldType::DateTime => ColumnType::Timestamptz,
        }
    }

    pub fn widget(&self) -> Widget {
        match self {
            FieldType::Text => Widget::TextInput,
            FieldType::LongText => Widget::TextArea,
            FieldType::Integer => Widget::NumberInput,
            FieldType::Boolean => Widget::Checkbox,
            FieldType::Decimal => Widget::DecimalInput,
            FieldType::Date => Widget::DateInput,
            FieldType::DateTime => Widget::DateTimeInput,
            FieldType::Choice => Widget::Select,
        }
    }

    /// Tipos cuyo filtro se compara sin distinguir mayúsculas.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::LongText | FieldType::Choice)
    }

    /// Convierte un valor crudo al tipo del campo. El string vacío y `null`
    /// significan "sin valor". No valida obligatoriedad ni opciones (eso lo
    /// hace `InputSpec::clean`).
    pub fn coerce(&self, raw: &Value) -> Result<FieldValue, String> {
        if is_blank(raw) {
            return Ok(FieldValue::Null);
        }
        match self {
            FieldType::Text | FieldType::Choice => {
                let s = scalar_to_string(raw)?;
                if s.chars().count() > TEXT_MAX_LEN {
                    return Err(format!("ensure this value has at most {TEXT_MAX_LEN} characters"));
                }
                Ok(FieldValue::Text(s))
            }
            FieldType::LongText => Ok(FieldValue::Text(scalar_to_string(raw)?)),
            FieldType::Integer => coerce_integer(raw),
            FieldType::Boolean => coerce_boolean(raw),
            FieldType::Decimal => coerce_decimal(raw),
            FieldType::Date => {
                let s = expect_str(raw, "date")?;
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map(FieldValue::Date)
                                                        .map_err(|_| format!("'{s}' is not a valid date (YYYY-MM-DD)"))
            }
            FieldType::DateTime => {
                let s = expect_str(raw, "datetime")?;
                parse_datetime(s).map(FieldValue::DateTime)
                                 .ok_or_else(|| format!("'{s}' is not a valid datetime (RFC 3339)"))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::parse_strict(s)
    }
}

impl TryFrom<String> for FieldType {
    type Error = DomainError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldType::parse_strict(&value)
    }
}

impl From<FieldType> for &'static str {
    fn from(value: FieldType) -> Self {
        value.as_str()
    }
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn scalar_to_string(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err("expected a scalar value".into()),
    }
}

fn expect_str<'a>(raw: &'a Value, what: &str) -> Result<&'a str, String> {
    raw.as_str().map(str::trim).ok_or_else(|| format!("expected a {what} string"))
}

fn coerce_integer(raw: &Value) -> Result<FieldValue, String> {
    let n = match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                _ => return Err(format!("'{n}' is not a whole number")),
            },
        },
        Value::String(s) => s.trim()
                             .parse::<i64>()
                             .map_err(|_| format!("'{}' is not a whole number", s.trim()))?,
        _ => return Err("expected a whole number".into()),
    };
    if n < i32::MIN as i64 || n > i32::MAX as i64 {
        return Err(format!("{n} is out of range for an integer field"));
    }
    Ok(FieldValue::Integer(n))
}

fn coerce_boolean(raw: &Value) -> Result<FieldValue, String> {
    match raw {
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(FieldValue::Boolean(false)),
            Some(1) => Ok(FieldValue::Boolean(true)),
            _ => Err(format!("'{n}' is not a boolean")),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" => Ok(FieldValue::Boolean(true)),
            "false" | "0" | "no" | "off" | "f" => Ok(FieldValue::Boolean(false)),
            other => Err(format!("'{other}' is not a boolean")),
        },
        _ => Err("expected a boolean".into()),
    }
}

fn coerce_decimal(raw: &Value) -> Result<FieldValue, String> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err("expected a decimal number".into()),
    };
    let parsed = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
                                         .map_err(|_| format!("'{text}' is not a decimal number"))?;
    let normalized = parsed.normalize();
    if normalized.scale() > DECIMAL_SCALE as u32 {
        return Err(format!("ensure that there are no more than {DECIMAL_SCALE} decimal places"));
    }
    let int_digits_limit = Decimal::from(10_i64.pow((DECIMAL_PRECISION - DECIMAL_SCALE) as u32));
    if normalized.abs() >= int_digits_limit {
        return Err(format!("ensure that there are no more than {DECIMAL_PRECISION} digits in total"));
    }
    let mut value = normalized;
    value.rescale(DECIMAL_SCALE as u32);
    Ok(FieldValue::Decimal(value))
}

/// RFC 3339 o fecha-hora sin zona (interpretada como UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"].iter()
                                                     .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                                                     .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Opciones de construcción de un `InputSpec`.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub label: Option<String>,
    pub required: bool,
    pub choices: Vec<String>,
}

/// Especificación de entrada validada para un campo (widget + validador).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub widget: Widget,
    pub required: bool,
    /// Conjunto cerrado de valores (sólo para `Choice`).
    pub choices: Vec<String>,
    pub max_length: Option<usize>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

/// Construye el `InputSpec` de un tipo. `Choice` sin opciones es un error de
/// definición.
pub fn form_field(field_type: FieldType, name: &str, options: FieldOptions) -> Result<InputSpec, DomainError> {
    if field_type == FieldType::Choice && options.choices.is_empty() {
        return Err(DomainError::InvalidDefinition(format!("choice field '{name}' has no choices")));
    }
    let (precision, scale) = match field_type {
        FieldType::Decimal => (Some(DECIMAL_PRECISION), Some(DECIMAL_SCALE)),
        _ => (None, None),
    };
    let max_length = match field_type {
        FieldType::Text | FieldType::Choice => Some(TEXT_MAX_LEN),
        _ => None,
    };
    let choices = if field_type == FieldType::Choice { options.choices } else { Vec::new() };
    Ok(InputSpec { name: name.to_string(),
                   label: options.label.unwrap_or_else(|| name.to_string()),
                   field_type,
                   widget: field_type.widget(),
                   required: options.required,
                   choices,
                   max_length,
                   precision,
                   scale })
}

impl InputSpec {
    /// Valida un valor crudo: coerción de tipo, obligatoriedad y pertenencia
    /// al conjunto de opciones.
    pub fn clean(&self, raw: &Value) -> Result<FieldValue, String> {
        let value = self.field_type.coerce(raw)?;
        if value.is_null() {
            if self.required {
                return Err("this field is required".into());
            }
            return Ok(value);
        }
        if self.field_type == FieldType::Choice {
            let text = value.as_text().unwrap_or_default();
            if !self.choices.iter().any(|c| c == text) {
                return Err(format!("'{text}' is not one of the available choices"));
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn storage_mapping_is_fixed() {
        assert_eq!(FieldType::Text.storage_type().sql(), "VARCHAR(255)");
        assert_eq!(FieldType::LongText.storage_type().sql(), "TEXT");
        assert_eq!(FieldType::Integer.storage_type().sql(), "INTEGER");
        assert_eq!(FieldType::Boolean.storage_type().sql(), "BOOLEAN");
        assert_eq!(FieldType::Decimal.storage_type().sql(), "NUMERIC(10,2)");
        assert_eq!(FieldType::Date.storage_type().sql(), "DATE");
        assert_eq!(FieldType::DateTime.storage_type().sql(), "TIMESTAMPTZ");
        assert_eq!(FieldType::Choice.storage_type().sql(), "VARCHAR(255)");
    }

    #[test]
    fn parses_canonical_and_legacy_names() {
        for ty in FieldType::ALL {
            assert_eq!(FieldType::parse_strict(ty.as_str()).unwrap(), ty);
        }
        assert_eq!(FieldType::parse_strict("CharField").unwrap(), FieldType::Text);
        assert_eq!(FieldType::parse_strict("TextField").unwrap(), FieldType::LongText);
        assert_eq!(FieldType::parse_strict("DateTimeField").unwrap(), FieldType::DateTime);
        assert!(matches!(FieldType::parse_strict("JSONField"), Err(DomainError::UnsupportedFieldType(_))));
        assert_eq!(FieldType::parse_lenient("JSONField"), FieldType::LongText);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let out = serde_json::to_string(&FieldType::DateTime).unwrap();
        assert_eq!(out, "\"datetime\"");
        let back: FieldType = serde_json::from_str("\"IntegerField\"").unwrap();
        assert_eq!(back, FieldType::Integer);
        assert!(serde_json::from_str::<FieldType>("\"blob\"").is_err());
    }

    #[test]
    fn coerces_scalars() {
        assert_eq!(FieldType::Integer.coerce(&json!("42")).unwrap(), FieldValue::Integer(42));
        assert_eq!(FieldType::Integer.coerce(&json!(7)).unwrap(), FieldValue::Integer(7));
        assert!(FieldType::Integer.coerce(&json!("4.5")).is_err());
        assert!(FieldType::Integer.coerce(&json!(5_000_000_000_i64)).is_err());
        assert_eq!(FieldType::Boolean.coerce(&json!("on")).unwrap(), FieldValue::Boolean(true));
        assert_eq!(FieldType::Text.coerce(&json!(100)).unwrap(), FieldValue::Text("100".into()));
        assert_eq!(FieldType::Text.coerce(&json!("  ")).unwrap(), FieldValue::Null);
        assert!(FieldType::Text.coerce(&json!("x".repeat(256))).is_err());
        assert!(FieldType::LongText.coerce(&json!("x".repeat(256))).is_ok());
    }

    #[test]
    fn decimal_respects_precision_and_scale() {
        let v = FieldType::Decimal.coerce(&json!("12.5")).unwrap();
        assert_eq!(v.to_string(), "12.50");
        assert!(FieldType::Decimal.coerce(&json!("1.234")).is_err());
        assert!(FieldType::Decimal.coerce(&json!("123456789.00")).is_err());
        assert!(FieldType::Decimal.coerce(&json!(99999999.99)).is_ok());
    }

    #[test]
    fn dates_and_datetimes() {
        assert!(FieldType::Date.coerce(&json!("2025-01-01")).is_ok());
        assert!(FieldType::Date.coerce(&json!("01/01/2025")).is_err());
        let dt = FieldType::DateTime.coerce(&json!("2025-01-01T09:00:00+09:00")).unwrap();
        assert_eq!(dt.to_string(), "2025-01-01T00:00:00+00:00");
        assert!(FieldType::DateTime.coerce(&json!("2025-01-01 10:30:00")).is_ok());
    }

    #[test]
    fn form_field_requires_choices_for_choice() {
        let err = form_field(FieldType::Choice, "week", FieldOptions::default()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidDefinition(_)));
        let spec = form_field(FieldType::Choice,
                              "week",
                              FieldOptions { required: true,
                                             choices: vec!["Mon".into(), "Tue".into()],
                                             ..Default::default() }).unwrap();
        assert_eq!(spec.widget, Widget::Select);
        assert_eq!(spec.label, "week");
        assert!(spec.clean(&json!("Mon")).is_ok());
        assert!(spec.clean(&json!("mon")).is_err());
        assert_eq!(spec.clean(&json!("")).unwrap_err(), "this field is required");
    }
}
