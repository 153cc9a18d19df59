//! SQL dinámico para tablas de esquema: parámetros enlazados como texto y
//! casteados al tipo de columna en el propio SQL.

use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{Nullable, Text};
use diesel::QueryableByName;
use forma_core::ddl::quote_ident;
use forma_core::{Condition, Match};
use forma_domain::field_type::parse_datetime;
use forma_domain::{FieldValue, Record, Schema};
use log::warn;
use serde_json::{Map, Value};

use crate::error::PersistenceError;

/// Fila serializada con `row_to_json(..)::text`.
#[derive(QueryableByName, Debug)]
pub(crate) struct JsonRow {
    #[diesel(sql_type = Text)]
    pub payload: String,
}

#[derive(QueryableByName, Debug)]
pub(crate) struct ColumnRow {
    #[diesel(sql_type = Text)]
    pub column_name: String,
}

/// Acumula parámetros posicionales (`$1`, `$2`, ...).
#[derive(Default)]
pub(crate) struct SqlParams {
    values: Vec<Option<String>>,
}

impl SqlParams {
    pub fn push(&mut self, value: &FieldValue) -> String {
        self.values.push(value.sql_text());
        format!("${}", self.values.len())
    }

    pub fn into_query(self, sql: String) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
        let mut query = diesel::sql_query(sql).into_boxed::<Pg>();
        for value in self.values {
            query = query.bind::<Nullable<Text>, _>(value);
        }
        query
    }
}

/// Placeholder casteado al tipo de almacenamiento del campo.
pub(crate) fn typed_param(schema: &Schema, column: &str, value: &FieldValue, params: &mut SqlParams) -> String {
    let placeholder = params.push(value);
    match schema.field(column) {
        Some(field) => format!("{placeholder}::{}", field.field_type.storage_type().sql()),
        None => placeholder,
    }
}

/// `WHERE ...` (vacío si no hay condiciones).
pub(crate) fn where_clause(schema: &Schema, conditions: &[Condition], params: &mut SqlParams) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = conditions.iter()
                                       .map(|c| {
                                           let column = quote_ident(&c.field);
                                           let textual = schema.field(&c.field).map_or(true, |f| f.field_type.is_textual());
                                           if textual && c.op == Match::IExact {
                                               let placeholder = params.push(&c.value);
                                               format!("lower({column}::text) = lower({placeholder})")
                                           } else {
                                               format!("{column} = {}", typed_param(schema, &c.field, &c.value, params))
                                           }
                                       })
                                       .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

/// Reconstruye un `Record` a partir de la fila JSON. Los valores que ya no
/// encajan en el tipo actual del campo se conservan como texto.
pub(crate) fn decode_record(schema: &Schema, payload: &str) -> Result<Record, PersistenceError> {
    let row: Map<String, Value> =
        serde_json::from_str(payload).map_err(|e| PersistenceError::Unknown(format!("row decode: {e}")))?;
    let timestamp = |key: &str| row.get(key).and_then(Value::as_str).and_then(parse_datetime);
    let values = schema.fields
                       .iter()
                       .map(|f| {
                           let raw = row.get(&f.name).unwrap_or(&Value::Null);
                           let value = f.coerce(raw).unwrap_or_else(|reason| {
                                                         warn!("records:decode_mismatch field={} reason={reason}", f.name);
                                                         match raw {
                                                             Value::String(s) => FieldValue::Text(s.clone()),
                                                             other => FieldValue::Text(other.to_string()),
                                                         }
                                                     });
                           (f.name.clone(), value)
                       })
                       .collect();
    Ok(Record { id: row.get("id").and_then(Value::as_i64),
                values,
                created_at: timestamp("created_at"),
                updated_at: timestamp("updated_at") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_domain::{FieldDef, FieldType};

    fn schema() -> Schema {
        let field = |id: i64, name: &str, ty| FieldDef { id,
                                                          schema_id: 1,
                                                          position: id as i32,
                                                          name: name.into(),
                                                          field_type: ty,
                                                          is_required: false,
                                                          choices: vec![] };
        Schema { id: 1,
                 name: "Shop".into(),
                 description: None,
                 fields: vec![field(0, "week", FieldType::Text), field(1, "retail", FieldType::Decimal)] }
    }

    #[test]
    fn textual_iexact_uses_lower_and_others_are_typed() {
        let mut params = SqlParams::default();
        let sql = where_clause(&schema(),
                               &[Condition::iexact("week", "Mon".into()),
                                 Condition::iexact("retail", FieldValue::Text("1".into()))],
                               &mut params);
        assert_eq!(sql, " WHERE lower(\"week\"::text) = lower($1) AND \"retail\" = $2::NUMERIC(10,2)");
    }

    #[test]
    fn decodes_row_to_json_payload() {
        let payload = r#"{"id": 4, "week": "Mon", "retail": 100.5, "created_at": "2025-01-01T10:00:00.5+00:00", "updated_at": "2025-01-01T10:00:00+00:00", "legacy": 1}"#;
        let record = decode_record(&schema(), payload).unwrap();
        assert_eq!(record.id, Some(4));
        assert_eq!(record.get("retail").map(|v| v.to_string()), Some("100.50".into()));
        assert!(record.created_at.is_some());
        assert!(record.get("legacy").is_none());
    }
}
