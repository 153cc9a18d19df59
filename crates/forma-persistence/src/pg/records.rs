//! `RecordStore` sobre Postgres con SQL dinámico.
//!
//! Las escrituras devuelven la fila con `RETURNING row_to_json(..)`, así que
//! lo que ve el llamador es exactamente lo que quedó persistido.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use forma_core::ddl::quote_ident;
use forma_core::{Condition, EngineError, RecordStore, RowValues};
use forma_domain::{Record, Schema};
use log::debug;

use super::sql::{decode_record, typed_param, where_clause, JsonRow, SqlParams};
use super::{with_retry, ConnectionProvider, PgBackend};
use crate::error::PersistenceError;

const ROW_ALIAS: &str = "r";

fn insert_one(conn: &mut PgConnection, schema: &Schema, values: &RowValues) -> Result<Record, PersistenceError> {
    let table = quote_ident(&schema.table_name());
    let mut params = SqlParams::default();
    let sql = if values.is_empty() {
        format!("INSERT INTO {table} AS {ROW_ALIAS} DEFAULT VALUES RETURNING row_to_json({ROW_ALIAS})::text AS payload")
    } else {
        let columns: Vec<String> = values.keys().map(|k| quote_ident(k)).collect();
        let placeholders: Vec<String> = values.iter()
                                              .map(|(k, v)| typed_param(schema, k, v, &mut params))
                                              .collect();
        format!("INSERT INTO {table} AS {ROW_ALIAS} ({}) VALUES ({}) RETURNING row_to_json({ROW_ALIAS})::text AS payload",
                columns.join(", "),
                placeholders.join(", "))
    };
    let row: JsonRow = params.into_query(sql).get_result(conn)?;
    decode_record(schema, &row.payload)
}

/// `UndefinedTable` en una tabla de esquema equivale a `SchemaNotFound`.
fn to_engine(schema: &Schema, err: PersistenceError) -> EngineError {
    match err {
        PersistenceError::UndefinedTable(_) => EngineError::SchemaNotFound(schema.name.clone()),
        other => other.into(),
    }
}

impl<P: ConnectionProvider> RecordStore for PgBackend<P> {
    fn insert(&self, schema: &Schema, values: &RowValues) -> Result<Record, EngineError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            insert_one(&mut conn, schema, values)
        }).map_err(|e| to_engine(schema, e))
    }

    fn insert_batch(&self, schema: &Schema, rows: &[RowValues]) -> Result<Vec<Record>, EngineError> {
        let records: Vec<Record> = with_retry(|| {
                                       let mut conn = self.provider.connection()?;
                                       conn.build_transaction()
                                           .read_write()
                                           .run(|tx| rows.iter().map(|values| insert_one(tx, schema, values)).collect())
                                   }).map_err(|e| to_engine(schema, e))?;
        debug!("records:insert_batch table={} count={}", schema.table_name(), records.len());
        Ok(records)
    }

    fn select(&self, schema: &Schema, conditions: &[Condition]) -> Result<Vec<Record>, EngineError> {
        let rows: Vec<JsonRow> = with_retry(|| {
                                     let mut params = SqlParams::default();
                                     let sql = format!("SELECT row_to_json({ROW_ALIAS})::text AS payload FROM {} {ROW_ALIAS}{} \
                                                        ORDER BY {ROW_ALIAS}.\"id\"",
                                                       quote_ident(&schema.table_name()),
                                                       where_clause(schema, conditions, &mut params));
                                     let mut conn = self.provider.connection()?;
                                     Ok(params.into_query(sql).load(&mut conn)?)
                                 }).map_err(|e| to_engine(schema, e))?;
        rows.iter()
            .map(|row| decode_record(schema, &row.payload).map_err(EngineError::from))
            .collect()
    }

    /// Un único `UPDATE ... RETURNING`: la actualización y la relectura son
    /// atómicas. `RETURNING` no ordena, así que se ordena por `id` aquí.
    fn update_matching(&self,
                       schema: &Schema,
                       conditions: &[Condition],
                       assignments: &RowValues)
                       -> Result<Vec<Record>, EngineError> {
        let rows: Vec<JsonRow> = with_retry(|| {
                                     let mut params = SqlParams::default();
                                     let mut sets: Vec<String> =
                                         assignments.iter()
                                                    .map(|(k, v)| format!("{} = {}", quote_ident(k), typed_param(schema, k, v, &mut params)))
                                                    .collect();
                                     sets.push("\"updated_at\" = now()".into());
                                     let sql = format!("UPDATE {} AS {ROW_ALIAS} SET {}{} RETURNING row_to_json({ROW_ALIAS})::text AS payload",
                                                       quote_ident(&schema.table_name()),
                                                       sets.join(", "),
                                                       where_clause(schema, conditions, &mut params));
                                     let mut conn = self.provider.connection()?;
                                     Ok(params.into_query(sql).load(&mut conn)?)
                                 }).map_err(|e| to_engine(schema, e))?;
        let mut records = rows.iter()
                              .map(|row| decode_record(schema, &row.payload))
                              .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}
