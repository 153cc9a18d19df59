//! `TableCatalog` sobre Postgres: columnas vivas desde
//! `information_schema.columns` y DDL serializado por tabla.

use diesel::prelude::*;
use diesel::sql_types::Text;
use forma_core::{EngineError, SyncPlan, TableCatalog};
use log::{debug, info};

use super::sql::ColumnRow;
use super::{with_retry, ConnectionProvider, PgBackend};
use crate::error::PersistenceError;

const COLUMNS_SQL: &str = "SELECT column_name::text AS column_name FROM information_schema.columns \
                           WHERE table_schema = current_schema() AND table_name = $1 ORDER BY ordinal_position";

impl<P: ConnectionProvider> PgBackend<P> {
    fn load_columns(&self, table: &str) -> Result<Vec<String>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            let rows: Vec<ColumnRow> = diesel::sql_query(COLUMNS_SQL).bind::<Text, _>(table).load(&mut conn)?;
            Ok(rows.into_iter().map(|r| r.column_name).collect())
        })
    }
}

impl<P: ConnectionProvider> TableCatalog for PgBackend<P> {
    fn table_exists(&self, table: &str) -> Result<bool, EngineError> {
        Ok(!self.load_columns(table)?.is_empty())
    }

    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, EngineError> {
        let columns = self.load_columns(table)?;
        debug!("catalog:columns table={table} count={}", columns.len());
        Ok(if columns.is_empty() { None } else { Some(columns) })
    }

    /// Todo el plan corre en una transacción que primero toma
    /// `pg_advisory_xact_lock(hashtext(tabla))`; las sentencias usan
    /// `IF NOT EXISTS`, así que otro proceso que llegue después no falla.
    fn apply(&self, plan: &SyncPlan) -> Result<Vec<String>, EngineError> {
        let statements = plan.statements();
        if statements.is_empty() {
            return Ok(statements);
        }
        let table = plan.table();
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))").bind::<Text, _>(table)
                                                                                  .execute(tx)?;
                    for sql in &statements {
                        info!("ddl:apply backend=pg sql={sql}");
                        diesel::sql_query(sql.as_str()).execute(tx)?;
                    }
                    Ok::<(), diesel::result::Error>(())
                })
                .map_err(PersistenceError::from)
        })?;
        Ok(statements)
    }
}
