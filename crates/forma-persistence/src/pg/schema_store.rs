//! `SchemaStore` sobre las tablas de catálogo.
//!
//! - Búsqueda de esquema por `lower(name)` (índice único en la migración).
//! - Los tipos guardados se leen en modo estricto: un tipo desconocido en el
//!   catálogo es `UnsupportedFieldType`, nunca un valor por defecto.
//! - `upsert_schema` y `replace_fields` corren en una sola transacción.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use forma_core::store::{keep_stored_names, plan_field_merge, prepare_upsert};
use forma_core::{EngineError, SchemaStore};
use forma_domain::{FieldDef, FieldDraft, FieldType, Schema};
use log::debug;
use serde_json::Value;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{forma_schema_fields, forma_schemas};

diesel::define_sql_function!(fn lower(x: Text) -> Text);

#[derive(Queryable, Debug)]
struct SchemaRow {
    id: i64,
    name: String,
    description: Option<String>,
}

#[derive(Queryable, Debug)]
struct FieldRow {
    id: i64,
    schema_id: i64,
    position: i32,
    name: String,
    field_type: String,
    is_required: bool,
    choices: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = forma_schemas)]
struct NewSchemaRow<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = forma_schema_fields)]
struct NewFieldRow<'a> {
    schema_id: i64,
    position: i32,
    name: &'a str,
    field_type: &'a str,
    is_required: bool,
    choices: Value,
}

impl FieldRow {
    fn into_def(self) -> Result<FieldDef, PersistenceError> {
        Ok(FieldDef { id: self.id,
                      schema_id: self.schema_id,
                      position: self.position,
                      field_type: FieldType::parse_strict(&self.field_type)?,
                      name: self.name,
                      is_required: self.is_required,
                      choices: forma_domain::parse_choices(&self.choices) })
    }
}

fn choices_json(draft: &FieldDraft) -> Value {
    Value::from(draft.choices.clone())
}

const SCHEMA_COLUMNS: (forma_schemas::id, forma_schemas::name, forma_schemas::description) =
    (forma_schemas::id, forma_schemas::name, forma_schemas::description);

fn find_header(conn: &mut PgConnection, name: &str) -> Result<Option<SchemaRow>, PersistenceError> {
    Ok(forma_schemas::table.filter(lower(forma_schemas::name).eq(name.to_lowercase()))
                           .select(SCHEMA_COLUMNS)
                           .first::<SchemaRow>(conn)
                           .optional()?)
}

fn load_fields(conn: &mut PgConnection, schema_id: i64) -> Result<Vec<FieldDef>, PersistenceError> {
    let rows: Vec<FieldRow> = forma_schema_fields::table.filter(forma_schema_fields::schema_id.eq(schema_id))
                                                        .order((forma_schema_fields::position.asc(),
                                                                forma_schema_fields::id.asc()))
                                                        .load(conn)?;
    rows.into_iter().map(FieldRow::into_def).collect()
}

fn load_schema(conn: &mut PgConnection, header: SchemaRow) -> Result<Schema, PersistenceError> {
    let fields = load_fields(conn, header.id)?;
    Ok(Schema { id: header.id,
                name: header.name,
                description: header.description,
                fields })
}

/// Inserta o actualiza la cabecera. `description == None` conserva la actual.
fn upsert_header(conn: &mut PgConnection, name: &str, description: Option<&str>) -> Result<SchemaRow, PersistenceError> {
    match find_header(conn, name)? {
        Some(current) => {
            let description = description.map(str::to_string).or(current.description);
            Ok(diesel::update(forma_schemas::table.find(current.id)).set((forma_schemas::name.eq(name),
                                                                         forma_schemas::description.eq(description)))
                                                                    .returning(SCHEMA_COLUMNS)
                                                                    .get_result(conn)?)
        }
        None => Ok(diesel::insert_into(forma_schemas::table).values(NewSchemaRow { name, description })
                                                           .returning(SCHEMA_COLUMNS)
                                                           .get_result(conn)?),
    }
}

fn insert_field(conn: &mut PgConnection, schema_id: i64, position: i32, draft: &FieldDraft) -> Result<(), PersistenceError> {
    diesel::insert_into(forma_schema_fields::table).values(NewFieldRow { schema_id,
                                                                        position,
                                                                        name: &draft.name,
                                                                        field_type: draft.field_type.as_str(),
                                                                        is_required: draft.is_required,
                                                                        choices: choices_json(draft) })
                                                   .execute(conn)?;
    Ok(())
}

pub struct PgSchemaStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgSchemaStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> SchemaStore for PgSchemaStore<P> {
    fn get_schema(&self, name: &str) -> Result<Option<Schema>, EngineError> {
        let schema = with_retry(|| {
            let mut conn = self.provider.connection()?;
            match find_header(&mut conn, name)? {
                Some(header) => load_schema(&mut conn, header).map(Some),
                None => Ok(None),
            }
        })?;
        Ok(schema)
    }

    fn list_schemas(&self) -> Result<Vec<Schema>, EngineError> {
        let schemas = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let headers: Vec<SchemaRow> = forma_schemas::table.select(SCHEMA_COLUMNS)
                                                              .order(forma_schemas::name.asc())
                                                              .load(&mut conn)?;
            headers.into_iter().map(|h| load_schema(&mut conn, h)).collect::<Result<Vec<_>, _>>()
        })?;
        Ok(schemas)
    }

    fn upsert_schema(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let drafts = prepare_upsert(name, fields)?;
        let schema = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let header = upsert_header(tx, name, description)?;
                    let existing = load_fields(tx, header.id)?;
                    let plan = plan_field_merge(&existing, &drafts);
                    for (field_id, draft) in &plan.updates {
                        diesel::update(forma_schema_fields::table.find(*field_id))
                            .set((forma_schema_fields::field_type.eq(draft.field_type.as_str()),
                                  forma_schema_fields::is_required.eq(draft.is_required),
                                  forma_schema_fields::choices.eq(choices_json(draft))))
                            .execute(tx)?;
                    }
                    for (position, draft) in &plan.inserts {
                        insert_field(tx, header.id, *position, draft)?;
                    }
                    debug!("schema_store:upsert name={name} updated={} inserted={}",
                           plan.updates.len(),
                           plan.inserts.len());
                    load_schema(tx, header)
                })
        })?;
        Ok(schema)
    }

    fn replace_fields(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let drafts = prepare_upsert(name, fields)?;
        let schema = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let header = upsert_header(tx, name, description)?;
                    let drafts = keep_stored_names(&load_fields(tx, header.id)?, drafts.clone());
                    let deleted = diesel::delete(forma_schema_fields::table.filter(forma_schema_fields::schema_id.eq(header.id)))
                        .execute(tx)?;
                    for (position, draft) in drafts.iter().enumerate() {
                        insert_field(tx, header.id, position as i32, draft)?;
                    }
                    debug!("schema_store:replace_fields name={name} deleted={deleted} inserted={}", drafts.len());
                    load_schema(tx, header)
                })
        })?;
        Ok(schema)
    }
}
