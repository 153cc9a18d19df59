//! Compilador de esquema de tabla: de `Schema` a DDL concreto.
//!
//! Todo el DDL que emite el motor sale de aquí, sin generación de código en
//! tiempo de ejecución. Los identificadores siempre van entre comillas dobles.

use std::collections::HashSet;

use forma_domain::{ColumnType, FieldDef, Schema};

use crate::constants::{CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};

/// Cita un identificador Postgres (duplica comillas internas).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Columna dinámica derivada de un campo. Las columnas dinámicas son siempre
/// anulables; obligatoriedad y opciones se validan en la capa de formularios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn for_field(field: &FieldDef) -> Self {
        Self { name: field.name.clone(),
               column_type: field.field_type.storage_type(),
               nullable: true }
    }

    pub fn sql(&self) -> String {
        let null = if self.nullable { "NULL" } else { "NOT NULL" };
        format!("{} {} {}", quote_ident(&self.name), self.column_type.sql(), null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDefinition {
    pub fn for_schema(schema: &Schema) -> Self {
        Self { table: schema.table_name(),
               columns: schema.fields.iter().map(ColumnDef::for_field).collect() }
    }

    pub fn create_sql(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() + 3);
        parts.push(format!("{} BIGSERIAL PRIMARY KEY", quote_ident(ID_COLUMN)));
        parts.extend(self.columns.iter().map(ColumnDef::sql));
        parts.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT now()", quote_ident(CREATED_AT_COLUMN)));
        parts.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT now()", quote_ident(UPDATED_AT_COLUMN)));
        format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(&self.table), parts.join(", "))
    }

    /// Todas las columnas físicas esperadas (gestionadas + dinámicas).
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![ID_COLUMN.to_string()];
        names.extend(self.columns.iter().map(|c| c.name.clone()));
        names.push(CREATED_AT_COLUMN.to_string());
        names.push(UPDATED_AT_COLUMN.to_string());
        names
    }
}

pub fn add_column_sql(table: &str, column: &ColumnDef) -> String {
    format!("ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}", quote_ident(table), column.sql())
}

/// Plan de sincronización calculado contra el catálogo vivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    Create(TableDefinition),
    AddColumns { table: String, columns: Vec<ColumnDef> },
    Noop { table: String },
}

impl SyncPlan {
    /// `existing == None` significa que la tabla no existe. El diff es por
    /// nombre exacto: nunca se elimina ni se cambia el tipo de una columna.
    pub fn plan(schema: &Schema, existing: Option<&[String]>) -> SyncPlan {
        let definition = TableDefinition::for_schema(schema);
        let Some(existing) = existing else {
            return SyncPlan::Create(definition);
        };
        let present: HashSet<&str> = existing.iter().map(String::as_str).collect();
        let missing: Vec<ColumnDef> = definition.columns
                                                .into_iter()
                                                .filter(|c| !present.contains(c.name.as_str()))
                                                .collect();
        if missing.is_empty() {
            SyncPlan::Noop { table: definition.table }
        } else {
            SyncPlan::AddColumns { table: definition.table,
                                   columns: missing }
        }
    }

    pub fn table(&self) -> &str {
        match self {
            SyncPlan::Create(def) => &def.table,
            SyncPlan::AddColumns { table, .. } | SyncPlan::Noop { table } => table,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, SyncPlan::Noop { .. })
    }

    pub fn statements(&self) -> Vec<String> {
        match self {
            SyncPlan::Create(def) => vec![def.create_sql()],
            SyncPlan::AddColumns { table, columns } => columns.iter().map(|c| add_column_sql(table, c)).collect(),
            SyncPlan::Noop { .. } => Vec::new(),
        }
    }
}
