//! Reglas de identificadores para tablas y columnas dinámicas.
//!
//! Los nombres se usan siempre entrecomillados en SQL, pero se restringen a
//! `[A-Za-z_][A-Za-z0-9_]*` para que la tabla resultante sea predecible.

use crate::DomainError;

/// Límite de Postgres para identificadores (NAMEDATALEN - 1).
pub const MAX_IDENT_LEN: usize = 63;

/// Columnas que el motor agrega a toda tabla dinámica.
pub const RESERVED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Prefijos de tabla reservados para metadatos.
pub const RESERVED_TABLE_PREFIXES: [&str; 2] = ["forma_", "__diesel"];

pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidIdentifier { name: name.to_string(),
                                                                  reason: reason.to_string() };
    let mut chars = name.chars();
    let first = chars.next().ok_or_else(|| invalid("must not be empty"))?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or '_'"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("only ASCII letters, digits and '_' are allowed"));
    }
    if name.len() > MAX_IDENT_LEN {
        return Err(invalid("longer than 63 bytes"));
    }
    Ok(())
}

/// Valida un nombre de esquema (además de las reglas de identificador, la
/// tabla derivada no puede pisar tablas de metadatos).
pub fn validate_schema_name(name: &str) -> Result<(), DomainError> {
    validate_identifier(name)?;
    let table = table_name_for(name);
    if RESERVED_TABLE_PREFIXES.iter().any(|p| table.starts_with(p)) {
        return Err(DomainError::InvalidIdentifier { name: name.to_string(),
                                                    reason: "prefix is reserved for metadata tables".into() });
    }
    Ok(())
}

pub fn validate_field_name(name: &str) -> Result<(), DomainError> {
    validate_identifier(name)?;
    if is_reserved_column(name) {
        return Err(DomainError::InvalidIdentifier { name: name.to_string(),
                                                    reason: "collides with a managed column".into() });
    }
    Ok(())
}

pub fn is_reserved_column(name: &str) -> bool {
    RESERVED_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Nombre de la tabla de respaldo de un esquema.
pub fn table_name_for(schema_name: &str) -> String {
    schema_name.to_ascii_lowercase()
}
