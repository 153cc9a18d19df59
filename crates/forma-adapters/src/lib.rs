//! forma-adapters: importación/exportación alrededor del motor.
//!
//! - `schema_json`: documentos `{schema, fields}` (merge o reemplazo).
//! - `records_json`: filas como array JSON u objeto único; exportación con
//!   registro ficticio cuando la tabla está vacía.
//! - `csv`: fila de cabecera con los nombres de campo.
//! - `manual`: registro a partir de un mapa suelto `{campo: tipo}`.

pub mod csv;
pub mod error;
pub mod manual;
pub mod records_json;
pub mod schema_json;

pub use error::AdapterError;
pub use manual::manual_register;
pub use records_json::{export_records, import_records};
pub use schema_json::{export_schema, import_schema, ImportMode, ImportReport, SchemaDocument};
