//! forma-domain: modelo de esquemas dinámicos.
//!
//! Contiene las piezas sin dependencias de almacenamiento:
//! - `schema`: definiciones de esquema y campo (más borradores para upsert).
//! - `field_type`: registro cerrado de tipos de campo (columna + formulario).
//! - `value`: valores tipados que viajan entre formularios y backends.
//! - `record`: filas de las tablas dinámicas.
//! - `ident`: reglas de nombres para tablas y columnas.
//! - `bitmask`: evaluación OR de máscaras de 8 bits.
pub mod bitmask;
pub mod error;
pub mod field_type;
pub mod ident;
pub mod record;
pub mod schema;
pub mod value;

pub use bitmask::{evaluate_bitwise_or, MASK_WIDTH};
pub use error::DomainError;
pub use field_type::{form_field, ColumnType, FieldOptions, FieldType, InputSpec, Widget};
pub use record::Record;
pub use schema::{normalize_choices, parse_choices, FieldDef, FieldDraft, Schema};
pub use value::FieldValue;
