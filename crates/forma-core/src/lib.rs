//! forma-core: motor de mapeo esquema -> almacenamiento.
//!
//! Los backends se abstraen con tres traits (`SchemaStore`, `TableCatalog`,
//! `RecordStore`); este crate trae implementaciones en memoria con la misma
//! semántica que el backend Postgres de `forma-persistence`.
pub mod backend;
pub mod constants;
pub mod ddl;
pub mod engine;
pub mod errors;
pub mod form;
pub mod hashing;
pub mod pipeline;
pub mod records;
pub mod registry;
pub mod store;
pub mod sync;

pub use backend::{Condition, InMemoryBackend, Match, RecordStore, RowValues, TableCatalog};
pub use ddl::{ColumnDef, SyncPlan, TableDefinition};
pub use engine::SchemaEngine;
pub use errors::{EngineError, ErrorKind, ErrorPayload, FieldError, ValidationErrors};
pub use form::{FormBuilder, Submission};
pub use pipeline::{register_recognition_schemas, DecisionOutcome, DecisionRecord, EvaluationOutcome, JudgeValue, PipelineConfig,
                   RecognitionOutcome, RecognitionPipeline};
pub use records::RecordAccessor;
pub use registry::{ModelRegistry, TableHandle};
pub use store::{InMemorySchemaStore, SchemaStore};
pub use sync::{SyncAction, SyncReport, SyncState, TableSynchronizer};

/// Motor completamente en memoria.
pub type InMemoryEngine = SchemaEngine<InMemorySchemaStore, InMemoryBackend>;
