//! Constantes del motor.

/// Clave primaria sustituta de toda tabla dinámica.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Columnas gestionadas por el motor (nunca vienen de un campo).
pub const MANAGED_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

/// Esquemas y tokens por defecto del pipeline de reconocimiento.
pub const EVALUATION_SCHEMA: &str = "evaluation";
pub const DECISION_SCHEMA: &str = "decision";
/// Tercer modelo: se sincroniza sólo si alguien declaró sus campos.
pub const RECOGNITION_SCHEMA: &str = "recognition";
pub const JUDGE_FIELD: &str = "judge";
pub const JUDGE_MATCHED: &str = "has-contact-record";
pub const JUDGE_UNMATCHED: &str = "needs-contact";

/// Texto de interfaz original asociado a cada token.
pub const JUDGE_MATCHED_LABEL: &str = "連絡なし";
pub const JUDGE_UNMATCHED_LABEL: &str = "連絡あり";
