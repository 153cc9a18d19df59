//! Esquema Diesel del catálogo (mantenido a mano junto a `migrations/`).

diesel::table! {
    forma_schemas (id) {
        id -> BigInt,
        name -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    forma_schema_fields (id) {
        id -> BigInt,
        schema_id -> BigInt,
        position -> Integer,
        name -> Text,
        field_type -> Text,
        is_required -> Bool,
        choices -> Jsonb,
    }
}

diesel::joinable!(forma_schema_fields -> forma_schemas (schema_id));

diesel::allow_tables_to_appear_in_same_query!(forma_schemas, forma_schema_fields,);
