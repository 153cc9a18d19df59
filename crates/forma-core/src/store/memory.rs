use std::sync::RwLock;

use forma_domain::{FieldDef, FieldDraft, Schema};

use super::{keep_stored_names, plan_field_merge, prepare_upsert, SchemaStore};
use crate::errors::EngineError;

#[derive(Default)]
struct State {
    schemas: Vec<Schema>,
    next_schema_id: i64,
    next_field_id: i64,
}

impl State {
    fn position_of(&self, name: &str) -> Option<usize> {
        self.schemas.iter().position(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn alloc_field_id(&mut self) -> i64 {
        self.next_field_id += 1;
        self.next_field_id
    }

    /// Crea o actualiza la cabecera del esquema y devuelve su índice.
    fn upsert_header(&mut self, name: &str, description: Option<&str>) -> usize {
        match self.position_of(name) {
            Some(idx) => {
                let schema = &mut self.schemas[idx];
                schema.name = name.to_string();
                if let Some(d) = description {
                    schema.description = Some(d.to_string());
                }
                idx
            }
            None => {
                self.next_schema_id += 1;
                self.schemas.push(Schema { id: self.next_schema_id,
                                           name: name.to_string(),
                                           description: description.map(str::to_string),
                                           fields: Vec::new() });
                self.schemas.len() - 1
            }
        }
    }
}

fn field_from_draft(id: i64, schema_id: i64, position: i32, draft: FieldDraft) -> FieldDef {
    FieldDef { id,
               schema_id,
               position,
               name: draft.name,
               field_type: draft.field_type,
               is_required: draft.is_required,
               choices: draft.choices }
}

/// Schema Store en memoria (tests y modo `--memory` de la CLI).
#[derive(Default)]
pub struct InMemorySchemaStore {
    state: RwLock<State>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaStore for InMemorySchemaStore {
    fn get_schema(&self, name: &str) -> Result<Option<Schema>, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::lock_poisoned("schema store"))?;
        Ok(state.position_of(name).map(|idx| state.schemas[idx].clone()))
    }

    fn list_schemas(&self) -> Result<Vec<Schema>, EngineError> {
        let state = self.state.read().map_err(|_| EngineError::lock_poisoned("schema store"))?;
        let mut all = state.schemas.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn upsert_schema(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let drafts = prepare_upsert(name, fields)?;
        let mut state = self.state.write().map_err(|_| EngineError::lock_poisoned("schema store"))?;
        let idx = state.upsert_header(name, description);
        let plan = plan_field_merge(&state.schemas[idx].fields, &drafts);
        let schema_id = state.schemas[idx].id;
        let mut new_fields = Vec::with_capacity(plan.inserts.len());
        for (position, draft) in plan.inserts {
            let id = state.alloc_field_id();
            new_fields.push(field_from_draft(id, schema_id, position, draft));
        }
        let schema = &mut state.schemas[idx];
        for (id, draft) in plan.updates {
            if let Some(field) = schema.fields.iter_mut().find(|f| f.id == id) {
                *field = field_from_draft(id, schema_id, field.position, draft);
            }
        }
        schema.fields.extend(new_fields);
        schema.fields.sort_by_key(|f| f.position);
        Ok(schema.clone())
    }

    fn replace_fields(&self, name: &str, description: Option<&str>, fields: &[FieldDraft]) -> Result<Schema, EngineError> {
        let drafts = prepare_upsert(name, fields)?;
        let mut state = self.state.write().map_err(|_| EngineError::lock_poisoned("schema store"))?;
        let idx = state.upsert_header(name, description);
        let drafts = keep_stored_names(&state.schemas[idx].fields, drafts);
        let schema_id = state.schemas[idx].id;
        let mut replacement = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.into_iter().enumerate() {
            let id = state.alloc_field_id();
            replacement.push(field_from_draft(id, schema_id, position as i32, draft));
        }
        let schema = &mut state.schemas[idx];
        schema.fields = replacement;
        Ok(schema.clone())
    }
}
