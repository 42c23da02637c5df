//! Shared fixtures for the layout tool integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use kinform_tools::{FetchedForm, FormStore, StoreError};

/// In-memory form store with revision tokens, standing in for the external
/// store the production tools talk to.
#[derive(Default)]
pub struct InMemoryStore {
    forms: Mutex<HashMap<String, (Value, u64)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one app with a layout at revision 1.
    pub fn with_form(app_id: &str, layout: Value) -> Self {
        let store = Self::new();
        store
            .forms
            .lock()
            .expect("store lock")
            .insert(app_id.to_string(), (layout, 1));
        store
    }

    /// The layout currently persisted for an app.
    pub fn stored_layout(&self, app_id: &str) -> Value {
        self.forms
            .lock()
            .expect("store lock")
            .get(app_id)
            .map(|(layout, _)| layout.clone())
            .expect("app should exist")
    }
}

#[async_trait]
impl FormStore for InMemoryStore {
    async fn fetch(&self, app_id: &str) -> Result<FetchedForm, StoreError> {
        let forms = self.forms.lock().expect("store lock");
        let (layout, revision) = forms
            .get(app_id)
            .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))?;
        Ok(FetchedForm {
            layout: layout.clone(),
            revision: revision.to_string(),
        })
    }

    async fn persist(
        &self,
        app_id: &str,
        layout: &Value,
        revision: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut forms = self.forms.lock().expect("store lock");
        let entry = forms.entry(app_id.to_string()).or_insert((json!([]), 0));
        if let Some(expected) = revision {
            if expected != entry.1.to_string() {
                return Err(StoreError::RevisionConflict {
                    app_id: app_id.to_string(),
                    expected: expected.to_string(),
                    actual: entry.1.to_string(),
                });
            }
        }
        entry.0 = layout.clone();
        entry.1 += 1;
        Ok(entry.1.to_string())
    }
}

/// A small valid layout: one row holding the field `"x"`.
pub fn single_field_layout() -> Value {
    json!([{
        "type": "ROW",
        "fields": [{ "type": "SINGLE_LINE_TEXT", "code": "x", "size": {} }],
    }])
}
