use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{
    backend::BackendState,
    composer::{Action, ActionKind},
    error::ViewError,
    models::Session,
    registry::{ColumnDef, InputKind, ResourceMapEntry, ResourceRegistry},
};

const EMPTY_CELL: &str = "—";

/// ViewRequest
///
/// Everything a feature view gets to work with. Owned: the load runs inside the
/// streamed page body, after the handler has returned.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub entry: ResourceMapEntry,
    pub action: Action,
    /// `/admin/users`: base for links to records.
    pub base_href: String,
    pub session: Option<Arc<Session>>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub input: InputKind,
    pub value: String,
}

/// ViewContent
///
/// The finished body of a resource page, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewContent {
    Table {
        columns: Vec<ColumnDef>,
        rows: Vec<TableRow>,
    },
    Detail {
        rows: Vec<DetailRow>,
    },
    Form {
        action: String,
        submit_label: String,
        fields: Vec<FormField>,
    },
}

/// FeatureView Trait
///
/// The plug-in seam for per-resource CRUD UI. Implementations fetch whatever they need
/// and return finished content; the page shows the skeleton until they do.
#[async_trait]
pub trait FeatureView: Send + Sync {
    async fn load(&self, request: &ViewRequest) -> Result<ViewContent, ViewError>;
}

/// FeatureViews
///
/// Registration table keyed by `(resource_name, action)`.
#[derive(Default, Clone)]
pub struct FeatureViews {
    views: HashMap<(String, ActionKind), Arc<dyn FeatureView>>,
}

impl FeatureViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the generic backend view for every enabled resource and every action.
    pub fn with_backend(registry: &ResourceRegistry, backend: BackendState) -> Self {
        let generic: Arc<dyn FeatureView> = Arc::new(BackendResourceView::new(backend));
        let mut views = Self::new();
        for entry in registry.visible() {
            for kind in ActionKind::ALL {
                views.register(&entry.resource_name, kind, generic.clone());
            }
        }
        views
    }

    /// Adds or replaces the view for `(resource_name, kind)`.
    pub fn register(&mut self, resource_name: &str, kind: ActionKind, view: Arc<dyn FeatureView>) {
        self.views.insert((resource_name.to_string(), kind), view);
    }

    pub fn get(&self, resource_name: &str, kind: ActionKind) -> Option<Arc<dyn FeatureView>> {
        self.views.get(&(resource_name.to_string(), kind)).cloned()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// BackendResourceView
///
/// Default view for any registry entry: reads records from the backend API and lays
/// them out using the entry's column and field definitions.
pub struct BackendResourceView {
    backend: BackendState,
}

impl BackendResourceView {
    pub fn new(backend: BackendState) -> Self {
        Self { backend }
    }

    async fn fetch_record(&self, request: &ViewRequest, id: &str) -> Result<Value, ViewError> {
        let record = self
            .backend
            .fetch(&request.entry.resource_name, id, request.token.as_deref())
            .await?;
        match record {
            Some(Value::Null) | None => Err(ViewError::NotFound),
            Some(record) => Ok(record),
        }
    }
}

#[async_trait]
impl FeatureView for BackendResourceView {
    async fn load(&self, request: &ViewRequest) -> Result<ViewContent, ViewError> {
        let entry = &request.entry;
        match &request.action {
            Action::List => {
                let records = self
                    .backend
                    .list(&entry.resource_name, request.token.as_deref())
                    .await?;
                let rows = records
                    .iter()
                    .map(|record| TableRow {
                        href: record_id(record).map(|id| format!("{}/{}", request.base_href, id)),
                        cells: entry
                            .columns
                            .iter()
                            .map(|column| display_value(record.get(&column.field)))
                            .collect(),
                    })
                    .collect();
                Ok(ViewContent::Table {
                    columns: entry.columns.clone(),
                    rows,
                })
            }
            Action::Detail { id } => {
                let record = self.fetch_record(request, id).await?;
                Ok(ViewContent::Detail {
                    rows: detail_rows(entry, &record),
                })
            }
            Action::Create => Ok(ViewContent::Form {
                action: self.backend.resource_url(&entry.resource_name, None),
                submit_label: "Tạo mới".to_string(),
                fields: form_fields(entry, None),
            }),
            Action::Edit { id } => {
                let record = self.fetch_record(request, id).await?;
                Ok(ViewContent::Form {
                    action: self.backend.resource_url(&entry.resource_name, Some(id)),
                    submit_label: "Lưu thay đổi".to_string(),
                    fields: form_fields(entry, Some(&record)),
                })
            }
        }
    }
}

/// Columns first, then any form field not already shown. Passwords never appear.
fn detail_rows(entry: &ResourceMapEntry, record: &Value) -> Vec<DetailRow> {
    let mut rows: Vec<DetailRow> = entry
        .columns
        .iter()
        .map(|column| DetailRow {
            label: column.label.clone(),
            value: display_value(record.get(&column.field)),
        })
        .collect();

    for field in &entry.fields {
        let shown = entry.columns.iter().any(|column| column.field == field.name);
        if shown || field.input == InputKind::Password {
            continue;
        }
        rows.push(DetailRow {
            label: field.label.clone(),
            value: display_value(record.get(&field.name)),
        });
    }
    rows
}

fn form_fields(entry: &ResourceMapEntry, record: Option<&Value>) -> Vec<FormField> {
    entry
        .fields
        .iter()
        .map(|field| {
            let value = match (record, field.input) {
                (_, InputKind::Password) | (None, _) => String::new(),
                (Some(record), _) => input_value(record.get(&field.name)),
            };
            FormField {
                name: field.name.clone(),
                label: field.label.clone(),
                input: field.input,
                value,
            }
        })
        .collect()
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// display_value
///
/// Human-readable rendering of a JSON value inside a table cell or detail row.
/// Related records render by their `name` or `title`.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::Bool(true)) => "Có".to_string(),
        Some(Value::Bool(false)) => "Không".to_string(),
        Some(Value::Array(items)) if items.is_empty() => EMPTY_CELL.to_string(),
        Some(other) => input_value(Some(other)),
    }
}

/// The raw text a form input is pre-filled with.
fn input_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| input_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(object)) => object
            .get("name")
            .or_else(|| object.get("title"))
            .map(|label| input_value(Some(label)))
            .unwrap_or_else(|| Value::Object(object.clone()).to_string()),
    }
}
