// Data record domain model
use super::component::ComponentId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub type RecordId = Uuid;

/// A value that has passed validation against its field's declared kind.
/// Email and url values are stored as plain strings once checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_json(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::json!(n),
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRecord {
    pub id: RecordId,
    pub component_id: ComponentId,
    pub values: BTreeMap<String, FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataRecord {
    pub fn new(component_id: ComponentId, values: BTreeMap<String, FieldValue>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            component_id,
            values,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }
}
