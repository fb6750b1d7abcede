// Record service - validation and CRUD of data records against a schema
use crate::application::schema_manager;
use crate::application::store::{DashboardStore, StoreError};
use crate::domain::component::ComponentId;
use crate::domain::record::{DataRecord, FieldValue, RecordId};
use crate::domain::schema::{FieldKind, FieldSchema};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    MissingRequired,
    TypeMismatch,
    UnknownField,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub code: ViolationCode,
    pub message: String,
}

impl ValidationError {
    fn missing_required(field: &str) -> Self {
        Self {
            field: field.to_string(),
            code: ViolationCode::MissingRequired,
            message: "required field is missing".to_string(),
        }
    }

    fn type_mismatch(field: &str, kind: FieldKind, got: &Value) -> Self {
        Self {
            field: field.to_string(),
            code: ViolationCode::TypeMismatch,
            message: format!("expected {}, got {}", kind.as_str(), describe(got)),
        }
    }

    fn unknown_field(field: &str) -> Self {
        Self {
            field: field.to_string(),
            code: ViolationCode::UnknownField,
            message: "field is not in the schema".to_string(),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a raw record against a schema, collecting ALL violations
/// rather than failing fast. On success returns the typed value map with
/// declared defaults filled in for absent optional fields.
pub fn validate(
    schema: &FieldSchema,
    raw: &Map<String, Value>,
) -> Result<BTreeMap<String, FieldValue>, Vec<ValidationError>> {
    let mut typed = BTreeMap::new();
    let mut violations = Vec::new();

    for (name, value) in raw {
        let Some(field) = schema.field(name) else {
            violations.push(ValidationError::unknown_field(name));
            continue;
        };
        match coerce(field.kind, value) {
            Some(field_value) => {
                typed.insert(name.clone(), field_value);
            }
            None => violations.push(ValidationError::type_mismatch(name, field.kind, value)),
        }
    }

    for field in schema.fields() {
        if raw.contains_key(&field.name) {
            continue;
        }
        match &field.default {
            Some(default) => match coerce(field.kind, default) {
                Some(field_value) => {
                    typed.insert(field.name.clone(), field_value);
                }
                None => violations.push(ValidationError::type_mismatch(
                    &field.name,
                    field.kind,
                    default,
                )),
            },
            None if field.required => {
                violations.push(ValidationError::missing_required(&field.name));
            }
            None => {}
        }
    }

    if violations.is_empty() {
        Ok(typed)
    } else {
        Err(violations)
    }
}

/// Coerce a raw JSON value to the declared kind. Numbers accept numeric
/// strings, booleans accept "true"/"false", dates are `%Y-%m-%d`,
/// datetimes RFC 3339. Email and url checks are deliberately permissive.
fn coerce(kind: FieldKind, value: &Value) -> Option<FieldValue> {
    match kind {
        FieldKind::String => value.as_str().map(|s| FieldValue::String(s.to_string())),
        FieldKind::Number => match value {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(FieldValue::Number),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Number),
            _ => None,
        },
        FieldKind::Boolean => match value {
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::String(s) if s == "true" => Some(FieldValue::Boolean(true)),
            Value::String(s) if s == "false" => Some(FieldValue::Boolean(false)),
            _ => None,
        },
        FieldKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(FieldValue::Date),
        FieldKind::DateTime => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc))),
        FieldKind::Email => value
            .as_str()
            .filter(|s| looks_like_email(s))
            .map(|s| FieldValue::String(s.to_string())),
        FieldKind::Url => value
            .as_str()
            .filter(|s| looks_like_url(s))
            .map(|s| FieldValue::String(s.to_string())),
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn looks_like_url(s: &str) -> bool {
    s.strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .map(|rest| !rest.is_empty())
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record validation failed with {} violation(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("component `{id}` not found")]
    ComponentNotFound { id: ComponentId },
    #[error("record `{id}` not found")]
    RecordNotFound { id: RecordId },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn DashboardStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn DashboardStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        component_id: ComponentId,
        values: Map<String, Value>,
    ) -> Result<DataRecord, RecordError> {
        let schema = self
            .store
            .read_schema(component_id)
            .await?
            .ok_or(RecordError::ComponentNotFound { id: component_id })?;
        let typed = validate(&schema, &values).map_err(RecordError::Validation)?;

        let record = DataRecord::new(component_id, typed);
        self.store.create_record(record.clone()).await?;
        Ok(record)
    }

    /// Full-replacement update, re-validated against the CURRENT schema
    /// (fields may have been appended since the record was created).
    pub async fn update(
        &self,
        record_id: RecordId,
        values: Map<String, Value>,
    ) -> Result<DataRecord, RecordError> {
        let mut record = self
            .store
            .get_record(record_id)
            .await?
            .ok_or(RecordError::RecordNotFound { id: record_id })?;
        let schema = self
            .store
            .read_schema(record.component_id)
            .await?
            .ok_or(RecordError::ComponentNotFound {
                id: record.component_id,
            })?;
        let typed = validate(&schema, &values).map_err(RecordError::Validation)?;

        record.values = typed;
        record.updated_at = Utc::now();
        self.store.update_record(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete(&self, record_id: RecordId) -> Result<(), RecordError> {
        self.store.delete_record(record_id).await?;
        Ok(())
    }

    pub async fn list(&self, component_id: ComponentId) -> Result<Vec<DataRecord>, RecordError> {
        Ok(self.store.list_records(component_id).await?)
    }

    /// Derived lock state of a component's schema.
    pub async fn is_locked(&self, component_id: ComponentId) -> Result<bool, RecordError> {
        let count = self.store.record_count(component_id).await?;
        Ok(schema_manager::is_locked(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::Field;
    use serde_json::json;

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            Field::new("a", FieldKind::Number).required(),
            Field::new("b", FieldKind::String),
        ])
    }

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_validate_optional_field_may_be_absent() {
        let violations = validate(&schema(), &raw(json!({"a": "x"}))).unwrap_err();
        // b is optional, so only the type mismatch on a is reported
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "a");
        assert_eq!(violations[0].code, ViolationCode::TypeMismatch);
    }

    #[test]
    fn test_validate_missing_required_and_mismatch_together() {
        let schema = FieldSchema::new(vec![
            Field::new("a", FieldKind::Number).required(),
            Field::new("b", FieldKind::String).required(),
        ]);
        let violations = validate(&schema, &raw(json!({"a": "x"}))).unwrap_err();
        assert_eq!(violations.len(), 2);
        let tagged: Vec<_> = violations
            .iter()
            .map(|v| (v.field.as_str(), v.code))
            .collect();
        assert!(tagged.contains(&("a", ViolationCode::TypeMismatch)));
        assert!(tagged.contains(&("b", ViolationCode::MissingRequired)));
    }

    #[test]
    fn test_validate_unknown_field() {
        let violations = validate(&schema(), &raw(json!({"a": 1, "zzz": 9}))).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "zzz");
        assert_eq!(violations[0].code, ViolationCode::UnknownField);
    }

    #[test]
    fn test_validate_coercions() {
        let schema = FieldSchema::new(vec![
            Field::new("n", FieldKind::Number),
            Field::new("b", FieldKind::Boolean),
            Field::new("d", FieldKind::Date),
            Field::new("ts", FieldKind::DateTime),
            Field::new("mail", FieldKind::Email),
            Field::new("link", FieldKind::Url),
        ]);
        let typed = validate(
            &schema,
            &raw(json!({
                "n": "12.5",
                "b": "true",
                "d": "2026-08-01",
                "ts": "2026-08-01T10:30:00Z",
                "mail": "ops@example.com",
                "link": "https://example.com/board",
            })),
        )
        .unwrap();
        assert_eq!(typed["n"], FieldValue::Number(12.5));
        assert_eq!(typed["b"], FieldValue::Boolean(true));
        assert!(matches!(typed["d"], FieldValue::Date(_)));
        assert!(matches!(typed["ts"], FieldValue::DateTime(_)));
    }

    #[test]
    fn test_validate_rejects_bad_coercions() {
        let schema = FieldSchema::new(vec![
            Field::new("n", FieldKind::Number),
            Field::new("b", FieldKind::Boolean),
            Field::new("d", FieldKind::Date),
            Field::new("mail", FieldKind::Email),
            Field::new("link", FieldKind::Url),
        ]);
        let violations = validate(
            &schema,
            &raw(json!({
                "n": "twelve",
                "b": "yes",
                "d": "2026-13-40",
                "mail": "not-an-email",
                "link": "ftp://example.com",
            })),
        )
        .unwrap_err();
        assert_eq!(violations.len(), 5);
        assert!(violations
            .iter()
            .all(|v| v.code == ViolationCode::TypeMismatch));
    }

    #[test]
    fn test_validate_fills_defaults() {
        let schema = FieldSchema::new(vec![Field {
            name: "currency".to_string(),
            kind: FieldKind::String,
            required: false,
            default: Some(json!("EUR")),
        }]);
        let typed = validate(&schema, &raw(json!({}))).unwrap();
        assert_eq!(typed["currency"], FieldValue::String("EUR".to_string()));
    }

    #[test]
    fn test_validate_required_with_default_is_satisfied() {
        let schema = FieldSchema::new(vec![Field {
            name: "qty".to_string(),
            kind: FieldKind::Number,
            required: true,
            default: Some(json!(1)),
        }]);
        let typed = validate(&schema, &raw(json!({}))).unwrap();
        assert_eq!(typed["qty"], FieldValue::Number(1.0));
    }
}
