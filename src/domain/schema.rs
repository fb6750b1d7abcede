// Field schema domain model
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of value types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    DateTime,
    Email,
    Url,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
        }
    }

    pub fn parse(s: &str) -> Option<FieldKind> {
        match s {
            "string" => Some(FieldKind::String),
            "number" => Some(FieldKind::Number),
            "boolean" => Some(FieldKind::Boolean),
            "date" => Some(FieldKind::Date),
            "datetime" => Some(FieldKind::DateTime),
            "email" => Some(FieldKind::Email),
            "url" => Some(FieldKind::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Raw default value; coerced against `kind` when a record omits the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered list of fields describing the shape of a component's records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<Field>,
}

impl FieldSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Structural validation: names must be non-empty and unique.
    pub fn check_structure(&self) -> Result<(), SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema is locked: field `{field}` cannot be removed, renamed, or retyped")]
    Locked { field: String },
    #[error("duplicate field name `{field}`")]
    DuplicateField { field: String },
    #[error("field names must be non-empty")]
    EmptyFieldName,
}
