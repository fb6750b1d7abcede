// Template document domain model
use super::component::GridRect;
use super::schema::{Field, FieldKind, FieldSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Declarative bundle used to bulk-create a dashboard: per named component,
/// a type, an optional position, a config bag, and seed data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub components: BTreeMap<String, TemplateComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub position: Option<GridRect>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

/// Infer a field schema from the shape of the first data row, typing each
/// key by probing its value: number if it parses numeric, boolean if
/// strictly boolean, otherwise string. First-record-wins; fields that vary
/// in type across later rows are not representable.
pub fn infer_schema(first_row: &Map<String, Value>) -> FieldSchema {
    let fields = first_row
        .iter()
        .map(|(name, value)| Field::new(name.clone(), probe_kind(value)))
        .collect();
    FieldSchema::new(fields)
}

fn probe_kind(value: &Value) -> FieldKind {
    match value {
        Value::Bool(_) => FieldKind::Boolean,
        Value::Number(_) => FieldKind::Number,
        Value::String(s) if s.parse::<f64>().map(f64::is_finite).unwrap_or(false) => {
            FieldKind::Number
        }
        _ => FieldKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_infer_schema_probes_values() {
        let schema = infer_schema(&row(json!({
            "amount": 12.5,
            "count": "42",
            "active": true,
            "label": "north",
            "mixed": [1, 2],
        })));

        assert_eq!(schema.field("amount").unwrap().kind, FieldKind::Number);
        assert_eq!(schema.field("count").unwrap().kind, FieldKind::Number);
        assert_eq!(schema.field("active").unwrap().kind, FieldKind::Boolean);
        assert_eq!(schema.field("label").unwrap().kind, FieldKind::String);
        assert_eq!(schema.field("mixed").unwrap().kind, FieldKind::String);
    }

    #[test]
    fn test_inferred_fields_are_optional() {
        let schema = infer_schema(&row(json!({"x": 1})));
        assert!(!schema.field("x").unwrap().required);
    }

    #[test]
    fn test_template_document_parses() {
        let doc: TemplateDocument = serde_json::from_value(json!({
            "name": "Sales Overview",
            "slug": "sales-overview",
            "components": {
                "revenue": {
                    "type": "line-chart",
                    "position": {"x": 0, "y": 0, "w": 6, "h": 8},
                    "config": {"yField": "revenue"},
                    "data": [{"x": "Jan", "revenue": 100}]
                }
            }
        }))
        .unwrap();

        let component = &doc.components["revenue"];
        assert_eq!(component.kind, "line-chart");
        assert_eq!(component.data.len(), 1);
    }
}
