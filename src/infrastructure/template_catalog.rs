// Static template catalog implementation
use crate::application::store::{CatalogError, TemplateCatalog};
use crate::domain::template::TemplateDocument;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

/// Catalog of published templates held in memory, keyed by template id
/// (the document slug).
pub struct StaticTemplateCatalog {
    templates: HashMap<String, TemplateDocument>,
}

impl StaticTemplateCatalog {
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn with_documents(documents: Vec<TemplateDocument>) -> Self {
        let templates = documents
            .into_iter()
            .map(|doc| (doc.slug.clone(), doc))
            .collect();
        Self { templates }
    }

    /// The built-in catalog shipped with the server.
    pub fn builtin() -> Self {
        let documents = vec![
            serde_json::from_value(json!({
                "name": "Sales Overview",
                "slug": "sales-overview",
                "description": "Revenue trend, deal funnel, and a headline metric.",
                "components": {
                    "revenue-trend": {
                        "type": "line-chart",
                        "position": {"x": 0, "y": 0, "w": 8, "h": 8},
                        "config": {"xField": "month", "yField": "revenue"},
                        "data": [
                            {"month": "Jan", "revenue": 12400},
                            {"month": "Feb", "revenue": 15800},
                            {"month": "Mar", "revenue": 14100}
                        ]
                    },
                    "pipeline": {
                        "type": "funnel-chart",
                        "position": {"x": 8, "y": 0, "w": 4, "h": 8},
                        "config": {"stageField": "stage", "valueField": "count"},
                        "data": [
                            {"stage": "Lead", "count": 340},
                            {"stage": "Qualified", "count": 120},
                            {"stage": "Won", "count": 32}
                        ]
                    },
                    "headline": {
                        "type": "metric-card",
                        "position": {"x": 0, "y": 8, "w": 3, "h": 4},
                        "config": {"valueField": "total", "label": "Quarter revenue"},
                        "data": [{"total": 42300}]
                    }
                }
            }))
            .expect("builtin template is well-formed"),
            serde_json::from_value(json!({
                "name": "Service Health",
                "slug": "service-health",
                "description": "Uptime gauge and incident log.",
                "components": {
                    "uptime": {
                        "type": "gauge",
                        "position": {"x": 0, "y": 0, "w": 4, "h": 6},
                        "config": {"valueField": "uptime", "unit": "%"},
                        "data": [{"uptime": 99.95}]
                    },
                    "incidents": {
                        "type": "table",
                        "position": {"x": 4, "y": 0, "w": 8, "h": 10},
                        "data": [
                            {"date": "2026-07-02", "summary": "Elevated latency", "resolved": true},
                            {"date": "2026-07-19", "summary": "Cache node loss", "resolved": true}
                        ]
                    }
                }
            }))
            .expect("builtin template is well-formed"),
        ];
        Self::with_documents(documents)
    }
}

#[async_trait]
impl TemplateCatalog for StaticTemplateCatalog {
    async fn get_template(
        &self,
        template_id: &str,
    ) -> Result<Option<TemplateDocument>, CatalogError> {
        Ok(self.templates.get(template_id).cloned())
    }
}
