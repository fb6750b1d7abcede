// Template installer - bulk dashboard creation from declarative documents
//
// All-or-nothing at dashboard granularity: the whole document is
// instantiated and validated in memory first; nothing is persisted until
// every component and every data row has passed.
use crate::application::record_service::{validate, ValidationError};
use crate::application::store::{CatalogError, DashboardStore, StoreError, TemplateCatalog};
use crate::domain::component::Component;
use crate::domain::dashboard::{is_valid_slug, Dashboard, Visibility};
use crate::domain::record::DataRecord;
use crate::domain::registry::{self, ComponentOverrides, RegistryError};
use crate::domain::template::{infer_schema, TemplateDocument};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("template `{0}` not found")]
    TemplateNotFound(String),
    #[error("template has invalid slug `{0}`")]
    InvalidSlug(String),
    #[error("component `{name}`: {source}")]
    Component {
        name: String,
        source: ComponentInstallError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum ComponentInstallError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("data row {index} failed validation: {}", describe(.violations))]
    Validation {
        index: usize,
        violations: Vec<ValidationError>,
    },
}

fn describe(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone)]
pub struct TemplateInstaller {
    store: Arc<dyn DashboardStore>,
    catalog: Arc<dyn TemplateCatalog>,
}

impl TemplateInstaller {
    pub fn new(store: Arc<dyn DashboardStore>, catalog: Arc<dyn TemplateCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Install an inline template document. The slug doubles as the
    /// idempotency key: if a dashboard with it already exists, that
    /// dashboard is returned untouched instead of creating a duplicate.
    pub async fn install(&self, document: TemplateDocument) -> Result<Dashboard, InstallError> {
        if !is_valid_slug(&document.slug) {
            return Err(InstallError::InvalidSlug(document.slug));
        }
        if let Some(existing) = self.store.get_dashboard(&document.slug).await? {
            tracing::debug!(
                "install of `{}` is a repeat; returning existing dashboard",
                document.slug
            );
            return Ok(existing);
        }

        // Stage everything in memory; first failure aborts with nothing
        // persisted.
        let mut staged_records: Vec<DataRecord> = Vec::new();
        let mut dashboard = Dashboard::new(
            document.slug.clone(),
            document.name.clone(),
            Visibility::Public,
        );
        dashboard.description = document.description.clone();

        for (name, entry) in &document.components {
            let (component, records) =
                Self::stage_component(name, entry).map_err(|source| InstallError::Component {
                    name: name.clone(),
                    source,
                })?;
            dashboard.components.push(component);
            staged_records.extend(records);
        }

        self.store.create_dashboard(dashboard.clone()).await?;
        for record in staged_records {
            if let Err(error) = self.store.create_record(record).await {
                // Undo the half-written install before reporting.
                let _ = self.store.delete_dashboard(&dashboard.slug).await;
                return Err(error.into());
            }
        }

        tracing::debug!(
            "installed dashboard `{}` with {} component(s)",
            dashboard.slug,
            dashboard.components.len()
        );
        Ok(dashboard)
    }

    /// Install a published template from the catalog. Same semantics and
    /// idempotency as the inline path.
    pub async fn install_by_id(&self, template_id: &str) -> Result<Dashboard, InstallError> {
        let document = self
            .catalog
            .get_template(template_id)
            .await?
            .ok_or_else(|| InstallError::TemplateNotFound(template_id.to_string()))?;
        self.install(document).await
    }

    fn stage_component(
        name: &str,
        entry: &crate::domain::template::TemplateComponent,
    ) -> Result<(Component, Vec<DataRecord>), ComponentInstallError> {
        let overrides = ComponentOverrides {
            name: Some(name.to_string()),
            position: entry.position,
            config: entry.config.clone(),
        };
        let mut component = registry::instantiate(&entry.kind, overrides)?;

        if let Some(first_row) = entry.data.first() {
            component.schema = infer_schema(first_row);
        }

        let mut records = Vec::with_capacity(entry.data.len());
        for (index, row) in entry.data.iter().enumerate() {
            let typed = validate(&component.schema, row)
                .map_err(|violations| ComponentInstallError::Validation { index, violations })?;
            records.push(DataRecord::new(component.id, typed));
        }
        Ok((component, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::MemoryStore;
    use crate::infrastructure::template_catalog::StaticTemplateCatalog;
    use serde_json::json;

    fn installer(store: Arc<MemoryStore>) -> TemplateInstaller {
        TemplateInstaller::new(store, Arc::new(StaticTemplateCatalog::empty()))
    }

    fn document(value: serde_json::Value) -> TemplateDocument {
        serde_json::from_value(value).unwrap()
    }

    fn sales_template() -> TemplateDocument {
        document(json!({
            "name": "Sales Overview",
            "slug": "sales-overview",
            "components": {
                "revenue": {
                    "type": "line-chart",
                    "position": {"x": 0, "y": 0, "w": 6, "h": 8},
                    "data": [
                        {"x": "Jan", "revenue": 100},
                        {"x": "Feb", "revenue": 140}
                    ]
                },
                "headline": {
                    "type": "metric-card",
                    "data": [{"value": 240, "trend": "up"}]
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_install_creates_dashboard_components_and_records() {
        let store = Arc::new(MemoryStore::new());
        let dashboard = installer(store.clone())
            .install(sales_template())
            .await
            .unwrap();

        assert_eq!(dashboard.slug, "sales-overview");
        assert_eq!(dashboard.components.len(), 2);

        let stored = store.get_dashboard("sales-overview").await.unwrap().unwrap();
        let revenue = stored
            .components
            .iter()
            .find(|c| c.name == "revenue")
            .unwrap();
        assert_eq!(store.record_count(revenue.id).await.unwrap(), 2);
        // Schema inferred from the first row: x string, revenue number
        assert_eq!(
            revenue.schema.field("revenue").unwrap().kind,
            crate::domain::schema::FieldKind::Number
        );
    }

    #[tokio::test]
    async fn test_install_is_atomic_on_validation_failure() {
        let store = Arc::new(MemoryStore::new());
        // Third row of five turns the numeric field textual.
        let doc = document(json!({
            "name": "Broken",
            "slug": "broken",
            "components": {
                "only": {
                    "type": "table",
                    "data": [
                        {"n": 1}, {"n": 2}, {"n": "lots"}, {"n": 4}, {"n": 5}
                    ]
                }
            }
        }));

        let err = installer(store.clone()).install(doc).await.unwrap_err();
        match err {
            InstallError::Component { name, source } => {
                assert_eq!(name, "only");
                assert!(matches!(
                    source,
                    ComponentInstallError::Validation { index: 2, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Nothing persisted.
        assert!(store.get_dashboard("broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_atomic_when_middle_component_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        // Five components; the third carries a row that contradicts its
        // inferred schema.
        let doc = document(json!({
            "name": "Mostly Fine",
            "slug": "mostly-fine",
            "components": {
                "c1": {"type": "metric-card", "data": [{"value": 1}]},
                "c2": {"type": "metric-card", "data": [{"value": 2}]},
                "c3": {"type": "table", "data": [{"n": 3}, {"n": "three"}]},
                "c4": {"type": "metric-card", "data": [{"value": 4}]},
                "c5": {"type": "metric-card", "data": [{"value": 5}]}
            }
        }));

        let err = installer(store.clone()).install(doc).await.unwrap_err();
        assert!(matches!(
            err,
            InstallError::Component { ref name, .. } if name == "c3"
        ));
        assert!(store.get_dashboard("mostly-fine").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_aborts_on_unknown_component_type() {
        let store = Arc::new(MemoryStore::new());
        let doc = document(json!({
            "name": "Odd",
            "slug": "odd",
            "components": {
                "weird": {"type": "hologram", "data": []}
            }
        }));
        let err = installer(store.clone()).install(doc).await.unwrap_err();
        assert!(matches!(err, InstallError::Component { .. }));
        assert!(store.get_dashboard("odd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeat_install_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let installer = installer(store.clone());

        let first = installer.install(sales_template()).await.unwrap();
        let second = installer.install(sales_template()).await.unwrap();

        assert_eq!(first.slug, second.slug);
        // Same dashboard, not a duplicate: component ids are unchanged.
        let first_ids: Vec<_> = first.components.iter().map(|c| c.id).collect();
        let second_ids: Vec<_> = second.components.iter().map(|c| c.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_install_by_id_uses_catalog() {
        let store = Arc::new(MemoryStore::new());
        let catalog = StaticTemplateCatalog::with_documents(vec![sales_template()]);
        let installer = TemplateInstaller::new(store.clone(), Arc::new(catalog));

        let dashboard = installer.install_by_id("sales-overview").await.unwrap();
        assert_eq!(dashboard.components.len(), 2);

        let err = installer.install_by_id("no-such").await.unwrap_err();
        assert!(matches!(err, InstallError::TemplateNotFound(_)));
    }

    #[tokio::test]
    async fn test_install_rejects_bad_slug() {
        let store = Arc::new(MemoryStore::new());
        let doc = document(json!({"name": "X", "slug": "Bad Slug", "components": {}}));
        let err = installer(store).install(doc).await.unwrap_err();
        assert!(matches!(err, InstallError::InvalidSlug(_)));
    }
}
