// Store and catalog traits for dashboard persistence
use crate::domain::component::{Component, ComponentId, GridRect};
use crate::domain::dashboard::Dashboard;
use crate::domain::record::{DataRecord, RecordId};
use crate::domain::schema::FieldSchema;
use crate::domain::template::TemplateDocument;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("dashboard `{slug}` already exists")]
    DashboardExists { slug: String },
    #[error("dashboard `{slug}` not found")]
    DashboardNotFound { slug: String },
    #[error("component `{id}` not found")]
    ComponentNotFound { id: ComponentId },
    #[error("record `{id}` not found")]
    RecordNotFound { id: RecordId },
    /// Persistence failure; `target` names the affected dashboard,
    /// component, or record.
    #[error("i/o failure on `{target}`: {message}")]
    Io { target: String, message: String },
}

#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn create_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError>;

    async fn get_dashboard(&self, slug: &str) -> Result<Option<Dashboard>, StoreError>;

    /// Update display metadata and visibility. The slug is identity and is
    /// never changed by this call.
    async fn update_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError>;

    /// Deletes the dashboard and everything it owns: components and their
    /// records.
    async fn delete_dashboard(&self, slug: &str) -> Result<(), StoreError>;

    /// Insert or replace a component of the given dashboard.
    async fn put_component(&self, slug: &str, component: Component) -> Result<(), StoreError>;

    /// Deletes the component and its records.
    async fn delete_component(&self, slug: &str, id: ComponentId) -> Result<(), StoreError>;

    /// Persist one component's grid rect. Scoped to a single component so
    /// that sibling writes are independent.
    async fn save_component_position(
        &self,
        id: ComponentId,
        rect: GridRect,
    ) -> Result<(), StoreError>;

    async fn read_schema(&self, id: ComponentId) -> Result<Option<FieldSchema>, StoreError>;

    async fn write_schema(&self, id: ComponentId, schema: FieldSchema) -> Result<(), StoreError>;

    async fn create_record(&self, record: DataRecord) -> Result<(), StoreError>;

    async fn update_record(&self, record: DataRecord) -> Result<(), StoreError>;

    async fn delete_record(&self, id: RecordId) -> Result<(), StoreError>;

    async fn get_record(&self, id: RecordId) -> Result<Option<DataRecord>, StoreError>;

    /// Records of a component in creation order.
    async fn list_records(&self, id: ComponentId) -> Result<Vec<DataRecord>, StoreError>;

    async fn record_count(&self, id: ComponentId) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("template catalog unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Look up a published template document by id.
    async fn get_template(&self, template_id: &str)
        -> Result<Option<TemplateDocument>, CatalogError>;
}
