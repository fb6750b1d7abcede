// Dashboard service - orchestrates dashboard and component lifecycle
use crate::application::schema_manager;
use crate::application::store::{DashboardStore, StoreError};
use crate::domain::component::{Component, ComponentId};
use crate::domain::dashboard::{
    check_visibility, is_valid_slug, AccessDecision, Dashboard, Visibility,
};
use crate::domain::registry::{self, ComponentOverrides, RegistryError};
use crate::domain::schema::{FieldSchema, SchemaError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid slug `{slug}`")]
    InvalidSlug { slug: String },
    #[error("dashboard `{slug}` not found")]
    NotFound { slug: String },
    #[error("component `{id}` not found")]
    ComponentNotFound { id: ComponentId },
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inputs for creating a dashboard. Visibility is derived from the
/// optional password: when present, only its sha256 verifier is kept.
#[derive(Debug, Clone)]
pub struct NewDashboard {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Vec<String>,
    pub private: bool,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn DashboardStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DashboardStore>) -> Self {
        Self { store }
    }

    pub async fn create_dashboard(&self, new: NewDashboard) -> Result<Dashboard, DashboardError> {
        if !is_valid_slug(&new.slug) {
            return Err(DashboardError::InvalidSlug { slug: new.slug });
        }
        let visibility = match (&new.password, new.private) {
            (Some(password), _) => Visibility::password_protected(password),
            (None, true) => Visibility::Private,
            (None, false) => Visibility::Public,
        };
        let mut dashboard = Dashboard::new(new.slug, new.name, visibility);
        dashboard.description = new.description;
        dashboard.thumbnail = new.thumbnail;
        dashboard.tags = new.tags;

        self.store.create_dashboard(dashboard.clone()).await?;
        tracing::debug!("created dashboard `{}`", dashboard.slug);
        Ok(dashboard)
    }

    /// Fetch a dashboard, enforcing its visibility mode. `credentials` is
    /// the caller-supplied password candidate, if any.
    pub async fn get_dashboard(
        &self,
        slug: &str,
        credentials: Option<&str>,
    ) -> Result<Dashboard, DashboardError> {
        let dashboard = self.require(slug).await?;
        match check_visibility(&dashboard, credentials) {
            AccessDecision::Allowed => Ok(dashboard),
            AccessDecision::Denied { reason } => Err(DashboardError::AccessDenied { reason }),
        }
    }

    /// Update display metadata. The slug is identity and never changes.
    pub async fn update_metadata(
        &self,
        slug: &str,
        name: Option<String>,
        description: Option<String>,
        thumbnail: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Dashboard, DashboardError> {
        let mut dashboard = self.require(slug).await?;
        if let Some(name) = name {
            dashboard.name = name;
        }
        if let Some(description) = description {
            dashboard.description = Some(description);
        }
        if let Some(thumbnail) = thumbnail {
            dashboard.thumbnail = Some(thumbnail);
        }
        if let Some(tags) = tags {
            dashboard.tags = tags;
        }
        dashboard.touch();
        self.store.update_dashboard(dashboard.clone()).await?;
        Ok(dashboard)
    }

    pub async fn delete_dashboard(&self, slug: &str) -> Result<(), DashboardError> {
        self.store.delete_dashboard(slug).await?;
        tracing::debug!("deleted dashboard `{}`", slug);
        Ok(())
    }

    /// Add a component: registry defaults merged with overrides, empty
    /// schema until fields are proposed.
    pub async fn add_component(
        &self,
        slug: &str,
        kind: &str,
        overrides: ComponentOverrides,
    ) -> Result<Component, DashboardError> {
        // Surface a slug error before a type error, matching caller intent.
        self.require(slug).await?;
        let component = registry::instantiate(kind, overrides)?;
        self.store.put_component(slug, component.clone()).await?;
        tracing::debug!(
            "added {} component `{}` to `{}`",
            component.kind.as_str(),
            component.name,
            slug
        );
        Ok(component)
    }

    pub async fn delete_component(
        &self,
        slug: &str,
        id: ComponentId,
    ) -> Result<(), DashboardError> {
        self.store.delete_component(slug, id).await?;
        Ok(())
    }

    /// Propose a new field schema for a component. The lock state is
    /// derived from the live record count at the time of the call.
    pub async fn propose_schema(
        &self,
        id: ComponentId,
        candidate: FieldSchema,
    ) -> Result<FieldSchema, DashboardError> {
        let current = self
            .store
            .read_schema(id)
            .await?
            .ok_or(DashboardError::ComponentNotFound { id })?;
        let locked = schema_manager::is_locked(self.store.record_count(id).await?);

        let accepted = schema_manager::propose_schema(&current, candidate, locked)?;
        self.store.write_schema(id, accepted.clone()).await?;
        Ok(accepted)
    }
}

impl DashboardService {
    async fn require(&self, slug: &str) -> Result<Dashboard, DashboardError> {
        self.store
            .get_dashboard(slug)
            .await?
            .ok_or_else(|| DashboardError::NotFound {
                slug: slug.to_string(),
            })
    }
}
