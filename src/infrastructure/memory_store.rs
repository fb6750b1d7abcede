// In-memory dashboard store implementation
use crate::application::store::{DashboardStore, StoreError};
use crate::domain::component::{Component, ComponentId, GridRect};
use crate::domain::dashboard::Dashboard;
use crate::domain::record::{DataRecord, RecordId};
use crate::domain::schema::FieldSchema;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreState {
    /// Dashboards by slug; components live inline in the aggregate.
    dashboards: HashMap<String, Dashboard>,
    /// Component id -> owning dashboard slug.
    component_owner: HashMap<ComponentId, String>,
    records: HashMap<RecordId, DataRecord>,
    /// Record ids per component, in creation order.
    records_by_component: HashMap<ComponentId, Vec<RecordId>>,
}

impl StoreState {
    fn dashboard_of_component(&self, id: ComponentId) -> Option<&Dashboard> {
        let slug = self.component_owner.get(&id)?;
        self.dashboards.get(slug)
    }

    fn remove_component_records(&mut self, id: ComponentId) {
        if let Some(record_ids) = self.records_by_component.remove(&id) {
            for record_id in record_ids {
                self.records.remove(&record_id);
            }
        }
    }
}

pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn create_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.dashboards.contains_key(&dashboard.slug) {
            return Err(StoreError::DashboardExists {
                slug: dashboard.slug,
            });
        }
        for component in &dashboard.components {
            state
                .component_owner
                .insert(component.id, dashboard.slug.clone());
        }
        state.dashboards.insert(dashboard.slug.clone(), dashboard);
        Ok(())
    }

    async fn get_dashboard(&self, slug: &str) -> Result<Option<Dashboard>, StoreError> {
        let state = self.state.read().await;
        Ok(state.dashboards.get(slug).cloned())
    }

    async fn update_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slug = dashboard.slug.clone();
        match state.dashboards.get_mut(&slug) {
            Some(existing) => {
                // Identity is immutable; metadata and visibility move over.
                existing.name = dashboard.name;
                existing.description = dashboard.description;
                existing.thumbnail = dashboard.thumbnail;
                existing.tags = dashboard.tags;
                existing.visibility = dashboard.visibility;
                existing.updated_at = dashboard.updated_at;
                Ok(())
            }
            None => Err(StoreError::DashboardNotFound { slug }),
        }
    }

    async fn delete_dashboard(&self, slug: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let dashboard = state
            .dashboards
            .remove(slug)
            .ok_or_else(|| StoreError::DashboardNotFound {
                slug: slug.to_string(),
            })?;
        for component in &dashboard.components {
            state.component_owner.remove(&component.id);
            state.remove_component_records(component.id);
        }
        Ok(())
    }

    async fn put_component(&self, slug: &str, component: Component) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let component_id = component.id;
        let Some(dashboard) = state.dashboards.get_mut(slug) else {
            return Err(StoreError::DashboardNotFound {
                slug: slug.to_string(),
            });
        };
        match dashboard.component_mut(component.id) {
            Some(existing) => *existing = component,
            None => dashboard.components.push(component),
        }
        dashboard.touch();
        state.component_owner.insert(component_id, slug.to_string());
        Ok(())
    }

    async fn delete_component(&self, slug: &str, id: ComponentId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let dashboard = state
            .dashboards
            .get_mut(slug)
            .ok_or_else(|| StoreError::DashboardNotFound {
                slug: slug.to_string(),
            })?;
        let before = dashboard.components.len();
        dashboard.components.retain(|c| c.id != id);
        if dashboard.components.len() == before {
            return Err(StoreError::ComponentNotFound { id });
        }
        dashboard.touch();
        state.component_owner.remove(&id);
        state.remove_component_records(id);
        Ok(())
    }

    async fn save_component_position(
        &self,
        id: ComponentId,
        rect: GridRect,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slug = state
            .component_owner
            .get(&id)
            .cloned()
            .ok_or(StoreError::ComponentNotFound { id })?;
        let component = state
            .dashboards
            .get_mut(&slug)
            .and_then(|d| d.component_mut(id))
            .ok_or(StoreError::ComponentNotFound { id })?;
        component.position = rect;
        Ok(())
    }

    async fn read_schema(&self, id: ComponentId) -> Result<Option<FieldSchema>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .dashboard_of_component(id)
            .and_then(|d| d.component(id))
            .map(|c| c.schema.clone()))
    }

    async fn write_schema(&self, id: ComponentId, schema: FieldSchema) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slug = state
            .component_owner
            .get(&id)
            .cloned()
            .ok_or(StoreError::ComponentNotFound { id })?;
        let component = state
            .dashboards
            .get_mut(&slug)
            .and_then(|d| d.component_mut(id))
            .ok_or(StoreError::ComponentNotFound { id })?;
        component.schema = schema;
        Ok(())
    }

    async fn create_record(&self, record: DataRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.component_owner.contains_key(&record.component_id) {
            return Err(StoreError::ComponentNotFound {
                id: record.component_id,
            });
        }
        state
            .records_by_component
            .entry(record.component_id)
            .or_default()
            .push(record.id);
        state.records.insert(record.id, record);
        Ok(())
    }

    async fn update_record(&self, record: DataRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::RecordNotFound { id: record.id }),
        }
    }

    async fn delete_record(&self, id: RecordId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .remove(&id)
            .ok_or(StoreError::RecordNotFound { id })?;
        if let Some(ids) = state.records_by_component.get_mut(&record.component_id) {
            ids.retain(|r| *r != id);
        }
        Ok(())
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<DataRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn list_records(&self, id: ComponentId) -> Result<Vec<DataRecord>, StoreError> {
        let state = self.state.read().await;
        let records = state
            .records_by_component
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|record_id| state.records.get(record_id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn record_count(&self, id: ComponentId) -> Result<usize, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .records_by_component
            .get(&id)
            .map(|ids| ids.len())
            .unwrap_or(0))
    }
}
