// Layout engine - grid mutation and debounced position persistence
//
// Interaction and persistence are decoupled: every submit replaces the
// pending layout for its dashboard and re-arms the debounce timer; the
// flush that eventually runs writes the latest observed layout, one
// component at a time. Writes coalesce, they never queue.
use crate::application::store::{DashboardStore, StoreError};
use crate::domain::component::{Component, ComponentId, GridRect};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One entry of a full replacement layout, as submitted by the editing
/// surface. Bounds and the static flag always come from the stored
/// component, never from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LayoutUpdate {
    pub id: ComponentId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug)]
pub struct PositionWriteFailure {
    pub component_id: ComponentId,
    pub error: StoreError,
}

/// Reduce a replacement layout against the current components. Rects are
/// accepted verbatim for non-static components, clamped only to declared
/// bounds and grid width. Overlaps are intentional and preserved; there is
/// no collision resolution. Static and unknown components are skipped.
pub fn apply_layout(
    components: &[Component],
    replacement: &[LayoutUpdate],
) -> Vec<(ComponentId, GridRect)> {
    replacement
        .iter()
        .filter_map(|update| {
            let component = components.iter().find(|c| c.id == update.id)?;
            if component.position.is_static {
                return None;
            }
            let rect = GridRect {
                x: update.x,
                y: update.y,
                w: update.w,
                h: update.h,
                ..component.position
            }
            .clamped();
            Some((component.id, rect))
        })
        .collect()
}

#[derive(Default)]
struct PendingFlush {
    /// Latest accepted layout; replaced, never appended.
    latest: Option<Vec<(ComponentId, GridRect)>>,
    deadline: Option<Instant>,
    worker_running: bool,
    failures: Vec<PositionWriteFailure>,
}

struct EngineInner {
    store: Arc<dyn DashboardStore>,
    debounce: Duration,
    pending: Mutex<HashMap<String, PendingFlush>>,
}

#[derive(Clone)]
pub struct LayoutEngine {
    inner: Arc<EngineInner>,
}

impl LayoutEngine {
    pub fn new(store: Arc<dyn DashboardStore>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                debounce,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Accept a full replacement layout for a dashboard and schedule a
    /// debounced flush. Returns how many rects were accepted.
    pub async fn submit(
        &self,
        slug: &str,
        replacement: &[LayoutUpdate],
    ) -> Result<usize, StoreError> {
        let dashboard = self
            .inner
            .store
            .get_dashboard(slug)
            .await?
            .ok_or_else(|| StoreError::DashboardNotFound {
                slug: slug.to_string(),
            })?;

        let writes = apply_layout(&dashboard.components, replacement);
        let accepted = writes.len();
        if accepted > 0 {
            self.schedule(slug, writes);
        }
        Ok(accepted)
    }

    /// Replace the pending payload for this dashboard and (re)arm the
    /// debounce timer. A pending flush is rescheduled, never stacked.
    fn schedule(&self, slug: &str, writes: Vec<(ComponentId, GridRect)>) {
        let mut pending = self.inner.pending.lock().unwrap();
        let entry = pending.entry(slug.to_string()).or_default();
        entry.latest = Some(writes);
        entry.deadline = Some(Instant::now() + self.inner.debounce);
        if !entry.worker_running {
            entry.worker_running = true;
            tokio::spawn(Self::run_worker(self.clone(), slug.to_string()));
        }
    }

    /// Per-dashboard worker: sleeps until the deadline settles, then takes
    /// the latest payload and writes it. Flushes run one at a time here; a
    /// submit that lands mid-flush parks its payload in `latest` and is
    /// picked up on the next loop turn.
    async fn run_worker(self, slug: String) {
        loop {
            let deadline = {
                let mut pending = self.inner.pending.lock().unwrap();
                let Some(entry) = pending.get_mut(&slug) else {
                    return;
                };
                match entry.deadline {
                    Some(deadline) => deadline,
                    // Drained by a direct flush while we slept.
                    None => {
                        entry.worker_running = false;
                        return;
                    }
                }
            };

            tokio::time::sleep_until(deadline).await;

            let payload = {
                let mut pending = self.inner.pending.lock().unwrap();
                let Some(entry) = pending.get_mut(&slug) else {
                    return;
                };
                match entry.deadline {
                    // Rescheduled while sleeping; keep waiting.
                    Some(deadline) if deadline > Instant::now() => continue,
                    _ => {}
                }
                entry.deadline = None;
                match entry.latest.take() {
                    Some(payload) => payload,
                    None => {
                        entry.worker_running = false;
                        return;
                    }
                }
            };

            let failures = Self::write_positions(&self.inner.store, payload).await;
            let mut pending = self.inner.pending.lock().unwrap();
            let Some(entry) = pending.get_mut(&slug) else {
                return;
            };
            for failure in &failures {
                tracing::warn!(
                    "position write for component {} on `{}` failed: {}",
                    failure.component_id,
                    slug,
                    failure.error
                );
            }
            entry.failures.extend(failures);
            if entry.latest.is_none() {
                entry.worker_running = false;
                return;
            }
            // else: coalesced submit arrived mid-flight; loop for it.
        }
    }

    /// Write each rect independently. One component's failure never rolls
    /// back or blocks its siblings.
    async fn write_positions(
        store: &Arc<dyn DashboardStore>,
        writes: Vec<(ComponentId, GridRect)>,
    ) -> Vec<PositionWriteFailure> {
        let attempts = writes.into_iter().map(|(id, rect)| {
            let store = store.clone();
            async move {
                store
                    .save_component_position(id, rect)
                    .await
                    .err()
                    .map(|error| PositionWriteFailure {
                        component_id: id,
                        error,
                    })
            }
        });
        futures::future::join_all(attempts)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Flush a dashboard's pending layout immediately, bypassing the
    /// debounce window. Returns the partial-failure list.
    pub async fn flush_now(&self, slug: &str) -> Vec<PositionWriteFailure> {
        let payload = {
            let mut pending = self.inner.pending.lock().unwrap();
            match pending.get_mut(slug) {
                Some(entry) => {
                    entry.deadline = None;
                    entry.latest.take()
                }
                None => None,
            }
        };
        match payload {
            Some(payload) => Self::write_positions(&self.inner.store, payload).await,
            None => Vec::new(),
        }
    }

    /// Issue every pending flush. Called on teardown so no accepted layout
    /// is silently dropped.
    pub async fn shutdown(&self) {
        let slugs: Vec<String> = {
            let pending = self.inner.pending.lock().unwrap();
            pending
                .iter()
                .filter(|(_, entry)| entry.latest.is_some())
                .map(|(slug, _)| slug.clone())
                .collect()
        };
        for slug in slugs {
            let failures = self.flush_now(&slug).await;
            for failure in &failures {
                tracing::warn!(
                    "teardown flush for `{}` failed on component {}: {}",
                    slug,
                    failure.component_id,
                    failure.error
                );
            }
            let mut pending = self.inner.pending.lock().unwrap();
            if let Some(entry) = pending.get_mut(&slug) {
                entry.failures.extend(failures);
            }
        }
    }

    /// Drain the recorded partial-failure list for a dashboard.
    pub fn take_failures(&self, slug: &str) -> Vec<PositionWriteFailure> {
        let mut pending = self.inner.pending.lock().unwrap();
        pending
            .get_mut(slug)
            .map(|entry| std::mem::take(&mut entry.failures))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::DashboardStore;
    use crate::domain::dashboard::{Dashboard, Visibility};
    use crate::domain::record::{DataRecord, RecordId};
    use crate::domain::registry::ComponentKind;
    use crate::domain::schema::FieldSchema;
    use crate::infrastructure::memory_store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store to count position writes and fail chosen
    /// components.
    struct InstrumentedStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        failing: Mutex<HashSet<ComponentId>>,
    }

    impl InstrumentedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                saves: AtomicUsize::new(0),
                failing: Mutex::new(HashSet::new()),
            }
        }

        fn fail_component(&self, id: ComponentId) {
            self.failing.lock().unwrap().insert(id);
        }
    }

    #[async_trait]
    impl DashboardStore for InstrumentedStore {
        async fn create_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError> {
            self.inner.create_dashboard(dashboard).await
        }
        async fn get_dashboard(&self, slug: &str) -> Result<Option<Dashboard>, StoreError> {
            self.inner.get_dashboard(slug).await
        }
        async fn update_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError> {
            self.inner.update_dashboard(dashboard).await
        }
        async fn delete_dashboard(&self, slug: &str) -> Result<(), StoreError> {
            self.inner.delete_dashboard(slug).await
        }
        async fn put_component(&self, slug: &str, component: Component) -> Result<(), StoreError> {
            self.inner.put_component(slug, component).await
        }
        async fn delete_component(&self, slug: &str, id: ComponentId) -> Result<(), StoreError> {
            self.inner.delete_component(slug, id).await
        }
        async fn save_component_position(
            &self,
            id: ComponentId,
            rect: GridRect,
        ) -> Result<(), StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(&id) {
                return Err(StoreError::Io {
                    target: id.to_string(),
                    message: "disk unplugged".to_string(),
                });
            }
            self.inner.save_component_position(id, rect).await
        }
        async fn read_schema(&self, id: ComponentId) -> Result<Option<FieldSchema>, StoreError> {
            self.inner.read_schema(id).await
        }
        async fn write_schema(
            &self,
            id: ComponentId,
            schema: FieldSchema,
        ) -> Result<(), StoreError> {
            self.inner.write_schema(id, schema).await
        }
        async fn create_record(&self, record: DataRecord) -> Result<(), StoreError> {
            self.inner.create_record(record).await
        }
        async fn update_record(&self, record: DataRecord) -> Result<(), StoreError> {
            self.inner.update_record(record).await
        }
        async fn delete_record(&self, id: RecordId) -> Result<(), StoreError> {
            self.inner.delete_record(id).await
        }
        async fn get_record(&self, id: RecordId) -> Result<Option<DataRecord>, StoreError> {
            self.inner.get_record(id).await
        }
        async fn list_records(&self, id: ComponentId) -> Result<Vec<DataRecord>, StoreError> {
            self.inner.list_records(id).await
        }
        async fn record_count(&self, id: ComponentId) -> Result<usize, StoreError> {
            self.inner.record_count(id).await
        }
    }

    fn component(x: u32, y: u32) -> Component {
        Component::new(ComponentKind::Table, "t", GridRect::new(x, y, 4, 4))
    }

    async fn seed(store: &InstrumentedStore, components: Vec<Component>) -> Dashboard {
        let mut dashboard = Dashboard::new("board", "Board", Visibility::Public);
        dashboard.components = components;
        store.create_dashboard(dashboard.clone()).await.unwrap();
        dashboard
    }

    fn update(id: ComponentId, x: u32, y: u32) -> LayoutUpdate {
        LayoutUpdate { id, x, y, w: 4, h: 4 }
    }

    #[test]
    fn test_apply_layout_accepts_overlaps_verbatim() {
        let a = component(0, 0);
        let b = component(8, 0);
        let components = vec![a.clone(), b.clone()];
        let writes = apply_layout(
            &components,
            &[update(a.id, 2, 2), update(b.id, 3, 3)],
        );
        assert_eq!(writes.len(), 2);
        assert!(writes[0].1.overlaps(&writes[1].1));
    }

    #[test]
    fn test_apply_layout_skips_static_and_unknown() {
        let mut pinned = component(0, 0);
        pinned.position.is_static = true;
        let movable = component(4, 0);
        let components = vec![pinned.clone(), movable.clone()];

        let writes = apply_layout(
            &components,
            &[
                update(pinned.id, 6, 6),
                update(movable.id, 8, 0),
                update(uuid::Uuid::new_v4(), 1, 1),
            ],
        );
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, movable.id);
    }

    #[test]
    fn test_apply_layout_clamps_to_bounds() {
        let c = component(0, 0);
        let id = c.id;
        let writes = apply_layout(&[c], &[LayoutUpdate { id, x: 10, y: 0, w: 40, h: 1 }]);
        assert_eq!(writes[0].1.w, 12);
        assert_eq!(writes[0].1.h, 2);
        assert_eq!(writes[0].1.x, 0);
    }

    #[tokio::test]
    async fn test_rapid_updates_coalesce_into_one_write() {
        let store = Arc::new(InstrumentedStore::new());
        let engine = LayoutEngine::new(store.clone(), Duration::from_millis(30));
        let dashboard = seed(&store, vec![component(0, 0)]).await;
        let id = dashboard.components[0].id;

        engine.submit("board", &[update(id, 1, 0)]).await.unwrap();
        engine.submit("board", &[update(id, 2, 0)]).await.unwrap();
        engine.submit("board", &[update(id, 3, 5)]).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        let stored = store.inner.get_dashboard("board").await.unwrap().unwrap();
        assert_eq!(stored.components[0].position.x, 3);
        assert_eq!(stored.components[0].position.y, 5);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_roll_back_siblings() {
        let store = Arc::new(InstrumentedStore::new());
        let engine = LayoutEngine::new(store.clone(), Duration::from_millis(10));
        let dashboard = seed(&store, vec![component(0, 0), component(6, 0)]).await;
        let failing = dashboard.components[0].id;
        let healthy = dashboard.components[1].id;
        store.fail_component(failing);

        engine
            .submit("board", &[update(failing, 1, 1), update(healthy, 2, 2)])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let failures = engine.take_failures("board");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].component_id, failing);

        let stored = store.inner.get_dashboard("board").await.unwrap().unwrap();
        assert_eq!(stored.component(healthy).unwrap().position.x, 2);
        assert_eq!(stored.component(failing).unwrap().position.x, 0);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_layout() {
        let store = Arc::new(InstrumentedStore::new());
        // Debounce far longer than the test; only shutdown can flush.
        let engine = LayoutEngine::new(store.clone(), Duration::from_secs(3600));
        let dashboard = seed(&store, vec![component(0, 0)]).await;
        let id = dashboard.components[0].id;

        engine.submit("board", &[update(id, 5, 5)]).await.unwrap();
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);

        engine.shutdown().await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        let stored = store.inner.get_dashboard("board").await.unwrap().unwrap();
        assert_eq!(stored.components[0].position.x, 5);
    }

    #[tokio::test]
    async fn test_submit_to_unknown_dashboard_fails() {
        let store = Arc::new(InstrumentedStore::new());
        let engine = LayoutEngine::new(store, Duration::from_millis(10));
        let err = engine
            .submit("ghost", &[update(uuid::Uuid::new_v4(), 0, 0)])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DashboardNotFound {
                slug: "ghost".to_string()
            }
        );
    }
}
