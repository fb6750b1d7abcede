// HTTP request handlers
use crate::application::dashboard_service::{DashboardError, NewDashboard};
use crate::application::installer::InstallError;
use crate::application::layout_engine::LayoutUpdate;
use crate::application::record_service::RecordError;
use crate::application::store::StoreError;
use crate::domain::component::{ComponentId, GridRect};
use crate::domain::record::RecordId;
use crate::domain::registry::ComponentOverrides;
use crate::domain::schema::FieldSchema;
use crate::domain::template::TemplateDocument;
use crate::presentation::app_state::AppState;
use crate::presentation::render::render_model;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateDashboardRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDashboardRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct AddComponentRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<GridRect>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    pub password: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDashboardRequest>,
) -> Response {
    let new = NewDashboard {
        slug: request.slug,
        name: request.name,
        description: request.description,
        thumbnail: request.thumbnail,
        tags: request.tags,
        private: request.private,
        password: request.password,
    };
    match state.dashboards.create_dashboard(new).await {
        Ok(dashboard) => (StatusCode::CREATED, Json(dashboard)).into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn get_dashboard(
    Path(slug): Path<String>,
    Query(query): Query<AccessQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state
        .dashboards
        .get_dashboard(&slug, query.password.as_deref())
        .await
    {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn update_dashboard(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateDashboardRequest>,
) -> Response {
    match state
        .dashboards
        .update_metadata(
            &slug,
            request.name,
            request.description,
            request.thumbnail,
            request.tags,
        )
        .await
    {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn delete_dashboard(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboards.delete_dashboard(&slug).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn add_component(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddComponentRequest>,
) -> Response {
    let overrides = ComponentOverrides {
        name: request.name,
        position: request.position,
        config: request.config,
    };
    match state
        .dashboards
        .add_component(&slug, &request.kind, overrides)
        .await
    {
        Ok(component) => (StatusCode::CREATED, Json(component)).into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn delete_component(
    Path((slug, id)): Path<(String, ComponentId)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboards.delete_component(&slug, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => dashboard_error(e),
    }
}

/// Replace a component's field schema. Locked-schema rules apply based on
/// the component's live record count.
pub async fn put_schema(
    Path((_slug, id)): Path<(String, ComponentId)>,
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<FieldSchema>,
) -> Response {
    match state.dashboards.propose_schema(id, candidate).await {
        Ok(schema) => Json(schema).into_response(),
        Err(e) => dashboard_error(e),
    }
}

pub async fn create_record(
    Path(component_id): Path<ComponentId>,
    State(state): State<Arc<AppState>>,
    Json(values): Json<Map<String, Value>>,
) -> Response {
    match state.records.create(component_id, values).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => record_error(e),
    }
}

pub async fn list_records(
    Path(component_id): Path<ComponentId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.records.list(component_id).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => record_error(e),
    }
}

pub async fn update_record(
    Path(record_id): Path<RecordId>,
    State(state): State<Arc<AppState>>,
    Json(values): Json<Map<String, Value>>,
) -> Response {
    match state.records.update(record_id, values).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => record_error(e),
    }
}

pub async fn delete_record(
    Path(record_id): Path<RecordId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.records.delete(record_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => record_error(e),
    }
}

/// Accept a full replacement layout. Persistence is debounced; the
/// response only acknowledges how many rects were accepted.
pub async fn put_layout(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(updates): Json<Vec<LayoutUpdate>>,
) -> Response {
    match state.layout.submit(&slug, &updates).await {
        Ok(accepted) => (
            StatusCode::ACCEPTED,
            Json(json!({ "accepted": accepted })),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

pub async fn install_template(
    State(state): State<Arc<AppState>>,
    Json(document): Json<TemplateDocument>,
) -> Response {
    match state.installer.install(document).await {
        Ok(dashboard) => (StatusCode::CREATED, Json(dashboard)).into_response(),
        Err(e) => install_error(e),
    }
}

pub async fn install_catalog_template(
    Path(template_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.installer.install_by_id(&template_id).await {
        Ok(dashboard) => (StatusCode::CREATED, Json(dashboard)).into_response(),
        Err(e) => install_error(e),
    }
}

/// Resolve a component's render model from its current records.
pub async fn render_component(
    Path((slug, id)): Path<(String, ComponentId)>,
    Query(query): Query<AccessQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let dashboard = match state
        .dashboards
        .get_dashboard(&slug, query.password.as_deref())
        .await
    {
        Ok(dashboard) => dashboard,
        Err(e) => return dashboard_error(e),
    };
    let Some(component) = dashboard.component(id) else {
        return not_found(format!("component `{id}` not found"));
    };
    match state.records.list(id).await {
        Ok(records) => {
            Json(render_model(component.kind, &component.config, &records)).into_response()
        }
        Err(e) => record_error(e),
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn not_found(message: String) -> Response {
    error_body(StatusCode::NOT_FOUND, message)
}

fn dashboard_error(e: DashboardError) -> Response {
    let message = e.to_string();
    match e {
        DashboardError::NotFound { .. } | DashboardError::ComponentNotFound { .. } => {
            not_found(message)
        }
        DashboardError::InvalidSlug { .. } | DashboardError::Registry(_) => {
            error_body(StatusCode::BAD_REQUEST, message)
        }
        DashboardError::AccessDenied { .. } => error_body(StatusCode::FORBIDDEN, message),
        DashboardError::Schema(_) => error_body(StatusCode::UNPROCESSABLE_ENTITY, message),
        DashboardError::Store(e) => store_error(e),
    }
}

fn record_error(e: RecordError) -> Response {
    match e {
        RecordError::Validation(violations) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "validation failed",
                "violations": violations,
            })),
        )
            .into_response(),
        RecordError::ComponentNotFound { .. } | RecordError::RecordNotFound { .. } => {
            not_found(e.to_string())
        }
        RecordError::Store(e) => store_error(e),
    }
}

fn store_error(e: StoreError) -> Response {
    let message = e.to_string();
    match e {
        StoreError::DashboardExists { .. } => error_body(StatusCode::CONFLICT, message),
        StoreError::DashboardNotFound { .. }
        | StoreError::ComponentNotFound { .. }
        | StoreError::RecordNotFound { .. } => not_found(message),
        StoreError::Io { .. } => error_body(StatusCode::BAD_GATEWAY, message),
    }
}

fn install_error(e: InstallError) -> Response {
    let message = e.to_string();
    match e {
        InstallError::TemplateNotFound(_) => not_found(message),
        InstallError::InvalidSlug(_) => error_body(StatusCode::BAD_REQUEST, message),
        InstallError::Component { .. } => error_body(StatusCode::UNPROCESSABLE_ENTITY, message),
        InstallError::Store(e) => store_error(e),
        InstallError::Catalog(_) => error_body(StatusCode::BAD_GATEWAY, message),
    }
}
