// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::installer::TemplateInstaller;
use crate::application::layout_engine::LayoutEngine;
use crate::application::record_service::RecordService;

#[derive(Clone)]
pub struct AppState {
    pub dashboards: DashboardService,
    pub records: RecordService,
    pub layout: LayoutEngine,
    pub installer: TemplateInstaller,
}
