// Application layer - Use cases composed over the store traits
pub mod dashboard_service;
pub mod installer;
pub mod layout_engine;
pub mod record_service;
pub mod schema_manager;
pub mod store;
