// Domain layer - Pure data model and rules, no I/O
pub mod component;
pub mod dashboard;
pub mod record;
pub mod registry;
pub mod schema;
pub mod template;
