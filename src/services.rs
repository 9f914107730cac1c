pub mod dashboard_service;
pub mod entry_service;
pub mod exit_service;
pub mod user_service;
