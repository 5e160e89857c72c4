pub mod export;
pub mod project_settings;
