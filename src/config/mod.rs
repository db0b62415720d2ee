pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{AppConfig, ApplicationConfig, GeneratorConfig, SourceLayout};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{
    CONFIG_FILE_NAME, DEFAULT_BACKUP_EXTENSION, DEFAULT_PLUGIN_MANAGER_SUFFIX,
    PROJECT_CONFIG_FILE_NAME,
};
