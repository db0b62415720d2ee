pub mod args;
pub mod config;
pub mod errors;
pub mod generator;
pub mod handlers;
pub mod infrastructure;
pub mod logging;
pub mod php;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::{AppError, GeneratorError};
pub use generator::{ExtendOutcome, GeneratorTools, Workspace};
