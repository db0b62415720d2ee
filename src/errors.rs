use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("Application error: {0}")]
    Generic(String), // For simple string-based errors
}

/// Errors raised while loading the tool's own configuration (`modext.toml`).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Required configuration field '{0}' is missing or invalid")]
    FieldMissing(String),
}

/// Errors raised by the scaffolding pipeline.
///
/// Every variant is fatal to the current operation; nothing is rolled back,
/// backups written so far stay on disk.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A class, factory, config path or module config file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Unsupported registration type or malformed factory reference.
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// A fresh artifact was expected but something already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The constructor rewrite could not pick a single target.
    #[error("Ambiguous: {0}")]
    Ambiguous(String),
    #[error("I/O failure while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// A config path walk met a non-array node.
    #[error("Structural violation: {0}")]
    StructuralViolation(String),
    #[error("Failed to parse '{path}' at line {line}, column {column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },
}

impl GeneratorError {
    /// Short category name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorError::NotFound(_) => "not_found",
            GeneratorError::Unsupported(_) => "unsupported",
            GeneratorError::Conflict(_) => "conflict",
            GeneratorError::Ambiguous(_) => "ambiguous",
            GeneratorError::Io { .. } => "io",
            GeneratorError::StructuralViolation(_) => "structural_violation",
            GeneratorError::Parse { .. } => "parse",
        }
    }
}

pub fn not_found(message: impl Into<String>) -> GeneratorError {
    GeneratorError::NotFound(message.into())
}

pub fn unsupported(message: impl Into<String>) -> GeneratorError {
    GeneratorError::Unsupported(message.into())
}

pub fn conflict(message: impl Into<String>) -> GeneratorError {
    GeneratorError::Conflict(message.into())
}

/// Wraps an I/O error with the action and path it happened on.
pub fn io_error(action: &str, path: &Path, source: std::io::Error) -> GeneratorError {
    GeneratorError::Io {
        context: format!("{} '{}'", action, path.display()),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn mock_toml_error() -> toml::de::Error {
        toml::from_str::<toml::Value>("invalid_toml").err().unwrap()
    }

    #[test]
    fn test_config_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err_file_read = ConfigError::FileRead("modext.toml".to_string(), io_err);
        assert_eq!(
            format!("{}", err_file_read),
            "Failed to read file 'modext.toml': file not found"
        );

        let err_toml_parse = ConfigError::TomlParse("modext.toml".to_string(), mock_toml_error());
        assert!(format!("{}", err_toml_parse)
            .starts_with("Failed to parse TOML from file 'modext.toml': "));

        let err_field_missing = ConfigError::FieldMissing("application.root".to_string());
        assert_eq!(
            format!("{}", err_field_missing),
            "Required configuration field 'application.root' is missing or invalid"
        );
    }

    #[test]
    fn test_generator_error_display() {
        let err = not_found("could not find factory for VuFind\\Auth\\Database");
        assert_eq!(
            format!("{}", err),
            "Not found: could not find factory for VuFind\\Auth\\Database"
        );
        assert_eq!(err.kind(), "not_found");

        let err = io_error(
            "writing",
            Path::new("/tmp/x.php"),
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(
            format!("{}", err),
            "I/O failure while writing '/tmp/x.php': permission denied"
        );
        assert_eq!(err.kind(), "io");

        let err = GeneratorError::Parse {
            path: "module.config.php".to_string(),
            line: 3,
            column: 7,
            message: "unexpected ')'".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Failed to parse 'module.config.php' at line 3, column 7: unexpected ')'"
        );
    }

    #[test]
    fn test_app_error_display() {
        let app_err = AppError::from(conflict("MyModule\\Foo::build already exists"));
        assert_eq!(
            format!("{}", app_err),
            "Generator error: Conflict: MyModule\\Foo::build already exists"
        );

        let app_config_err = AppError::from(ConfigError::FieldMissing(
            "generator.backup_extension".to_string(),
        ));
        assert_eq!(
            format!("{}", app_config_err),
            "Configuration error: Required configuration field 'generator.backup_extension' is missing or invalid"
        );
    }
}
