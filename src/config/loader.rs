use std::{collections::HashMap, env, fs, path::{Path, PathBuf}};
use crate::errors::ConfigError;
use crate::utils::paths;

use super::app_config::{
    AppConfig, PartialAppConfig, CONFIG_FILE_NAME, ENV_PREFIX, ENV_ROOT,
    PROJECT_CONFIG_FILE_NAME, USER_CONFIG_PATH,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
    config_file: Option<PathBuf>,
    root_override: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self {
            base_path: None,
            config_file: None,
            root_override: None,
        }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
            ..Self::new()
        }
    }

    /// Use an explicit config file instead of searching for one.
    pub fn config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Override the application root (highest precedence).
    pub fn root(mut self, root: Option<PathBuf>) -> Self {
        self.root_override = root;
        self
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let env_map = self.collect_env_vars();

        let config_path = self.locate_config_file(&env_map)?;
        let partial_config = match &config_path {
            Some(path) => Some(self.load_partial_config(path)?),
            None => None,
        };

        match &config_path {
            Some(path) => tracing::debug!("使用配置文件: {}", path.display()),
            None => tracing::debug!("未发现配置文件，使用默认配置"),
        }

        AppConfig::from_partial_and_env(
            partial_config,
            env_map,
            self.root_override.clone(),
            config_path,
        )
    }

    /// Finds the config file: explicit path, `<root>/modext.toml`, then the user config dir.
    fn locate_config_file(
        &self,
        env_map: &HashMap<String, String>,
    ) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(explicit) = &self.config_file {
            if !explicit.is_file() {
                return Err(ConfigError::FileRead(
                    explicit.to_string_lossy().to_string(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
                ));
            }
            return Ok(Some(explicit.clone()));
        }

        let root_hint = self
            .root_override
            .clone()
            .or_else(|| env_map.get(ENV_ROOT).map(|r| paths::expand_user(r)))
            .unwrap_or_else(|| PathBuf::from("."));
        let project_file = root_hint.join(PROJECT_CONFIG_FILE_NAME);
        if project_file.is_file() {
            return Ok(Some(project_file));
        }

        let user_file = self.user_config_file();
        Ok(user_file.filter(|path| path.is_file()))
    }

    fn user_config_file(&self) -> Option<PathBuf> {
        match &self.base_path {
            // For testing: use custom base path
            Some(base_path) => Some(
                base_path
                    .join(USER_CONFIG_PATH.trim_start_matches("~/"))
                    .join(CONFIG_FILE_NAME),
            ),
            None => paths::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)),
        }
    }

    fn load_partial_config(&self, path: &Path) -> Result<PartialAppConfig, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string_lossy().to_string(), e))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::TomlParse(path.to_string_lossy().to_string(), e))
    }

    /// Collect `MODEXT_*` environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_loader() -> (ConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_base_path(temp_dir.path().to_path_buf());
        (loader, temp_dir)
    }

    #[test]
    fn test_project_file_is_found_under_root() {
        let (loader, temp_dir) = create_test_loader();
        fs::write(
            temp_dir.path().join("modext.toml"),
            "[generator]\nbackup_extension = \"orig\"\n",
        )
        .unwrap();

        let config = loader
            .root(Some(temp_dir.path().to_path_buf()))
            .load_config()
            .unwrap();
        assert_eq!(config.generator.backup_extension, "orig");
        assert_eq!(config.application.root, temp_dir.path().to_path_buf());
        assert_eq!(config.source, Some(temp_dir.path().join("modext.toml")));
    }

    #[test]
    fn test_user_config_file_is_fallback() {
        let (loader, temp_dir) = create_test_loader();
        let user_file = temp_dir.path().join(".config/modext/config.toml");
        fs::create_dir_all(user_file.parent().unwrap()).unwrap();
        fs::write(&user_file, "[generator]\nplugin_manager_suffix = \"Manager\"\n").unwrap();

        let empty_root = temp_dir.path().join("site");
        fs::create_dir_all(&empty_root).unwrap();

        let config = loader.root(Some(empty_root)).load_config().unwrap();
        assert_eq!(config.generator.plugin_manager_suffix, "Manager");
        assert_eq!(config.source, Some(user_file));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let (loader, temp_dir) = create_test_loader();
        let result = loader
            .config_file(Some(temp_dir.path().join("nope.toml")))
            .load_config();
        assert!(matches!(result, Err(ConfigError::FileRead(..))));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let (loader, temp_dir) = create_test_loader();
        let file = temp_dir.path().join("broken.toml");
        fs::write(&file, "[generator\n").unwrap();
        let result = loader.config_file(Some(file)).load_config();
        assert!(matches!(result, Err(ConfigError::TomlParse(..))));
    }
}
