use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};
use crate::errors::ConfigError;

use super::loader::ConfigLoader;

// Configuration location constants
pub const USER_CONFIG_PATH: &str = "~/.config/modext";

// Configuration file names
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const PROJECT_CONFIG_FILE_NAME: &str = "modext.toml";

// Defaults
pub const DEFAULT_PLUGIN_MANAGER_SUFFIX: &str = "PluginManager";
pub const DEFAULT_BACKUP_EXTENSION: &str = "bak";

// Environment variables
pub const ENV_ROOT: &str = "MODEXT_ROOT";
pub const ENV_MODULES: &str = "MODEXT_MODULES";
pub const ENV_PREFIX: &str = "MODEXT_";

/// Where generated classes land below `module/<Module>/src`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceLayout {
    /// `module/<M>/src/<every namespace segment>/<Class>.php`
    #[default]
    Namespaced,
    /// `module/<M>/src/<namespace segments after the module>/<Class>.php`
    Flat,
}

/// Main Application Configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub application: ApplicationConfig,
    pub generator: GeneratorConfig,
    /// Extra PSR-4 prefixes (`"Laminas\\Mvc\\"`) mapped to directories relative to the root.
    pub autoload: BTreeMap<String, PathBuf>,
    /// The file this configuration was read from, if any.
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    /// Application root, the directory holding `module/`.
    pub root: PathBuf,
    /// Merge order of module configs; `None` means discover.
    pub modules: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub plugin_manager_suffix: String,
    pub backup_extension: String,
    pub source_layout: SourceLayout,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            plugin_manager_suffix: DEFAULT_PLUGIN_MANAGER_SUFFIX.to_string(),
            backup_extension: DEFAULT_BACKUP_EXTENSION.to_string(),
            source_layout: SourceLayout::default(),
        }
    }
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    pub application: Option<PartialApplicationConfig>,
    pub generator: Option<PartialGeneratorConfig>,
    pub autoload: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialApplicationConfig {
    pub root: Option<String>,
    pub modules: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialGeneratorConfig {
    pub plugin_manager_suffix: Option<String>,
    pub backup_extension: Option<String>,
    pub source_layout: Option<SourceLayout>,
}

impl AppConfig {
    /// Load configuration from file and environment, with the command line overrides
    pub fn load(config_file: Option<PathBuf>, root: Option<PathBuf>) -> Result<Self, ConfigError> {
        ConfigLoader::new()
            .config_file(config_file)
            .root(root)
            .load_config()
    }

    /// Create AppConfig from partial config and environment.
    ///
    /// Precedence for the root: `root_override` (CLI), `MODEXT_ROOT`, the file, `.`.
    /// A relative root from the file is taken relative to the file's directory.
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
        root_override: Option<PathBuf>,
        source: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let application = partial.application.unwrap_or_default();
        let generator = partial.generator.unwrap_or_default();

        let root = match (root_override, env_map.get(ENV_ROOT)) {
            (Some(root), _) => root,
            (None, Some(root)) => expand(root),
            (None, None) => match application.root.as_deref() {
                Some(root) => {
                    let root = expand(root);
                    match source.as_deref().and_then(Path::parent) {
                        Some(dir) if root.is_relative() => dir.join(root),
                        _ => root,
                    }
                }
                None => PathBuf::from("."),
            },
        };

        let modules = match env_map.get(ENV_MODULES) {
            Some(list) => Some(
                list.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            None => application.modules,
        };

        let defaults = GeneratorConfig::default();
        let generator = GeneratorConfig {
            plugin_manager_suffix: generator
                .plugin_manager_suffix
                .unwrap_or(defaults.plugin_manager_suffix),
            backup_extension: generator
                .backup_extension
                .unwrap_or(defaults.backup_extension),
            source_layout: generator.source_layout.unwrap_or(defaults.source_layout),
        };

        if generator.plugin_manager_suffix.is_empty() {
            return Err(ConfigError::FieldMissing(
                "generator.plugin_manager_suffix".to_string(),
            ));
        }
        if generator.backup_extension.is_empty() || generator.backup_extension.contains('/') {
            return Err(ConfigError::FieldMissing(
                "generator.backup_extension".to_string(),
            ));
        }

        let autoload = partial
            .autoload
            .unwrap_or_default()
            .into_iter()
            .map(|(prefix, dir)| (prefix, PathBuf::from(dir)))
            .collect();

        Ok(Self {
            application: ApplicationConfig { root, modules },
            generator,
            autoload,
            source,
        })
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
