//! 模块扩展生成器
//!
//! 两个入口：
//! - [`GeneratorTools::extend_class`]：基于服务容器，为服务生成子类并注册别名
//! - [`GeneratorTools::extend_service`]：基于应用配置，处理 `factories` 与 `invokables`

pub mod backup;
pub mod class_locator;
pub mod class_name;
pub mod cloner;
pub mod config_path;
pub mod emitter;
pub mod locator;
pub mod module_config;
pub mod workspace;

pub use class_locator::ClassLocator;
pub use cloner::FactoryRef;
pub use locator::FactoryLocation;
pub use workspace::Workspace;

use crate::config::AppConfig;
use crate::errors::{not_found, unsupported, GeneratorError};
use crate::infrastructure::container::{
    Container, PluginRegistryConvention, ServiceManagerContainer, SuffixConvention,
};
use crate::php::PhpValue;
use std::path::PathBuf;

/// `extend_service` 支持的注册类型
pub const SUPPORTED_SERVICE_TYPES: [&str; 2] = ["factories", "invokables"];

/// 一次扩展操作的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendOutcome {
    /// 生成的子类；克隆工厂时为生成的工厂类
    pub new_class: String,
    /// 写入的主注册项的配置路径
    pub config_path: Vec<String>,
    /// 写入 `config_path` 的值
    pub registration: PhpValue,
    /// 被改写的模块配置文件
    pub config_file: PathBuf,
}

/// 针对一个应用目录树驱动整个生成流程
#[derive(Debug)]
pub struct GeneratorTools {
    workspace: Workspace,
    classes: ClassLocator,
    config: PhpValue,
    convention: Box<dyn PluginRegistryConvention>,
}

impl GeneratorTools {
    /// `config` 是用于路径查找的合并后应用配置。
    pub fn new(workspace: Workspace, classes: ClassLocator, config: PhpValue) -> Self {
        Self {
            workspace,
            classes,
            config,
            convention: Box::new(SuffixConvention::default()),
        }
    }

    /// 加载 `config` 指定（或在磁盘上发现）的全部模块配置。
    pub fn from_config(config: &AppConfig, workspace: Workspace) -> Result<Self, GeneratorError> {
        let application = module_config::load_application_config(
            &workspace,
            config.application.modules.as_deref(),
        )?;
        let classes = ClassLocator::from_config(workspace.clone(), config);
        Ok(Self::new(workspace, classes, application).with_convention(Box::new(
            SuffixConvention::new(&config.generator.plugin_manager_suffix),
        )))
    }

    pub fn with_convention(mut self, convention: Box<dyn PluginRegistryConvention>) -> Self {
        self.convention = convention;
        self
    }

    pub fn application_config(&self) -> &PhpValue {
        &self.config
    }

    pub fn convention(&self) -> &dyn PluginRegistryConvention {
        self.convention.as_ref()
    }

    /// 应用配置的 service manager 视图
    pub fn container(&self) -> ServiceManagerContainer {
        ServiceManagerContainer::from_application_config(&self.config, self.convention.as_ref())
    }

    /// 在 `module` 中为容器服务生成子类，并把注册指向新类。
    ///
    /// 新类沿用 `class` 的工厂，`class` 成为新类的别名。
    /// 只有第一次写配置时创建备份。
    pub fn extend_class(
        &self,
        container: &dyn Container,
        class: &str,
        module: &str,
    ) -> Result<ExtendOutcome, GeneratorError> {
        let location = locator::locate_factory(container, class, self.convention.as_ref())?;
        let new_class = cloner::create_subclass(&self.workspace, &location.class, module)?;

        let prefix = location.config_prefix();
        let factory_path = extend_path(&prefix, &["factories", new_class.as_str()]);
        let alias_path = extend_path(&prefix, &["aliases", location.class.as_str()]);

        module_config::write_module_config(
            &self.workspace,
            &factory_path,
            location.factory.clone(),
            module,
            true,
        )?;
        let config_file = module_config::write_module_config(
            &self.workspace,
            &alias_path,
            PhpValue::from(new_class.as_str()),
            module,
            false,
        )?;

        tracing::info!(class = %location.class, new_class = %new_class, module = %module, "服务已扩展");
        Ok(ExtendOutcome {
            new_class,
            config_path: factory_path,
            registration: location.factory,
            config_file,
        })
    }

    /// 用 `module` 中生成的类覆盖 `source_path`
    /// （如 `controllers/factories/Foo`）处的注册。
    pub fn extend_service(
        &self,
        source_path: &str,
        module: &str,
    ) -> Result<ExtendOutcome, GeneratorError> {
        let segments = config_path::split_path(source_path);
        if segments.len() < 3 {
            return Err(unsupported(format!(
                "config path too short: '{}' (expected section/type/key)",
                source_path
            )));
        }
        let kind = segments[segments.len() - 2].as_str();
        if !SUPPORTED_SERVICE_TYPES.contains(&kind) {
            return Err(unsupported(format!(
                "unsupported service type '{}'; supported types: {}",
                kind,
                SUPPORTED_SERVICE_TYPES.join(", ")
            )));
        }

        let existing = config_path::resolve(&self.config, &segments)
            .ok_or_else(|| not_found(format!("{} not found in configuration", source_path)))?;

        let (new_class, registration) = if kind == "factories" {
            let factory = FactoryRef::parse(existing)?;
            let cloned = cloner::clone_factory(&self.workspace, &self.classes, &factory, module)?;
            (cloned.class.clone(), cloned.to_value())
        } else {
            let class = existing.as_str().ok_or_else(|| {
                unsupported(format!(
                    "invokable {} must be a class name, found {}",
                    source_path,
                    existing.type_name()
                ))
            })?;
            let new_class = cloner::create_subclass(&self.workspace, class, module)?;
            (new_class.clone(), PhpValue::String(new_class))
        };

        let config_file = module_config::write_module_config(
            &self.workspace,
            &segments,
            registration.clone(),
            module,
            true,
        )?;

        tracing::info!(path = %source_path, new_class = %new_class, module = %module, "服务配置已扩展");
        Ok(ExtendOutcome {
            new_class,
            config_path: segments,
            registration,
            config_file,
        })
    }
}

fn extend_path(prefix: &[String], rest: &[&str]) -> Vec<String> {
    prefix
        .iter()
        .cloned()
        .chain(rest.iter().map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingReporter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn tools(temp_dir: &TempDir, config: PhpValue) -> GeneratorTools {
        let ws = Workspace::new(temp_dir.path()).with_reporter(Arc::new(RecordingReporter::new()));
        GeneratorTools::new(ws.clone(), ClassLocator::new(ws), config)
    }

    #[test]
    fn test_extend_service_rejects_short_paths() {
        let temp_dir = TempDir::new().unwrap();
        let tools = tools(&temp_dir, PhpValue::empty_array());
        for path in ["Foo", "a/Foo"] {
            let err = tools.extend_service(path, "MyModule").unwrap_err();
            assert!(matches!(err, GeneratorError::Unsupported(ref m) if m.contains("too short")));
        }
    }

    #[test]
    fn test_extend_service_rejects_unknown_types() {
        let temp_dir = TempDir::new().unwrap();
        let tools = tools(&temp_dir, PhpValue::empty_array());
        let err = tools
            .extend_service("controllers/aliases/Foo", "MyModule")
            .unwrap_err();
        match err {
            GeneratorError::Unsupported(message) => {
                assert!(message.contains("factories"));
                assert!(message.contains("invokables"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extend_service_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let tools = tools(&temp_dir, PhpValue::empty_array());
        let err = tools
            .extend_service("controllers/factories/Foo", "MyModule")
            .unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound(_)));
    }

    #[test]
    fn test_extend_path() {
        assert_eq!(
            extend_path(&["service_manager".to_string()], &["aliases", "Foo"]),
            vec!["service_manager", "aliases", "Foo"]
        );
    }
}
