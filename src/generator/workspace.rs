//! 应用目录布局
//!
//! 所有路径都从显式传入的应用根目录推导，不依赖任何全局状态。

use crate::config::{AppConfig, SourceLayout, DEFAULT_BACKUP_EXTENSION};
use crate::utils::{ConsoleReporter, Reporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MODULE_DIR: &str = "module";
pub const MODULE_CONFIG_FILE: &str = "module.config.php";
pub const SOURCE_EXTENSION: &str = "php";

/// 被修改的应用目录树，以及面向用户的输出去向
#[derive(Clone)]
pub struct Workspace {
    root: PathBuf,
    layout: SourceLayout,
    backup_extension: String,
    reporter: Arc<dyn Reporter>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: SourceLayout::default(),
            backup_extension: DEFAULT_BACKUP_EXTENSION.to_string(),
            reporter: Arc::new(ConsoleReporter),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.application.root.clone())
            .with_layout(config.generator.source_layout)
            .with_backup_extension(&config.generator.backup_extension)
    }

    pub fn with_layout(mut self, layout: SourceLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_backup_extension(mut self, extension: &str) -> Self {
        self.backup_extension = extension.to_string();
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> SourceLayout {
        self.layout
    }

    pub fn backup_extension(&self) -> &str {
        &self.backup_extension
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULE_DIR)
    }

    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.modules_dir().join(module)
    }

    /// `module/<Module>/config/module.config.php`
    pub fn module_config_path(&self, module: &str) -> PathBuf {
        self.module_dir(module).join("config").join(MODULE_CONFIG_FILE)
    }

    /// `module` 中存放 `namespace` 下类的目录
    pub fn source_dir(&self, module: &str, namespace: &str) -> PathBuf {
        let mut dir = self.module_dir(module).join("src");
        let skip = match self.layout {
            SourceLayout::Namespaced => 0,
            SourceLayout::Flat => 1,
        };
        for segment in namespace.split('\\').filter(|s| !s.is_empty()).skip(skip) {
            dir.push(segment);
        }
        dir
    }

    /// 类属于 `module` 时所在的文件
    pub fn class_path(&self, module: &str, namespace: &str, simple_name: &str) -> PathBuf {
        self.source_dir(module, namespace)
            .join(format!("{}.{}", simple_name, SOURCE_EXTENSION))
    }

    /// 输出一行面向用户的提示
    pub fn report(&self, line: &str) {
        self.reporter.report(line);
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("layout", &self.layout)
            .field("backup_extension", &self.backup_extension)
            .finish()
    }
}
