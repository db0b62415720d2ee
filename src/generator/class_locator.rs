use crate::config::AppConfig;
use crate::errors::{io_error, not_found, GeneratorError};
use crate::generator::class_name::split_class_name;
use crate::generator::workspace::{Workspace, SOURCE_EXTENSION};
use crate::php::PhpClassFile;
use std::fs;
use std::path::PathBuf;

/// 在应用目录树中查找类源文件。
///
/// 首段命名空间对应 `module/` 下某个模块的类按工作区布局查找，
/// 否则取匹配最长的 autoload 前缀。
#[derive(Debug, Clone)]
pub struct ClassLocator {
    workspace: Workspace,
    autoload: Vec<(String, PathBuf)>,
}

impl ClassLocator {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            autoload: Vec::new(),
        }
    }

    pub fn from_config(workspace: Workspace, config: &AppConfig) -> Self {
        config
            .autoload
            .iter()
            .fold(Self::new(workspace), |locator, (prefix, dir)| {
                locator.with_autoload(prefix, dir.clone())
            })
    }

    /// 注册 PSR-4 风格的前缀，相对目录以根目录为基准。
    pub fn with_autoload(mut self, prefix: &str, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dir = if dir.is_absolute() {
            dir
        } else {
            self.workspace.root().join(dir)
        };
        let prefix = prefix.trim_matches('\\').to_string();
        self.autoload.push((prefix, dir));
        self.autoload.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// 声明 `class` 的文件路径（存在时）。
    pub fn locate(&self, class: &str) -> Option<PathBuf> {
        let class = class.trim_start_matches('\\');
        if let Ok((namespace, simple)) = split_class_name(class) {
            if let Some(module) = namespace.split('\\').next() {
                if self.workspace.module_dir(module).is_dir() {
                    let path = self.workspace.class_path(module, &namespace, &simple);
                    if path.is_file() {
                        return Some(path);
                    }
                }
            }
        }

        self.autoload.iter().find_map(|(prefix, dir)| {
            let rest = if prefix.is_empty() {
                class
            } else {
                class.strip_prefix(prefix.as_str())?.strip_prefix('\\')?
            };
            let mut path = dir.clone();
            for segment in rest.split('\\') {
                path.push(segment);
            }
            path.set_extension(SOURCE_EXTENSION);
            path.is_file().then_some(path)
        })
    }

    pub fn exists(&self, class: &str) -> bool {
        self.locate(class).is_some()
    }

    /// 读取并解析声明 `class` 的文件。
    pub fn load(&self, class: &str) -> Result<PhpClassFile, GeneratorError> {
        let class = class.trim_start_matches('\\');
        let path = self
            .locate(class)
            .ok_or_else(|| not_found(format!("class {} does not exist", class)))?;
        let source = fs::read_to_string(&path).map_err(|e| io_error("reading", &path, e))?;
        let file = PhpClassFile::parse(&source, &path.display().to_string())?;

        match file.class_name() {
            Some(declared) if declared.eq_ignore_ascii_case(class) => {
                tracing::debug!(class = %class, path = %path.display(), "类源码已加载");
                Ok(file)
            }
            declared => Err(not_found(format!(
                "{} does not declare class {} (found {})",
                path.display(),
                class,
                declared.unwrap_or_else(|| "no class".to_string())
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &std::path::Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_locate_in_module_tree() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "module/VuFind/src/VuFind/Auth/Database.php",
            "<?php\nnamespace VuFind\\Auth;\nclass Database\n{\n}\n",
        );
        let locator = ClassLocator::new(Workspace::new(temp_dir.path()));

        assert!(locator.exists("\\VuFind\\Auth\\Database"));
        assert!(!locator.exists("VuFind\\Auth\\Missing"));
        let file = locator.load("VuFind\\Auth\\Database").unwrap();
        assert_eq!(file.class_name().as_deref(), Some("VuFind\\Auth\\Database"));
    }

    #[test]
    fn test_locate_through_autoload_prefix() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "vendor/laminas/src/Factory/InvokableFactory.php",
            "<?php\nnamespace Laminas\\ServiceManager\\Factory;\nclass InvokableFactory\n{\n}\n",
        );
        let locator = ClassLocator::new(Workspace::new(temp_dir.path()))
            .with_autoload("Laminas\\ServiceManager\\", "vendor/laminas/src");

        let path = locator
            .locate("Laminas\\ServiceManager\\Factory\\InvokableFactory")
            .unwrap();
        assert!(path.ends_with("vendor/laminas/src/Factory/InvokableFactory.php"));
        assert!(!locator.exists("Laminas\\Other\\Thing"));
    }

    #[test]
    fn test_load_rejects_mismatched_declaration() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "module/VuFind/src/VuFind/Auth/Database.php",
            "<?php\nnamespace VuFind\\Other;\nclass Database\n{\n}\n",
        );
        let locator = ClassLocator::new(Workspace::new(temp_dir.path()));
        let err = locator.load("VuFind\\Auth\\Database").unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound(_)));

        let err = locator.load("VuFind\\Auth\\Missing").unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound(_)));
    }
}
