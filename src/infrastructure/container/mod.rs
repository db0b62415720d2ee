//! 服务容器抽象
//!
//! 生成器只依赖这里的 trait：顶层容器、插件管理器（子容器）以及
//! 识别插件管理器的命名约定。`factory_keys` 显式提供工厂枚举能力。

pub mod service_manager;

pub use service_manager::ServiceManagerContainer;

use crate::config::DEFAULT_PLUGIN_MANAGER_SUFFIX;
use crate::php::PhpValue;

/// `Container::get` 的返回值
#[derive(Debug, Clone, Copy)]
pub enum ContainerEntry<'a> {
    /// 嵌套的插件注册表
    Registry(&'a dyn Container),
    /// 普通服务注册
    Service(&'a PhpValue),
}

/// 服务名到构造方式的注册表
pub trait Container: std::fmt::Debug {
    /// 服务名已知（factory、invokable、alias 或注册表）时为 true
    fn has(&self, name: &str) -> bool;

    fn get(&self, name: &str) -> Option<ContainerEntry<'_>>;

    /// 所有注册了工厂的服务名，按注册顺序
    fn factory_keys(&self) -> Vec<String>;

    /// 精确注册给 `name` 的工厂
    fn factory(&self, name: &str) -> Option<&PhpValue>;
}

/// 判断哪些顶层服务是插件注册表，以及其配置所在位置
pub trait PluginRegistryConvention: std::fmt::Debug + Send + Sync {
    fn is_plugin_registry(&self, name: &str) -> bool;

    /// 注册表配置在 `vufind.plugin_managers` 下的键
    fn config_key(&self, name: &str) -> Option<String>;
}

/// 服务名以固定后缀结尾的即为插件注册表。
///
/// 配置键由厂商段与后缀之间的命名空间段组成：
/// `VuFind\Search\Results\PluginManager` 对应 `search_results`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixConvention {
    suffix: String,
}

impl SuffixConvention {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }
}

impl Default for SuffixConvention {
    fn default() -> Self {
        Self::new(DEFAULT_PLUGIN_MANAGER_SUFFIX)
    }
}

impl PluginRegistryConvention for SuffixConvention {
    fn is_plugin_registry(&self, name: &str) -> bool {
        !self.suffix.is_empty() && name.ends_with(&self.suffix)
    }

    fn config_key(&self, name: &str) -> Option<String> {
        if !self.is_plugin_registry(name) {
            return None;
        }
        let mut segments: Vec<&str> = name
            .trim_start_matches('\\')
            .split('\\')
            .filter(|s| !s.is_empty())
            .collect();
        let last = segments.pop()?;
        let stem = last.strip_suffix(self.suffix.as_str()).unwrap_or(last);
        if !segments.is_empty() {
            segments.remove(0);
        }
        if !stem.is_empty() {
            segments.push(stem);
        }
        if segments.is_empty() {
            return None;
        }
        Some(
            segments
                .iter()
                .map(|s| s.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
        )
    }
}
