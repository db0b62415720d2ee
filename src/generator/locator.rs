use crate::errors::{not_found, unsupported, GeneratorError};
use crate::infrastructure::container::{Container, ContainerEntry, PluginRegistryConvention};
use crate::php::PhpValue;

/// 顶层 service manager 的配置段
pub const SERVICE_MANAGER_KEY: &str = "service_manager";

/// 包含目标类的插件注册表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMatch {
    /// 注册表在顶层容器中的服务名
    pub name: String,
    /// `vufind.plugin_managers` 下的键
    pub config_key: String,
}

/// 类的工厂注册位置
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryLocation {
    pub class: String,
    pub registry: Option<RegistryMatch>,
    pub factory: PhpValue,
}

impl FactoryLocation {
    /// 同一容器内注册项的配置路径前缀
    pub fn config_prefix(&self) -> Vec<String> {
        match &self.registry {
            None => vec![SERVICE_MANAGER_KEY.to_string()],
            Some(registry) => vec![
                "vufind".to_string(),
                "plugin_managers".to_string(),
                registry.config_key.clone(),
            ],
        }
    }
}

/// 精确注册给 `class` 的工厂（如果有）
pub fn direct_lookup<'a>(container: &'a dyn Container, class: &str) -> Option<&'a PhpValue> {
    if container.factory_keys().iter().any(|key| key == class) {
        container.factory(class)
    } else {
        None
    }
}

/// 按注册顺序第一个包含 `class` 工厂的插件注册表
pub fn scan_lookup<'a>(
    container: &'a dyn Container,
    class: &str,
    convention: &dyn PluginRegistryConvention,
) -> Option<(String, &'a dyn Container)> {
    container
        .factory_keys()
        .into_iter()
        .filter(|name| convention.is_plugin_registry(name))
        .find_map(|name| match container.get(&name) {
            Some(ContainerEntry::Registry(registry))
                if direct_lookup(registry, class).is_some() =>
            {
                Some((name, registry))
            }
            _ => None,
        })
}

/// 查找 `class` 的工厂：先查顶层，再查插件注册表。
pub fn locate_factory(
    container: &dyn Container,
    class: &str,
    convention: &dyn PluginRegistryConvention,
) -> Result<FactoryLocation, GeneratorError> {
    let class = class.trim_start_matches('\\');

    let (registry, factory) = if container.has(class) {
        tracing::debug!(class = %class, "在顶层容器中找到服务");
        (None, direct_lookup(container, class))
    } else {
        match scan_lookup(container, class, convention) {
            Some((name, registry)) => {
                let config_key = convention.config_key(&name).ok_or_else(|| {
                    unsupported(format!("no configuration key for plugin manager {}", name))
                })?;
                tracing::debug!(class = %class, registry = %name, key = %config_key, "在插件管理器中找到服务");
                (
                    Some(RegistryMatch { name, config_key }),
                    direct_lookup(registry, class),
                )
            }
            None => (None, None),
        }
    };

    let factory = factory.ok_or_else(|| not_found(format!("could not find factory for {}", class)))?;
    Ok(FactoryLocation {
        class: class.to_string(),
        registry,
        factory: factory.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::{ServiceManagerContainer, SuffixConvention};

    fn container() -> ServiceManagerContainer {
        ServiceManagerContainer::new()
            .with_factory("Foo", PhpValue::list(["F", "create"]))
            .with_invokable("Plain", "Plain")
            .with_registry(
                "VuFind\\Auth\\PluginManager",
                ServiceManagerContainer::new()
                    .with_factory("VuFind\\Auth\\Database", "VuFind\\Auth\\DatabaseFactory"),
            )
            .with_registry(
                "VuFind\\Search\\Results\\PluginManager",
                ServiceManagerContainer::new()
                    .with_factory("VuFind\\Auth\\Database", "Shadowed"),
            )
    }

    #[test]
    fn test_direct_lookup() {
        let container = container();
        assert_eq!(
            direct_lookup(&container, "Foo"),
            Some(&PhpValue::list(["F", "create"]))
        );
        assert_eq!(direct_lookup(&container, "Plain"), None);
        assert_eq!(direct_lookup(&container, "Missing"), None);
    }

    #[test]
    fn test_scan_lookup_first_registry_wins() {
        let container = container();
        let convention = SuffixConvention::default();
        let (name, _) = scan_lookup(&container, "VuFind\\Auth\\Database", &convention).unwrap();
        assert_eq!(name, "VuFind\\Auth\\PluginManager");
        assert!(scan_lookup(&container, "Nope", &convention).is_none());
    }

    #[test]
    fn test_locate_factory_top_level() {
        let location =
            locate_factory(&container(), "\\Foo", &SuffixConvention::default()).unwrap();
        assert_eq!(location.class, "Foo");
        assert_eq!(location.registry, None);
        assert_eq!(location.config_prefix(), vec!["service_manager"]);
    }

    #[test]
    fn test_locate_factory_in_registry() {
        let location = locate_factory(
            &container(),
            "VuFind\\Auth\\Database",
            &SuffixConvention::default(),
        )
        .unwrap();
        assert_eq!(location.factory, PhpValue::from("VuFind\\Auth\\DatabaseFactory"));
        assert_eq!(
            location.config_prefix(),
            vec!["vufind", "plugin_managers", "auth"]
        );
    }

    #[test]
    fn test_locate_factory_failures() {
        let convention = SuffixConvention::default();
        for class in ["Plain", "Unknown\\Class"] {
            let err = locate_factory(&container(), class, &convention).unwrap_err();
            assert!(matches!(err, GeneratorError::NotFound(ref m) if m.contains("could not find factory")));
        }
    }
}
