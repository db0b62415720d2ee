use super::{Container, ContainerEntry, PluginRegistryConvention};
use crate::php::PhpValue;
use indexmap::IndexMap;

const MAX_ALIAS_DEPTH: usize = 16;

/// 由配置构建的 Laminas 风格 service manager 静态视图
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceManagerContainer {
    factories: IndexMap<String, PhpValue>,
    invokables: IndexMap<String, PhpValue>,
    aliases: IndexMap<String, String>,
    registries: IndexMap<String, ServiceManagerContainer>,
}

impl ServiceManagerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `service_manager` 构建顶层容器；约定识别为注册表的工厂键
    /// 从 `vufind.plugin_managers.<key>` 填充。
    pub fn from_application_config(
        config: &PhpValue,
        convention: &dyn PluginRegistryConvention,
    ) -> Self {
        let mut container = config
            .get("service_manager")
            .map(Self::from_section)
            .unwrap_or_default();

        let registry_names: Vec<String> = container
            .factories
            .keys()
            .filter(|name| convention.is_plugin_registry(name))
            .cloned()
            .collect();
        for name in registry_names {
            let Some(key) = convention.config_key(&name) else {
                tracing::warn!(registry = %name, "无法推导插件管理器配置键，已跳过");
                continue;
            };
            let section = config
                .get("vufind")
                .and_then(|v| v.get("plugin_managers"))
                .and_then(|p| p.get(&key));
            let registry = section.map(Self::from_section).unwrap_or_default();
            tracing::debug!(
                registry = %name,
                key = %key,
                factories = registry.factories.len(),
                "插件管理器已加载"
            );
            container.registries.insert(name, registry);
        }
        container
    }

    /// 从一个 manager 配置段读取 `factories`、`invokables` 和 `aliases`。
    pub fn from_section(section: &PhpValue) -> Self {
        let mut container = Self::new();
        for (name, value) in entries(section, "factories") {
            container.factories.insert(name, value.clone());
        }
        for (name, value) in entries(section, "invokables") {
            container.invokables.insert(name, value.clone());
        }
        for (name, value) in entries(section, "aliases") {
            if let Some(target) = value.as_str() {
                container.aliases.insert(name, target.to_string());
            }
        }
        container
    }

    pub fn with_factory(mut self, name: &str, factory: impl Into<PhpValue>) -> Self {
        self.factories.insert(name.to_string(), factory.into());
        self
    }

    pub fn with_invokable(mut self, name: &str, class: &str) -> Self {
        self.invokables
            .insert(name.to_string(), PhpValue::from(class));
        self
    }

    pub fn with_alias(mut self, name: &str, target: &str) -> Self {
        self.aliases.insert(name.to_string(), target.to_string());
        self
    }

    /// 注册插件注册表，同时登记一个工厂条目以便枚举。
    pub fn with_registry(mut self, name: &str, registry: ServiceManagerContainer) -> Self {
        self.factories
            .entry(name.to_string())
            .or_insert_with(|| PhpValue::from(name));
        self.registries.insert(name.to_string(), registry);
        self
    }

    fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.aliases.get(current) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }
}

fn entries<'a>(section: &'a PhpValue, kind: &str) -> impl Iterator<Item = (String, &'a PhpValue)> {
    section
        .get(kind)
        .and_then(PhpValue::as_array)
        .into_iter()
        .flat_map(|array| array.iter().map(|(k, v)| (k.to_string(), v)))
}

impl Container for ServiceManagerContainer {
    fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
            || self.invokables.contains_key(name)
            || self.aliases.contains_key(name)
            || self.registries.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<ContainerEntry<'_>> {
        let name = self.resolve_alias(name);
        if let Some(registry) = self.registries.get(name) {
            return Some(ContainerEntry::Registry(registry));
        }
        self.factories
            .get(name)
            .or_else(|| self.invokables.get(name))
            .map(ContainerEntry::Service)
    }

    fn factory_keys(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    fn factory(&self, name: &str) -> Option<&PhpValue> {
        self.factories.get(name)
    }
}
