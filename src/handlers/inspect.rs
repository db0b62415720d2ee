use crate::config::AppConfig;
use crate::errors::{not_found, AppError, GeneratorError};
use crate::generator::locator::{locate_factory, FactoryLocation};
use crate::generator::{config_path, FactoryRef, GeneratorTools};
use crate::handlers::build_tools;
use crate::php::PhpValue;

/// 处理 locate 命令
pub fn handle_locate(config: &AppConfig, class: &str) -> Result<(), AppError> {
    let tools = build_tools(config)?;
    println!("{}", locate_report(&tools, class)?);
    Ok(())
}

/// 处理 show 命令
pub fn handle_show(config: &AppConfig, path: Option<&str>) -> Result<(), AppError> {
    let tools = build_tools(config)?;
    println!("{}", show_json(&tools, path)?);
    Ok(())
}

/// 描述 `class` 的工厂注册位置
pub fn locate_report(tools: &GeneratorTools, class: &str) -> Result<String, GeneratorError> {
    let container = tools.container();
    let location = locate_factory(&container, class, tools.convention())?;
    Ok(describe(&location))
}

fn describe(location: &FactoryLocation) -> String {
    let container = match &location.registry {
        Some(registry) => format!("plugin manager {}", registry.name),
        None => "service manager".to_string(),
    };
    let mut path = location.config_prefix();
    path.push("factories".to_string());
    path.push(location.class.clone());
    format!(
        "{}\n  container: {}\n  factory:   {}\n  config:    {}",
        location.class,
        container,
        describe_factory(&location.factory),
        path.join("/")
    )
}

/// 工厂引用输出 `Class::method`，否则输出类名
fn describe_factory(factory: &PhpValue) -> String {
    match FactoryRef::parse(factory) {
        Ok(reference) => reference.to_string(),
        Err(_) => factory
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| factory.to_json().to_string()),
    }
}

/// 合并配置中 `path` 处的格式化 JSON（`None` 时输出全部）
pub fn show_json(tools: &GeneratorTools, path: Option<&str>) -> Result<String, AppError> {
    let config = tools.application_config();
    let value = match path.filter(|p| !p.is_empty()) {
        Some(path) => config_path::resolve(config, &config_path::split_path(path))
            .ok_or_else(|| not_found(format!("{} not found in configuration", path)))?,
        None => config,
    };
    serde_json::to_string_pretty(&value.to_json())
        .map_err(|e| AppError::Generic(format!("failed to render JSON: {}", e)))
}
