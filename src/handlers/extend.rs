use crate::config::AppConfig;
use crate::errors::AppError;
use crate::handlers::build_tools;
use crate::logging::OperationTimer;

/// 处理 extend-service 命令
pub fn handle_extend_service(config: &AppConfig, path: &str, module: &str) -> Result<(), AppError> {
    let timer = OperationTimer::new("extend-service")
        .with_metadata("path", path)
        .with_metadata("module", module);

    let tools = build_tools(config)?;
    let outcome = tools.extend_service(path, module)?;
    tracing::debug!(new_class = %outcome.new_class, file = %outcome.config_file.display(), "extend-service 完成");

    timer.finish();
    Ok(())
}

/// 处理 extend-class 命令，容器由合并后的应用配置构建
pub fn handle_extend_class(config: &AppConfig, class: &str, module: &str) -> Result<(), AppError> {
    let timer = OperationTimer::new("extend-class")
        .with_metadata("class", class)
        .with_metadata("module", module);

    let tools = build_tools(config)?;
    let container = tools.container();
    let outcome = tools.extend_class(&container, class, module)?;
    tracing::debug!(new_class = %outcome.new_class, file = %outcome.config_file.display(), "extend-class 完成");

    timer.finish();
    Ok(())
}
