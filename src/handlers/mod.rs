pub mod extend;
pub mod inspect;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::generator::{GeneratorTools, Workspace};

/// 根据配置构建生成器：加载并合并所有模块配置
pub fn build_tools(config: &AppConfig) -> Result<GeneratorTools, AppError> {
    let workspace = Workspace::from_config(config);
    tracing::debug!(root = %workspace.root().display(), layout = ?workspace.layout(), "工作区已就绪");
    Ok(GeneratorTools::from_config(config, workspace)?)
}
