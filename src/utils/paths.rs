//! 跨平台路径解析工具模块
//!
//! 提供统一的配置目录解析，支持：
//! - 环境变量覆盖：MODEXT_CONFIG_DIR
//! - 向后兼容：优先使用已存在的 ~/.config/modext
//! - 平台标准：使用各平台标准目录作为默认位置

use std::env;
use std::path::PathBuf;

/// 展开用户目录 ~ 到实际路径
///
/// 支持：
/// - Unix 风格：~/path、~
/// - Windows 风格：~\path
///
/// # Examples
/// ```
/// use modext::utils::paths::expand_user;
///
/// let path = expand_user("/var/www/vufind");
/// assert_eq!(path, std::path::PathBuf::from("/var/www/vufind"));
/// ```
pub fn expand_user(input: &str) -> PathBuf {
    if let Some(stripped) = input.strip_prefix('~') {
        if let Some(home) = home::home_dir() {
            // 支持 Unix (/) 和 Windows (\) 路径分隔符
            let stripped = stripped
                .strip_prefix('/')
                .or_else(|| stripped.strip_prefix('\\'))
                .unwrap_or(stripped);

            return if stripped.is_empty() {
                home
            } else {
                home.join(stripped)
            };
        }
    }
    PathBuf::from(input)
}

/// 获取 modext 配置目录
///
/// 优先级：
/// 1. 环境变量 MODEXT_CONFIG_DIR
/// 2. 向后兼容：~/.config/modext（如果存在）
/// 3. 平台标准配置目录/modext
pub fn config_dir() -> Option<PathBuf> {
    // 1. 环境变量覆盖
    if let Ok(path) = env::var("MODEXT_CONFIG_DIR") {
        return Some(expand_user(&path));
    }

    // 2. 向后兼容检查
    let legacy = expand_user(crate::config::app_config::USER_CONFIG_PATH);
    if legacy.exists() {
        return Some(legacy);
    }

    // 3. 平台标准目录
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("modext"))
}
