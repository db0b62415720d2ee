use crate::errors::{unsupported, GeneratorError};

/// 命名空间分隔符
pub const SEPARATOR: char = '\\';

/// 替换首段命名空间，把类映射到 `module` 中。
///
/// `VuFind\Auth\Database` 映射到 `MyModule` 后为 `MyModule\Auth\Database`。
/// 类名至少需要两段，否则没有可替换的模块段。
pub fn local_class_name(class: &str, module: &str) -> Result<String, GeneratorError> {
    if module.is_empty() || module.contains(SEPARATOR) {
        return Err(unsupported(format!("invalid module name '{}'", module)));
    }
    let mut segments = segments(class)?;
    segments[0] = module;
    Ok(segments.join("\\"))
}

/// 把类名拆分为 `(命名空间, 短类名)`。
pub fn split_class_name(class: &str) -> Result<(String, String), GeneratorError> {
    let segments = segments(class)?;
    let (simple, namespace) = segments
        .split_last()
        .ok_or_else(|| unsupported(format!("'{}' is not a class name", class)))?;
    Ok((namespace.join("\\"), simple.to_string()))
}

fn segments(class: &str) -> Result<Vec<&str>, GeneratorError> {
    let trimmed = class.trim_start_matches(SEPARATOR);
    let segments: Vec<&str> = trimmed.split(SEPARATOR).collect();
    if segments.len() < 2 {
        return Err(unsupported(format!(
            "cannot determine module of '{}': at least two namespace segments are required",
            class
        )));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(unsupported(format!("'{}' is not a valid class name", class)));
    }
    Ok(segments)
}
