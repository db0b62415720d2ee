//! 模块配置文件的读取、修改与合并
//!
//! 每次修改都从磁盘重新读取 `module.config.php`，写回时整体重写为单个
//! `return [...];` 语句。

use crate::errors::{io_error, not_found, unsupported, GeneratorError};
use crate::generator::backup::backup_file;
use crate::generator::workspace::{Workspace, MODULE_CONFIG_FILE};
use crate::php::{parse_config_file, write_config_file, PhpArray, PhpKey, PhpValue};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 在 `path` 处写入 `value`，缺失的中间数组会被创建。
pub fn set_path<S: AsRef<str>>(
    config: &mut PhpValue,
    path: &[S],
    value: PhpValue,
) -> Result<(), GeneratorError> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| unsupported("config path must have at least one segment"))?;

    let mut node = config;
    let mut walked = Vec::with_capacity(parents.len());
    for segment in parents {
        let array = node
            .as_array_mut()
            .ok_or_else(|| structural_violation(&walked, segment.as_ref()))?;
        walked.push(segment.as_ref());
        node = array
            .entry(PhpKey::from_segment(segment.as_ref()))
            .or_insert_with(PhpValue::empty_array);
    }

    let array = node
        .as_array_mut()
        .ok_or_else(|| structural_violation(&walked, last.as_ref()))?;
    array.insert(PhpKey::from_segment(last.as_ref()), value);
    Ok(())
}

fn structural_violation(walked: &[&str], next: &str) -> GeneratorError {
    let at = if walked.is_empty() {
        "<root>".to_string()
    } else {
        walked.join("/")
    };
    GeneratorError::StructuralViolation(format!(
        "cannot set '{}': '{}' is not an array",
        next, at
    ))
}

/// 读取 `module/<module>/config/module.config.php`
pub fn load_module_config(ws: &Workspace, module: &str) -> Result<PhpValue, GeneratorError> {
    read_config_file(&ws.module_config_path(module))
}

fn read_config_file(path: &Path) -> Result<PhpValue, GeneratorError> {
    if !path.is_file() {
        return Err(not_found(format!(
            "module configuration {} does not exist",
            path.display()
        )));
    }
    let source = fs::read_to_string(path).map_err(|e| io_error("reading", path, e))?;
    parse_config_file(&source, &path.display().to_string())
}

/// 向模块配置文件写入一个值。
///
/// 除非 `backup` 为 false，否则先备份；同一操作中第二次及之后的写入
/// 会传入 false。
pub fn write_module_config<S: AsRef<str>>(
    ws: &Workspace,
    path: &[S],
    value: PhpValue,
    module: &str,
    backup: bool,
) -> Result<PathBuf, GeneratorError> {
    let file = ws.module_config_path(module);
    let mut config = read_config_file(&file)?;
    if backup {
        backup_file(ws, &file)?;
    }

    set_path(&mut config, path, value)?;
    fs::write(&file, write_config_file(&config)).map_err(|e| io_error("writing", &file, e))?;

    let joined: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    tracing::info!(module = %module, path = %joined.join("/"), "模块配置已更新");
    ws.report(&format!("Successfully updated {}", file.display()));
    Ok(file)
}

/// 把 `overlay` 合并进 `base`。
///
/// 字符串键两侧都是数组时递归合并，否则以 `overlay` 为准。
/// 整数键追加，已存在相同值时跳过。
pub fn merge(base: &mut PhpArray, overlay: PhpArray) {
    for (key, value) in overlay {
        match key {
            PhpKey::Int(_) => {
                if !base.values().any(|existing| *existing == value) {
                    let next = next_index(base);
                    base.insert(PhpKey::Int(next), value);
                }
            }
            PhpKey::Str(_) => match (base.get_mut(&key), value) {
                (Some(PhpValue::Array(existing)), PhpValue::Array(incoming)) => {
                    merge(existing, incoming)
                }
                (_, value) => {
                    base.insert(key, value);
                }
            },
        }
    }
}

fn next_index(array: &PhpArray) -> i64 {
    array
        .keys()
        .filter_map(|k| match k {
            PhpKey::Int(i) => Some(*i),
            PhpKey::Str(_) => None,
        })
        .max()
        .map_or(0, |max| max.saturating_add(1).max(0))
}

/// 带有配置文件的模块目录，按名称排序
pub fn discover_modules(ws: &Workspace) -> Result<Vec<String>, GeneratorError> {
    let dir = ws.modules_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut modules = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
            io_error("listing modules in", &path, e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.path().join("config").join(MODULE_CONFIG_FILE).is_file() {
            modules.push(name);
        }
    }
    modules.sort();
    Ok(modules)
}

/// 按顺序合并所有模块配置，得到应用配置。
///
/// 未显式指定模块列表时加载所有发现的模块。
pub fn load_application_config(
    ws: &Workspace,
    modules: Option<&[String]>,
) -> Result<PhpValue, GeneratorError> {
    let modules = match modules {
        Some(list) => list.to_vec(),
        None => discover_modules(ws)?,
    };

    let mut merged = PhpArray::new();
    for module in &modules {
        match load_module_config(ws, module)? {
            PhpValue::Array(config) => merge(&mut merged, config),
            other => {
                return Err(GeneratorError::StructuralViolation(format!(
                    "configuration of module {} returns {}, expected array",
                    module,
                    other.type_name()
                )))
            }
        }
    }
    tracing::debug!(modules = ?modules, "应用配置已合并");
    Ok(PhpValue::Array(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingReporter;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup(config: &str) -> (TempDir, Workspace, Arc<RecordingReporter>) {
        let temp_dir = TempDir::new().unwrap();
        let reporter = Arc::new(RecordingReporter::new());
        let ws = Workspace::new(temp_dir.path()).with_reporter(reporter.clone());
        let path = ws.module_config_path("MyModule");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, config).unwrap();
        (temp_dir, ws, reporter)
    }

    fn backups(ws: &Workspace) -> usize {
        let dir = ws.module_config_path("MyModule");
        fs::read_dir(dir.parent().unwrap())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".bak")
            })
            .count()
    }

    #[test]
    fn test_set_path_creates_intermediate_nodes() {
        let mut config = PhpValue::empty_array();
        set_path(&mut config, &["a", "b", "c"], PhpValue::from("v")).unwrap();
        assert_eq!(
            config,
            PhpValue::map([("a", PhpValue::map([("b", PhpValue::map([("c", "v")]))]))])
        );
    }

    #[test]
    fn test_set_path_rejects_scalar_intermediate() {
        let mut config = PhpValue::map([("a", "scalar")]);
        let err = set_path(&mut config, &["a", "b"], PhpValue::from("x")).unwrap_err();
        assert!(matches!(err, GeneratorError::StructuralViolation(_)));
        assert_eq!(config, PhpValue::map([("a", "scalar")]));
    }

    #[test]
    fn test_set_path_overwrites_existing_value() {
        let mut config = PhpValue::map([("a", PhpValue::map([("b", "old"), ("c", "keep")]))]);
        set_path(&mut config, &["a", "b"], PhpValue::from("new")).unwrap();
        assert_eq!(
            config,
            PhpValue::map([("a", PhpValue::map([("b", "new"), ("c", "keep")]))])
        );
    }

    #[test]
    fn test_write_module_config_backs_up_and_reports() {
        let (_temp_dir, ws, reporter) = setup("<?php\nreturn [];\n");
        let file = write_module_config(
            &ws,
            &["service_manager", "aliases", "Foo"],
            PhpValue::from("MyModule\\Foo"),
            "MyModule",
            true,
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "<?php\n\nreturn [\n    'service_manager' => [\n        'aliases' => [\n            'Foo' => 'MyModule\\\\Foo',\n        ],\n    ],\n];\n"
        );
        assert_eq!(backups(&ws), 1);
        let lines = reporter.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Created backup: "));
        assert_eq!(lines[1], format!("Successfully updated {}", file.display()));
    }

    #[test]
    fn test_repeated_identical_writes_are_byte_identical() {
        let (_temp_dir, ws, _) = setup("<?php\nreturn ['x' => [1, 2]];\n");
        let path = ["controllers", "factories", "Foo"];
        let value = PhpValue::from("MyModule\\FooFactory::build");

        let file = write_module_config(&ws, &path, value.clone(), "MyModule", false).unwrap();
        let first = fs::read(&file).unwrap();
        write_module_config(&ws, &path, value, "MyModule", false).unwrap();
        assert_eq!(fs::read(&file).unwrap(), first);
        assert_eq!(backups(&ws), 0);
    }

    #[test]
    fn test_missing_module_config_is_not_found() {
        let (_temp_dir, ws, _) = setup("<?php\nreturn [];\n");
        let err = write_module_config(&ws, &["a"], PhpValue::Null, "Other", true).unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound(_)));
    }

    #[test]
    fn test_merge_follows_array_utils_rules() {
        let mut base = match PhpValue::map([
            ("a", PhpValue::map([("x", "1"), ("y", "2")])),
            ("list", PhpValue::list(["one", "two"])),
            ("scalar", PhpValue::from("old")),
        ]) {
            PhpValue::Array(a) => a,
            _ => unreachable!(),
        };
        let overlay = match PhpValue::map([
            ("a", PhpValue::map([("y", "3"), ("z", "4")])),
            ("list", PhpValue::list(["two", "three"])),
            ("scalar", PhpValue::list(["new"])),
        ]) {
            PhpValue::Array(a) => a,
            _ => unreachable!(),
        };

        merge(&mut base, overlay);
        assert_eq!(
            PhpValue::Array(base),
            PhpValue::map([
                ("a", PhpValue::map([("x", "1"), ("y", "3"), ("z", "4")])),
                ("list", PhpValue::list(["one", "two", "three"])),
                ("scalar", PhpValue::list(["new"])),
            ])
        );
    }

    #[test]
    fn test_application_config_merges_discovered_modules_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Workspace::new(temp_dir.path());
        for (module, body) in [
            ("VuFind", "['service_manager' => ['factories' => ['A' => 'AF']]]"),
            ("MyModule", "['service_manager' => ['factories' => ['A' => 'Mine']]]"),
        ] {
            let path = ws.module_config_path(module);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("<?php\nreturn {};\n", body)).unwrap();
        }
        fs::create_dir_all(ws.module_dir("NoConfig")).unwrap();

        assert_eq!(discover_modules(&ws).unwrap(), vec!["MyModule", "VuFind"]);

        let discovered = load_application_config(&ws, None).unwrap();
        assert_eq!(
            discovered.get("service_manager").and_then(|s| s.get("factories")).and_then(|f| f.get("A")),
            Some(&PhpValue::from("AF"))
        );

        let order = vec!["VuFind".to_string(), "MyModule".to_string()];
        let explicit = load_application_config(&ws, Some(&order)).unwrap();
        assert_eq!(
            explicit.get("service_manager").and_then(|s| s.get("factories")).and_then(|f| f.get("A")),
            Some(&PhpValue::from("Mine"))
        );
    }
}
