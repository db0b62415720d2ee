//! 工厂克隆与子类生成
//!
//! 克隆工厂方法时，方法体内唯一的 `new X(` 会被替换为目标模块中新生成的 X 子类。

use crate::errors::{conflict, not_found, unsupported, GeneratorError};
use crate::generator::class_locator::ClassLocator;
use crate::generator::class_name::local_class_name;
use crate::generator::emitter::{write_class, ClassDescriptor};
use crate::generator::workspace::Workspace;
use crate::php::{PhpClassFile, PhpMethod, PhpValue};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt;

const MAX_PARENT_DEPTH: usize = 16;

lazy_static! {
    static ref CONSTRUCTION: Regex =
        Regex::new(r"\bnew\s+(\\?[A-Za-z_][A-Za-z0-9_]*(?:\\[A-Za-z_][A-Za-z0-9_]*)*)\s*\(")
            .unwrap();
}

/// `new` 之后不代表可继承类的名字
const RESERVED_TARGETS: [&str; 4] = ["self", "static", "parent", "class"];

/// `[Class, method]` 二元组，也可写作 `'Class::method'`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryRef {
    pub class: String,
    pub method: String,
}

impl FactoryRef {
    pub fn new(class: &str, method: &str) -> Self {
        Self {
            class: class.trim_start_matches('\\').to_string(),
            method: method.to_string(),
        }
    }

    /// 接受两个字符串组成的列表或 `Class::method` 字符串。
    pub fn parse(value: &PhpValue) -> Result<Self, GeneratorError> {
        let parsed = match value {
            PhpValue::String(s) => s
                .split_once("::")
                .filter(|(class, method)| !class.is_empty() && !method.is_empty())
                .map(|(class, method)| Self::new(class, method)),
            PhpValue::Array(array) if array.len() == 2 => {
                match (value.get("0").and_then(PhpValue::as_str), value.get("1").and_then(PhpValue::as_str)) {
                    (Some(class), Some(method)) if !class.is_empty() && !method.is_empty() => {
                        Some(Self::new(class, method))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        parsed.ok_or_else(|| {
            unsupported(format!(
                "unsupported factory configuration {}; expected [class, method] or 'class::method'",
                crate::php::write_literal(value).replace('\n', " ")
            ))
        })
    }

    /// 写回配置时使用的 `Class::method` 形式
    pub fn to_value(&self) -> PhpValue {
        PhpValue::String(self.to_string())
    }
}

impl fmt::Display for FactoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}

/// 在 `module` 中生成 `class` 的空子类并返回其类名。
pub fn create_subclass(ws: &Workspace, class: &str, module: &str) -> Result<String, GeneratorError> {
    let class = class.trim_start_matches('\\');
    let new_class = local_class_name(class, module)?;
    let desc = ClassDescriptor::new(&new_class)?.with_parent(class);
    write_class(ws, &desc, module, false, false)?;
    tracing::info!(parent = %class, class = %new_class, "子类已生成");
    Ok(new_class)
}

/// 把 `body` 中唯一的构造表达式改写为 `module` 中新生成的子类。
///
/// `source` 是方法体所在的文件，非限定名按它解析。
pub fn rewrite_construction(
    ws: &Workspace,
    source: &PhpClassFile,
    body: &str,
    module: &str,
) -> Result<String, GeneratorError> {
    let mut targets: Vec<String> = Vec::new();
    for captures in CONSTRUCTION.captures_iter(body) {
        let written = &captures[1];
        if RESERVED_TARGETS.iter().any(|r| r.eq_ignore_ascii_case(written)) {
            continue;
        }
        let resolved = source.resolve_class_name(written);
        if !targets.iter().any(|t| t.eq_ignore_ascii_case(&resolved)) {
            targets.push(resolved);
        }
    }

    if targets.len() != 1 {
        return Err(GeneratorError::Ambiguous(format!(
            "Found {} class constructions in factory method; expected exactly 1{}",
            targets.len(),
            if targets.is_empty() {
                String::new()
            } else {
                format!(" ({})", targets.join(", "))
            }
        )));
    }

    let target = targets.remove(0);
    let new_class = create_subclass(ws, &target, module)?;
    let replacement = format!("new \\{}(", new_class);
    let rewritten = CONSTRUCTION.replace_all(body, |captures: &Captures| {
        if source
            .resolve_class_name(&captures[1])
            .eq_ignore_ascii_case(&target)
        {
            replacement.clone()
        } else {
            captures[0].to_string()
        }
    });
    Ok(rewritten.into_owned())
}

/// 在类上查找 `method`，找不到时沿 `extends` 链向上查找。
///
/// 返回方法以及声明它的文件。
pub fn find_method(
    classes: &ClassLocator,
    file: &PhpClassFile,
    method: &str,
) -> Result<(PhpMethod, PhpClassFile), GeneratorError> {
    let mut current = file.clone();
    for _ in 0..MAX_PARENT_DEPTH {
        let class = current
            .class
            .as_ref()
            .ok_or_else(|| not_found("no class declaration in source file"))?;
        if let Some(found) = class.method(method) {
            return Ok((found.clone(), current));
        }
        let Some(parent) = class.parent.as_deref() else {
            break;
        };
        let parent = current.resolve_class_name(parent);
        tracing::debug!(method = %method, parent = %parent, "在父类中查找方法");
        current = match classes.load(&parent) {
            Ok(next) => next,
            Err(GeneratorError::NotFound(_)) => break,
            Err(e) => return Err(e),
        };
    }
    Err(not_found(format!(
        "method {} does not exist on {}",
        method,
        file.class_name().unwrap_or_default()
    )))
}

/// 把工厂方法复制到 `module`，并让其构造表达式指向新生成的子类。
///
/// 返回新的工厂引用。
pub fn clone_factory(
    ws: &Workspace,
    classes: &ClassLocator,
    factory: &FactoryRef,
    module: &str,
) -> Result<FactoryRef, GeneratorError> {
    let source = classes.load(&factory.class)?;
    let (method, owner) = find_method(classes, &source, &factory.method)?;
    let body = method.body.as_deref().ok_or_else(|| {
        unsupported(format!("{} is abstract and cannot be cloned", factory))
    })?;

    let new_class = local_class_name(&factory.class, module)?;
    let skip_backup = if classes.exists(&new_class) {
        false
    } else {
        write_class(ws, &ClassDescriptor::new(&new_class)?, module, false, false)?;
        true
    };

    let existing = classes.load(&new_class)?;
    let mut desc = ClassDescriptor::from_existing(&existing)?;
    if desc.has_method(&method.name) {
        return Err(conflict(format!(
            "{}::{} already exists",
            new_class, method.name
        )));
    }

    let rewritten = rewrite_construction(ws, &owner, body, module)?;
    desc.merge_imports(&owner.imports);
    desc.add_method(PhpMethod {
        name: method.name.clone(),
        header: method.header.clone(),
        body: Some(rewritten),
    });
    write_class(ws, &desc, module, true, skip_backup)?;

    let cloned = FactoryRef::new(&new_class, &factory.method);
    tracing::info!(source = %factory, target = %cloned, "工厂已克隆");
    Ok(cloned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingReporter;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace, Arc<RecordingReporter>) {
        let temp_dir = TempDir::new().unwrap();
        let reporter = Arc::new(RecordingReporter::new());
        let ws = Workspace::new(temp_dir.path()).with_reporter(reporter.clone());
        (temp_dir, ws, reporter)
    }

    fn source(body: &str) -> PhpClassFile {
        let text = format!(
            "<?php\nnamespace VuFind\\Auth;\n\nuse VuFind\\Db\\Table\\User as UserTable;\n\nclass F\n{{\n    public function f()\n    {{{}}}\n}}\n",
            body
        );
        PhpClassFile::parse(&text, "F.php").unwrap()
    }

    #[test]
    fn test_factory_ref_parse() {
        assert_eq!(
            FactoryRef::parse(&PhpValue::list(["\\A\\F", "build"])).unwrap(),
            FactoryRef::new("A\\F", "build")
        );
        assert_eq!(
            FactoryRef::parse(&PhpValue::from("A\\F::build")).unwrap().to_string(),
            "A\\F::build"
        );
        for bad in [
            PhpValue::from("A\\F"),
            PhpValue::from("::build"),
            PhpValue::list(["A\\F"]),
            PhpValue::list(["A\\F", "build", "x"]),
            PhpValue::Int(3),
            PhpValue::map([("class", "A"), ("method", "b")]),
        ] {
            let err = FactoryRef::parse(&bad).unwrap_err();
            assert!(matches!(err, GeneratorError::Unsupported(_)));
        }
    }

    #[test]
    fn test_create_subclass_writes_parented_class() {
        let (temp_dir, ws, _) = setup();
        let new_class = create_subclass(&ws, "\\VuFind\\Auth\\Database", "MyModule").unwrap();
        assert_eq!(new_class, "MyModule\\Auth\\Database");

        let written = fs::read_to_string(
            temp_dir
                .path()
                .join("module/MyModule/src/MyModule/Auth/Database.php"),
        )
        .unwrap();
        assert!(written.contains("class Database extends \\VuFind\\Auth\\Database"));

        let err = create_subclass(&ws, "VuFind\\Auth\\Database", "MyModule").unwrap_err();
        assert!(matches!(err, GeneratorError::Conflict(_)));
    }

    #[test]
    fn test_rewrite_resolves_namespace_and_replaces_all_occurrences() {
        let (_temp_dir, ws, _) = setup();
        let body = "\n        $a = new Database($x);\n        return $a ?: new  Database ();\n    ";
        let rewritten = rewrite_construction(&ws, &source(body), body, "MyModule").unwrap();
        assert_eq!(
            rewritten,
            "\n        $a = new \\MyModule\\Auth\\Database($x);\n        return $a ?: new \\MyModule\\Auth\\Database();\n    "
        );
    }

    #[test]
    fn test_rewrite_resolves_imports_and_ignores_self() {
        let (_temp_dir, ws, _) = setup();
        let body = "\n        $t = new UserTable();\n        $s = new static();\n        return $t;\n    ";
        let rewritten = rewrite_construction(&ws, &source(body), body, "MyModule").unwrap();
        assert!(rewritten.contains("new \\MyModule\\Db\\Table\\User()"));
        assert!(rewritten.contains("new static()"));
    }

    #[test]
    fn test_rewrite_requires_exactly_one_target() {
        let (_temp_dir, ws, _) = setup();
        for body in [
            "return new X() ?? new Y();",
            "return $container->get('x');",
        ] {
            let err = rewrite_construction(&ws, &source(body), body, "MyModule").unwrap_err();
            assert!(matches!(err, GeneratorError::Ambiguous(_)));
        }
        let body = "return new X() ?? new \\VuFind\\Auth\\X();";
        assert!(rewrite_construction(&ws, &source(body), body, "MyModule").is_ok());
    }
}
