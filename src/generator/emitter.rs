//! 类源码生成
//!
//! 把类描述渲染为 PHP 源码并写入目标模块的 `src/` 目录。

use crate::errors::{conflict, io_error, GeneratorError};
use crate::generator::backup::backup_file;
use crate::generator::class_name::split_class_name;
use crate::generator::workspace::Workspace;
use crate::php::{Import, PhpClassFile, PhpMethod};
use std::fs;
use std::io;
use std::path::PathBuf;

const INDENT: &str = "    ";

/// 渲染一个类文件所需的全部信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub namespace: String,
    pub name: String,
    pub modifiers: Vec<String>,
    /// 按原样输出在 `extends` 之后
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub imports: Vec<Import>,
    /// 从磁盘读回的类体原文
    pub body: Option<String>,
    /// `body` 中已声明的方法
    declared_methods: Vec<String>,
    /// 追加在 `body` 之后的方法
    pub methods: Vec<PhpMethod>,
}

impl ClassDescriptor {
    /// 以完全限定名创建空类。
    pub fn new(class: &str) -> Result<Self, GeneratorError> {
        let (namespace, name) = split_class_name(class)?;
        Ok(Self {
            namespace,
            name,
            modifiers: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            imports: Vec::new(),
            body: None,
            declared_methods: Vec::new(),
            methods: Vec::new(),
        })
    }

    /// 设置完全限定的父类。
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(format!("\\{}", parent.trim_start_matches('\\')));
        self
    }

    /// 描述磁盘上已有的类，以便追加内容后重新输出。
    pub fn from_existing(file: &PhpClassFile) -> Result<Self, GeneratorError> {
        let class = file.class.as_ref().ok_or_else(|| {
            GeneratorError::NotFound("no class declaration in source file".to_string())
        })?;
        Ok(Self {
            namespace: file.namespace.clone().unwrap_or_default(),
            name: class.name.clone(),
            modifiers: class.modifiers.clone(),
            parent: class.parent.clone(),
            interfaces: class.interfaces.clone(),
            imports: file.imports.clone(),
            body: Some(class.body.clone()),
            declared_methods: class.methods.iter().map(|m| m.name.clone()).collect(),
            methods: Vec::new(),
        })
    }

    pub fn class_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}\\{}", self.namespace, self.name)
        }
    }

    /// 与 PHP 一致，不区分大小写。
    pub fn has_method(&self, name: &str) -> bool {
        self.declared_methods
            .iter()
            .chain(self.methods.iter().map(|m| &m.name))
            .any(|m| m.eq_ignore_ascii_case(name))
    }

    pub fn add_method(&mut self, method: PhpMethod) {
        self.methods.push(method);
    }

    /// 补充新文件需要的导入，保留已有导入。
    ///
    /// 别名已绑定到其他类的导入会被跳过。
    pub fn merge_imports(&mut self, imports: &[Import]) {
        for import in imports {
            if let Some(existing) = self
                .imports
                .iter()
                .find(|i| i.alias.eq_ignore_ascii_case(&import.alias))
            {
                if !existing.name.eq_ignore_ascii_case(&import.name) {
                    tracing::warn!(
                        alias = %import.alias,
                        kept = %existing.name,
                        skipped = %import.name,
                        "导入别名冲突，已跳过"
                    );
                }
                continue;
            }
            if import.alias.eq_ignore_ascii_case(&self.name) {
                tracing::warn!(
                    alias = %import.alias,
                    skipped = %import.name,
                    "导入别名与类名冲突，已跳过"
                );
                continue;
            }
            self.imports.push(import.clone());
        }
    }

    /// 渲染完整文件
    pub fn render(&self) -> String {
        let mut out = String::from("<?php\n\n");
        if !self.namespace.is_empty() {
            out.push_str(&format!("namespace {};\n\n", self.namespace));
        }
        if !self.imports.is_empty() {
            for import in &self.imports {
                if import.has_explicit_alias() {
                    out.push_str(&format!("use {} as {};\n", import.name, import.alias));
                } else {
                    out.push_str(&format!("use {};\n", import.name));
                }
            }
            out.push('\n');
        }

        let mut declaration = String::new();
        for modifier in &self.modifiers {
            declaration.push_str(modifier);
            declaration.push(' ');
        }
        declaration.push_str("class ");
        declaration.push_str(&self.name);
        if let Some(parent) = &self.parent {
            declaration.push_str(" extends ");
            declaration.push_str(parent);
        }
        if !self.interfaces.is_empty() {
            declaration.push_str(" implements ");
            declaration.push_str(&self.interfaces.join(", "));
        }
        out.push_str(&declaration);
        out.push_str("\n{\n");

        let mut members = Vec::new();
        if let Some(body) = &self.body {
            let body = body.trim_start_matches(['\r', '\n']).trim_end();
            if !body.is_empty() {
                members.push(body.to_string());
            }
        }
        members.extend(self.methods.iter().map(render_method));
        if !members.is_empty() {
            out.push_str(&members.join("\n\n"));
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn render_method(method: &PhpMethod) -> String {
    let from = leading_indent(&method.header);
    let mut text = reindent(method.header.trim_end(), from);
    match &method.body {
        Some(body) => {
            text.push('\n');
            text.push_str(INDENT);
            text.push_str("{\n");
            let body = body.trim_start_matches(['\r', '\n']).trim_end();
            if !body.is_empty() {
                text.push_str(&reindent(body, from));
                text.push('\n');
            }
            text.push_str(INDENT);
            text.push('}');
        }
        None => text.push(';'),
    }
    text
}

fn leading_indent(text: &str) -> usize {
    text.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// 把每行从 `from` 列缩进调整为一级缩进。
fn reindent(text: &str, from: usize) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                return String::new();
            }
            let strip = leading_indent(line).min(from);
            format!("{}{}", INDENT, &line[strip..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 把 `desc` 写入 `module` 并返回文件路径。
///
/// 文件已存在时，除非 `allow_overwrite`，否则视为冲突；
/// 覆盖前先备份旧文件，除非 `skip_backup`。
pub fn write_class(
    ws: &Workspace,
    desc: &ClassDescriptor,
    module: &str,
    allow_overwrite: bool,
    skip_backup: bool,
) -> Result<PathBuf, GeneratorError> {
    let dir = ws.source_dir(module, &desc.namespace);
    ensure_dir(ws, &dir)?;

    let path = ws.class_path(module, &desc.namespace, &desc.name);
    if path.exists() {
        if !allow_overwrite {
            return Err(conflict(format!(
                "{} already exists at {}",
                desc.class_name(),
                path.display()
            )));
        }
        if !skip_backup {
            backup_file(ws, &path)?;
        }
    }

    fs::write(&path, desc.render()).map_err(|e| io_error("writing", &path, e))?;
    tracing::debug!(class = %desc.class_name(), path = %path.display(), "类文件已写入");
    ws.report(&format!("Saved file: {}", path.display()));
    Ok(path)
}

/// 创建 `dir` 及缺失的父目录，已存在的路径组件必须是目录。
fn ensure_dir(ws: &Workspace, dir: &std::path::Path) -> Result<(), GeneratorError> {
    let mut chain: Vec<_> = dir
        .ancestors()
        .take_while(|p| p.starts_with(ws.root()) && *p != ws.root())
        .collect();
    chain.reverse();
    for component in chain {
        if component.exists() && !component.is_dir() {
            return Err(io_error(
                "creating directory",
                component,
                io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
            ));
        }
    }
    fs::create_dir_all(dir).map_err(|e| io_error("creating directory", dir, e))
}
