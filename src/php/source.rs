//! PHP 类文件解析
//!
//! 基于 tree-sitter 语法树提取命名空间、`use` 导入（含分组导入）、类声明以及
//! 每个方法的头部与方法体原文，供工厂克隆使用。

use crate::errors::GeneratorError;
use tree_sitter::{Node, Parser, Tree};

/// 文件级 `use` 导入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// 完全限定名，不带前导分隔符
    pub name: String,
    /// 导入后可见的名字
    pub alias: String,
}

impl Import {
    pub fn new(name: &str) -> Self {
        let name = name.trim_start_matches('\\').to_string();
        let alias = simple_name(&name).to_string();
        Self { name, alias }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            name: name.trim_start_matches('\\').to_string(),
            alias: alias.to_string(),
        }
    }

    /// 需要写成 `use X as Y` 时为 true
    pub fn has_explicit_alias(&self) -> bool {
        simple_name(&self.name) != self.alias
    }
}

/// 源码中的方法原文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpMethod {
    pub name: String,
    /// docblock、属性、修饰符与签名，不含左花括号
    pub header: String,
    /// 花括号之间的文本；抽象方法为 `None`
    pub body: Option<String>,
}

/// 文件中声明的第一个类
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpClass {
    pub name: String,
    /// `abstract`, `final`, `readonly`
    pub modifiers: Vec<String>,
    /// 父类名（原文）
    pub parent: Option<String>,
    /// 接口名（原文）
    pub interfaces: Vec<String>,
    /// 类花括号之间的原文
    pub body: String,
    pub methods: Vec<PhpMethod>,
}

impl PhpClass {
    /// PHP 方法名不区分大小写
    pub fn method(&self, name: &str) -> Option<&PhpMethod> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpClassFile {
    pub namespace: Option<String>,
    pub imports: Vec<Import>,
    pub class: Option<PhpClass>,
}

impl PhpClassFile {
    /// 解析 PHP 源码，`origin` 仅用于错误信息。
    pub fn parse(source: &str, origin: &str) -> Result<Self, GeneratorError> {
        let tree = parse_tree(source, origin)?;
        let mut file = PhpClassFile {
            namespace: None,
            imports: Vec::new(),
            class: None,
        };
        SyntaxWalker { src: source }.collect(tree.root_node(), &mut file);
        Ok(file)
    }

    /// 所声明类的完全限定名
    pub fn class_name(&self) -> Option<String> {
        let class = self.class.as_ref()?;
        Some(match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, class.name),
            _ => class.name.clone(),
        })
    }

    /// 按 PHP 在本文件中的规则解析类引用。
    ///
    /// 结果不带前导分隔符。
    pub fn resolve_class_name(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }
        if let Some(relative) = name.strip_prefix("namespace\\") {
            return self.qualify(relative);
        }
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| i.alias.eq_ignore_ascii_case(first))
        {
            return match rest {
                Some(rest) => format!("{}\\{}", import.name, rest),
                None => import.name.clone(),
            };
        }
        self.qualify(name)
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
            _ => name.to_string(),
        }
    }
}

/// 带命名空间名字的最后一段
pub fn simple_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

fn parse_tree(source: &str, origin: &str) -> Result<Tree, GeneratorError> {
    let parse_error = |line: usize, column: usize, message: &str| GeneratorError::Parse {
        path: origin.to_string(),
        line,
        column,
        message: message.to_string(),
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
        .map_err(|e| parse_error(1, 1, &format!("failed to load PHP grammar: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| parse_error(1, 1, "parser produced no syntax tree"))?;

    // 语法树含错误时拒绝解析
    let root = tree.root_node();
    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let position = node.start_position();
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            "syntax error".to_string()
        };
        return Err(parse_error(position.row + 1, position.column + 1, &message));
    }

    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn all_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn is_name_node(node: &Node<'_>) -> bool {
    matches!(node.kind(), "name" | "qualified_name" | "namespace_name")
}

/// `use function ...` / `use const ...` 的关键字子节点
fn has_non_class_type(node: Node<'_>) -> bool {
    all_children(node).iter().any(|child| {
        !child.is_named()
            && (child.kind().eq_ignore_ascii_case("function")
                || child.kind().eq_ignore_ascii_case("const"))
    })
}

struct SyntaxWalker<'a> {
    src: &'a str,
}

impl<'a> SyntaxWalker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        &self.src[node.byte_range()]
    }

    /// 只遍历顶层语句与花括号命名空间体，表达式中的匿名类不会被当作声明
    fn collect(&self, scope: Node<'_>, file: &mut PhpClassFile) {
        for node in named_children(scope) {
            if file.class.is_some() {
                return;
            }
            match node.kind() {
                "namespace_definition" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        file.namespace =
                            Some(self.text(name).trim_start_matches('\\').to_string());
                    }
                    if let Some(body) = node.child_by_field_name("body") {
                        self.collect(body, file);
                    }
                }
                "namespace_use_declaration" => self.collect_imports(node, &mut file.imports),
                "class_declaration" => file.class = Some(self.class(node)),
                _ => {}
            }
        }
    }

    fn collect_imports(&self, declaration: Node<'_>, imports: &mut Vec<Import>) {
        if has_non_class_type(declaration) {
            return;
        }

        // 分组导入 `use A\B\{C, D as E};` 的公共前缀
        let prefix = named_children(declaration)
            .into_iter()
            .find(|child| child.kind() == "namespace_name")
            .map(|node| self.text(node).trim_start_matches('\\').to_string());

        let mut clauses = Vec::new();
        for child in named_children(declaration) {
            match child.kind() {
                "namespace_use_clause" | "namespace_use_group_clause" => clauses.push(child),
                "namespace_use_group" => clauses.extend(named_children(child).into_iter().filter(
                    |c| matches!(c.kind(), "namespace_use_clause" | "namespace_use_group_clause"),
                )),
                _ => {}
            }
        }

        for clause in clauses {
            if has_non_class_type(clause) {
                continue;
            }
            let Some(import) = self.import(clause, prefix.as_deref()) else {
                tracing::debug!("无法识别的导入子句: {}", self.text(clause));
                continue;
            };
            imports.push(import);
        }
    }

    fn import(&self, clause: Node<'_>, prefix: Option<&str>) -> Option<Import> {
        let children = named_children(clause);
        let name_node = children.iter().find(|c| is_name_node(c))?;
        let name = self.text(*name_node).trim_start_matches('\\');
        let name = match prefix {
            Some(prefix) => format!("{}\\{}", prefix, name),
            None => name.to_string(),
        };

        let alias = clause
            .child_by_field_name("alias")
            .or_else(|| {
                children
                    .iter()
                    .find(|c| c.kind() == "namespace_aliasing_clause")
                    .and_then(|c| named_children(*c).into_iter().find(|n| n.kind() == "name"))
            })
            .map(|node| self.text(node));

        Some(match alias {
            Some(alias) => Import::aliased(&name, alias),
            None => Import::new(&name),
        })
    }

    fn class(&self, node: Node<'_>) -> PhpClass {
        let mut modifiers = Vec::new();
        let mut parent = None;
        let mut interfaces = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                kind if kind.ends_with("_modifier") => {
                    modifiers.push(self.text(child).to_ascii_lowercase())
                }
                "base_clause" => {
                    parent = named_children(child)
                        .into_iter()
                        .find(is_name_node)
                        .map(|n| self.text(n).to_string());
                }
                "class_interface_clause" => interfaces.extend(
                    named_children(child)
                        .into_iter()
                        .filter(is_name_node)
                        .map(|n| self.text(n).to_string()),
                ),
                _ => {}
            }
        }

        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let (body, methods) = match node.child_by_field_name("body") {
            Some(list) => (
                self.between_braces(list).to_string(),
                named_children(list)
                    .into_iter()
                    .filter(|member| member.kind() == "method_declaration")
                    .map(|member| self.method(member))
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        PhpClass {
            name,
            modifiers,
            parent,
            interfaces,
            body,
            methods,
        }
    }

    fn method(&self, node: Node<'_>) -> PhpMethod {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let header_start = line_start(self.src, self.leading_comments_start(node));
        match node.child_by_field_name("body") {
            Some(body) => PhpMethod {
                name,
                header: self.src[header_start..body.start_byte()]
                    .trim_end()
                    .to_string(),
                body: Some(self.between_braces(body).to_string()),
            },
            None => PhpMethod {
                name,
                header: self.src[header_start..node.end_byte()]
                    .trim_end()
                    .trim_end_matches(';')
                    .trim_end()
                    .to_string(),
                body: None,
            },
        }
    }

    /// 紧贴在成员前面的注释（docblock）属于成员头部
    fn leading_comments_start(&self, node: Node<'_>) -> usize {
        let mut start = node.start_byte();
        let mut current = node;
        while let Some(previous) = current.prev_sibling() {
            if previous.kind() != "comment"
                || !self.src[previous.end_byte()..start].trim().is_empty()
            {
                break;
            }
            start = previous.start_byte();
            current = previous;
        }
        start
    }

    fn between_braces(&self, node: Node<'_>) -> &'a str {
        let text = self.text(node);
        let inner = text.strip_prefix('{').unwrap_or(text);
        inner.strip_suffix('}').unwrap_or(inner)
    }
}

/// `pos` 前只有缩进时回退到行首
fn line_start(src: &str, pos: usize) -> usize {
    let begin = src[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if src[begin..pos].trim().is_empty() {
        begin
    } else {
        pos
    }
}
