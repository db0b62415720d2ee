//! 将 [`PhpValue`] 序列化为 PHP 源码
//!
//! 输出格式固定：短数组语法、4 空格缩进、每项一行并带尾随逗号、
//! 字符串统一使用单引号。相同的值总是得到逐字节相同的输出。

use crate::php::value::{is_list, PhpKey, PhpValue};
use std::fmt::Write;

const INDENT: &str = "    ";

/// 输出完整配置文件：`<?php`、空行、`return <literal>;`
pub fn write_config_file(value: &PhpValue) -> String {
    format!("<?php\n\nreturn {};\n", write_literal(value))
}

/// 输出单个字面量，嵌套数组从第 0 列开始缩进
pub fn write_literal(value: &PhpValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &PhpValue, depth: usize) {
    match value {
        PhpValue::Null => out.push_str("null"),
        PhpValue::Bool(true) => out.push_str("true"),
        PhpValue::Bool(false) => out.push_str("false"),
        PhpValue::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        PhpValue::Float(f) => out.push_str(&format_float(*f)),
        PhpValue::String(s) => out.push_str(&quote(s)),
        PhpValue::Array(array) if array.is_empty() => out.push_str("[]"),
        PhpValue::Array(array) => {
            let list = is_list(array);
            out.push_str("[\n");
            for (key, item) in array {
                out.push_str(&INDENT.repeat(depth + 1));
                if !list {
                    write_key(out, key);
                    out.push_str(" => ");
                }
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
    }
}

fn write_key(out: &mut String, key: &PhpKey) {
    match key {
        PhpKey::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        PhpKey::Str(s) => out.push_str(&quote(s)),
    }
}

/// 用单引号包裹字符串，转义 `\` 与 `'`
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    // Debug 输出是可往返的最短表示，且总带小数点或指数
    format!("{:?}", f)
}
