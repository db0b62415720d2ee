//! PHP 数组字面量的内存表示
//!
//! `module.config.php` 的全部内容就是一个 `return [...];` 语句，
//! 这里用 [`PhpValue`] 表示它，保留键的插入顺序。

use indexmap::IndexMap;
use std::fmt;

/// 数组键。与 PHP 一致，规范的十进制字符串会转换为整数键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

impl PhpKey {
    /// 按 PHP 的整数键规则由配置路径段构造键
    /// （`"3"` 转为 `3`，`"03"` 和 `"-0"` 保持字符串）。
    pub fn from_segment(segment: &str) -> Self {
        if is_canonical_int(segment) {
            if let Ok(value) = segment.parse::<i64>() {
                return PhpKey::Int(value);
            }
        }
        PhpKey::Str(segment.to_string())
    }
}

impl From<&str> for PhpKey {
    fn from(segment: &str) -> Self {
        PhpKey::from_segment(segment)
    }
}

impl From<String> for PhpKey {
    fn from(segment: String) -> Self {
        PhpKey::from_segment(&segment)
    }
}

impl From<i64> for PhpKey {
    fn from(index: i64) -> Self {
        PhpKey::Int(index)
    }
}

impl fmt::Display for PhpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpKey::Int(i) => write!(f, "{}", i),
            PhpKey::Str(s) => write!(f, "{}", s),
        }
    }
}

fn is_canonical_int(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits == "0" {
        return !segment.starts_with('-');
    }
    !digits.starts_with('0')
}

/// 有序关联数组
pub type PhpArray = IndexMap<PhpKey, PhpValue>;

/// 配置文件中的 PHP 字面量值
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(PhpArray),
}

impl PhpValue {
    /// 空数组
    pub fn empty_array() -> Self {
        PhpValue::Array(PhpArray::new())
    }

    /// 构造键为 `0..n` 的列表（`[a, b, c]`）
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PhpValue>,
    {
        PhpValue::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (PhpKey::Int(i as i64), v.into()))
                .collect(),
        )
    }

    /// 由 `(key, value)` 对构造关联数组
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PhpKey>,
        V: Into<PhpValue>,
    {
        PhpValue::Array(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PhpArray> {
        match self {
            PhpValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut PhpArray> {
        match self {
            PhpValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// 按路径段查找直接子节点
    pub fn get(&self, segment: &str) -> Option<&PhpValue> {
        self.as_array()?.get(&PhpKey::from_segment(segment))
    }

    /// PHP 类型名，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            PhpValue::Null => "null",
            PhpValue::Bool(_) => "bool",
            PhpValue::Int(_) => "int",
            PhpValue::Float(_) => "float",
            PhpValue::String(_) => "string",
            PhpValue::Array(_) => "array",
        }
    }

    /// 转换为 JSON 以便展示。列表转为 JSON 数组，其余转为对象。
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            PhpValue::Null => Value::Null,
            PhpValue::Bool(b) => Value::Bool(*b),
            PhpValue::Int(i) => Value::from(*i),
            PhpValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PhpValue::String(s) => Value::String(s.clone()),
            PhpValue::Array(a) if is_list(a) => {
                Value::Array(a.values().map(PhpValue::to_json).collect())
            }
            PhpValue::Array(a) => Value::Object(
                a.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// 键依次恰为 `0, 1, .., n-1` 时为 true
pub fn is_list(array: &PhpArray) -> bool {
    array
        .keys()
        .enumerate()
        .all(|(i, k)| *k == PhpKey::Int(i as i64))
}

impl From<&str> for PhpValue {
    fn from(s: &str) -> Self {
        PhpValue::String(s.to_string())
    }
}

impl From<String> for PhpValue {
    fn from(s: String) -> Self {
        PhpValue::String(s)
    }
}

impl From<i64> for PhpValue {
    fn from(i: i64) -> Self {
        PhpValue::Int(i)
    }
}

impl From<bool> for PhpValue {
    fn from(b: bool) -> Self {
        PhpValue::Bool(b)
    }
}

impl From<PhpArray> for PhpValue {
    fn from(a: PhpArray) -> Self {
        PhpValue::Array(a)
    }
}
