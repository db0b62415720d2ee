//! PHP 源码处理
//!
//! - `value`: 配置数组的内存模型
//! - `parser`: `return [...];` 配置文件解析
//! - `writer`: 稳定的数组字面量输出
//! - `source`: 类文件结构提取（命名空间、导入、方法）

pub mod parser;
pub mod source;
pub mod value;
pub mod writer;

pub use parser::{parse_config_file, parse_literal};
pub use source::{Import, PhpClass, PhpClassFile, PhpMethod};
pub use value::{PhpArray, PhpKey, PhpValue};
pub use writer::{write_config_file, write_literal};
