//! PHP 配置文件解析器
//!
//! 只接受"字面量返回"形式的文件：
//! `<?php`、注释、`namespace`/`use`/`declare` 语句，然后是 `return <literal>;`。
//! 不执行任何 PHP 代码。

use crate::errors::GeneratorError;
use crate::php::value::{PhpArray, PhpKey, PhpValue};
use std::collections::HashMap;

/// 解析完整的配置文件（`<?php ... return <literal>;`）
pub fn parse_config_file(source: &str, origin: &str) -> Result<PhpValue, GeneratorError> {
    let mut parser = LiteralParser::new(source, origin);
    parser.parse_file()
}

/// 解析单个字面量，如 `['a' => 1]`
pub fn parse_literal(source: &str) -> Result<PhpValue, GeneratorError> {
    let mut parser = LiteralParser::new(source, "<literal>");
    parser.skip_trivia();
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    origin: &'a str,
    namespace: Option<String>,
    imports: HashMap<String, String>,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str, origin: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            origin,
            namespace: None,
            imports: HashMap::new(),
        }
    }

    fn parse_file(&mut self) -> Result<PhpValue, GeneratorError> {
        self.skip_trivia();
        if self.src[self.pos..].starts_with("<?php") {
            self.pos += 5;
        }

        loop {
            self.skip_trivia();
            let checkpoint = self.pos;
            let word = self.read_name();
            match word.to_ascii_lowercase().as_str() {
                "return" => break,
                "namespace" => {
                    self.skip_trivia();
                    let name = self.read_name();
                    self.expect(b';')?;
                    self.namespace = Some(name.trim_start_matches('\\').to_string());
                }
                "use" => self.parse_use()?,
                "declare" => {
                    self.skip_until(b';')?;
                }
                "" => return Err(self.error("expected a `return` statement")),
                _ => {
                    self.pos = checkpoint;
                    return Err(self.error(&format!("unsupported statement `{}`", word)));
                }
            }
        }

        self.skip_trivia();
        let value = self.parse_value()?;
        self.expect(b';')?;
        self.skip_trivia();
        if self.src[self.pos..].starts_with("?>") {
            self.pos += 2;
            self.skip_trivia();
        }
        if !self.at_end() {
            return Err(self.error("unexpected input after the return statement"));
        }
        Ok(value)
    }

    fn parse_use(&mut self) -> Result<(), GeneratorError> {
        loop {
            self.skip_trivia();
            let name = self.read_name();
            if name.is_empty() {
                return Err(self.error("expected a name after `use`"));
            }
            if name.eq_ignore_ascii_case("function") || name.eq_ignore_ascii_case("const") {
                return self.skip_until(b';');
            }
            let name = name.trim_start_matches('\\').to_string();
            self.skip_trivia();
            let checkpoint = self.pos;
            let alias = if self.read_name().eq_ignore_ascii_case("as") {
                self.skip_trivia();
                self.read_name()
            } else {
                self.pos = checkpoint;
                name.rsplit('\\').next().unwrap_or(&name).to_string()
            };
            self.imports.insert(alias.to_ascii_lowercase(), name);
            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b';') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.error("expected `,` or `;` in use statement")),
            }
        }
    }

    fn parse_value(&mut self) -> Result<PhpValue, GeneratorError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'[') => {
                self.pos += 1;
                self.parse_array(b']')
            }
            Some(b'\'') => self.parse_single_quoted().map(PhpValue::String),
            Some(b'"') => self.parse_double_quoted().map(PhpValue::String),
            Some(c) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' => {
                self.parse_number()
            }
            Some(c) if is_name_start(c) || c == b'\\' => self.parse_name_expression(),
            Some(c) => Err(self.error(&format!("unexpected character `{}`", c as char))),
        }
    }

    fn parse_name_expression(&mut self) -> Result<PhpValue, GeneratorError> {
        let start = self.pos;
        let name = self.read_name();
        self.skip_trivia();

        if name.eq_ignore_ascii_case("array") && self.peek() == Some(b'(') {
            self.pos += 1;
            return self.parse_array(b')');
        }

        if self.src[self.pos..].starts_with("::") {
            self.pos += 2;
            self.skip_trivia();
            let member = self.read_name();
            if member.eq_ignore_ascii_case("class") {
                return Ok(PhpValue::String(self.resolve_class(&name)));
            }
            self.pos = start;
            return Err(self.error(&format!("unsupported constant `{}::{}`", name, member)));
        }

        match name.to_ascii_lowercase().as_str() {
            "true" => Ok(PhpValue::Bool(true)),
            "false" => Ok(PhpValue::Bool(false)),
            "null" => Ok(PhpValue::Null),
            "inf" => Ok(PhpValue::Float(f64::INFINITY)),
            "nan" => Ok(PhpValue::Float(f64::NAN)),
            _ => {
                self.pos = start;
                Err(self.error(&format!("unsupported expression `{}`", name)))
            }
        }
    }

    /// 按 PHP 编译期规则解析 `Name::class`
    fn resolve_class(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(imported) = self.imports.get(&first.to_ascii_lowercase()) {
            return match rest {
                Some(rest) => format!("{}\\{}", imported, rest),
                None => imported.clone(),
            };
        }
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
            _ => name.to_string(),
        }
    }

    fn parse_array(&mut self, close: u8) -> Result<PhpValue, GeneratorError> {
        let mut array = PhpArray::new();
        let mut next_index: i64 = 0;

        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.error("unterminated array")),
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(PhpValue::Array(array));
                }
                _ => {}
            }

            let first = self.parse_value()?;
            self.skip_trivia();
            let (key, value) = if self.src[self.pos..].starts_with("=>") {
                self.pos += 2;
                let key = self.to_key(first)?;
                (key, self.parse_value()?)
            } else {
                (PhpKey::Int(next_index), first)
            };

            if let PhpKey::Int(i) = key {
                if i >= next_index {
                    next_index = i.saturating_add(1);
                }
            }
            array.insert(key, value);

            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => {
                    return Err(self.error(&format!(
                        "expected `,` or `{}` in array",
                        close as char
                    )))
                }
            }
        }
    }

    fn to_key(&self, value: PhpValue) -> Result<PhpKey, GeneratorError> {
        match value {
            PhpValue::Int(i) => Ok(PhpKey::Int(i)),
            PhpValue::String(s) => Ok(PhpKey::from_segment(&s)),
            PhpValue::Bool(b) => Ok(PhpKey::Int(i64::from(b))),
            PhpValue::Null => Ok(PhpKey::Str(String::new())),
            PhpValue::Float(f) => Ok(PhpKey::Int(f.trunc() as i64)),
            PhpValue::Array(_) => Err(self.error("arrays cannot be used as keys")),
        }
    }

    fn parse_single_quoted(&mut self) -> Result<String, GeneratorError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                b'\'' => return self.utf8(out, start),
                b'\\' => match self.peek() {
                    Some(next @ (b'\\' | b'\'')) => {
                        out.push(next);
                        self.pos += 1;
                    }
                    _ => out.push(b'\\'),
                },
                _ => out.push(c),
            }
        }
        self.pos = start;
        Err(self.error("unterminated string"))
    }

    fn parse_double_quoted(&mut self) -> Result<String, GeneratorError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                b'"' => return self.utf8(out, start),
                b'$' if self.peek().is_some_and(|n| is_name_start(n) || n == b'{') => {
                    self.pos -= 1;
                    return Err(self.error("string interpolation is not supported"));
                }
                b'\\' => self.parse_escape(&mut out)?,
                _ => out.push(c),
            }
        }
        self.pos = start;
        Err(self.error("unterminated string"))
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<(), GeneratorError> {
        let Some(c) = self.peek() else {
            out.push(b'\\');
            return Ok(());
        };
        self.pos += 1;
        match c {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' | b'$' | b'"' => out.push(c),
            b'0'..=b'7' => {
                let start = self.pos - 1;
                while self.pos - start < 3 && matches!(self.peek(), Some(b'0'..=b'7')) {
                    self.pos += 1;
                }
                let value = u32::from_str_radix(&self.src[start..self.pos], 8).unwrap_or(0);
                out.push((value & 0xff) as u8);
            }
            b'x' if self.peek().is_some_and(|n| n.is_ascii_hexdigit()) => {
                let start = self.pos;
                while self.pos - start < 2 && self.peek().is_some_and(|n| n.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                let value = u8::from_str_radix(&self.src[start..self.pos], 16).unwrap_or(0);
                out.push(value);
            }
            b'u' if self.peek() == Some(b'{') => {
                let start = self.pos + 1;
                let end = self.src[start..]
                    .find('}')
                    .map(|i| start + i)
                    .ok_or_else(|| self.error("unterminated unicode escape"))?;
                let ch = u32::from_str_radix(&self.src[start..end], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("invalid unicode escape"))?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                self.pos = end + 1;
            }
            _ => {
                out.push(b'\\');
                out.push(c);
            }
        }
        Ok(())
    }

    fn parse_number(&mut self) -> Result<PhpValue, GeneratorError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'_')
        {
            // 指数部分允许带符号
            if matches!(self.peek(), Some(b'e' | b'E'))
                && !self.src[start..self.pos].contains(['x', 'X', 'b', 'B'])
                && matches!(self.bytes.get(self.pos + 1), Some(b'-' | b'+'))
            {
                self.pos += 2;
                continue;
            }
            self.pos += 1;
        }

        let raw = self.src[start..self.pos].replace('_', "");
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.trim_start_matches('+')),
        };
        let sign = if negative { "-" } else { "" };
        let lower = digits.to_ascii_lowercase();

        let radix = if lower.starts_with("0x") {
            Some((16, &digits[2..]))
        } else if lower.starts_with("0b") {
            Some((2, &digits[2..]))
        } else if lower.starts_with("0o") {
            Some((8, &digits[2..]))
        } else if digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some((8, &digits[1..]))
        } else {
            None
        };

        if let Some((radix, body)) = radix {
            return i64::from_str_radix(&format!("{}{}", sign, body), radix)
                .map(PhpValue::Int)
                .map_err(|_| self.error_at(start, &format!("invalid number `{}`", raw)));
        }

        if digits.contains(['.', 'e', 'E']) {
            return format!("{}{}", sign, digits)
                .parse::<f64>()
                .map(PhpValue::Float)
                .map_err(|_| self.error_at(start, &format!("invalid number `{}`", raw)));
        }

        let literal = format!("{}{}", sign, digits);
        match literal.parse::<i64>() {
            Ok(i) => Ok(PhpValue::Int(i)),
            // PHP 溢出时转为浮点数
            Err(_) => literal
                .parse::<f64>()
                .map(PhpValue::Float)
                .map_err(|_| self.error_at(start, &format!("invalid number `{}`", raw))),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_start(c) || c.is_ascii_digit() || c == b'\\' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#[")) {
                match rest.find('\n') {
                    Some(i) => self.pos += i + 1,
                    None => self.pos = self.src.len(),
                }
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(i) => self.pos += i + 4,
                    None => self.pos = self.src.len(),
                }
            } else {
                break;
            }
        }
    }

    fn skip_until(&mut self, target: u8) -> Result<(), GeneratorError> {
        match self.src[self.pos..].find(target as char) {
            Some(i) => {
                self.pos += i + 1;
                Ok(())
            }
            None => Err(self.error(&format!("expected `{}`", target as char))),
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), GeneratorError> {
        self.skip_trivia();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", c as char)))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn utf8(&self, bytes: Vec<u8>, start: usize) -> Result<String, GeneratorError> {
        String::from_utf8(bytes).map_err(|_| self.error_at(start, "string is not valid UTF-8"))
    }

    fn error(&self, message: &str) -> GeneratorError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: &str) -> GeneratorError {
        let (line, column) = line_column(self.src, pos);
        GeneratorError::Parse {
            path: self.origin.to_string(),
            line,
            column,
            message: message.to_string(),
        }
    }
}

fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

/// 字节偏移对应的行号与列号（从 1 开始）
pub(crate) fn line_column(src: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(src.len());
    let before = &src.as_bytes()[..pos];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, pos - line_start + 1)
}
