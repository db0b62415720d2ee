//! 面向用户的输出
//!
//! 每次成功写盘都会输出一行提示（"Saved file: ..." 等）。
//! 生成流程只依赖 [`Reporter`]，命令行使用 [`ConsoleReporter`]，测试使用 [`RecordingReporter`]。

use std::sync::Mutex;

pub trait Reporter: Send + Sync {
    fn report(&self, line: &str);
}

/// 逐行输出到标准输出
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, line: &str) {
        println!("{}", line);
    }
}

/// 在内存中保存输出行
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// 以 `prefix` 开头的行
    pub fn lines_starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.starts_with(prefix))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
