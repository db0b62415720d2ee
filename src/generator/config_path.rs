use crate::php::PhpValue;

/// 把 `controllers/factories/Foo` 拆分为路径段
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/').map(str::to_string).collect()
}

/// 沿 `path` 逐层访问嵌套数组。
///
/// 任一段不存在或遇到非数组节点时返回 `None`。
pub fn resolve<'a, S: AsRef<str>>(config: &'a PhpValue, path: &[S]) -> Option<&'a PhpValue> {
    path.iter()
        .try_fold(config, |node, segment| node.get(segment.as_ref()))
}
