use crate::errors::{io_error, not_found, GeneratorError};
use crate::generator::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};

/// 改写前把 `path` 复制为 `<path>.<unix 时间戳>.<ext>`。
///
/// 不会覆盖已有备份：当前秒对应的文件名已被占用时，
/// 时间戳递增直到找到空闲的文件名。
pub fn backup_file(ws: &Workspace, path: &Path) -> Result<PathBuf, GeneratorError> {
    if !path.is_file() {
        return Err(not_found(format!(
            "cannot back up '{}': file does not exist",
            path.display()
        )));
    }

    let mut timestamp = chrono::Utc::now().timestamp();
    let mut target = backup_path(path, timestamp, ws.backup_extension());
    while target.exists() {
        timestamp += 1;
        target = backup_path(path, timestamp, ws.backup_extension());
    }

    fs::copy(path, &target).map_err(|e| io_error("creating backup", &target, e))?;
    tracing::debug!(source = %path.display(), backup = %target.display(), "备份已创建");
    ws.report(&format!("Created backup: {}", target.display()));
    Ok(target)
}

fn backup_path(path: &Path, timestamp: i64, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.{}", timestamp, extension));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingReporter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn timestamp_of(backup: &Path) -> i64 {
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        let parts: Vec<_> = name.rsplitn(3, '.').collect();
        parts[1].parse().unwrap()
    }

    #[test]
    fn test_backup_copies_bytes_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = Arc::new(RecordingReporter::new());
        let ws = Workspace::new(temp_dir.path()).with_reporter(reporter.clone());

        let file = temp_dir.path().join("module.config.php");
        fs::write(&file, "<?php\n\nreturn [];\n").unwrap();

        let backup = backup_file(&ws, &file).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&file).unwrap());
        assert!(backup
            .to_string_lossy()
            .starts_with(&format!("{}.", file.display())));
        assert!(backup.to_string_lossy().ends_with(".bak"));
        assert_eq!(
            reporter.lines(),
            vec![format!("Created backup: {}", backup.display())]
        );
    }

    #[test]
    fn test_repeated_backups_get_increasing_names() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Workspace::new(temp_dir.path())
            .with_backup_extension("orig")
            .with_reporter(Arc::new(RecordingReporter::new()));

        let file = temp_dir.path().join("Foo.php");
        fs::write(&file, "first").unwrap();
        let first = backup_file(&ws, &file).unwrap();
        fs::write(&file, "second").unwrap();
        let second = backup_file(&ws, &file).unwrap();

        assert_ne!(first, second);
        assert!(timestamp_of(&second) > timestamp_of(&first));
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
        assert!(second.to_string_lossy().ends_with(".orig"));
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Workspace::new(temp_dir.path());
        let err = backup_file(&ws, &temp_dir.path().join("missing.php")).unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound(_)));
    }
}
