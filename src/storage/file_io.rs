//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{KeepsakeError, KeepsakeResult};

/// Permission bits for stored files
pub const FILE_MODE: u32 = 0o644;

/// Read the whole file into memory
pub fn read_bytes<P: AsRef<Path>>(path: P) -> KeepsakeResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| KeepsakeError::io(path, e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn create_temp(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options.open(path)
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// This ensures that the file is either completely written or not modified at all,
/// preventing corruption on crashes or power failures.
pub fn write_bytes_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> KeepsakeResult<()> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| KeepsakeError::io(parent, e))?;
    }

    // Create temp file in same directory (important for atomic rename)
    let temp_path = temp_path_for(path);

    let file = create_temp(&temp_path).map_err(|e| KeepsakeError::io(&temp_path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .map_err(|e| KeepsakeError::io(&temp_path, e))?;
    writer.flush().map_err(|e| KeepsakeError::io(&temp_path, e))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| KeepsakeError::io(&temp_path, e))?;

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|e| {
        // Try to clean up temp file if rename fails
        let _ = fs::remove_file(&temp_path);
        KeepsakeError::io(path, e)
    })?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

/// Serialize a value as JSON with a 4-space indent
pub fn to_pretty_json<T: Serialize>(value: &T) -> KeepsakeResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");

        write_bytes_atomic(&path, b"{\"a\": 1}").unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"{\"a\": 1}");
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        let temp_path = temp_dir.path().join("secrets.json.tmp");

        write_bytes_atomic(&path, b"data").unwrap();

        assert!(path.exists());
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");

        write_bytes_atomic(&path, b"first version, longer").unwrap();
        write_bytes_atomic(&path, b"second").unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"second");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("secrets.json");

        write_bytes_atomic(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        write_bytes_atomic(&path, b"data").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // umask may only remove bits
        assert_eq!(mode & !FILE_MODE, 0);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        match read_bytes(&path) {
            Err(KeepsakeError::Io { path: p, .. }) => assert!(p.ends_with("missing.json")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let value = serde_json::json!({"a": {"b": 1}});
        let text = String::from_utf8(to_pretty_json(&value).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}");
    }
}
