use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting store files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Serialize `value` as YAML and write it atomically.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    atomic_write(path, data.as_bytes())
}

/// Read a YAML collection file, treating a missing file as the default value.
pub fn read_yaml_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(&data)?)
}

/// Remove a directory tree. Returns `false` if it did not exist.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        atomic_write(&path, b"hello: world").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello: world");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/test.yaml");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_collection_reads_as_default() {
        let dir = TempDir::new().unwrap();
        let items: Vec<String> = read_yaml_or_default(&dir.path().join("none.yaml")).unwrap();
        assert!(items.is_empty());

        std::fs::write(dir.path().join("empty.yaml"), "\n").unwrap();
        let items: Vec<String> = read_yaml_or_default(&dir.path().join("empty.yaml")).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn yaml_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.yaml");
        write_yaml(&path, &vec!["a".to_string(), "b".to_string()]).unwrap();
        let items: Vec<String> = read_yaml_or_default(&path).unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn remove_missing_dir_is_noop() {
        let dir = TempDir::new().unwrap();
        assert!(!remove_dir_if_exists(&dir.path().join("ghost")).unwrap());
        std::fs::create_dir_all(dir.path().join("real/x")).unwrap();
        assert!(remove_dir_if_exists(&dir.path().join("real")).unwrap());
        assert!(!dir.path().join("real").exists());
    }
}
