//! Single-file JSON persistence shared by the memory store and sigma cache
//!
//! Writes go to a sibling temp file which is then renamed over the target, so a
//! crash mid-write leaves either the old or the new complete content.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the result root that holds the cross-week stores
pub const STORE_DIR: &str = "_memory_global";

/// Memory store file name
pub const MEMORY_FILE: &str = "spc_memory.json";

/// Last-sigma cache file name
pub const SIGMA_FILE: &str = "last_sigma_simple.json";

/// Errors that can occur while persisting a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Locations of both persisted stores for one result root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub memory: PathBuf,
    pub sigma: PathBuf,
}

impl StorePaths {
    /// Derive store locations from the result root
    pub fn from_result_root(root: &Path) -> Self {
        let dir = root.join(STORE_DIR);
        Self {
            memory: dir.join(MEMORY_FILE),
            sigma: dir.join(SIGMA_FILE),
        }
    }
}

/// Load a JSON document, treating a missing or malformed file as empty
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed store file");
            T::default()
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &content).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to `<path>.tmp`, then rename over `path`
pub fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, content.as_bytes())?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_store_paths_from_root() {
        let paths = StorePaths::from_result_root(Path::new("/results"));
        assert_eq!(
            paths.memory,
            PathBuf::from("/results/_memory_global/spc_memory.json")
        );
        assert_eq!(
            paths.sigma,
            PathBuf::from("/results/_memory_global/last_sigma_simple.json")
        );
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let map: BTreeMap<String, f64> = load_json_or_default(&tmp.path().join("nope.json"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let map: BTreeMap<String, f64> = load_json_or_default(&path);
        assert!(map.is_empty());
    }

    #[test]
    fn test_save_creates_dirs_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/store.json");
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1.5);

        save_json(&path, &map).unwrap();

        assert!(path.exists());
        assert!(!tmp.path().join("nested/dir/store.json.tmp").exists());
        let loaded: BTreeMap<String, f64> = load_json_or_default(&path);
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_save_replaces_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(&path, "{\"old\": 1.0}").unwrap();

        let mut map = BTreeMap::new();
        map.insert("new".to_string(), 2.0);
        save_json(&path, &map).unwrap();

        let loaded: BTreeMap<String, f64> = load_json_or_default(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("new"), Some(&2.0));
    }
}
