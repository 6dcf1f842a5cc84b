//! Shared helper functions for CLI commands

use std::path::{Path, PathBuf};

use crate::core::config::RunConfig;
use crate::core::store::StorePaths;

/// Options locating the persisted stores
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Result root holding `_memory_global/` (defaults to the config's result_root)
    #[arg(long)]
    pub result_root: Option<PathBuf>,

    /// YAML configuration used when --result-root is not given
    #[arg(long, short = 'c', env = "SPC_CONFIG", default_value = "spc_config.yaml")]
    pub config: PathBuf,
}

impl StoreArgs {
    /// Resolve store paths: explicit root, then config file, then the default root
    pub fn store_paths(&self) -> miette::Result<StorePaths> {
        let root = match &self.result_root {
            Some(root) => root.clone(),
            None => resolve_result_root(&self.config)?,
        };
        Ok(StorePaths::from_result_root(&root))
    }
}

fn resolve_result_root(config: &Path) -> miette::Result<PathBuf> {
    if config.is_file() {
        Ok(RunConfig::load(config)?.result_root)
    } else {
        Ok(RunConfig::default().result_root)
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Split a `"<product>|<feature>"` store key
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once('|').unwrap_or((key, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("μμμμμμ", 5), "μμ...");
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("ProductA|PL Peak"), ("ProductA", "PL Peak"));
        assert_eq!(split_key("orphan"), ("orphan", ""));
    }

    #[test]
    fn test_store_paths_prefers_explicit_root() {
        let args = StoreArgs {
            result_root: Some(PathBuf::from("/r")),
            config: PathBuf::from("/missing.yaml"),
        };
        assert_eq!(
            args.store_paths().unwrap().memory,
            PathBuf::from("/r/_memory_global/spc_memory.json")
        );
    }

    #[test]
    fn test_store_paths_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("spc.yaml");
        std::fs::write(&config, "result_root: /from/config\n").unwrap();

        let args = StoreArgs {
            result_root: None,
            config,
        };
        assert_eq!(
            args.store_paths().unwrap().sigma,
            PathBuf::from("/from/config/_memory_global/last_sigma_simple.json")
        );
    }

    #[test]
    fn test_store_paths_default_root() {
        let args = StoreArgs {
            result_root: None,
            config: PathBuf::from("/definitely/missing.yaml"),
        };
        assert_eq!(
            args.store_paths().unwrap().memory,
            PathBuf::from("Results/_memory_global/spc_memory.json")
        );
    }
}
