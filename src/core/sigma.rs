//! Last plotted sigma level per series
//!
//! Only used to show the previous value next to the new one. JSON cannot hold
//! infinity, so an infinite sigma is stored as `null`. Files written by older
//! tooling may carry bare `Infinity`/`NaN` tokens; those entries read back as
//! infinite and their neighbours are kept.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::memory::SeriesKey;
use crate::core::store::{save_json, StoreError};

/// Non-JSON float tokens emitted by Python's `json.dump`, longest first
const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

#[derive(Debug)]
pub struct SigmaCache {
    path: PathBuf,
    entries: BTreeMap<String, Option<f64>>,
}

impl SigmaCache {
    /// Open the cache at `path`; a missing or corrupt file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => parse_entries(&content, &path),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded sigma, or `None` if this series was never charted
    pub fn get(&self, key: &SeriesKey) -> Option<f64> {
        self.entries
            .get(&key.to_string())
            .map(|v| v.unwrap_or(f64::INFINITY))
    }

    /// Overwrite the sigma for `key` and persist
    pub fn set(&mut self, key: &SeriesKey, sigma: f64) -> Result<(), StoreError> {
        let stored = sigma.is_finite().then_some(sigma);
        self.entries.insert(key.to_string(), stored);
        save_json(&self.path, &self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.unwrap_or(f64::INFINITY)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entries(content: &str, path: &Path) -> BTreeMap<String, Option<f64>> {
    if let Ok(entries) = serde_json::from_str(content) {
        return entries;
    }
    match serde_json::from_str(&null_non_finite(content)) {
        Ok(entries) => {
            tracing::debug!(path = %path.display(), "Read non-finite sigma tokens as infinite");
            entries
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Ignoring malformed sigma cache; it will be overwritten on the next chart"
            );
            BTreeMap::new()
        }
    }
}

/// Replace bare non-finite tokens outside string literals with `null`
fn null_non_finite(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while let Some(c) = content[i..].chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS
            .iter()
            .find(|t| content[i..].starts_with(**t))
        {
            out.push_str("null");
            i += token.len();
            continue;
        }
        out.push(c);
        i += c.len_utf8();
    }
    out
}
