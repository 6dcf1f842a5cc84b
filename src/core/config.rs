//! Run configuration loaded from YAML
//!
//! ```yaml
//! data_root: ./Data
//! result_root: ./Results
//! threshold: 20
//! history_strategy: all          # or fill_to_threshold
//! y_label_overrides:
//!   Mesa Width: "Width (um)"
//! products:
//!   - name: ProductA
//!     data_subdir: A
//!     features:
//!       - display_name: PL Peak
//!         file_stem: pl_peak
//!         need_ual_lal: true
//! ```

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::store::StorePaths;
use crate::core::week::WeekRange;
use crate::yaml::{parse_yaml_file, YamlError};

/// Default minimum number of points before a chart is drawn
pub const DEFAULT_THRESHOLD: usize = 20;

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("Invalid threshold {0}: must be at least 1")]
    #[diagnostic(code(spc::config::threshold))]
    InvalidThreshold(usize),
}

/// How much history to pull when the current week is short of the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum HistoryStrategy {
    /// Take every stored point from earlier weeks
    #[default]
    All,
    /// Take only enough stored points to reach the threshold
    FillToThreshold,
}

impl From<String> for HistoryStrategy {
    fn from(s: String) -> Self {
        HistoryStrategy::from(s.as_str())
    }
}

impl From<&str> for HistoryStrategy {
    /// Unrecognised values fall back to `All`
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fill_to_threshold" => HistoryStrategy::FillToThreshold,
            _ => HistoryStrategy::All,
        }
    }
}

impl std::fmt::Display for HistoryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryStrategy::All => write!(f, "all"),
            HistoryStrategy::FillToThreshold => write!(f, "fill_to_threshold"),
        }
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_root: PathBuf,
    pub result_root: PathBuf,
    pub threshold: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub history_strategy: HistoryStrategy,
    #[serde(deserialize_with = "label_overrides")]
    pub y_label_overrides: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub products: Vec<ProductConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("Data"),
            result_root: PathBuf::from("Results"),
            threshold: DEFAULT_THRESHOLD,
            history_strategy: HistoryStrategy::All,
            y_label_overrides: BTreeMap::new(),
            products: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: RunConfig = parse_yaml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    pub fn has_products(&self) -> bool {
        !self.products.is_empty()
    }

    /// `<data_root>/<data_subdir>/<week>`
    pub fn data_dir(&self, product: &ProductConfig, week: &WeekRange) -> PathBuf {
        self.data_root
            .join(product.data_subdir())
            .join(week.to_string())
    }

    /// `<result_root>/<results_subdir>/<week>`
    pub fn results_dir(&self, product: &ProductConfig, week: &WeekRange) -> PathBuf {
        self.result_root
            .join(product.results_subdir())
            .join(week.to_string())
    }

    pub fn store_paths(&self) -> StorePaths {
        StorePaths::from_result_root(&self.result_root)
    }

    pub fn y_label(&self, display_name: &str) -> String {
        y_label(display_name, &self.y_label_overrides)
    }
}

/// One product and the features charted for it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub name: Option<String>,
    pub data_subdir: Option<String>,
    pub results_subdir: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<FeatureConfig>,
}

impl ProductConfig {
    pub fn name(&self) -> &str {
        non_empty(&self.name).unwrap_or("Product")
    }

    pub fn data_subdir(&self) -> &str {
        non_empty(&self.data_subdir).unwrap_or_else(|| self.name())
    }

    pub fn results_subdir(&self) -> &str {
        non_empty(&self.results_subdir).unwrap_or_else(|| self.name())
    }
}

/// One charted feature
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub display_name: Option<String>,
    pub file_stem: Option<String>,
    pub need_ual_lal: bool,
}

impl FeatureConfig {
    pub fn new(display_name: &str, file_stem: &str) -> Self {
        Self {
            display_name: Some(display_name.to_string()),
            file_stem: Some(file_stem.to_string()),
            need_ual_lal: false,
        }
    }

    /// Display name, falling back to the file stem
    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.display_name).or_else(|| non_empty(&self.file_stem))
    }

    /// File stem, falling back to the display name
    pub fn file_stem(&self) -> Option<&str> {
        non_empty(&self.file_stem).or_else(|| non_empty(&self.display_name))
    }
}

/// Y-axis label for a feature
///
/// An override whose key matches the display name case-insensitively wins;
/// otherwise a few well-known measurement names get their unit.
pub fn y_label(display_name: &str, overrides: &BTreeMap<String, String>) -> String {
    let wanted = display_name.trim().to_lowercase();
    if let Some(label) = overrides
        .iter()
        .find(|(k, _)| k.trim().to_lowercase() == wanted)
        .map(|(_, v)| v)
    {
        return label.clone();
    }

    let name = display_name.to_lowercase();
    if name.contains("pl") {
        "PL (nm)".to_string()
    } else if name.contains("mesa") && name.contains("width") {
        "Mesa Width (\u{03bc}m)".to_string()
    } else if name.contains("etch") || name.contains("depth") {
        "Mesa Depth (\u{03bc}m)".to_string()
    } else if name.contains("thickness") {
        "Final Thickness (\u{03bc}m)".to_string()
    } else {
        display_name.to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string-to-string mapping; anything else is ignored
fn label_overrides<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yml::Value::deserialize(deserializer)?;
    let Some(mapping) = value.as_mapping() else {
        return Ok(BTreeMap::new());
    };
    Ok(mapping
        .iter()
        .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
        .collect())
}
