//! Weekly measurement source files
//!
//! Each feature's week of data is a CSV export of the measurement sheet: a
//! header row, then one row per observation with the id in column 0 and the
//! value in column 1. The first data row also carries the limits at fixed
//! columns agreed with the upstream producer.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::limits::{ActionLimits, Limits};

/// Zero-based column positions of the limits in the first data row
pub mod columns {
    pub const ID: usize = 0;
    pub const VALUE: usize = 1;
    pub const UCL: usize = 3;
    pub const LCL: usize = 7;
    pub const UAL: usize = 25;
    pub const LAL: usize = 27;
    pub const LSL: usize = 31;
    pub const USL: usize = 33;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source file not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed source {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// One week's observations and limits for a feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSource {
    /// `(id, value)` pairs in file order
    pub points: Vec<(String, f64)>,
    /// Limits as read, not yet normalized
    pub limits: Limits,
}

impl FeatureSource {
    /// Read a source file; UAL/LAL are only looked up when requested
    pub fn read(path: &Path, need_action_limits: bool) -> Result<Self, SourceError> {
        if !path.is_file() {
            return Err(SourceError::Missing(path.to_path_buf()));
        }

        let csv_err = |source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let malformed = |message: String| SourceError::Malformed {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let mut points = Vec::new();
        let mut first_row: Option<csv::StringRecord> = None;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if first_row.is_none() {
                first_row = Some(record.clone());
            }

            let raw_value = record.get(columns::VALUE).unwrap_or("");
            if raw_value.is_empty() {
                continue;
            }
            let value = parse_number(raw_value).ok_or_else(|| {
                malformed(format!("row {}: value '{}' is not a number", row + 2, raw_value))
            })?;
            let id = record.get(columns::ID).unwrap_or("").to_string();
            points.push((normalize_id(&id), value));
        }

        let first = first_row.ok_or_else(|| malformed("no data rows".to_string()))?;
        let required = |col: usize, name: &str| {
            first
                .get(col)
                .and_then(parse_number)
                .ok_or_else(|| malformed(format!("missing {} in column {}", name, col + 1)))
        };

        let usl = required(columns::USL, "USL")?;
        let lsl = required(columns::LSL, "LSL")?;
        let ucl = required(columns::UCL, "UCL")?;
        let lcl = required(columns::LCL, "LCL")?;

        let action = if need_action_limits {
            let ual = first.get(columns::UAL).and_then(parse_number);
            let lal = first.get(columns::LAL).and_then(parse_number);
            match (ual, lal) {
                (Some(ual), Some(lal)) => Some(ActionLimits { ual, lal }),
                _ => {
                    tracing::debug!(path = %path.display(), "UAL/LAL requested but not present");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            points,
            limits: Limits {
                usl,
                lsl,
                ucl,
                lcl,
                action,
            },
        })
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Spreadsheet exports often write integer ids as `7.0`
fn normalize_id(id: &str) -> String {
    match id.strip_suffix(".0") {
        Some(whole) if !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()) => {
            whole.to_string()
        }
        _ => id.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build CSV text with limits placed in the first data row
    pub(crate) fn sheet(values: &[f64], limits: &Limits) -> String {
        let width = columns::USL + 1;
        let header: Vec<String> = (0..width).map(|i| format!("c{}", i)).collect();
        let mut out = header.join(",");
        out.push('\n');
        for (i, v) in values.iter().enumerate() {
            let mut row = vec![String::new(); width];
            row[columns::ID] = (i + 1).to_string();
            row[columns::VALUE] = v.to_string();
            if i == 0 {
                row[columns::USL] = limits.usl.to_string();
                row[columns::LSL] = limits.lsl.to_string();
                row[columns::UCL] = limits.ucl.to_string();
                row[columns::LCL] = limits.lcl.to_string();
                if let Some(action) = limits.action {
                    row[columns::UAL] = action.ual.to_string();
                    row[columns::LAL] = action.lal.to_string();
                }
            }
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    fn limits() -> Limits {
        Limits {
            usl: 10.0,
            lsl: 0.0,
            ucl: 8.0,
            lcl: 2.0,
            action: Some(ActionLimits { ual: 9.0, lal: 1.0 }),
        }
    }

    #[test]
    fn test_read_points_and_limits() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        fs::write(&path, sheet(&[5.0, 5.5, 6.0], &limits())).unwrap();

        let source = FeatureSource::read(&path, false).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.points[0], ("1".to_string(), 5.0));
        assert_eq!(source.values(), vec![5.0, 5.5, 6.0]);
        assert_eq!(source.limits.usl, 10.0);
        assert_eq!(source.limits.lcl, 2.0);
        assert_eq!(source.limits.action, None);
    }

    #[test]
    fn test_read_action_limits_when_requested() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        fs::write(&path, sheet(&[5.0], &limits())).unwrap();

        let source = FeatureSource::read(&path, true).unwrap();
        assert_eq!(source.limits.action, Some(ActionLimits { ual: 9.0, lal: 1.0 }));
    }

    #[test]
    fn test_absent_action_limits_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        let no_action = Limits {
            action: None,
            ..limits()
        };
        fs::write(&path, sheet(&[5.0], &no_action)).unwrap();

        let source = FeatureSource::read(&path, true).unwrap();
        assert_eq!(source.limits.action, None);
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = FeatureSource::read(&tmp.path().join("nope.csv"), false);
        assert!(matches!(result, Err(SourceError::Missing(_))));
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        let text = sheet(&[5.0], &limits()).replace("\n1,5,", "\n1,abc,");
        fs::write(&path, text).unwrap();

        let result = FeatureSource::read(&path, false);
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_infinite_value_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        fs::write(&path, sheet(&[10.0, f64::INFINITY, 10.0], &limits())).unwrap();

        match FeatureSource::read(&path, false) {
            Err(SourceError::Malformed { message, .. }) => assert!(message.contains("row 3")),
            other => panic!("expected malformed source, got {:?}", other),
        }
    }

    #[test]
    fn test_infinite_limit_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        let text = sheet(&[5.0], &limits()).replacen(",10\n", ",-inf\n", 1);
        fs::write(&path, text).unwrap();

        let result = FeatureSource::read(&path, false);
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_missing_limit_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        fs::write(&path, "id,value\n1,5.0\n2,6.0\n").unwrap();

        let result = FeatureSource::read(&path, false);
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feat.csv");
        let mut text = sheet(&[5.0, 6.0], &limits());
        text.push_str("3,\n");
        fs::write(&path, text).unwrap();

        let source = FeatureSource::read(&path, false).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("7.0"), "7");
        assert_eq!(normalize_id("7.5"), "7.5");
        assert_eq!(normalize_id("W-1"), "W-1");
        assert_eq!(normalize_id(".0"), ".0");
    }
}
