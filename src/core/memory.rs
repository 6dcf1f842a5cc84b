//! Cross-week memory of I-MR observations
//!
//! Small weekly batches are parked here until enough points exist to chart.
//! Buckets are keyed by `"<product>|<feature>"` and persisted as one JSON file:
//!
//! ```json
//! { "ProductA|PL Peak": [ {"type": "IMR", "week": "20240101-20240107", "id": "1", "value": 1.25} ] }
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::store::{load_json_or_default, save_json, StoreError};
use crate::core::week::WeekRange;

/// Record type tag for single-point I-MR observations
pub const IMR_KIND: &str = "IMR";

/// Identifies one product/feature series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub product: String,
    pub feature: String,
}

impl SeriesKey {
    pub fn new(product: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            feature: feature.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.product, self.feature)
    }
}

/// One measured point recorded for a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub week: String,
    pub id: String,
    pub value: f64,
}

fn default_kind() -> String {
    IMR_KIND.to_string()
}

impl Observation {
    pub fn imr(week: &WeekRange, id: impl Into<String>, value: f64) -> Self {
        Self {
            kind: default_kind(),
            week: week.to_string(),
            id: id.into(),
            value,
        }
    }

    fn is_imr(&self) -> bool {
        self.kind == IMR_KIND
    }
}

/// Historical values pulled from a bucket, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTake {
    /// Week of each taken value, parallel to `values`
    pub weeks: Vec<String>,
    pub values: Vec<f64>,
}

impl HistoryTake {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// JSON-backed memory of observations, one ordered bucket per series
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    buckets: BTreeMap<String, Vec<Observation>>,
}

impl MemoryStore {
    /// Open the store at `path`; a missing or corrupt file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let buckets = load_json_or_default(&path);
        Self { path, buckets }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a week's `(id, value)` pairs, skipping any `(week, id)` already present
    ///
    /// The bucket is re-sorted by week then numeric id and the store persisted
    /// even when every pair was a duplicate. An empty `points` is a no-op and
    /// never creates a bucket. Returns the number of new points.
    pub fn append(
        &mut self,
        key: &SeriesKey,
        week: &WeekRange,
        points: &[(String, f64)],
    ) -> Result<usize, StoreError> {
        if points.is_empty() {
            return Ok(0);
        }
        let week_str = week.to_string();
        let bucket = self.buckets.entry(key.to_string()).or_default();

        let mut added = 0;
        for (id, value) in points {
            let exists = bucket
                .iter()
                .any(|r| r.is_imr() && r.week == week_str && r.id == *id);
            if !exists {
                bucket.push(Observation::imr(week, id.clone(), *value));
                added += 1;
            }
        }
        bucket.sort_by(compare_records);

        tracing::debug!(series = %key, week = %week_str, added, total = bucket.len(), "Appended to memory");
        self.save()?;
        Ok(added)
    }

    /// Collect stored values in order without modifying the bucket
    ///
    /// Records from `exclude_week` are skipped. With `need = None` every
    /// remaining value is taken; otherwise collection stops at `need` values.
    pub fn take_until(
        &self,
        key: &SeriesKey,
        need: Option<usize>,
        exclude_week: Option<&WeekRange>,
    ) -> HistoryTake {
        let exclude = exclude_week.map(|w| w.to_string());
        let mut taken = HistoryTake::default();

        let Some(bucket) = self.buckets.get(&key.to_string()) else {
            return taken;
        };

        for record in bucket.iter().filter(|r| r.is_imr()) {
            if need.is_some_and(|n| taken.len() >= n) {
                break;
            }
            if exclude.as_deref() == Some(record.week.as_str()) {
                continue;
            }
            taken.weeks.push(record.week.clone());
            taken.values.push(record.value);
        }
        taken
    }

    /// Remove the whole bucket for `key`; clearing an absent key does nothing
    pub fn clear(&mut self, key: &SeriesKey) -> Result<bool, StoreError> {
        if self.buckets.remove(&key.to_string()).is_none() {
            return Ok(false);
        }
        tracing::info!(series = %key, "Cleared memory bucket");
        self.save()?;
        Ok(true)
    }

    /// Stored records for a series, in bucket order
    pub fn bucket(&self, key: &SeriesKey) -> &[Observation] {
        self.buckets
            .get(&key.to_string())
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    /// All bucket keys with their records
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Observation])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn save(&self) -> Result<(), StoreError> {
        save_json(&self.path, &self.buckets)
    }
}

/// Order by type, week, then id compared numerically ("2" before "10")
fn compare_records(a: &Observation, b: &Observation) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then_with(|| a.week.cmp(&b.week))
        .then_with(|| compare_ids(&a.id, &b.id))
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
