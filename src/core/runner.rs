//! Per-feature run: source → accumulation → metrics → chart → stores
//!
//! All writes are terminal side effects of one outcome: a deferral appends the
//! current week to memory, a chart writes the image, the sigma cache and then
//! clears the series' memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::accumulate::{AccumulationProgress, Accumulator, Decision, ReadySeries};
use crate::core::chart::{render_svg, write_chart, ChartSpec};
use crate::core::config::{y_label, FeatureConfig, HistoryStrategy, RunConfig};
use crate::core::limits::Limits;
use crate::core::memory::{MemoryStore, SeriesKey};
use crate::core::metrics::{out_of_control, Capability};
use crate::core::panel::{PanelInput, SummaryPanel};
use crate::core::sigma::SigmaCache;
use crate::core::source::{FeatureSource, SourceError};
use crate::core::store::{StoreError, StorePaths};
use crate::core::week::WeekRange;

/// Source file extension for weekly feature data
pub const SOURCE_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to write chart for '{feature}': {source}")]
    Render {
        feature: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Store failures threaten durability and stop the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Store(_))
    }
}

/// Settings shared by every feature of a run
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub threshold: usize,
    pub history_strategy: HistoryStrategy,
    pub y_label_overrides: BTreeMap<String, String>,
}

impl From<&RunConfig> for RunSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            threshold: config.threshold,
            history_strategy: config.history_strategy,
            y_label_overrides: config.y_label_overrides.clone(),
        }
    }
}

/// A successfully charted feature
#[derive(Debug, Clone)]
pub struct ChartReport {
    pub key: SeriesKey,
    pub series: ReadySeries,
    pub limits: Limits,
    pub capability: Capability,
    pub ooc: Vec<usize>,
    pub last_sigma: Option<f64>,
    pub panel: SummaryPanel,
    pub chart_path: PathBuf,
}

#[derive(Debug, Clone)]
pub enum FeatureOutcome {
    /// No source file for this week
    NoData { source: PathBuf },
    Deferred(AccumulationProgress),
    Charted(Box<ChartReport>),
}

/// Processes features one at a time against both persisted stores
pub struct Runner {
    memory: MemoryStore,
    sigma: SigmaCache,
    accumulator: Accumulator,
    y_label_overrides: BTreeMap<String, String>,
}

impl Runner {
    pub fn new(paths: &StorePaths, settings: RunSettings) -> Self {
        Self {
            memory: MemoryStore::open(&paths.memory),
            sigma: SigmaCache::open(&paths.sigma),
            accumulator: Accumulator::new(settings.threshold, settings.history_strategy),
            y_label_overrides: settings.y_label_overrides,
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn sigma(&self) -> &SigmaCache {
        &self.sigma
    }

    /// Run one feature of `product` for `week`
    ///
    /// The source is `<data_dir>/<file_stem>.csv`; the chart lands in `results_dir`.
    pub fn run_feature(
        &mut self,
        product: &str,
        feature: &FeatureConfig,
        week: &WeekRange,
        data_dir: &Path,
        results_dir: &Path,
    ) -> Result<FeatureOutcome, RunError> {
        let (Some(display_name), Some(stem)) = (feature.display_name(), feature.file_stem())
        else {
            return Ok(FeatureOutcome::NoData {
                source: data_dir.to_path_buf(),
            });
        };
        let source_path = data_dir.join(format!("{}.{}", stem, SOURCE_EXTENSION));

        let source = match FeatureSource::read(&source_path, feature.need_ual_lal) {
            Ok(source) => source,
            Err(SourceError::Missing(path)) => {
                tracing::debug!(path = %path.display(), "No source for feature");
                return Ok(FeatureOutcome::NoData { source: path });
            }
            Err(e) => return Err(e.into()),
        };
        let limits = source.limits.normalized();
        let key = SeriesKey::new(product, display_name);

        // Read before this run can overwrite it
        let last_sigma = self.sigma.get(&key);

        let series = match self
            .accumulator
            .evaluate(&mut self.memory, &key, week, &source.points)?
        {
            Decision::Deferred(progress) => return Ok(FeatureOutcome::Deferred(progress)),
            Decision::Ready(series) => series,
        };

        let capability = Capability::compute(&series.values, &limits);
        let ooc = out_of_control(&series.values, &limits);
        let panel = SummaryPanel::build(&PanelInput {
            feature: display_name,
            week,
            capability: &capability,
            limits: &limits,
            series: &series,
            last_sigma,
            ooc: &ooc,
        });

        let label = y_label(display_name, &self.y_label_overrides);
        let svg = render_svg(&ChartSpec {
            feature: display_name,
            y_label: &label,
            values: &series.values,
            mean: capability.mean,
            limits: &limits,
            ooc: &ooc,
            panel: &panel,
        });
        let chart_path =
            write_chart(results_dir, display_name, &svg).map_err(|source| RunError::Render {
                feature: display_name.to_string(),
                source,
            })?;
        tracing::info!(series = %key, path = %chart_path.display(), points = series.values.len(), "Chart written");

        self.sigma.set(&key, capability.sigma_level)?;
        self.memory.clear(&key)?;

        Ok(FeatureOutcome::Charted(Box::new(ChartReport {
            key,
            series,
            limits,
            capability,
            ooc,
            last_sigma,
            panel,
            chart_path,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::ActionLimits;
    use crate::core::source::tests::sheet;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tmp: TempDir::new().unwrap(),
            }
        }

        fn paths(&self) -> StorePaths {
            StorePaths::from_result_root(&self.tmp.path().join("Results"))
        }

        fn data_dir(&self, week: &str) -> PathBuf {
            self.tmp.path().join("Data").join(week)
        }

        fn results_dir(&self, week: &str) -> PathBuf {
            self.tmp.path().join("Results/P").join(week)
        }

        fn write_source(&self, week: &str, stem: &str, values: &[f64], limits: &Limits) {
            let dir = self.data_dir(week);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("{}.csv", stem)), sheet(values, limits)).unwrap();
        }

        fn runner(&self, threshold: usize) -> Runner {
            Runner::new(
                &self.paths(),
                RunSettings {
                    threshold,
                    ..Default::default()
                },
            )
        }

        fn run(&self, runner: &mut Runner, week: &str, feature: &FeatureConfig) -> FeatureOutcome {
            runner
                .run_feature(
                    "P",
                    feature,
                    &week.parse().unwrap(),
                    &self.data_dir(week),
                    &self.results_dir(week),
                )
                .unwrap()
        }
    }

    fn limits() -> Limits {
        Limits {
            usl: 20.0,
            lsl: 0.0,
            ucl: 15.0,
            lcl: 5.0,
            action: None,
        }
    }

    fn values(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + (i % 3) as f64).collect()
    }

    const W1: &str = "20240101-20240107";
    const W2: &str = "20240108-20240114";
    const W3: &str = "20240115-20240121";

    #[test]
    fn test_missing_source_touches_nothing() {
        let fx = Fixture::new();
        let mut runner = fx.runner(20);
        let feature = FeatureConfig::new("Thickness", "thickness");

        let outcome = fx.run(&mut runner, W1, &feature);
        assert!(matches!(outcome, FeatureOutcome::NoData { .. }));
        assert!(!fx.paths().memory.exists());
        assert!(!fx.paths().sigma.exists());
    }

    #[test]
    fn test_accumulates_then_charts_and_clears() {
        let fx = Fixture::new();
        let feature = FeatureConfig::new("Thickness", "thickness");
        let key = SeriesKey::new("P", "Thickness");

        fx.write_source(W1, "thickness", &values(10), &limits());
        fx.write_source(W2, "thickness", &values(5), &limits());
        fx.write_source(W3, "thickness", &values(6), &limits());

        let mut runner = fx.runner(20);
        assert!(matches!(fx.run(&mut runner, W1, &feature), FeatureOutcome::Deferred(_)));
        match fx.run(&mut runner, W2, &feature) {
            FeatureOutcome::Deferred(progress) => {
                assert_eq!(progress.current, 5);
                assert_eq!(progress.history, 10);
            }
            other => panic!("expected deferral, got {:?}", other),
        }
        assert_eq!(runner.memory().bucket(&key).len(), 15);

        let FeatureOutcome::Charted(report) = fx.run(&mut runner, W3, &feature) else {
            panic!("expected chart");
        };
        assert_eq!(report.series.values.len(), 21);
        assert_eq!(report.last_sigma, None);
        assert!(report.chart_path.exists());
        assert!(report.chart_path.ends_with("Thickness.svg"));

        // Memory cleared, sigma recorded, both durable
        assert!(runner.memory().bucket(&key).is_empty());
        let reopened = fx.runner(20);
        assert!(reopened.memory().bucket(&key).is_empty());
        assert_eq!(reopened.sigma().get(&key), Some(report.capability.sigma_level));
    }

    #[test]
    fn test_last_sigma_reflects_previous_chart() {
        let fx = Fixture::new();
        let feature = FeatureConfig::new("Thickness", "thickness");
        fx.write_source(W1, "thickness", &values(20), &limits());
        fx.write_source(W2, "thickness", &values(21), &limits());

        let mut runner = fx.runner(20);
        let FeatureOutcome::Charted(first) = fx.run(&mut runner, W1, &feature) else {
            panic!("expected chart");
        };
        let FeatureOutcome::Charted(second) = fx.run(&mut runner, W2, &feature) else {
            panic!("expected chart");
        };
        assert_eq!(second.last_sigma, Some(first.capability.sigma_level));
    }

    #[test]
    fn test_inverted_limits_are_normalized() {
        let fx = Fixture::new();
        let feature = FeatureConfig::new("Thickness", "thickness");
        let inverted = Limits {
            usl: 0.0,
            lsl: 20.0,
            ucl: 5.0,
            lcl: 15.0,
            action: None,
        };
        fx.write_source(W1, "thickness", &values(20), &inverted);

        let mut runner = fx.runner(20);
        let FeatureOutcome::Charted(report) = fx.run(&mut runner, W1, &feature) else {
            panic!("expected chart");
        };
        assert_eq!(report.limits.usl, 20.0);
        assert_eq!(report.limits.ucl, 15.0);
        assert!(report.capability.cp.is_finite());
    }

    #[test]
    fn test_action_limits_flow_into_panel() {
        let fx = Fixture::new();
        let mut feature = FeatureConfig::new("Thickness", "thickness");
        feature.need_ual_lal = true;
        let with_action = Limits {
            action: Some(ActionLimits { ual: 14.0, lal: 6.0 }),
            ..limits()
        };
        fx.write_source(W1, "thickness", &values(20), &with_action);

        let mut runner = fx.runner(20);
        let FeatureOutcome::Charted(report) = fx.run(&mut runner, W1, &feature) else {
            panic!("expected chart");
        };
        assert!(report.panel.texts().any(|t| t == "UAL: 14.000 | LAL: 6.000"));
    }

    #[test]
    fn test_malformed_source_is_not_fatal() {
        let fx = Fixture::new();
        let feature = FeatureConfig::new("Thickness", "thickness");
        let dir = fx.data_dir(W1);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("thickness.csv"), "id,value\n1,abc\n").unwrap();

        let mut runner = fx.runner(20);
        let err = runner
            .run_feature("P", &feature, &W1.parse().unwrap(), &dir, &fx.results_dir(W1))
            .unwrap_err();
        assert!(matches!(err, RunError::Source(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_ooc_points_reported_in_combined_order() {
        let fx = Fixture::new();
        let feature = FeatureConfig::new("Thickness", "thickness");
        let mut vals = values(20);
        vals[2] = 16.0;
        vals[7] = 4.0;
        vals[9] = 15.0;
        fx.write_source(W1, "thickness", &vals, &limits());

        let mut runner = fx.runner(20);
        let FeatureOutcome::Charted(report) = fx.run(&mut runner, W1, &feature) else {
            panic!("expected chart");
        };
        assert_eq!(report.ooc, vec![3, 8]);
    }
}
