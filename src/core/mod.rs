//! Core module - accumulation, capability metrics and persistence

pub mod accumulate;
pub mod chart;
pub mod config;
pub mod limits;
pub mod memory;
pub mod metrics;
pub mod panel;
pub mod runner;
pub mod sigma;
pub mod source;
pub mod store;
pub mod week;

pub use accumulate::{AccumulationProgress, Accumulator, Decision, ReadySeries};
pub use config::{ConfigError, FeatureConfig, HistoryStrategy, ProductConfig, RunConfig};
pub use limits::{ActionLimits, Limits};
pub use memory::{HistoryTake, MemoryStore, Observation, SeriesKey};
pub use metrics::{out_of_control, Capability, RiskLevel};
pub use panel::{LineKind, PanelLine, SummaryPanel};
pub use runner::{ChartReport, FeatureOutcome, RunError, RunSettings, Runner};
pub use sigma::SigmaCache;
pub use source::{FeatureSource, SourceError};
pub use store::{StoreError, StorePaths};
pub use week::{WeekParseError, WeekRange};
