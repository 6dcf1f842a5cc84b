//! Cross-week accumulation
//!
//! Rules for a series evaluated in a given week:
//! - the current week alone reaching the threshold is charted on its own, history untouched;
//! - otherwise history (excluding the current week) is prepended, oldest first;
//! - if the combined series is still short, the current week's points are
//!   stored for later weeks and no chart is drawn.

use std::fmt;

use crate::core::config::{HistoryStrategy, DEFAULT_THRESHOLD};
use crate::core::memory::{HistoryTake, MemoryStore, SeriesKey};
use crate::core::store::StoreError;
use crate::core::week::WeekRange;

/// Progress report for a deferred series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationProgress {
    pub key: SeriesKey,
    pub current: usize,
    pub history: usize,
    pub threshold: usize,
}

impl AccumulationProgress {
    pub fn total(&self) -> usize {
        self.current + self.history
    }
}

impl fmt::Display for AccumulationProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Accumulating '{} | {}': current({}) + history({}) = {}/{} points. No chart yet.",
            self.key.product,
            self.key.feature,
            self.current,
            self.history,
            self.total(),
            self.threshold
        )
    }
}

/// Series ready to chart, with where its points came from
#[derive(Debug, Clone, PartialEq)]
pub struct ReadySeries {
    /// History prefix followed by the current week
    pub values: Vec<f64>,
    pub current_count: usize,
    /// History used, empty when the current week sufficed alone
    pub history: HistoryTake,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Ready(ReadySeries),
    Deferred(AccumulationProgress),
}

/// Threshold and history policy applied to every series in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    threshold: usize,
    strategy: HistoryStrategy,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, HistoryStrategy::All)
    }
}

impl Accumulator {
    pub fn new(threshold: usize, strategy: HistoryStrategy) -> Self {
        Self {
            threshold,
            strategy,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// How many historical points to request for `current` points this week
    ///
    /// `None` means every stored point.
    pub fn history_need(&self, current: usize) -> Option<usize> {
        match self.strategy {
            HistoryStrategy::FillToThreshold => Some(self.threshold.saturating_sub(current)),
            HistoryStrategy::All => None,
        }
    }

    /// Decide whether `key` can be charted this week
    ///
    /// On deferral the current week's points are appended to `memory`; that
    /// is the only write this performs.
    pub fn evaluate(
        &self,
        memory: &mut MemoryStore,
        key: &SeriesKey,
        week: &WeekRange,
        current: &[(String, f64)],
    ) -> Result<Decision, StoreError> {
        let current_values: Vec<f64> = current.iter().map(|(_, v)| *v).collect();
        let cur_n = current_values.len();

        if cur_n >= self.threshold {
            tracing::debug!(series = %key, cur_n, "Current week meets threshold on its own");
            return Ok(Decision::Ready(ReadySeries {
                values: current_values,
                current_count: cur_n,
                history: HistoryTake::default(),
            }));
        }

        let need = self.history_need(cur_n);
        let history = memory.take_until(key, need, Some(week));
        let total = history.len() + cur_n;
        tracing::debug!(series = %key, cur_n, history = history.len(), ?need, "Evaluated history");

        if total < self.threshold {
            memory.append(key, week, current)?;
            return Ok(Decision::Deferred(AccumulationProgress {
                key: key.clone(),
                current: cur_n,
                history: history.len(),
                threshold: self.threshold,
            }));
        }

        let mut values = history.values.clone();
        values.extend(current_values);
        Ok(Decision::Ready(ReadySeries {
            values,
            current_count: cur_n,
            history,
        }))
    }
}
