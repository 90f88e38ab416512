//! Running statistics used by the aggregators.
//!
//! `RunningStats` is a Welford accumulator: mean and variance are updated
//! in O(1) per sample without keeping the history, and stay stable over
//! long partitions where a naive sum of squares would cancel badly.
//! `RollingWindow` layers a [`WindowPolicy`] on top so the anomaly detector
//! can run either over the full sensor history or over the last N samples.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use serde::Serialize;

// ---

/// Welford accumulator over a stream of `f64` samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn push(&mut self, x: f64) {
        // ---
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean, `None` before the first sample.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample standard deviation (n - 1 denominator).
    ///
    /// Undefined for fewer than two samples and reported as `None` rather
    /// than NaN, so callers have to decide what an undefined spread means.
    pub fn sample_stddev(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        // ---
        let mut stats = RunningStats::new();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

/// Which part of a sensor's history the rolling statistics cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Every reading from the start of the series up to the current one.
    #[default]
    Cumulative,
    /// The last N readings, the current one included.
    Sliding(NonZeroUsize),
}

impl WindowPolicy {
    /// `0` means cumulative, anything else a sliding window of that size.
    pub fn from_size(size: usize) -> Self {
        match NonZeroUsize::new(size) {
            Some(n) => WindowPolicy::Sliding(n),
            None => WindowPolicy::Cumulative,
        }
    }
}

/// Rolling statistics of one partition under a [`WindowPolicy`].
#[derive(Debug, Clone)]
pub struct RollingWindow {
    policy: WindowPolicy,
    stats: RunningStats,
    retained: VecDeque<f64>,
}

impl RollingWindow {
    // ---
    pub fn new(policy: WindowPolicy) -> Self {
        // ---
        let retained = match policy {
            WindowPolicy::Cumulative => VecDeque::new(),
            WindowPolicy::Sliding(n) => VecDeque::with_capacity(n.get() + 1),
        };

        Self {
            policy,
            stats: RunningStats::new(),
            retained,
        }
    }

    /// Add a sample, evicting the oldest one if the window is full, and
    /// return the statistics that now include it.
    ///
    /// A sliding window is re-accumulated from the retained samples on
    /// every step, O(window) per push. Subtracting evicted samples instead
    /// leaves rounding residue in the mean that never clears, which turns
    /// a constant window into a zero-width band around the wrong value.
    pub fn push(&mut self, x: f64) -> &RunningStats {
        // ---
        match self.policy {
            WindowPolicy::Cumulative => self.stats.push(x),
            WindowPolicy::Sliding(size) => {
                self.retained.push_back(x);
                if self.retained.len() > size.get() {
                    self.retained.pop_front();
                }
                self.stats = self.retained.iter().copied().collect();
            }
        }

        &self.stats
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }
}
