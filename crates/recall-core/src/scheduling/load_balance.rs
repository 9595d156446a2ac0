//! Due-date load balancing.
//!
//! Instead of random fuzz, a freshly computed interval is nudged within a
//! small window to the day with the fewest reviews already scheduled, so
//! reviews do not pile up on one calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of already-scheduled reviews per day, keyed by days from today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateHistogram {
    counts: BTreeMap<i64, u32>,
}

impl DueDateHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from absolute due dates relative to `today`.
    pub fn from_due_dates(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Self {
        let mut histogram = Self::new();
        for date in dates {
            histogram.record((date - today).num_days());
        }
        histogram
    }

    /// Account for one more review `days` from today.
    pub fn record(&mut self, days: i64) {
        *self.counts.entry(days).or_insert(0) += 1;
    }

    /// Reviews scheduled `days` from today.
    pub fn count(&self, days: i64) -> u32 {
        self.counts.get(&days).copied().unwrap_or(0)
    }

    /// Whether any review is recorded for that day.
    pub fn contains(&self, days: i64) -> bool {
        self.counts.contains_key(&days)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Pick the day to use for an interval of `interval` days.
    ///
    /// The interval is rounded to whole days. Intervals of four days or
    /// less, and days with nothing recorded yet, are kept as is. Otherwise
    /// the window on either side is searched nearest-first: the first empty
    /// day wins, else the least loaded day seen. Days outside
    /// `[1, max_interval]` are never chosen.
    pub fn balance(&self, interval: f64, max_interval: f64) -> f64 {
        let target = interval.round() as i64;
        if target <= 4 || !self.contains(target) {
            return target as f64;
        }

        let window = fuzz_window(target);
        let mut best = target;
        'search: for offset in 1..=window {
            for candidate in [target - offset, target + offset] {
                if candidate < 1 || candidate as f64 > max_interval {
                    continue;
                }
                if !self.contains(candidate) {
                    best = candidate;
                    break 'search;
                }
                if self.count(candidate) < self.count(best) {
                    best = candidate;
                }
            }
        }

        if best != target {
            tracing::debug!(from = target, to = best, "Load-balanced due date");
        }
        best as f64
    }
}

/// How many days either side of `interval` may be considered.
fn fuzz_window(interval: i64) -> i64 {
    if interval <= 4 {
        0
    } else if interval < 7 {
        1
    } else if interval < 30 {
        ((interval as f64 * 0.15).floor() as i64).max(2)
    } else {
        ((interval as f64 * 0.05).floor() as i64).max(4)
    }
}
