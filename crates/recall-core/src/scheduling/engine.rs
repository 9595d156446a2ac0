//! SM-2 style interval and ease scheduling.

use serde::{Deserialize, Serialize};

use super::load_balance::DueDateHistogram;
use crate::config::SchedulingConfig;
use crate::types::{Card, ResponseKind, MIN_EASE};

/// New interval and ease after a graded review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Interval in days, one decimal place.
    pub interval: f64,
    /// Ease in percent.
    pub ease: u32,
}

/// Compute the next interval and ease for a response.
///
/// Reset returns `(1, base_ease)` whatever the history. Any other response
/// moves ease by the response's delta (never below 130%) and grows the
/// interval multiplicatively:
///
/// ```text
/// interval' = (interval + delay * weight) * ease'/100 * factor
/// ```
///
/// `weight` is 1/4, 1/2 or 1 for Hard, Good and Easy: recalling a card late
/// is evidence of a stronger memory. `factor` is `lapses_interval_change`
/// for Hard, 1 for Good and `easy_bonus` for Easy. The result is clamped to
/// `[1, max_interval]` and, if a histogram is supplied, load-balanced.
///
/// Out-of-range inputs are clamped, never rejected.
pub fn schedule(
    response: ResponseKind,
    interval: f64,
    ease: u32,
    delay_before_review: f64,
    config: &SchedulingConfig,
    histogram: Option<&DueDateHistogram>,
) -> SchedulingResult {
    if response == ResponseKind::Reset {
        return SchedulingResult {
            interval: 1.0,
            ease: config.base_ease.max(MIN_EASE),
        };
    }

    let max_interval = config.max_interval.max(1.0);
    let interval = if interval.is_finite() { interval.max(1.0) } else { 1.0 };
    let delay = if delay_before_review.is_finite() {
        delay_before_review.max(0.0).floor()
    } else {
        0.0
    };

    let ease = (ease.max(MIN_EASE) as i64 + response.ease_delta(config.ease_step))
        .clamp(MIN_EASE as i64, u32::MAX as i64) as u32;

    let factor = match response {
        ResponseKind::Hard => config.lapses_interval_change,
        ResponseKind::Easy => config.easy_bonus,
        ResponseKind::Good | ResponseKind::Reset => 1.0,
    };

    let mut next = (interval + delay * response.delay_weight()) * (ease as f64 / 100.0) * factor;
    if !next.is_finite() {
        next = max_interval;
    }
    next = next.clamp(1.0, max_interval);

    if let Some(histogram) = histogram {
        next = histogram.balance(next, max_interval);
    }

    SchedulingResult {
        interval: ((next * 10.0).round() / 10.0).clamp(1.0, max_interval),
        ease,
    }
}

/// Scheduling front-end bound to a configuration.
///
/// Decides whether the histogram is used (`load_balance`) and how new cards
/// enter scheduling.
#[derive(Debug, Clone)]
pub struct SchedulingEngine {
    config: SchedulingConfig,
}

impl SchedulingEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Schedule with explicit inputs.
    pub fn schedule(
        &self,
        response: ResponseKind,
        interval: f64,
        ease: u32,
        delay_before_review: f64,
        histogram: Option<&DueDateHistogram>,
    ) -> SchedulingResult {
        let histogram = histogram.filter(|_| self.config.load_balance);
        schedule(response, interval, ease, delay_before_review, &self.config, histogram)
    }

    /// Schedule a card.
    ///
    /// A new card is scheduled from a one-day interval at its initial ease
    /// with no delay; a due card from its own interval, ease and delay.
    pub fn schedule_card(
        &self,
        card: &Card,
        response: ResponseKind,
        histogram: Option<&DueDateHistogram>,
    ) -> SchedulingResult {
        if card.is_due() {
            self.schedule(response, card.interval, card.ease, card.delay_before_review, histogram)
        } else {
            self.schedule(response, 1.0, card.ease, 0.0, histogram)
        }
    }

    /// Result of every configured response for a card, in button order.
    pub fn preview(
        &self,
        card: &Card,
        histogram: Option<&DueDateHistogram>,
    ) -> Vec<(ResponseKind, SchedulingResult)> {
        self.config
            .response_options
            .iter()
            .map(|kind| (kind, self.schedule_card(card, kind, histogram)))
            .collect()
    }
}

impl Default for SchedulingEngine {
    fn default() -> Self {
        Self::new(SchedulingConfig::default())
    }
}
