//! Bulk postponement of overdue cards that are still well retained.
//!
//! After a break, a backlog of overdue cards can be pushed out a little
//! instead of reviewed at once. Only cards that are probably still
//! remembered qualify; cards likely forgotten stay due.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::estimator::RetentionEstimator;
use crate::config::PostponeConfig;
use crate::types::time::{add_days, days_between, start_of_day};
use crate::types::{Card, CardId};

/// Outcome of a postponement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostponeReport {
    /// Cards looked at.
    pub examined: usize,
    /// Tracked cards due before today.
    pub overdue: usize,
    /// Overdue cards above the retention floor.
    pub candidates: usize,
    /// Overdue cards left alone because retention was at or below the floor.
    pub below_floor: usize,
    /// Cards whose interval and due date changed, lowest retention first.
    pub postponed: Vec<CardId>,
}

/// Reschedules overdue, well-retained cards without grading them.
///
/// Ease is never touched and the scheduling engine is not involved: the
/// interval grows by a small random factor plus the days already overdue.
#[derive(Debug, Clone)]
pub struct PostponeEngine {
    config: PostponeConfig,
    estimator: RetentionEstimator,
}

impl PostponeEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: PostponeConfig) -> Self {
        Self {
            config,
            estimator: RetentionEstimator::new(),
        }
    }

    pub fn config(&self) -> &PostponeConfig {
        &self.config
    }

    /// Postpone qualifying cards in place, using the current time and the
    /// thread-local RNG.
    ///
    /// With `fixed_due_offset_days`, every postponed card becomes due that
    /// many days from now; otherwise each is due after its new interval.
    pub fn postpone(
        &self,
        cards: &mut [Card],
        fixed_due_offset_days: Option<f64>,
    ) -> PostponeReport {
        let mut rng = rand::thread_rng();
        self.postpone_with_rng(cards, fixed_due_offset_days, Utc::now(), &mut rng)
    }

    /// Postpone with an explicit clock and RNG.
    ///
    /// Useful for reproducible testing.
    pub fn postpone_with_rng<R: Rng + ?Sized>(
        &self,
        cards: &mut [Card],
        fixed_due_offset_days: Option<f64>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> PostponeReport {
        let today = start_of_day(now);
        let fixed_due = fixed_due_offset_days.map(|days| add_days(now, days));
        let mut report = PostponeReport {
            examined: cards.len(),
            ..Default::default()
        };

        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for (idx, card) in cards.iter().enumerate() {
            if !card.is_tracked {
                continue;
            }
            let Some(due) = card.due else { continue };
            if due >= today {
                continue;
            }
            report.overdue += 1;

            match self.estimator.current_retention(card, now) {
                Some(retention) if retention > self.config.retention_floor => {
                    candidates.push((idx, retention));
                }
                retention => {
                    tracing::debug!(
                        card = %card.id,
                        ?retention,
                        "Not postponing: retention at or below floor"
                    );
                    report.below_floor += 1;
                }
            }
        }

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        report.candidates = candidates.len();

        let max_interval = self.config.max_interval.max(1.0);
        for (idx, retention) in candidates {
            let card = &mut cards[idx];
            if !card.interval.is_finite() || card.interval >= max_interval {
                tracing::debug!(
                    card = %card.id,
                    interval = card.interval,
                    "Not postponing: interval at maximum"
                );
                continue;
            }
            let last_review = card.last_review().unwrap_or(now);
            let delay = days_between(last_review, now) - card.interval;
            let growth = self.growth_factor(rng);
            let next = ((card.interval * growth).ceil() + delay).clamp(1.0, max_interval);

            if next <= card.interval {
                continue;
            }

            tracing::debug!(
                card = %card.id,
                retention,
                from = card.interval,
                to = next,
                "Postponed card"
            );
            card.interval = next;
            card.due = Some(fixed_due.unwrap_or_else(|| add_days(now, next)));
            card.delay_before_review = 0.0;
            report.postponed.push(card.id);
        }

        tracing::info!(
            examined = report.examined,
            overdue = report.overdue,
            candidates = report.candidates,
            postponed = report.postponed.len(),
            "Postponement pass finished"
        );
        report
    }

    fn growth_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (low, high) = (self.config.growth_min, self.config.growth_max);
        if high > low {
            rng.gen_range(low..high)
        } else {
            low
        }
    }
}

impl Default for PostponeEngine {
    fn default() -> Self {
        Self::new(PostponeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 14, 0, 0).unwrap()
    }

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn overdue_card(id: u64, interval: f64, days_overdue: i64) -> Card {
        Card::new(id, ["A"]).scheduled(now() - Duration::days(days_overdue), interval, 250, now())
    }

    #[test]
    fn test_postpones_well_retained_overdue_card() {
        let engine = PostponeEngine::default();
        let mut cards = vec![overdue_card(1, 30.0, 5)];

        let report = engine.postpone_with_rng(&mut cards, None, now(), &mut seeded_rng());

        assert_eq!(report.postponed, vec![CardId(1)]);
        let interval = cards[0].interval;
        assert!((37.0..=38.0).contains(&interval), "interval {} outside [37, 38]", interval);
        assert_eq!(cards[0].due, Some(add_days(now(), interval)));
        assert_eq!(cards[0].ease, 250, "ease must not change");
        assert_eq!(cards[0].delay_before_review, 0.0);
    }

    #[test]
    fn test_skips_cards_below_retention_floor() {
        let engine = PostponeEngine::default();
        // elapsed = 2 + 20 = 22 days on a 2-day interval: R = 1 / (1 + 22/18) < 0.65
        let mut cards = vec![overdue_card(1, 2.0, 20)];
        let before = cards.clone();

        let report = engine.postpone_with_rng(&mut cards, None, now(), &mut seeded_rng());

        assert_eq!(report.below_floor, 1);
        assert!(report.postponed.is_empty());
        assert_eq!(cards, before);
    }

    #[test]
    fn test_skips_untracked_new_and_not_yet_overdue() {
        let engine = PostponeEngine::default();
        let later_today = start_of_day(now()) + Duration::hours(1);
        let due_today = Card::new(3, ["A"]).scheduled(later_today, 10.0, 250, now());
        let mut cards = vec![
            overdue_card(1, 30.0, 5).untracked(),
            Card::new(2, ["A"]),
            due_today,
        ];
        let before = cards.clone();

        let report = engine.postpone_with_rng(&mut cards, None, now(), &mut seeded_rng());

        assert_eq!(report.overdue, 0);
        assert!(report.postponed.is_empty());
        assert_eq!(cards, before);
    }

    #[test]
    fn test_fixed_offset_gives_same_due_date() {
        let engine = PostponeEngine::default();
        let mut cards = vec![overdue_card(1, 30.0, 5), overdue_card(2, 60.0, 3)];

        let report = engine.postpone_with_rng(&mut cards, Some(3.0), now(), &mut seeded_rng());

        assert_eq!(report.candidates, 2);
        assert_eq!(report.postponed.len(), 2);
        let expected = add_days(now(), 3.0);
        assert!(cards.iter().all(|c| c.due == Some(expected)));
    }

    #[test]
    fn test_reports_lowest_retention_first() {
        let engine = PostponeEngine::default();
        // Same overdue days, shorter interval decays faster
        let mut cards = vec![overdue_card(1, 60.0, 4), overdue_card(2, 20.0, 4)];

        let report = engine.postpone_with_rng(&mut cards, None, now(), &mut seeded_rng());

        assert_eq!(report.postponed, vec![CardId(2), CardId(1)]);
    }

    #[test]
    fn test_never_decreases_interval() {
        let engine = PostponeEngine::default();
        let mut rng = seeded_rng();
        for interval in [1.0, 3.0, 17.0, 250.0, 36000.0] {
            let mut cards = vec![overdue_card(1, interval, 1)];
            engine.postpone_with_rng(&mut cards, None, now(), &mut rng);
            assert!(cards[0].interval >= interval);
            assert!(cards[0].interval <= 36500.0);
        }
    }

    #[test]
    fn test_huge_intervals_and_offsets_do_not_overflow() {
        let engine = PostponeEngine::default();
        let mut cards = vec![
            overdue_card(1, 1e15, 5),
            overdue_card(2, f64::INFINITY, 5),
            overdue_card(3, 30.0, 5),
        ];

        let report = engine.postpone_with_rng(&mut cards, Some(1e20), now(), &mut seeded_rng());

        assert_eq!(report.postponed, vec![CardId(3)]);
        assert_eq!(cards[0].interval, 1e15);
        assert_eq!(cards[2].due, Some(DateTime::<Utc>::MAX_UTC));
    }
}
