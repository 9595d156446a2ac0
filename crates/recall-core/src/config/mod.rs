//! Configuration system for recall.

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, RecallResult};
use crate::types::{ResponseOptions, DEFAULT_BASE_EASE, MIN_EASE};

/// Longest interval any schedule may produce, in days (about a century).
pub const DEFAULT_MAX_INTERVAL: f64 = 36500.0;

/// Scheduling and session options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Ease given to new cards and to cards after a reset, in percent.
    pub base_ease: u32,
    /// Upper clamp on intervals, in days.
    pub max_interval: f64,
    /// Interval multiplier applied on Easy.
    pub easy_bonus: f64,
    /// Interval multiplier applied on Hard.
    pub lapses_interval_change: f64,
    /// Ease change per Hard/Easy response, in percentage points.
    pub ease_step: u32,
    /// Ordered answer buttons; index 0 is Reset.
    pub response_options: ResponseOptions,
    /// Remove a reviewed card's siblings from the rest of today's session.
    pub bury_sibling_cards: bool,
    /// Pick cards at random instead of in queue order.
    pub randomize_card_order: bool,
    /// Spread due dates using the due-date histogram.
    pub load_balance: bool,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            base_ease: DEFAULT_BASE_EASE,
            max_interval: DEFAULT_MAX_INTERVAL,
            easy_bonus: 1.3,
            lapses_interval_change: 0.5,
            ease_step: 20,
            response_options: ResponseOptions::default(),
            bury_sibling_cards: false,
            randomize_card_order: true,
            load_balance: true,
        }
    }
}

impl SchedulingConfig {
    /// Set the number of recall buttons, rebuilding the response options.
    pub fn with_response_count(mut self, count: usize) -> Self {
        self.response_options = ResponseOptions::with_count(count);
        self
    }

    /// Check values are usable by the scheduling engine.
    pub fn validate(&self) -> RecallResult<()> {
        if self.base_ease < MIN_EASE {
            return Err(RecallError::validation_with_suggestion(
                format!("base_ease {} is below the {}% floor", self.base_ease, MIN_EASE),
                format!("Set base_ease to at least {}", MIN_EASE),
            ));
        }
        if !(self.max_interval >= 1.0) {
            return Err(RecallError::validation("max_interval must be at least one day"));
        }
        if !(self.easy_bonus >= 1.0) {
            return Err(RecallError::validation("easy_bonus must be at least 1.0"));
        }
        if !(self.lapses_interval_change > 0.0) {
            return Err(RecallError::validation("lapses_interval_change must be positive"));
        }
        Ok(())
    }
}

/// Options for postponing overdue but well-retained cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostponeConfig {
    /// Only cards whose estimated retention is above this are postponed.
    pub retention_floor: f64,
    /// Lower bound of the random interval growth factor.
    pub growth_min: f64,
    /// Upper bound (exclusive) of the random interval growth factor.
    pub growth_max: f64,
    /// Upper clamp on postponed intervals, in days.
    pub max_interval: f64,
}

impl Default for PostponeConfig {
    fn default() -> Self {
        Self {
            retention_floor: 0.65,
            growth_min: 1.05,
            growth_max: 1.10,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

impl PostponeConfig {
    /// Check the growth range and floor are sane.
    pub fn validate(&self) -> RecallResult<()> {
        if !(0.0..1.0).contains(&self.retention_floor) {
            return Err(RecallError::validation("retention_floor must be in [0, 1)"));
        }
        if !(self.growth_min >= 1.0 && self.growth_max > self.growth_min) {
            return Err(RecallError::validation_with_suggestion(
                format!(
                    "growth range [{}, {}) must be non-empty and at least 1.0",
                    self.growth_min, self.growth_max
                ),
                "Use growth_min = 1.05 and growth_max = 1.10",
            ));
        }
        if !(self.max_interval >= 1.0) {
            return Err(RecallError::validation("max_interval must be at least one day"));
        }
        Ok(())
    }
}

/// Main recall configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Scheduling and session options.
    pub scheduling: SchedulingConfig,
    /// Postponement options.
    pub postpone: PostponeConfig,
}

impl RecallConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> RecallResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| RecallError::Configuration(e.to_string()))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RecallError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| RecallError::Configuration(e.to_string()))?,
            _ => {
                return Err(RecallError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `RECALL_*` environment variables; unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ease) = env_parse::<u32>("RECALL_BASE_EASE") {
            self.scheduling.base_ease = ease;
        }
        if let Some(max) = env_parse::<f64>("RECALL_MAX_INTERVAL") {
            self.scheduling.max_interval = max;
            self.postpone.max_interval = max;
        }
        if let Some(count) = env_parse::<usize>("RECALL_RESPONSE_COUNT") {
            self.scheduling.response_options = ResponseOptions::with_count(count);
        }
        if let Some(bury) = env_parse::<bool>("RECALL_BURY_SIBLINGS") {
            self.scheduling.bury_sibling_cards = bury;
        }
        if let Some(randomize) = env_parse::<bool>("RECALL_RANDOMIZE") {
            self.scheduling.randomize_card_order = randomize;
        }
        if let Some(balance) = env_parse::<bool>("RECALL_LOAD_BALANCE") {
            self.scheduling.load_balance = balance;
        }
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> RecallResult<()> {
        self.scheduling.validate()?;
        self.postpone.validate()
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> RecallConfigBuilder {
        RecallConfigBuilder::default()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

/// Builder for RecallConfig.
#[derive(Default)]
pub struct RecallConfigBuilder {
    config: RecallConfig,
}

impl RecallConfigBuilder {
    /// Set base ease.
    pub fn base_ease(mut self, ease: u32) -> Self {
        self.config.scheduling.base_ease = ease;
        self
    }

    /// Set the interval clamp for both scheduling and postponement.
    pub fn max_interval(mut self, days: f64) -> Self {
        self.config.scheduling.max_interval = days;
        self.config.postpone.max_interval = days;
        self
    }

    /// Set the response option list.
    pub fn response_options(mut self, options: ResponseOptions) -> Self {
        self.config.scheduling.response_options = options;
        self
    }

    /// Enable or disable sibling burying.
    pub fn bury_sibling_cards(mut self, enabled: bool) -> Self {
        self.config.scheduling.bury_sibling_cards = enabled;
        self
    }

    /// Enable or disable random card order.
    pub fn randomize_card_order(mut self, enabled: bool) -> Self {
        self.config.scheduling.randomize_card_order = enabled;
        self
    }

    /// Enable or disable due-date load balancing.
    pub fn load_balance(mut self, enabled: bool) -> Self {
        self.config.scheduling.load_balance = enabled;
        self
    }

    /// Set the postponement retention floor.
    pub fn retention_floor(mut self, floor: f64) -> Self {
        self.config.postpone.retention_floor = floor;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> RecallResult<RecallConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
