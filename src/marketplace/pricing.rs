use serde::{Deserialize, Serialize};

use super::domain::{Difficulty, PricingRange};

/// Named constants behind the rule-based pricing advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Per-day fallback rate when a domain has no completed-task history.
    pub base_rate_per_day: f64,
    pub easy_multiplier: f64,
    pub medium_multiplier: f64,
    pub hard_multiplier: f64,
    /// Engagements strictly longer than this many days get the discount.
    pub long_engagement_days: u32,
    pub long_engagement_discount: f64,
    /// Half-width of the advisory range around the adjusted figure.
    pub range_spread: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_rate_per_day: 500.0,
            easy_multiplier: 1.0,
            medium_multiplier: 1.4,
            hard_multiplier: 2.0,
            long_engagement_days: 7,
            long_engagement_discount: 0.9,
            range_spread: 0.2,
        }
    }
}

impl PricingConfig {
    pub fn multiplier(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy_multiplier,
            Difficulty::Medium => self.medium_multiplier,
            Difficulty::Hard => self.hard_multiplier,
        }
    }
}

/// Computes the advisory budget range stored on a task at creation time.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Mean budget of the supplied historical figures, or `None` when the
    /// domain has no usable history yet.
    pub fn domain_average(budgets: &[u32]) -> Option<f64> {
        if budgets.is_empty() {
            return None;
        }
        let total: u64 = budgets.iter().map(|budget| u64::from(*budget)).sum();
        Some(total as f64 / budgets.len() as f64)
    }

    /// Advisory range from historical data (falling back to the flat per-day
    /// base when absent), difficulty tier, and duration. Never fails: missing
    /// history is the expected cold-start case, not a fault.
    pub fn quote(
        &self,
        domain_average: Option<f64>,
        duration_days: u32,
        difficulty: Difficulty,
    ) -> PricingRange {
        let config = &self.config;

        let domain_avg = domain_average
            .unwrap_or_else(|| config.base_rate_per_day * f64::from(duration_days));

        let base = domain_avg * config.multiplier(difficulty);

        // Economies of scale on longer engagements.
        let adjusted = if duration_days > config.long_engagement_days {
            base * config.long_engagement_discount
        } else {
            base
        };

        PricingRange {
            min: (adjusted * (1.0 - config.range_spread)).round() as u32,
            max: (adjusted * (1.0 + config.range_spread)).round() as u32,
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}
