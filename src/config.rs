// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Simulation Configuration
//
// Every tunable weight lives here as a named default. Hosts may override any
// subset through JSON; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::ai::ScoringWeights;
use crate::entropy::EntropyParams;
use crate::error::ConfigError;

pub const DEFAULT_PLAYER_CREDITS: f64 = 5000.0;
pub const DEFAULT_AI_CREDITS: f64 = 5000.0;

/// Best score below which a trader sits the tick out.
pub const AI_MIN_ACTION_SCORE: f64 = 0.1;
/// Credits a trader keeps in reserve when placing buy orders.
pub const AI_CREDIT_BUFFER: f64 = 500.0;
/// Entropy-equivalent above which a trader considers a reversal.
pub const AI_REVERSAL_THRESHOLD: f64 = 0.05;
/// Units per AI market order.
pub const AI_ORDER_QUANTITY: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub player_credits: f64,
    pub ai_credits: f64,
    pub ai_enabled: bool,
    pub entropy: EntropyParams,
    pub scoring: ScoringWeights,
    pub ai_min_action_score: f64,
    pub ai_credit_buffer: f64,
    pub ai_reversal_threshold: f64,
    pub ai_order_quantity: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_credits: DEFAULT_PLAYER_CREDITS,
            ai_credits: DEFAULT_AI_CREDITS,
            ai_enabled: true,
            entropy: EntropyParams::default(),
            scoring: ScoringWeights::default(),
            ai_min_action_score: AI_MIN_ACTION_SCORE,
            ai_credit_buffer: AI_CREDIT_BUFFER,
            ai_reversal_threshold: AI_REVERSAL_THRESHOLD,
            ai_order_quantity: AI_ORDER_QUANTITY,
        }
    }
}

impl SimConfig {
    /// Defaults with AI traders switched off.
    pub fn without_ai() -> Self {
        Self { ai_enabled: false, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("player_credits", self.player_credits)?;
        non_negative("ai_credits", self.ai_credits)?;
        non_negative("ai_credit_buffer", self.ai_credit_buffer)?;
        non_negative("ai_reversal_threshold", self.ai_reversal_threshold)?;
        let rate = self.entropy.base_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::OutOfRange {
                field: "entropy.base_rate",
                expected: "within [0, 1]",
                value: rate,
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, expected: "a finite non-negative number", value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = SimConfig::from_json(r#"{ "ai_enabled": false, "entropy": { "base_rate": 0.2 } }"#).unwrap();
        assert!(!cfg.ai_enabled);
        assert_eq!(cfg.entropy.base_rate, 0.2);
        assert_eq!(cfg.entropy.w_volatility, crate::entropy::W_VOLATILITY);
        assert_eq!(cfg.ai_order_quantity, AI_ORDER_QUANTITY);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            SimConfig::from_json(r#"{ "player_credits": -1 }"#),
            Err(ConfigError::OutOfRange { field: "player_credits", .. })
        ));
        assert!(matches!(
            SimConfig::from_json(r#"{ "entropy": { "base_rate": 3.0 } }"#),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(SimConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }
}
