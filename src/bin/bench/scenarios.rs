// Scenario Definitions - engine configurations and player traffic profiles
// All scenario logic lives in config builders and intent mixes; the engine is untouched.

use rift_engine::entropy::EntropyParams;
use rift_engine::{SimConfig, TimeMode};

use crate::intents::IntentMix;

// ─── Scenario Configuration ─────────────────────────────────────────────────

/// How the harness drives the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// `advance_tick` once per step.
    Manual,
    /// Host timer in the given mode, woken every `wake_ms` of simulated time.
    Timer { mode: TimeMode, wake_ms: f64 },
}

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub ticks: u64,
    pub config: fn() -> SimConfig,
    /// Mean player intents per tick.
    pub intent_rate: f64,
    pub mix: IntentMix,
    pub clock: Clock,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    pub require_balanced_audit: bool,
    pub require_price_bounds: bool,
    pub require_entropy_bounds: bool,
    pub require_capacity: bool,
    /// Minimum settled hauls over the run.
    pub min_settlements: Option<u32>,
    /// At least this many rejected intents (proves validation is exercised).
    pub min_rejections: Option<u32>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            require_balanced_audit: true,
            require_price_bounds: true,
            require_entropy_bounds: true,
            require_capacity: true,
            min_settlements: None,
            min_rejections: None,
        }
    }
}

// ─── Config Builders ────────────────────────────────────────────────────────

fn baseline() -> SimConfig {
    SimConfig::default()
}

fn no_ai() -> SimConfig {
    SimConfig::without_ai()
}

fn high_entropy() -> SimConfig {
    SimConfig {
        entropy: EntropyParams { base_rate: 0.3, ..EntropyParams::default() },
        ..SimConfig::default()
    }
}

fn lean_wallets() -> SimConfig {
    SimConfig { player_credits: 600.0, ai_credits: 600.0, ..SimConfig::default() }
}

// ─── Scenario Table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "RIFT_BASELINE",
            label: "Baseline (player + AI)",
            category: "Core",
            ticks: 400,
            config: baseline,
            intent_rate: 1.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Manual,
            criteria: PassCriteria { min_rejections: Some(1), ..PassCriteria::default() },
        },
        Scenario {
            name: "RIFT_AI_ONLY",
            label: "AI traders alone",
            category: "AI",
            ticks: 400,
            config: baseline,
            intent_rate: 0.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Manual,
            criteria: PassCriteria { min_settlements: Some(1), ..PassCriteria::default() },
        },
        Scenario {
            name: "RIFT_NO_AI",
            label: "Player only (AI disabled)",
            category: "Core",
            ticks: 400,
            config: no_ai,
            intent_rate: 1.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Manual,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "RIFT_HIGH_ENTROPY",
            label: "High entropy (base rate 0.3)",
            category: "Entropy",
            ticks: 400,
            config: high_entropy,
            intent_rate: 1.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Manual,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "RIFT_MARKET_FLOOD",
            label: "Market flood (order spam)",
            category: "Pricing",
            ticks: 300,
            config: baseline,
            intent_rate: 8.0,
            mix: IntentMix::TRADER,
            clock: Clock::Manual,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "RIFT_LEAN_WALLETS",
            label: "Lean wallets (600 cr)",
            category: "Credits",
            ticks: 300,
            config: lean_wallets,
            intent_rate: 2.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Manual,
            criteria: PassCriteria { min_rejections: Some(1), ..PassCriteria::default() },
        },
        Scenario {
            name: "RIFT_FAST_CLOCK",
            label: "Fast clock via host timer",
            category: "Scheduler",
            ticks: 400,
            config: baseline,
            intent_rate: 1.0,
            mix: IntentMix::BALANCED,
            clock: Clock::Timer { mode: TimeMode::Fast, wake_ms: 100.0 },
            criteria: PassCriteria::default(),
        },
    ]
}
