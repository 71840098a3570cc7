// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Entropy / Transit Risk Model
//
// Cargo in transit accumulates entropy along a saturating growth curve that
// approaches but never reaches ENTROPY_CAP. On arrival the accumulated
// entropy is converted once into persistent efficiency penalties.

use serde::{Deserialize, Serialize};

use crate::types::{ConsequenceDomain, EntropyConsequences};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const W_PROGRESS: f64 = 0.15;
pub const W_VOLATILITY: f64 = 0.35;
pub const W_LOAD: f64 = 0.20;
pub const W_INSTABILITY: f64 = 0.20;
pub const W_OBSERVER_ABSENCE: f64 = 0.10;

/// Fraction of effective risk converted into entropy each tick.
pub const BASE_RATE: f64 = 0.10;

/// Hard ceiling on fleet entropy.
pub const ENTROPY_CAP: f64 = 0.95;

/// Entropy at or below this level leaves no consequence.
pub const NEGLIGIBLE_ENTROPY: f64 = 0.05;

pub const CARGO_FACTOR: f64 = 0.5;
pub const FLEET_FACTOR: f64 = 0.4;
pub const OBSERVER_FACTOR: f64 = 0.3;

/// Cargo never drops below 60% of nominal.
pub const CARGO_FLOOR: f64 = -0.4;
pub const FLEET_FLOOR: f64 = -0.5;
pub const OBSERVER_FLOOR: f64 = -0.3;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable weights of the risk model. Defaults mirror the constants above.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntropyParams {
    pub w_progress: f64,
    pub w_volatility: f64,
    pub w_load: f64,
    pub w_instability: f64,
    pub w_observer_absence: f64,
    pub base_rate: f64,
}

impl Default for EntropyParams {
    fn default() -> Self {
        Self {
            w_progress: W_PROGRESS,
            w_volatility: W_VOLATILITY,
            w_load: W_LOAD,
            w_instability: W_INSTABILITY,
            w_observer_absence: W_OBSERVER_ABSENCE,
            base_rate: BASE_RATE,
        }
    }
}

/// Normalized per-tick risk inputs, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub progress: f64,
    pub volatility: f64,
    pub load: f64,
    pub instability: f64,
    pub observer_absent: bool,
}

// ---------------------------------------------------------------------------
// Accrual
// ---------------------------------------------------------------------------

/// Weighted sum of the normalized inputs.
pub fn risk(inputs: &RiskInputs, params: &EntropyParams) -> f64 {
    let absence = if inputs.observer_absent { 1.0 } else { 0.0 };
    params.w_progress * inputs.progress.clamp(0.0, 1.0)
        + params.w_volatility * inputs.volatility.clamp(0.0, 1.0)
        + params.w_load * inputs.load.clamp(0.0, 1.0)
        + params.w_instability * inputs.instability.clamp(0.0, 1.0)
        + params.w_observer_absence * absence
}

/// Total mitigation from hull and observers, capped to [0, 1].
pub fn total_mitigation(vessel_dampening: f64, observer_bonus: f64) -> f64 {
    (vessel_dampening.max(0.0) + observer_bonus.max(0.0)).min(1.0)
}

pub fn effective_risk(risk: f64, mitigation: f64) -> f64 {
    (risk * (1.0 - mitigation.clamp(0.0, 1.0))).max(0.0)
}

/// One tick of saturating growth.
pub fn accrue(entropy: f64, effective_risk: f64, params: &EntropyParams) -> f64 {
    let e = entropy.clamp(0.0, ENTROPY_CAP);
    (e + (1.0 - e) * effective_risk * params.base_rate).clamp(0.0, ENTROPY_CAP)
}

/// Entropy a fleet would carry after `eta` ticks of transit, starting clean.
///
/// `base` supplies every input except progress, which advances as
/// `(k + 1) / eta` exactly as the tick pipeline does.
pub fn project_transit(base: RiskInputs, eta: u32, mitigation: f64, params: &EntropyParams) -> f64 {
    let mut entropy = 0.0;
    let total = eta.max(1) as f64;
    for k in 0..eta {
        let inputs = RiskInputs { progress: (k + 1) as f64 / total, ..base };
        entropy = accrue(entropy, effective_risk(risk(&inputs, params), mitigation), params);
    }
    entropy
}

// ---------------------------------------------------------------------------
// Consequences
// ---------------------------------------------------------------------------

pub fn domain_factor(domain: ConsequenceDomain) -> f64 {
    match domain {
        ConsequenceDomain::Cargo => CARGO_FACTOR,
        ConsequenceDomain::Fleet => FLEET_FACTOR,
        ConsequenceDomain::Observer => OBSERVER_FACTOR,
    }
}

pub fn domain_floor(domain: ConsequenceDomain) -> f64 {
    match domain {
        ConsequenceDomain::Cargo => CARGO_FLOOR,
        ConsequenceDomain::Fleet => FLEET_FLOOR,
        ConsequenceDomain::Observer => OBSERVER_FLOOR,
    }
}

/// `clamp(−sqrt(entropy) × factor, floor, 0)` for one domain.
pub fn consequence_from_entropy(domain: ConsequenceDomain, entropy: f64) -> f64 {
    let e = entropy.clamp(0.0, ENTROPY_CAP);
    (-e.sqrt() * domain_factor(domain)).clamp(domain_floor(domain), 0.0)
}

/// Consequences derived at arrival. Negligible entropy leaves none.
pub fn derive_consequences(entropy: f64) -> EntropyConsequences {
    if entropy <= NEGLIGIBLE_ENTROPY {
        return EntropyConsequences::default();
    }
    let mut out = EntropyConsequences::default();
    for domain in ConsequenceDomain::ALL {
        out.set(domain, consequence_from_entropy(domain, entropy));
    }
    out
}

/// Keep the more severe penalty per domain.
pub fn merge_consequences(existing: EntropyConsequences, fresh: EntropyConsequences) -> EntropyConsequences {
    let mut out = existing;
    for domain in ConsequenceDomain::ALL {
        out.set(domain, existing.get(domain).min(fresh.get(domain)));
    }
    out
}

/// Inverse of [`consequence_from_entropy`]: the entropy that would produce `delta`.
pub fn entropy_equivalent(domain: ConsequenceDomain, delta: f64) -> f64 {
    let magnitude = delta.min(0.0).abs() / domain_factor(domain);
    (magnitude * magnitude).clamp(0.0, ENTROPY_CAP)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hostile_inputs() -> RiskInputs {
        RiskInputs {
            progress: 0.5,
            volatility: 1.0,
            load: 1.0,
            instability: 0.8,
            observer_absent: true,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        let p = EntropyParams::default();
        let sum = p.w_progress + p.w_volatility + p.w_load + p.w_instability + p.w_observer_absence;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn risk_is_weighted_sum() {
        let p = EntropyParams::default();
        let inputs = RiskInputs {
            progress: 1.0,
            volatility: 0.0,
            load: 0.5,
            instability: 0.1,
            observer_absent: false,
        };
        let expected = 0.15 + 0.2 * 0.5 + 0.2 * 0.1;
        assert!((risk(&inputs, &p) - expected).abs() < 1e-12);
    }

    #[test]
    fn mitigation_caps_at_one() {
        assert_eq!(total_mitigation(0.7, 0.6), 1.0);
        assert_eq!(effective_risk(0.9, 1.0), 0.0);
        assert!((effective_risk(0.8, 0.25) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn accrual_is_monotone_and_capped() {
        let p = EntropyParams { base_rate: 1.0, ..EntropyParams::default() };
        let mut e = 0.0;
        for _ in 0..500 {
            let next = accrue(e, 1.0, &p);
            assert!(next >= e);
            assert!(next <= ENTROPY_CAP);
            e = next;
        }
        assert!((e - ENTROPY_CAP).abs() < 1e-9);
    }

    #[test]
    fn accrual_saturates_below_cap_with_normal_rate() {
        let p = EntropyParams::default();
        let mut e = 0.0;
        for _ in 0..20 {
            e = accrue(e, 1.0, &p);
        }
        assert!(e < ENTROPY_CAP);
        assert!(e > 0.85);
    }

    #[test]
    fn projection_grows_with_eta() {
        let p = EntropyParams::default();
        let short = project_transit(hostile_inputs(), 3, 0.2, &p);
        let long = project_transit(hostile_inputs(), 12, 0.2, &p);
        assert!(long > short);
        assert_eq!(project_transit(hostile_inputs(), 0, 0.2, &p), 0.0);
    }

    #[test]
    fn negligible_entropy_has_no_consequence() {
        assert!(derive_consequences(0.0).is_clear());
        assert!(derive_consequences(NEGLIGIBLE_ENTROPY).is_clear());
    }

    #[test]
    fn consequences_follow_sqrt_and_floor() {
        let c = derive_consequences(0.36);
        assert!((c.cargo_efficiency_delta - (-0.3)).abs() < 1e-12);
        assert!((c.fleet_efficiency_delta - (-0.24)).abs() < 1e-12);
        assert!((c.observer_efficiency_delta - (-0.18)).abs() < 1e-12);

        // Only cargo hits its floor at the entropy cap.
        let worst = derive_consequences(ENTROPY_CAP);
        assert_eq!(worst.cargo_efficiency_delta, CARGO_FLOOR);
        assert!(worst.fleet_efficiency_delta > FLEET_FLOOR);
        assert!(worst.observer_efficiency_delta > OBSERVER_FLOOR);
    }

    #[test]
    fn entropy_equivalent_inverts_consequence() {
        for domain in ConsequenceDomain::ALL {
            let delta = consequence_from_entropy(domain, 0.3);
            let ee = entropy_equivalent(domain, delta);
            assert!((consequence_from_entropy(domain, ee) - delta).abs() < 1e-12);
        }
        assert_eq!(entropy_equivalent(ConsequenceDomain::Cargo, 0.0), 0.0);
    }

    #[test]
    fn merge_keeps_more_severe() {
        let a = EntropyConsequences {
            cargo_efficiency_delta: -0.3,
            fleet_efficiency_delta: 0.0,
            observer_efficiency_delta: -0.1,
        };
        let b = EntropyConsequences {
            cargo_efficiency_delta: -0.1,
            fleet_efficiency_delta: -0.2,
            observer_efficiency_delta: -0.05,
        };
        let m = merge_consequences(a, b);
        assert_eq!(m.cargo_efficiency_delta, -0.3);
        assert_eq!(m.fleet_efficiency_delta, -0.2);
        assert_eq!(m.observer_efficiency_delta, -0.1);
    }
}
