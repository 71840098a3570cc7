// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Reversal Economy
//
// A reversal buys back part of a persistent consequence. Each application
// removes a fixed fraction of the remaining entropy-equivalent, so repeated
// reversals approach a clean slate without ever reaching it, and each one is
// cheaper than the last.

use serde::{Deserialize, Serialize};

use crate::credits::{to_decimal, Credits};
use crate::entropy;
use crate::types::{ConsequenceDomain, EntropyConsequences};

pub const CARGO_BASE_COST: f64 = 40.0;
pub const FLEET_BASE_COST: f64 = 60.0;
pub const OBSERVER_BASE_COST: f64 = 50.0;

/// Fraction of entropy-equivalent removed per reversal.
pub const EFFECT_FRACTION: f64 = 0.4;

/// Ceiling on the effect fraction after bonuses.
const MAX_EFFECT_FRACTION: f64 = 0.9;

pub fn base_cost(domain: ConsequenceDomain) -> f64 {
    match domain {
        ConsequenceDomain::Cargo => CARGO_BASE_COST,
        ConsequenceDomain::Fleet => FLEET_BASE_COST,
        ConsequenceDomain::Observer => OBSERVER_BASE_COST,
    }
}

/// `baseCost × (1 + entropyEquivalent)`, summed in Decimal and left unrounded
/// so that smaller entropy-equivalents quote strictly cheaper. The quote stops
/// falling once `baseCost × entropyEquivalent` is under Decimal's resolution,
/// about 1e-26 at these base costs.
pub fn cost(domain: ConsequenceDomain, entropy_equivalent: f64) -> Credits {
    let base = to_decimal(base_cost(domain));
    Credits::from_decimal(base + base * to_decimal(entropy_equivalent.max(0.0)))
}

/// Precomputed outcome of one reversal application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReversalQuote {
    pub domain: ConsequenceDomain,
    pub entropy_before: f64,
    pub entropy_after: f64,
    pub delta_before: f64,
    pub delta_after: f64,
    pub cost: Credits,
}

/// Quote a reversal against current consequences.
///
/// Returns `None` when nothing remains to reverse in `domain`.
pub fn quote(
    consequences: &EntropyConsequences,
    domain: ConsequenceDomain,
    effect_bonus: f64,
) -> Option<ReversalQuote> {
    let delta_before = consequences.get(domain);
    let entropy_before = entropy::entropy_equivalent(domain, delta_before);
    if entropy_before <= 0.0 {
        return None;
    }
    let fraction = (EFFECT_FRACTION + effect_bonus.max(0.0)).min(MAX_EFFECT_FRACTION);
    let entropy_after = entropy_before * (1.0 - fraction);
    Some(ReversalQuote {
        domain,
        entropy_before,
        entropy_after,
        delta_before,
        delta_after: entropy::consequence_from_entropy(domain, entropy_after),
        cost: cost(domain, entropy_before),
    })
}

/// Write the reduced consequence back.
pub fn apply(consequences: &mut EntropyConsequences, quote: &ReversalQuote) {
    consequences.set(quote.domain, quote.delta_after);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
