// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Credit Audit
//
// Credits only enter a wallet through seeding, sales and settlements, and only
// leave through purchases. After every tick the wallets must add up to
// `seeded + income − expenses`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::credits::Credits;
use crate::state::WorldState;

/// Absolute imbalance tolerated before a check fails.
const TOLERANCE: Decimal = dec!(0.0001);

/// Outcome of one audit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuditResult {
    pub balanced: bool,
    /// Credits actually held across all wallets.
    pub held: Credits,
    /// Credits the flow totals say should be held.
    pub expected: Credits,
    pub error: Credits,
    /// Whether the breaker has tripped at any point since the last reset.
    pub tripped: bool,
}

/// Tracks imbalances across ticks and trips once they accumulate past a threshold.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreditAudit {
    pub cumulative_error: Credits,
    pub threshold: Credits,
    pub tripped: bool,
    pub consecutive_violations: u32,
}

impl CreditAudit {
    pub fn new(threshold: Credits) -> Self {
        Self {
            cumulative_error: Credits::ZERO,
            threshold,
            tripped: false,
            consecutive_violations: 0,
        }
    }

    pub fn verify(&mut self, world: &WorldState) -> AuditResult {
        let held = world.total_credits();
        let expected = world.credit_flow.expected_balance();
        let error = Credits((held.0 - expected.0).abs());
        let balanced = error.0 < TOLERANCE;

        if balanced {
            self.consecutive_violations = 0;
        } else {
            self.cumulative_error += error;
            self.consecutive_violations += 1;
            log::warn!("credit audit: held {} expected {} (tick {})", held, expected, world.tick);
        }
        if self.cumulative_error > self.threshold {
            self.tripped = true;
        }

        AuditResult { balanced, held, expected, error, tripped: self.tripped }
    }

    pub fn reset(&mut self) {
        self.cumulative_error = Credits::ZERO;
        self.tripped = false;
        self.consecutive_violations = 0;
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

impl Default for CreditAudit {
    fn default() -> Self {
        Self::new(Credits(dec!(0.01)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use crate::config::SimConfig;

    #[test]
    fn fresh_world_is_balanced() {
        let world = bootstrap::default_world(&SimConfig::default());
        let mut audit = CreditAudit::default();
        let result = audit.verify(&world);
        assert!(result.balanced);
        assert_eq!(result.held, Credits::from_f64(10000.0));
        assert!(!result.tripped);
    }

    #[test]
    fn untracked_credit_trips_breaker() {
        let mut world = bootstrap::default_world(&SimConfig::default());
        world.player.credits += Credits(dec!(5));
        let mut audit = CreditAudit::default();
        let result = audit.verify(&world);
        assert!(!result.balanced);
        assert_eq!(result.error, Credits(dec!(5)));
        assert!(result.tripped);
        assert_eq!(audit.consecutive_violations, 1);

        audit.reset();
        assert!(!audit.is_tripped());
    }

    #[test]
    fn sub_tolerance_drift_is_balanced() {
        let mut world = bootstrap::default_world(&SimConfig::default());
        world.player.credits += Credits(dec!(0.00001));
        let mut audit = CreditAudit::default();
        assert!(audit.verify(&world).balanced);
    }
}
