// Monte Carlo Infrastructure - N runs per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N, computing mean ± 95% CI

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rift_engine::entropy::ENTROPY_CAP;
use rift_engine::pricing::{PRICE_CEILING_RATIO, PRICE_FLOOR_RATIO};
use rift_engine::*;

use crate::intents::IntentGenerator;
use crate::report::*;
use crate::scenarios::{Clock, Scenario};

use std::collections::BTreeMap;
use std::time::Instant;

const EPSILON: f64 = 1e-9;
/// Wakes without a tick before a timer run is declared stalled.
const MAX_IDLE_WAKES: u32 = 1000;

// ─── Per-Tick Invariant Checks ──────────────────────────────────────────────

#[derive(Default)]
struct InvariantTracker {
    price_breaches: u32,
    entropy_breaches: u32,
    capacity_breaches: u32,
    peak_entropy: f64,
    /// Entropy and elapsed transit ticks per moving fleet at the last check.
    transit: BTreeMap<FleetId, (f64, u32)>,
}

impl InvariantTracker {
    fn check(&mut self, world: &WorldState) {
        for market in world.markets.values() {
            for entry in market.entries.values() {
                let floor = entry.baseline * PRICE_FLOOR_RATIO - EPSILON;
                let ceiling = entry.baseline * PRICE_CEILING_RATIO + EPSILON;
                if !(floor..=ceiling).contains(&entry.price) {
                    self.price_breaches += 1;
                }
            }
        }

        let mut transit = BTreeMap::new();
        for fleet in world.fleets.values() {
            self.peak_entropy = self.peak_entropy.max(fleet.entropy);
            if fleet.entropy < 0.0 || fleet.entropy > ENTROPY_CAP + EPSILON {
                self.entropy_breaches += 1;
            }
            if let Some(cargo) = &fleet.cargo {
                if cargo.quantity > fleet.vessel.capacity() {
                    self.capacity_breaches += 1;
                }
            }
            if fleet.status != FleetStatus::InTransit {
                continue;
            }
            // Same transit, one or more ticks on: entropy may only grow.
            if let Some(&(prev_entropy, prev_elapsed)) = self.transit.get(&fleet.id) {
                if fleet.transit_elapsed > prev_elapsed && fleet.entropy + EPSILON < prev_entropy {
                    self.entropy_breaches += 1;
                }
            }
            transit.insert(fleet.id.clone(), (fleet.entropy, fleet.transit_elapsed));
        }
        self.transit = transit;
    }
}

// ─── Single Run ─────────────────────────────────────────────────────────────

/// Run a single scenario iteration with a specific seed.
pub fn run_single(scenario: &Scenario, seed: u64) -> BenchResult {
    let start = Instant::now();
    let mut sim = RiftSimulation::from_config((scenario.config)());

    let rng = ChaCha8Rng::seed_from_u64(seed);
    let mut intents = IntentGenerator::new(rng, scenario.mix);
    let mut tracker = InvariantTracker::default();

    let (mut accepted, mut rejected) = (0u32, 0u32);
    let (mut arrivals, mut settlements, mut ai_actions, mut ai_skips) = (0u32, 0u32, 0u32, 0u32);
    let mut settled_credits = 0.0_f64;
    let mut max_audit_error = 0.0_f64;
    let mut audit_balanced = true;
    let mut stalled = false;

    let mut now_ms = 0.0_f64;
    if let Clock::Timer { mode, .. } = scenario.clock {
        if sim.submit(GameEvent::SetTimeMode { mode }).is_err() {
            stalled = true;
        }
    }

    let mut ticks_run = 0u64;
    while ticks_run < scenario.ticks && !stalled {
        for event in intents.generate_tick(sim.world(), scenario.intent_rate) {
            match sim.submit(event) {
                Ok(_) => accepted += 1,
                Err(_) => rejected += 1,
            }
        }

        let result = match scenario.clock {
            Clock::Manual => Some(sim.advance_tick()),
            Clock::Timer { wake_ms, .. } => {
                let mut fired = None;
                for _ in 0..MAX_IDLE_WAKES {
                    now_ms += wake_ms;
                    fired = sim.poll_at(now_ms);
                    if fired.is_some() {
                        break;
                    }
                }
                fired
            }
        };
        let Some(result) = result else {
            log::error!("{} seed {}: timer stalled at tick {}", scenario.name, seed, ticks_run);
            stalled = true;
            break;
        };
        ticks_run += 1;

        let summary = &result.summary;
        arrivals += summary.arrivals;
        settlements += summary.settlements;
        ai_actions += summary.ai_actions;
        ai_skips += summary.ai_skips;
        settled_credits += summary.settled_credits.to_f64();
        max_audit_error = max_audit_error.max(result.audit.error.to_f64());
        audit_balanced &= result.audit.balanced;

        tracker.check(sim.world());
    }

    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis();
    let elapsed_secs = elapsed.as_secs_f64().max(0.001);

    let world = sim.world();
    let final_ai_credits: f64 = world.traders.values().map(|t| t.wallet.credits.to_f64()).sum();

    // Evaluate pass/fail
    let criteria = &scenario.criteria;
    let mut pass = !stalled && ticks_run == scenario.ticks;
    if criteria.require_balanced_audit && !audit_balanced {
        pass = false;
    }
    if criteria.require_price_bounds && tracker.price_breaches > 0 {
        pass = false;
    }
    if criteria.require_entropy_bounds && tracker.entropy_breaches > 0 {
        pass = false;
    }
    if criteria.require_capacity && tracker.capacity_breaches > 0 {
        pass = false;
    }
    if let Some(min) = criteria.min_settlements {
        if settlements < min {
            pass = false;
        }
    }
    if let Some(min) = criteria.min_rejections {
        if rejected < min {
            pass = false;
        }
    }

    BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        ticks: ticks_run,
        intents: intents.generated,
        accepted,
        rejected,
        arrivals,
        settlements,
        ai_actions,
        ai_skips,
        settled_credits,
        final_player_credits: world.player.credits.to_f64(),
        final_ai_credits,
        max_audit_error,
        audit_balanced,
        price_breaches: tracker.price_breaches,
        entropy_breaches: tracker.entropy_breaches,
        capacity_breaches: tracker.capacity_breaches,
        peak_entropy: tracker.peak_entropy,
        ledger_entries: world.ledger.len(),
        elapsed_ms,
        ticks_per_sec: ticks_run as f64 / elapsed_secs,
    }
}

// ─── Aggregation ────────────────────────────────────────────────────────────

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(scenario: &Scenario, n_runs: usize, base_seed: u64) -> MonteCarloReport {
    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        results.push(run_single(scenario, seed));
    }
    aggregate(scenario, results)
}

fn stats_of(results: &[BenchResult], metric: impl Fn(&BenchResult) -> f64) -> Stats {
    Stats::from_samples(&results.iter().map(metric).collect::<Vec<_>>())
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n == 0 { 0.0 } else { passed as f64 / n as f64 };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate,
        settlements: stats_of(&results, |r| r.settlements as f64),
        rejected: stats_of(&results, |r| r.rejected as f64),
        ai_actions: stats_of(&results, |r| r.ai_actions as f64),
        settled_credits: stats_of(&results, |r| r.settled_credits),
        final_player_credits: stats_of(&results, |r| r.final_player_credits),
        peak_entropy: stats_of(&results, |r| r.peak_entropy),
        max_audit_error: stats_of(&results, |r| r.max_audit_error),
        elapsed_ms: stats_of(&results, |r| r.elapsed_ms as f64),
        ticks_per_sec: stats_of(&results, |r| r.ticks_per_sec),
        individual_runs: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::scenarios;

    #[test]
    fn same_seed_same_outcome() {
        let all = scenarios();
        let baseline = all.iter().find(|s| s.name == "RIFT_BASELINE").unwrap();
        let a = run_single(baseline, 11);
        let b = run_single(baseline, 11);
        assert_eq!(a.settlements, b.settlements);
        assert_eq!(a.rejected, b.rejected);
        assert_eq!(a.final_player_credits, b.final_player_credits);
        assert_eq!(a.ledger_entries, b.ledger_entries);
    }

    #[test]
    fn fast_clock_reaches_tick_target() {
        let all = scenarios();
        let fast = all.iter().find(|s| s.name == "RIFT_FAST_CLOCK").unwrap();
        let result = run_single(fast, 0);
        assert_eq!(result.ticks, fast.ticks);
        assert!(result.audit_balanced);
    }
}
