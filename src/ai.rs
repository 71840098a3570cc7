// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - AI Trader Decision Engine
//
// Each tick a trader enumerates every action open to it, scores the lot with
// fixed weights after min-max normalization, and submits the winner through
// the ordinary dispatcher. Nothing here mutates the world.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::SimConfig;
use crate::credits::Credits;
use crate::entropy;
use crate::dispatch::effect_bonus;
use crate::events::GameEvent;
use crate::pricing;
use crate::reversal;
use crate::state::WorldState;
use crate::types::*;

/// Credit value attributed to one unit of capacity per point of efficiency
/// restored by a reversal.
pub const REVERSAL_VALUE_PER_UNIT: f64 = 100.0;

// ─── Scoring Weights ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub profit: f64,
    pub eta: f64,
    pub entropy: f64,
    pub consequence: f64,
    pub cost: f64,
    pub utilization: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            profit: 1.0,
            eta: 0.5,
            entropy: 1.0,
            consequence: 1.5,
            cost: 1.0,
            utilization: 0.5,
        }
    }
}

// ─── Candidates ──────────────────────────────────────────────────────────────

/// Raw, unnormalized utility of one candidate action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Utility {
    pub projected_profit: f64,
    pub eta: f64,
    pub projected_entropy: f64,
    /// Change in the acting fleet's total consequence magnitude. Hauls add
    /// to it, reversals take it away.
    pub consequence_magnitude: f64,
    /// Credits committed: cargo value for a haul, the price of an order or
    /// reversal.
    pub credit_cost: f64,
    pub utilization: f64,
}

impl Utility {
    const DIMENSIONS: usize = 6;

    fn values(&self) -> [f64; Self::DIMENSIONS] {
        [
            self.projected_profit,
            self.eta,
            self.projected_entropy,
            self.consequence_magnitude,
            self.credit_cost,
            self.utilization,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Event type the candidate would submit; first tie-break key.
    pub action: &'static str,
    /// Stable identity within the action type; second tie-break key.
    pub key: String,
    pub event: GameEvent,
    pub utility: Utility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Act(ScoredCandidate),
    /// Nothing scored high enough; `best` is the top score if any candidate existed.
    Skip { best: Option<f64> },
}

/// Every action `trader_id` could take right now. Hauls and market orders
/// are only offered when they project a gain.
pub fn candidates(world: &WorldState, trader_id: &TraderId, config: &SimConfig) -> Vec<Candidate> {
    let Some(trader) = world.traders.get(trader_id) else {
        return Vec::new();
    };
    let actor = Actor::Trader(trader_id.clone());
    let mut out = Vec::new();

    let idle: Vec<&Fleet> = trader
        .fleet_ids
        .iter()
        .filter_map(|id| world.fleets.get(id))
        .filter(|f| f.owner == actor && f.is_idle())
        .collect();

    for fleet in &idle {
        dispatch_candidates(world, trader_id, fleet, config, &mut out);
        reversal_candidates(world, &actor, trader, fleet, config, &mut out);
    }
    order_candidates(world, trader_id, trader, config, &mut out);
    out
}

fn dispatch_candidates(
    world: &WorldState,
    trader_id: &TraderId,
    fleet: &Fleet,
    config: &SimConfig,
    out: &mut Vec<Candidate>,
) {
    let origin = &fleet.node_from;
    let capacity = fleet.vessel.capacity();
    let mitigation = world.fleet_mitigation(fleet);
    for (to, eta) in world.neighbours(origin) {
        for commodity in Commodity::ALL {
            let (Some(origin_price), Some(dest_price)) = (world.price(origin, commodity), world.price(to, commodity))
            else {
                continue;
            };
            let inputs = world.risk_inputs(fleet, commodity, capacity);
            let projected = entropy::project_transit(inputs, eta, mitigation, &config.entropy);
            let fresh = entropy::derive_consequences(projected);
            let after = entropy::merge_consequences(fleet.consequences, fresh);
            let qty = capacity as f64;
            let profit = (dest_price * (1.0 + after.cargo_efficiency_delta) - origin_price) * qty;
            if profit <= 0.0 {
                continue;
            }
            out.push(Candidate {
                action: "AI_DISPATCH_FLEET",
                key: format!("{}>{}:{:?}", fleet.id, to, commodity),
                event: GameEvent::AiDispatchFleet {
                    trader_id: trader_id.clone(),
                    fleet_id: fleet.id.clone(),
                    to: to.clone(),
                    commodity,
                    quantity: capacity,
                },
                utility: Utility {
                    projected_profit: profit,
                    eta: eta as f64,
                    projected_entropy: projected,
                    consequence_magnitude: after.magnitude() - fleet.consequences.magnitude(),
                    credit_cost: origin_price * qty,
                    utilization: 1.0,
                },
            });
        }
    }
}

fn reversal_candidates(
    world: &WorldState,
    actor: &Actor,
    trader: &AiTrader,
    fleet: &Fleet,
    config: &SimConfig,
    out: &mut Vec<Candidate>,
) {
    let Some(node) = fleet.docked_at().and_then(|id| world.nodes.get(id)) else {
        return;
    };
    for domain in ConsequenceDomain::ALL {
        let ee = entropy::entropy_equivalent(domain, fleet.consequences.get(domain));
        if ee <= config.ai_reversal_threshold || !node.has_structure(domain.required_structure()) {
            continue;
        }
        let Some(quote) = reversal::quote(&fleet.consequences, domain, effect_bonus(world, actor)) else {
            continue;
        };
        if trader.wallet.credits < quote.cost {
            continue;
        }
        let mut remaining = fleet.consequences;
        reversal::apply(&mut remaining, &quote);
        let restored = (quote.delta_after - quote.delta_before) * fleet.vessel.capacity() as f64 * REVERSAL_VALUE_PER_UNIT;
        out.push(Candidate {
            action: GameEvent::reversal(actor, fleet.id.clone(), domain).kind(),
            key: format!("{}:{:?}", fleet.id, domain),
            event: GameEvent::reversal(actor, fleet.id.clone(), domain),
            utility: Utility {
                projected_profit: restored,
                eta: 0.0,
                projected_entropy: 0.0,
                consequence_magnitude: remaining.magnitude() - fleet.consequences.magnitude(),
                credit_cost: quote.cost.to_f64(),
                utilization: 0.0,
            },
        });
    }
}

fn order_candidates(
    world: &WorldState,
    trader_id: &TraderId,
    trader: &AiTrader,
    config: &SimConfig,
    out: &mut Vec<Candidate>,
) {
    let buffer = Credits::from_f64(config.ai_credit_buffer);
    let order_qty = config.ai_order_quantity;
    if order_qty == 0 {
        return;
    }
    let max_population = world.max_population();
    for (node_id, market) in &world.markets {
        let Some(node) = world.nodes.get(node_id) else {
            continue;
        };
        let modifier = pricing::node_modifier(node, max_population);
        for (commodity, entry) in &market.entries {
            // Pressure decays away, so the resting price is what held stock is worth.
            let resting = pricing::resting_price(entry, modifier);

            let cost = Credits::from_f64(entry.price * order_qty as f64);
            let margin = (resting - entry.price) * order_qty as f64;
            if margin > 0.0 && trader.wallet.credits - cost >= buffer {
                out.push(Candidate {
                    action: "AI_BUY_ORDER",
                    key: format!("{}:{:?}", node_id, commodity),
                    event: GameEvent::AiBuyOrder {
                        trader_id: trader_id.clone(),
                        node_id: node_id.clone(),
                        commodity: *commodity,
                        quantity: order_qty,
                    },
                    utility: Utility {
                        projected_profit: margin,
                        credit_cost: cost.to_f64(),
                        ..Utility::default()
                    },
                });
            }

            let qty = trader.wallet.holding(node_id, *commodity).min(order_qty);
            let margin = (entry.price - resting) * qty as f64;
            if qty > 0 && margin > 0.0 {
                out.push(Candidate {
                    action: "AI_SELL_ORDER",
                    key: format!("{}:{:?}", node_id, commodity),
                    event: GameEvent::AiSellOrder {
                        trader_id: trader_id.clone(),
                        node_id: node_id.clone(),
                        commodity: *commodity,
                        quantity: qty,
                    },
                    utility: Utility { projected_profit: margin, ..Utility::default() },
                });
            }
        }
    }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Min-max normalize one dimension. A flat dimension maps to 1 when its
/// shared value is positive and 0 otherwise.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if !range.is_finite() || range <= f64::EPSILON {
        return if max > 0.0 { 1.0 } else { 0.0 };
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

fn combine(n: &[f64; Utility::DIMENSIONS], w: &ScoringWeights) -> f64 {
    n[0] * w.profit - n[1] * w.eta - n[2] * w.entropy - n[3] * w.consequence - n[4] * w.cost
        + n[5] * w.utilization
}

/// Score every candidate against the others in the same set.
pub fn score(candidates: Vec<Candidate>, weights: &ScoringWeights) -> Vec<ScoredCandidate> {
    let mut min = [f64::INFINITY; Utility::DIMENSIONS];
    let mut max = [f64::NEG_INFINITY; Utility::DIMENSIONS];
    for c in &candidates {
        for (i, v) in c.utility.values().iter().enumerate() {
            min[i] = min[i].min(*v);
            max[i] = max[i].max(*v);
        }
    }
    candidates
        .into_iter()
        .map(|candidate| {
            let raw = candidate.utility.values();
            let mut n = [0.0; Utility::DIMENSIONS];
            for i in 0..Utility::DIMENSIONS {
                n[i] = normalize(raw[i], min[i], max[i]);
            }
            let score = combine(&n, weights);
            ScoredCandidate { candidate, score: if score.is_nan() { f64::NEG_INFINITY } else { score } }
        })
        .collect()
}

/// Highest score wins; equal scores fall back to (action, key) ascending.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.action.cmp(b.candidate.action))
        .then_with(|| a.candidate.key.cmp(&b.candidate.key))
}

pub fn select(scored: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
    scored.into_iter().min_by(rank)
}

/// Full decision for one trader this tick.
pub fn decide(world: &WorldState, trader_id: &TraderId, config: &SimConfig) -> Decision {
    let scored = score(candidates(world, trader_id, config), &config.scoring);
    match select(scored) {
        Some(best) if best.score >= config.ai_min_action_score => Decision::Act(best),
        Some(best) => Decision::Skip { best: Some(best.score) },
        None => Decision::Skip { best: None },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;

    fn trader() -> TraderId {
        TraderId::from("TRADER-1")
    }

    fn candidate(action: &'static str, key: &str, utility: Utility) -> Candidate {
        Candidate {
            action,
            key: key.to_string(),
            event: GameEvent::Navigate { screen: Screen::Overview },
            utility,
        }
    }

    #[test]
    fn normalization_handles_flat_dimensions() {
        assert_eq!(normalize(5.0, 5.0, 5.0), 1.0);
        assert_eq!(normalize(0.0, 0.0, 0.0), 0.0);
        assert_eq!(normalize(-2.0, -2.0, -2.0), 0.0);
        assert_eq!(normalize(3.0, 1.0, 5.0), 0.5);
    }

    #[test]
    fn weights_favour_profit_and_penalize_risk() {
        let safe = candidate("AI_DISPATCH_FLEET", "a", Utility {
            projected_profit: 100.0,
            eta: 3.0,
            utilization: 1.0,
            ..Utility::default()
        });
        let risky = candidate("AI_DISPATCH_FLEET", "b", Utility {
            projected_profit: 110.0,
            eta: 14.0,
            projected_entropy: 0.5,
            consequence_magnitude: 0.6,
            utilization: 1.0,
            ..Utility::default()
        });
        let best = select(score(vec![risky, safe], &ScoringWeights::default())).unwrap();
        assert_eq!(best.candidate.key, "a");
    }

    #[test]
    fn ties_break_on_action_then_key() {
        let u = Utility { projected_profit: 10.0, ..Utility::default() };
        let scored = score(
            vec![
                candidate("AI_SELL_ORDER", "a", u),
                candidate("AI_BUY_ORDER", "z", u),
                candidate("AI_BUY_ORDER", "b", u),
            ],
            &ScoringWeights::default(),
        );
        let best = select(scored).unwrap();
        assert_eq!((best.candidate.action, best.candidate.key.as_str()), ("AI_BUY_ORDER", "b"));
    }

    /// Depress or inflate every price at `n` as if orders had just landed there.
    fn press(world: &mut WorldState, n: &str, demand: f64, supply: f64) {
        let id = NodeId::from(n);
        let max_population = world.max_population();
        let node = world.nodes[&id].clone();
        let market = world.markets.get_mut(&id).unwrap();
        for entry in market.entries.values_mut() {
            entry.demand_pressure = demand;
            entry.supply_pressure = supply;
        }
        pricing::reprice(market, &node, max_population);
    }

    #[test]
    fn candidates_only_offer_gains() {
        let world = bootstrap::default_world(&SimConfig::default());
        let all = candidates(&world, &trader(), &SimConfig::default());
        let dispatches: Vec<_> = all.iter().filter(|c| c.action == "AI_DISPATCH_FLEET").collect();
        // FLEET-4 and FLEET-5 have 3 lanes each; only profitable pairs survive.
        assert!(!dispatches.is_empty());
        assert!(dispatches.len() < 6 * Commodity::ALL.len());
        for c in &dispatches {
            assert!(c.utility.projected_profit > 0.0);
            assert!(c.utility.credit_cost > 0.0, "cargo value is committed");
            assert!(c.utility.projected_entropy < entropy::ENTROPY_CAP);
        }
        // Every market rests at its natural price, so no order pays.
        assert!(!all.iter().any(|c| c.action == "AI_BUY_ORDER" || c.action == "AI_SELL_ORDER"));
    }

    #[test]
    fn buy_orders_need_a_dip_and_respect_credit_buffer() {
        let mut world = bootstrap::default_world(&SimConfig::default());
        press(&mut world, "NODE-1", 0.0, 0.5);
        world.traders.get_mut(&trader()).unwrap().wallet.credits = Credits::from_f64(800.0);
        let all = candidates(&world, &trader(), &SimConfig::default());
        let buys: Vec<_> = all.iter().filter(|c| c.action == "AI_BUY_ORDER").collect();
        assert!(!buys.is_empty());
        for c in &buys {
            assert!(matches!(&c.event, GameEvent::AiBuyOrder { node_id, .. } if node_id.0 == "NODE-1"));
            assert!(c.utility.projected_profit > 0.0);
            assert!(800.0 - c.utility.credit_cost >= 500.0);
        }
        assert!(!buys.iter().any(|c| matches!(
            c.event,
            GameEvent::AiBuyOrder { commodity: Commodity::RiftShards, .. }
        )));
    }

    #[test]
    fn sell_orders_only_where_stock_is_held() {
        let mut world = bootstrap::default_world(&SimConfig::default());
        press(&mut world, "NODE-2", 0.5, 0.0);
        press(&mut world, "NODE-3", 0.5, 0.0);
        world
            .traders
            .get_mut(&trader())
            .unwrap()
            .wallet
            .stash(&NodeId::from("NODE-2"), Commodity::Alloys, 4);
        let all = candidates(&world, &trader(), &SimConfig::default());
        let sells: Vec<_> = all.iter().filter(|c| c.action == "AI_SELL_ORDER").collect();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].key, "NODE-2:Alloys");
        assert!(matches!(sells[0].event, GameEvent::AiSellOrder { quantity: 4, .. }));
    }

    #[test]
    fn idle_trader_hauls_on_an_open_map() {
        let world = bootstrap::default_world(&SimConfig::default());
        match decide(&world, &trader(), &SimConfig::default()) {
            Decision::Act(best) => assert_eq!(best.candidate.action, "AI_DISPATCH_FLEET"),
            other => panic!("expected a haul, got {:?}", other),
        }
    }

    #[test]
    fn reversal_candidate_appears_with_structure() {
        let mut world = bootstrap::default_world(&SimConfig::default());
        // FLEET-5 docks at Dustreach, which has a cargo stabilizer.
        world.fleets.get_mut(&FleetId::from("FLEET-5")).unwrap().consequences = entropy::derive_consequences(0.5);
        let all = candidates(&world, &trader(), &SimConfig::default());
        let reversals: Vec<_> = all.iter().filter(|c| c.action.starts_with("AI_REVERSE")).collect();
        assert_eq!(reversals.len(), 1);
        assert_eq!(reversals[0].action, "AI_REVERSE_CARGO");
        assert!(reversals[0].utility.projected_profit > 0.0);
        assert!(reversals[0].utility.consequence_magnitude < 0.0);
    }

    #[test]
    fn decision_is_deterministic() {
        let world = bootstrap::default_world(&SimConfig::default());
        let config = SimConfig::default();
        let first = decide(&world, &trader(), &config);
        for _ in 0..5 {
            assert_eq!(decide(&world.clone(), &trader(), &config), first);
        }
    }

    #[test]
    fn unknown_trader_skips() {
        let world = bootstrap::default_world(&SimConfig::default());
        let d = decide(&world, &TraderId::from("TRADER-7"), &SimConfig::default());
        assert_eq!(d, Decision::Skip { best: None });
    }
}
