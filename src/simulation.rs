// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Simulation Core

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use wasm_bindgen::prelude::*;

use crate::ai::{self, Decision};
use crate::audit::CreditAudit;
use crate::bootstrap;
use crate::config::SimConfig;
use crate::credits::Credits;
use crate::dispatch;
use crate::entropy::{self, RiskInputs};
use crate::error::{DispatchError, SnapshotError};
use crate::events::GameEvent;
use crate::ledger::{EntityRef, LedgerEntry, LedgerQuery};
use crate::pricing;
use crate::scheduler::TickTimer;
use crate::state::WorldState;
use crate::types::*;

/// Rejections kept for the host; older ones are dropped first.
pub const DIAGNOSTIC_CAPACITY: usize = 256;

/// A rejected event. Lives outside the world so rejections leave no trace in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub tick: u64,
    pub kind: String,
    pub reason: String,
}

// ─── RiftSimulation struct ───────────────────────────────────────────────────

#[wasm_bindgen]
pub struct RiftSimulation {
    pub(crate) world: WorldState,
    pub(crate) config: SimConfig,
    pub(crate) timer: TickTimer,
    pub(crate) audit: CreditAudit,
    pub(crate) diagnostics: VecDeque<Diagnostic>,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl RiftSimulation {
    /// The standard starting world under `config`.
    pub fn from_config(config: SimConfig) -> Self {
        let world = bootstrap::default_world(&config);
        Self::from_world(world, config)
    }

    pub fn from_world(world: WorldState, config: SimConfig) -> Self {
        let mut timer = TickTimer::new();
        timer.set_mode(world.time_mode, 0.0);
        Self {
            world,
            config,
            timer,
            audit: CreditAudit::default(),
            diagnostics: VecDeque::new(),
        }
    }

    pub fn from_snapshot(json: &str, config: SimConfig) -> Result<Self, SnapshotError> {
        Ok(Self::from_world(WorldState::from_json(json)?, config))
    }

    pub fn export_snapshot(&self) -> String {
        self.world.to_json()
    }

    /// Read-only view of the world.
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn query(&self, query: &LedgerQuery) -> Vec<&LedgerEntry> {
        self.world.ledger.query(query)
    }

    /// Submit an event through the dispatcher. Player actions, AI actions and
    /// arrivals all pass through here.
    pub fn submit(&mut self, event: GameEvent) -> Result<EventId, DispatchError> {
        dispatch::dispatch(&mut self.world, &event).map_err(|err| {
            let kind = event.blocked_kind();
            warn!("{}: {}", kind, err);
            if self.diagnostics.len() == DIAGNOSTIC_CAPACITY {
                self.diagnostics.pop_front();
            }
            self.diagnostics.push_back(Diagnostic { tick: self.world.tick, kind, reason: err.to_string() });
            err
        })
    }

    /// Host wake-up. Runs at most one tick, and only when one is due.
    pub fn poll_at(&mut self, now_ms: f64) -> Option<TickResult> {
        self.timer.set_mode(self.world.time_mode, now_ms);
        if !self.timer.take_due(now_ms) {
            return None;
        }
        let result = self.tick_core();
        self.timer.rearm(now_ms);
        Some(result)
    }

    /// One full tick regardless of time mode.
    pub fn advance_tick(&mut self) -> TickResult {
        self.tick_core()
    }

    pub fn run_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick_core();
        }
    }

    pub(crate) fn tick_core(&mut self) -> TickResult {
        self.world.tick += 1;
        let tick = self.world.tick;

        // 1. Markets forget
        for market in self.world.markets.values_mut() {
            pricing::decay(market);
        }

        // 2. Fleets move; arrivals dispatch ROUTE_ARRIVED
        let arrivals = self.advance_fleets();

        // 3. One decision per trader
        let (ai_actions, ai_skips) = self.run_ai_pass();

        // 4. Prices catch up with pressure
        let max_population = self.world.max_population();
        for (node_id, market) in self.world.markets.iter_mut() {
            if let Some(node) = self.world.nodes.get(node_id) {
                pricing::reprice(market, node, max_population);
            }
        }

        // 5. Pay out hauls at the refreshed prices
        let (settlements, settled_credits) = self.settle_profits();

        // 6. Summary and audit
        let summary = TickSummary {
            tick,
            arrivals,
            ai_actions,
            ai_skips,
            settlements,
            settled_credits,
            fleets_in_transit: self.world.fleets_in_transit() as u32,
        };
        self.world.push_log(
            "TICK",
            format!(
                "Tick {}: {} arrivals, {} AI actions, {} settled for {}",
                tick, arrivals, ai_actions, settlements, settled_credits
            ),
        );
        let audit = self.audit.verify(&self.world);
        debug!("tick {} done: {:?}", tick, summary);

        TickResult { summary, audit }
    }

    fn advance_fleets(&mut self) -> u32 {
        let moving: Vec<FleetId> = self
            .world
            .fleets
            .values()
            .filter(|f| f.status == FleetStatus::InTransit)
            .map(|f| f.id.clone())
            .collect();

        let mut arrivals = 0;
        for fleet_id in moving {
            let Some(fleet) = self.world.fleets.get(&fleet_id) else {
                continue;
            };
            let progress = (fleet.transit_elapsed + 1) as f64 / fleet.transit_total.max(1) as f64;
            let inputs = match &fleet.cargo {
                Some(cargo) => self.world.risk_inputs(fleet, cargo.commodity, cargo.quantity),
                None => self.world.risk_inputs(fleet, Commodity::Rations, 0),
            };
            let inputs = RiskInputs { progress: progress.min(1.0), ..inputs };
            let mitigation = self.world.fleet_mitigation(fleet);
            let params = &self.config.entropy;
            let effective = entropy::effective_risk(entropy::risk(&inputs, params), mitigation);
            let next_entropy = entropy::accrue(fleet.entropy, effective, params);

            let arrived = match self.world.fleets.get_mut(&fleet_id) {
                Some(fleet) => {
                    fleet.mitigation = mitigation;
                    fleet.entropy = next_entropy;
                    fleet.eta = fleet.eta.saturating_sub(1);
                    fleet.transit_elapsed += 1;
                    if fleet.eta == 0 {
                        fleet.status = FleetStatus::Arrived;
                    }
                    fleet.eta == 0
                }
                None => false,
            };
            if arrived && self.submit(GameEvent::RouteArrived { fleet_id }).is_ok() {
                arrivals += 1;
            }
        }
        arrivals
    }

    fn run_ai_pass(&mut self) -> (u32, u32) {
        if !self.config.ai_enabled {
            return (0, 0);
        }
        let traders: Vec<TraderId> = self.world.traders.keys().cloned().collect();
        let (mut acted, mut skipped) = (0, 0);
        for trader_id in traders {
            match ai::decide(&self.world, &trader_id, &self.config) {
                Decision::Act(best) => {
                    let action = best.candidate.action;
                    let key = best.candidate.key.clone();
                    match self.submit(best.candidate.event) {
                        Ok(_) => {
                            info!("AI {}: {} {} (score {:.3})", trader_id, action, key, best.score);
                            acted += 1;
                        }
                        Err(_) => skipped += 1,
                    }
                }
                Decision::Skip { best } => {
                    let message = match best {
                        Some(score) => format!("{} held position (best score {:.3})", trader_id, score),
                        None => format!("{} had no options", trader_id),
                    };
                    debug!("AI_SKIP: {}", message);
                    self.world.push_log("AI_SKIP", message);
                    skipped += 1;
                }
            }
        }
        (acted, skipped)
    }

    fn settle_profits(&mut self) -> (u32, Credits) {
        let pending = std::mem::take(&mut self.world.pending_settlements);
        let mut total = Credits::ZERO;
        let mut count = 0;
        for s in pending {
            // Markets are never removed, so the destination always prices.
            let arrival_price = self
                .world
                .price(&s.destination, s.commodity)
                .unwrap_or(s.dispatch_price);
            let delta = (arrival_price * (1.0 + s.cargo_efficiency_delta) - s.dispatch_price) * s.quantity as f64;
            let amount = Credits::from_f64(delta);
            dispatch::credit(&mut self.world, &s.owner, amount);
            total += amount;
            count += 1;

            let mut refs = vec![
                EntityRef::Fleet(s.fleet_id.clone()),
                EntityRef::Node(s.destination.clone()),
                EntityRef::Commodity(s.commodity),
            ];
            if let Actor::Trader(id) = &s.owner {
                refs.push(EntityRef::Trader(id.clone()));
            }
            self.world.push_log("SETTLEMENT", format!("{} settled {} for {}", s.fleet_id, amount, s.owner));
            self.world.record(
                "PROFIT_SETTLED",
                json!({
                    "fleet": s.fleet_id,
                    "owner": s.owner,
                    "destination": s.destination,
                    "commodity": s.commodity,
                    "quantity": s.quantity,
                    "dispatch_price": s.dispatch_price,
                    "arrival_price": arrival_price,
                    "cargo_efficiency_delta": s.cargo_efficiency_delta,
                    "arrival_tick": s.arrival_tick,
                    "amount": amount,
                }),
                refs,
            );
        }
        (count, total)
    }
}
