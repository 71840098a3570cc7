// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - World State Store
//
// The canonical snapshot. Only the dispatcher and the tick pipeline write to
// it; everything else sees `&WorldState` or a serialized copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::credits::Credits;
use crate::entropy::{self, RiskInputs};
use crate::error::SnapshotError;
use crate::ledger::{EntityRef, Ledger, LedgerEntry};
use crate::types::*;

/// Mitigation added to player fleets by Entropy Shielding.
pub const SHIELDING_MITIGATION: f64 = 0.1;

// ─── Id Sequences ────────────────────────────────────────────────────────────

/// Monotonic per-kind counters. A counter only advances when the id is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdSequences {
    pub node: u64,
    pub fleet: u64,
    pub observer: u64,
    pub trader: u64,
    pub event: u64,
    pub log: u64,
}

impl IdSequences {
    fn bump(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    pub fn next_node(&mut self) -> NodeId {
        NodeId(format!("NODE-{}", Self::bump(&mut self.node)))
    }

    pub fn next_fleet(&mut self) -> FleetId {
        FleetId(format!("FLEET-{}", Self::bump(&mut self.fleet)))
    }

    pub fn next_observer(&mut self) -> ObserverId {
        ObserverId(format!("OBS-{}", Self::bump(&mut self.observer)))
    }

    pub fn next_trader(&mut self) -> TraderId {
        TraderId(format!("TRADER-{}", Self::bump(&mut self.trader)))
    }

    pub fn next_event(&mut self) -> EventId {
        EventId(format!("EVT-{}", Self::bump(&mut self.event)))
    }

    pub fn next_log(&mut self) -> LogId {
        LogId(format!("LOG-{}", Self::bump(&mut self.log)))
    }
}

// ─── Credit Flow ─────────────────────────────────────────────────────────────

/// Running totals of every credit that entered or left a wallet.
///
/// `seeded + income − expenses` must always equal the sum of all wallets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditFlow {
    pub seeded: Credits,
    pub income: Credits,
    pub expenses: Credits,
}

impl CreditFlow {
    pub fn expected_balance(&self) -> Credits {
        self.seeded + self.income - self.expenses
    }
}

// ─── World State ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub tick: u64,
    pub time_mode: TimeMode,
    pub screen: Screen,
    pub nodes: BTreeMap<NodeId, Node>,
    pub routes: Vec<Route>,
    pub markets: BTreeMap<NodeId, Market>,
    pub fleets: BTreeMap<FleetId, Fleet>,
    pub observers: BTreeMap<ObserverId, Observer>,
    pub player: Wallet,
    pub traders: BTreeMap<TraderId, AiTrader>,
    pub governance: Governance,
    pub tech: TechState,
    pub ledger: Ledger,
    pub logs: Vec<LogLine>,
    pub pending_settlements: Vec<PendingSettlement>,
    pub ids: IdSequences,
    pub credit_flow: CreditFlow,
}

impl WorldState {
    // -- lookups -------------------------------------------------------------

    pub fn max_population(&self) -> u32 {
        self.nodes.values().map(|n| n.population).max().unwrap_or(0)
    }

    pub fn route_between(&self, from: &NodeId, to: &NodeId) -> Option<&Route> {
        self.routes.iter().find(|r| r.connects(from, to))
    }

    /// Directly connected nodes with their lane ETA, in route order.
    pub fn neighbours<'a>(&'a self, from: &'a NodeId) -> impl Iterator<Item = (&'a NodeId, u32)> + 'a {
        self.routes.iter().filter_map(move |r| r.other_end(from).map(|to| (to, r.eta)))
    }

    pub fn price(&self, node: &NodeId, commodity: Commodity) -> Option<f64> {
        self.markets.get(node).and_then(|m| m.price(commodity))
    }

    pub fn wallet(&self, actor: &Actor) -> Option<&Wallet> {
        match actor {
            Actor::Player => Some(&self.player),
            Actor::Trader(id) => self.traders.get(id).map(|t| &t.wallet),
        }
    }

    pub fn wallet_mut(&mut self, actor: &Actor) -> Option<&mut Wallet> {
        match actor {
            Actor::Player => Some(&mut self.player),
            Actor::Trader(id) => self.traders.get_mut(id).map(|t| &mut t.wallet),
        }
    }

    pub fn fleets_owned_by<'a>(&'a self, actor: &'a Actor) -> impl Iterator<Item = &'a Fleet> + 'a {
        self.fleets.values().filter(move |f| &f.owner == actor)
    }

    pub fn fleets_in_transit(&self) -> usize {
        self.fleets.values().filter(|f| f.status == FleetStatus::InTransit).count()
    }

    /// Credits held across the player and every trader.
    pub fn total_credits(&self) -> Credits {
        self.player.credits + self.traders.values().map(|t| t.wallet.credits).sum::<Credits>()
    }

    // -- transit risk --------------------------------------------------------

    /// Observers of the fleet's owner covering the fleet directly or its origin node.
    fn covering_observers<'a>(&'a self, fleet: &'a Fleet) -> impl Iterator<Item = &'a Observer> + 'a {
        self.observers.values().filter(move |o| {
            o.owner == fleet.owner
                && match &o.assignment {
                    ObserverAssignment::Fleet(id) => id == &fleet.id,
                    ObserverAssignment::Node(node) => node == &fleet.node_from,
                    ObserverAssignment::Unassigned => false,
                }
        })
    }

    pub fn observer_present(&self, fleet: &Fleet) -> bool {
        self.covering_observers(fleet).next().is_some()
    }

    /// Hull dampening plus observer bonus, each scaled by the fleet's own
    /// persistent penalties, capped to 1.
    pub fn fleet_mitigation(&self, fleet: &Fleet) -> f64 {
        let consequences = &fleet.consequences;
        let mut hull = fleet.vessel.dampening() * (1.0 + consequences.fleet_efficiency_delta);
        if fleet.owner == Actor::Player && self.tech.has(TechId::EntropyShielding) {
            hull += SHIELDING_MITIGATION;
        }
        let observers: f64 = self.covering_observers(fleet).map(|o| o.entropy_modifier_delta).sum();
        let observer_bonus = observers * (1.0 + consequences.observer_efficiency_delta);
        entropy::total_mitigation(hull, observer_bonus)
    }

    /// Risk inputs for `fleet` hauling `quantity` of `commodity` out of its
    /// current `node_from`. Progress is left at zero for the caller to fill.
    pub fn risk_inputs(&self, fleet: &Fleet, commodity: Commodity, quantity: u32) -> RiskInputs {
        let stability = self.nodes.get(&fleet.node_from).map(|n| n.stability_bias).unwrap_or(0.0);
        let capacity = fleet.vessel.capacity().max(1) as f64;
        RiskInputs {
            progress: 0.0,
            volatility: commodity.volatility().normalized(),
            load: quantity as f64 / capacity,
            instability: 1.0 - stability.clamp(0.0, 1.0),
            observer_absent: !self.observer_present(fleet),
        }
    }

    // -- append-only records -------------------------------------------------

    pub(crate) fn record(&mut self, event_type: &str, payload: Value, refs: Vec<EntityRef>) -> EventId {
        let id = self.ids.next_event();
        self.ledger.append(LedgerEntry {
            id: id.clone(),
            tick: self.tick,
            event_type: event_type.to_string(),
            payload,
            refs,
        });
        id
    }

    pub(crate) fn push_log(&mut self, kind: &str, message: String) {
        let id = self.ids.next_log();
        self.logs.push(LogLine { id, tick: self.tick, kind: kind.to_string(), message });
    }

    // -- snapshot boundary ---------------------------------------------------

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Restore a snapshot, rejecting one whose cross references do not resolve.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let world: WorldState = serde_json::from_str(json)?;
        world.check_references()?;
        Ok(world)
    }

    fn check_references(&self) -> Result<(), SnapshotError> {
        for route in &self.routes {
            if !self.nodes.contains_key(&route.a) || !self.nodes.contains_key(&route.b) {
                return Err(SnapshotError::Inconsistent(format!("route {}-{} has unknown endpoint", route.a, route.b)));
            }
        }
        for node in self.nodes.keys() {
            if !self.markets.contains_key(node) {
                return Err(SnapshotError::Inconsistent(format!("{} has no market", node)));
            }
        }
        for fleet in self.fleets.values() {
            if !self.nodes.contains_key(&fleet.node_from) || !self.nodes.contains_key(&fleet.node_to) {
                return Err(SnapshotError::Inconsistent(format!("{} references an unknown node", fleet.id)));
            }
            if self.wallet(&fleet.owner).is_none() {
                return Err(SnapshotError::Inconsistent(format!("{} has unknown owner {}", fleet.id, fleet.owner)));
            }
        }
        for trader in self.traders.values() {
            if let Some(missing) = trader.fleet_ids.iter().find(|f| !self.fleets.contains_key(f)) {
                return Err(SnapshotError::Inconsistent(format!("{} owns unknown {}", trader.id, missing)));
            }
        }
        let wallets = std::iter::once(&self.player).chain(self.traders.values().map(|t| &t.wallet));
        for wallet in wallets {
            if let Some(node) = wallet.holdings.keys().find(|n| !self.nodes.contains_key(n)) {
                return Err(SnapshotError::Inconsistent(format!("stock held at unknown {}", node)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;

    #[test]
    fn id_sequences_are_prefixed_and_monotonic() {
        let mut ids = IdSequences::default();
        assert_eq!(ids.next_fleet(), FleetId::from("FLEET-1"));
        assert_eq!(ids.next_fleet(), FleetId::from("FLEET-2"));
        assert_eq!(ids.next_event(), EventId::from("EVT-1"));
        assert_eq!(ids.next_log(), LogId::from("LOG-1"));
    }

    #[test]
    fn snapshot_round_trip_and_reference_check() {
        let world = bootstrap::default_world(&crate::config::SimConfig::default());
        let restored = WorldState::from_json(&world.to_json()).unwrap();
        assert_eq!(restored, world);

        let mut broken = world.clone();
        broken.markets.clear();
        assert!(matches!(
            WorldState::from_json(&broken.to_json()),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    #[test]
    fn observer_coverage_raises_mitigation() {
        let mut world = bootstrap::default_world(&crate::config::SimConfig::default());
        let fleet = world.fleets[&FleetId::from("FLEET-1")].clone();
        let covered = world.fleet_mitigation(&fleet);
        for o in world.observers.values_mut() {
            o.assignment = ObserverAssignment::Unassigned;
        }
        let bare = world.fleet_mitigation(&fleet);
        assert!(covered > bare);
        assert!((bare - fleet.vessel.dampening()).abs() < 1e-12);
        assert!(!world.observer_present(&fleet));
    }
}
