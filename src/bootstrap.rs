// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - World Bootstrap
//
// Seeds the starting map, the player's assets and the rival trader. The
// `add_*` helpers are also the supported way to assemble custom worlds.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::SimConfig;
use crate::credits::Credits;
use crate::pricing;
use crate::state::WorldState;
use crate::types::*;

/// Static description of a node to seed.
#[derive(Debug, Clone, Copy)]
pub struct NodeSeed {
    pub name: &'static str,
    pub class: NodeClass,
    pub x: f64,
    pub y: f64,
    pub stability: f64,
    pub population: u32,
    pub political_weight: f64,
    pub seats: u32,
    pub structures: &'static [StructureKind],
}

const NODES: [NodeSeed; 6] = [
    NodeSeed {
        name: "Helios Prime",
        class: NodeClass::Core,
        x: 0.0,
        y: 0.0,
        stability: 0.9,
        population: 9000,
        political_weight: 1.0,
        seats: 6,
        structures: &[StructureKind::CargoStabilizer, StructureKind::ObserverAnchor],
    },
    NodeSeed {
        name: "Forge Kestrel",
        class: NodeClass::Industrial,
        x: 3.0,
        y: -1.0,
        stability: 0.7,
        population: 5000,
        political_weight: 0.7,
        seats: 4,
        structures: &[StructureKind::HullRecalibrator],
    },
    NodeSeed {
        name: "Lumen Array",
        class: NodeClass::Research,
        x: 3.0,
        y: 2.0,
        stability: 0.75,
        population: 2500,
        political_weight: 0.6,
        seats: 4,
        structures: &[],
    },
    NodeSeed {
        name: "Dustreach",
        class: NodeClass::Frontier,
        x: 6.0,
        y: 1.0,
        stability: 0.45,
        population: 1200,
        political_weight: 0.4,
        seats: 3,
        structures: &[StructureKind::CargoStabilizer],
    },
    NodeSeed {
        name: "Vigil Spur",
        class: NodeClass::Frontier,
        x: 6.0,
        y: -3.0,
        stability: 0.55,
        population: 1800,
        political_weight: 0.3,
        seats: 2,
        structures: &[],
    },
    NodeSeed {
        name: "Rift Maw",
        class: NodeClass::RiftEdge,
        x: 9.0,
        y: -1.0,
        stability: 0.22,
        population: 400,
        political_weight: 0.2,
        seats: 2,
        structures: &[],
    },
];

/// Lanes as (node index, node index, eta). The 1-6 lane is the long haul.
const ROUTES: [(usize, usize, u32); 8] = [
    (0, 1, 3),
    (0, 2, 3),
    (1, 3, 4),
    (2, 3, 4),
    (3, 5, 5),
    (1, 4, 4),
    (4, 5, 5),
    (0, 5, 14),
];

const PLAYER_OBSERVER_DELTA: f64 = 0.15;
const TRADER_OBSERVER_DELTA: f64 = 0.15;

/// The standard starting world.
pub fn default_world(config: &SimConfig) -> WorldState {
    let mut world = WorldState::default();
    world.player = Wallet::new(Credits::ZERO);
    deposit(&mut world, &Actor::Player, Credits::from_f64(config.player_credits));

    let ids: Vec<NodeId> = NODES.iter().map(|seed| add_node(&mut world, seed)).collect();
    for (a, b, eta) in ROUTES {
        add_route(&mut world, &ids[a], &ids[b], eta);
    }
    open_markets(&mut world);

    let player = Actor::Player;
    add_fleet(&mut world, &player, VesselClass::Hauler, &ids[0]);
    add_fleet(&mut world, &player, VesselClass::ContainmentFrigate, &ids[5]);
    add_fleet(&mut world, &player, VesselClass::Courier, &ids[1]);

    let vex = Actor::Trader(add_trader(&mut world, "Syndicate Vex", Credits::from_f64(config.ai_credits)));
    add_fleet(&mut world, &vex, VesselClass::Hauler, &ids[1]);
    let frigate = add_fleet(&mut world, &vex, VesselClass::ContainmentFrigate, &ids[3]);

    add_observer(&mut world, &player, ObserverAssignment::Node(ids[0].clone()), PLAYER_OBSERVER_DELTA);
    add_observer(&mut world, &vex, ObserverAssignment::Fleet(frigate), TRADER_OBSERVER_DELTA);
    add_observer(&mut world, &player, ObserverAssignment::Unassigned, PLAYER_OBSERVER_DELTA);

    log::debug!(
        "bootstrap: {} nodes, {} routes, {} fleets, {} traders",
        world.nodes.len(),
        world.routes.len(),
        world.fleets.len(),
        world.traders.len()
    );
    world
}

/// An empty world holding only a player wallet.
pub fn empty_world(player_credits: Credits) -> WorldState {
    let mut world = WorldState::default();
    deposit(&mut world, &Actor::Player, player_credits);
    world
}

pub fn add_node(world: &mut WorldState, seed: &NodeSeed) -> NodeId {
    let id = world.ids.next_node();
    world.nodes.insert(
        id.clone(),
        Node {
            id: id.clone(),
            name: seed.name.to_string(),
            class: seed.class,
            x: seed.x,
            y: seed.y,
            stability_bias: seed.stability.clamp(0.0, 1.0),
            population: seed.population,
            political_weight: seed.political_weight,
            governance_seats: seed.seats,
            structures: seed.structures.iter().copied().collect::<BTreeSet<_>>(),
        },
    );
    id
}

pub fn add_route(world: &mut WorldState, a: &NodeId, b: &NodeId, eta: u32) {
    world.routes.push(Route { a: a.clone(), b: b.clone(), eta: eta.max(1) });
}

/// Create a market for every node that lacks one and price it.
pub fn open_markets(world: &mut WorldState) {
    let max_population = world.max_population();
    for node in world.nodes.values() {
        if world.markets.contains_key(&node.id) {
            continue;
        }
        let entries: BTreeMap<Commodity, MarketEntry> = Commodity::ALL
            .iter()
            .map(|c| (*c, pricing::new_entry(*c, node, max_population)))
            .collect();
        world.markets.insert(node.id.clone(), Market { node_id: node.id.clone(), entries });
    }
}

/// An idle, empty fleet docked at `at`.
pub fn add_fleet(world: &mut WorldState, owner: &Actor, vessel: VesselClass, at: &NodeId) -> FleetId {
    let id = world.ids.next_fleet();
    world.fleets.insert(id.clone(), idle_fleet(id.clone(), owner.clone(), vessel, at.clone()));
    if let Actor::Trader(trader_id) = owner {
        if let Some(trader) = world.traders.get_mut(trader_id) {
            trader.fleet_ids.push(id.clone());
        }
    }
    id
}

pub(crate) fn idle_fleet(id: FleetId, owner: Actor, vessel: VesselClass, at: NodeId) -> Fleet {
    Fleet {
        id,
        owner,
        vessel,
        node_from: at.clone(),
        node_to: at,
        status: FleetStatus::Idle,
        eta: 0,
        transit_total: 0,
        transit_elapsed: 0,
        cargo: None,
        entropy: 0.0,
        mitigation: vessel.dampening(),
        consequences: EntropyConsequences::default(),
    }
}

pub fn add_observer(world: &mut WorldState, owner: &Actor, assignment: ObserverAssignment, delta: f64) -> ObserverId {
    let id = world.ids.next_observer();
    world.observers.insert(
        id.clone(),
        Observer { id: id.clone(), owner: owner.clone(), assignment, entropy_modifier_delta: delta.max(0.0) },
    );
    if let Actor::Trader(trader_id) = owner {
        if let Some(trader) = world.traders.get_mut(trader_id) {
            trader.observer_ids.push(id.clone());
        }
    }
    id
}

pub fn add_trader(world: &mut WorldState, name: &str, credits: Credits) -> TraderId {
    let id = world.ids.next_trader();
    world.traders.insert(
        id.clone(),
        AiTrader {
            id: id.clone(),
            name: name.to_string(),
            wallet: Wallet::new(Credits::ZERO),
            fleet_ids: Vec::new(),
            observer_ids: Vec::new(),
        },
    );
    deposit(world, &Actor::Trader(id.clone()), credits);
    id
}

/// Starting balance, counted as seeded credit.
fn deposit(world: &mut WorldState, actor: &Actor, credits: Credits) {
    if let Some(wallet) = world.wallet_mut(actor) {
        wallet.credits += credits;
        world.credit_flow.seeded += credits;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_world_layout() {
        let world = default_world(&SimConfig::default());
        assert_eq!(world.nodes.len(), 6);
        assert_eq!(world.markets.len(), 6);
        assert_eq!(world.fleets.len(), 5);
        assert_eq!(world.traders.len(), 1);
        assert_eq!(world.total_credits(), world.credit_flow.expected_balance());

        let trader = &world.traders[&TraderId::from("TRADER-1")];
        assert_eq!(trader.fleet_ids, vec![FleetId::from("FLEET-4"), FleetId::from("FLEET-5")]);
        assert_eq!(trader.observer_ids, vec![ObserverId::from("OBS-2")]);
    }

    #[test]
    fn every_market_starts_within_bounds() {
        let world = default_world(&SimConfig::default());
        for market in world.markets.values() {
            for entry in market.entries.values() {
                assert!(entry.price >= entry.baseline * pricing::PRICE_FLOOR_RATIO);
                assert!(entry.price <= entry.baseline * pricing::PRICE_CEILING_RATIO);
            }
        }
    }

    #[test]
    fn long_haul_lane_links_rift_to_core() {
        let world = default_world(&SimConfig::default());
        let route = world.route_between(&NodeId::from("NODE-6"), &NodeId::from("NODE-1")).unwrap();
        assert_eq!(route.eta, 14);
        let rift = &world.nodes[&NodeId::from("NODE-6")];
        assert_eq!(rift.class, NodeClass::RiftEdge);
        assert_eq!(rift.stability_bias, 0.22);
    }
}
