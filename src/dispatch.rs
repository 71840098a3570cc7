// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Event Dispatcher
//
// The single mutation path. Every handler validates against the current world
// first and only then mutates, so a rejected event leaves no trace.

use log::{debug, info};
use rust_decimal_macros::dec;
use serde_json::json;

use crate::bootstrap::idle_fleet;
use crate::credits::Credits;
use crate::entropy;
use crate::error::DispatchError;
use crate::events::GameEvent;
use crate::ledger::EntityRef;
use crate::pricing;
use crate::reversal;
use crate::state::WorldState;
use crate::types::*;

/// Price of one governance seat.
pub const SEAT_PRICE: Credits = Credits(dec!(250));
/// Stability gained by a node per seat bought there.
pub const SEAT_STABILITY_GAIN: f64 = 0.02;
/// Extra reversal effect fraction from Reversal Catalysts.
pub const CATALYST_EFFECT_BONUS: f64 = 0.1;
/// Ticks shaved off every player lane by Logistics Drives.
pub const LOGISTICS_ETA_REDUCTION: u32 = 1;

/// Validate and apply one event.
pub fn dispatch(world: &mut WorldState, event: &GameEvent) -> Result<EventId, DispatchError> {
    let kind = event.kind();
    match event {
        GameEvent::SetTimeMode { mode } => {
            world.time_mode = *mode;
            Ok(world.record(kind, json!({ "mode": mode }), Vec::new()))
        }
        GameEvent::Navigate { screen } => {
            world.screen = *screen;
            Ok(world.record(kind, json!({ "screen": screen }), Vec::new()))
        }
        GameEvent::EstablishRoute { a, b, eta } => establish_route(world, a, b, *eta),
        GameEvent::DispatchFleet { fleet_id, vessel, from, to, commodity, quantity } => {
            let hull = match fleet_id {
                Some(id) => Hull::Existing(id.clone()),
                None => Hull::Commission(vessel.unwrap_or(VesselClass::Hauler)),
            };
            let shipment = Shipment {
                hull,
                from: from.clone(),
                to: to.clone(),
                commodity: *commodity,
                quantity: *quantity,
            };
            dispatch_fleet(world, kind, &Actor::Player, shipment)
        }
        GameEvent::AiDispatchFleet { trader_id, fleet_id, to, commodity, quantity } => {
            let actor = trader_actor(world, trader_id)?;
            let from = world
                .fleets
                .get(fleet_id)
                .map(|f| f.node_from.clone())
                .ok_or_else(|| DispatchError::UnknownFleet(fleet_id.clone()))?;
            let shipment = Shipment {
                hull: Hull::Existing(fleet_id.clone()),
                from,
                to: to.clone(),
                commodity: *commodity,
                quantity: *quantity,
            };
            dispatch_fleet(world, kind, &actor, shipment)
        }
        GameEvent::PlaceBuyOrder { node_id, commodity, quantity } => {
            buy(world, kind, &Actor::Player, node_id, *commodity, *quantity)
        }
        GameEvent::PlaceSellOrder { node_id, commodity, quantity } => {
            sell(world, kind, &Actor::Player, node_id, *commodity, *quantity)
        }
        GameEvent::AiBuyOrder { trader_id, node_id, commodity, quantity } => {
            let actor = trader_actor(world, trader_id)?;
            buy(world, kind, &actor, node_id, *commodity, *quantity)
        }
        GameEvent::AiSellOrder { trader_id, node_id, commodity, quantity } => {
            let actor = trader_actor(world, trader_id)?;
            sell(world, kind, &actor, node_id, *commodity, *quantity)
        }
        GameEvent::BuildStructure { node_id, structure } => build_structure(world, node_id, *structure),
        GameEvent::AssignObserver { observer_id, assignment } => {
            assign_observer(world, kind, &Actor::Player, observer_id, assignment)
        }
        GameEvent::AiAssignObserver { trader_id, observer_id, assignment } => {
            let actor = trader_actor(world, trader_id)?;
            assign_observer(world, kind, &actor, observer_id, assignment)
        }
        GameEvent::RerouteFleet { fleet_id, to } => reroute_fleet(world, fleet_id, to),
        GameEvent::RouteArrived { fleet_id } => route_arrived(world, fleet_id),
        GameEvent::ReverseCargo { fleet_id } => {
            reverse(world, kind, &Actor::Player, fleet_id, ConsequenceDomain::Cargo)
        }
        GameEvent::ReverseFleet { fleet_id } => {
            reverse(world, kind, &Actor::Player, fleet_id, ConsequenceDomain::Fleet)
        }
        GameEvent::ReverseObserver { fleet_id } => {
            reverse(world, kind, &Actor::Player, fleet_id, ConsequenceDomain::Observer)
        }
        GameEvent::AiReverseCargo { trader_id, fleet_id } => {
            let actor = trader_actor(world, trader_id)?;
            reverse(world, kind, &actor, fleet_id, ConsequenceDomain::Cargo)
        }
        GameEvent::AiReverseFleet { trader_id, fleet_id } => {
            let actor = trader_actor(world, trader_id)?;
            reverse(world, kind, &actor, fleet_id, ConsequenceDomain::Fleet)
        }
        GameEvent::AiReverseObserver { trader_id, fleet_id } => {
            let actor = trader_actor(world, trader_id)?;
            reverse(world, kind, &actor, fleet_id, ConsequenceDomain::Observer)
        }
        GameEvent::ResearchTech { tech } => research_tech(world, *tech),
        GameEvent::InvestGovernance { node_id } => invest_governance(world, node_id),
    }
}

// ─── Shared checks ───────────────────────────────────────────────────────────

fn trader_actor(world: &WorldState, id: &TraderId) -> Result<Actor, DispatchError> {
    if world.traders.contains_key(id) {
        Ok(Actor::Trader(id.clone()))
    } else {
        Err(DispatchError::UnknownTrader(id.clone()))
    }
}

fn ensure_node(world: &WorldState, id: &NodeId) -> Result<(), DispatchError> {
    if world.nodes.contains_key(id) {
        Ok(())
    } else {
        Err(DispatchError::UnknownNode(id.clone()))
    }
}

fn ensure_owner(actor: &Actor, owner: &Actor, entity: &dyn std::fmt::Display) -> Result<(), DispatchError> {
    if actor == owner {
        Ok(())
    } else {
        Err(DispatchError::NotOwner { entity: entity.to_string() })
    }
}

fn ensure_funds(world: &WorldState, actor: &Actor, needed: Credits) -> Result<(), DispatchError> {
    let available = world.wallet(actor).map(|w| w.credits).unwrap_or(Credits::ZERO);
    if available >= needed {
        Ok(())
    } else {
        Err(DispatchError::InsufficientCredits { needed, available })
    }
}

fn debit(world: &mut WorldState, actor: &Actor, amount: Credits) {
    if let Some(wallet) = world.wallet_mut(actor) {
        wallet.credits -= amount;
        world.credit_flow.expenses += amount;
    }
}

/// Signed: a losing haul settles as negative income.
pub(crate) fn credit(world: &mut WorldState, actor: &Actor, amount: Credits) {
    if let Some(wallet) = world.wallet_mut(actor) {
        wallet.credits += amount;
        world.credit_flow.income += amount;
    }
}

fn market_entry<'a>(world: &'a mut WorldState, node: &NodeId, commodity: Commodity) -> Option<&'a mut MarketEntry> {
    world.markets.get_mut(node).and_then(|m| m.entries.get_mut(&commodity))
}

/// Lane ETA after the actor's tech.
fn lane_eta(world: &WorldState, actor: &Actor, eta: u32) -> u32 {
    if *actor == Actor::Player && world.tech.has(TechId::LogisticsDrives) {
        eta.saturating_sub(LOGISTICS_ETA_REDUCTION).max(1)
    } else {
        eta.max(1)
    }
}

fn actor_ref(actor: &Actor) -> Option<EntityRef> {
    match actor {
        Actor::Player => None,
        Actor::Trader(id) => Some(EntityRef::Trader(id.clone())),
    }
}

// ─── Routes ──────────────────────────────────────────────────────────────────

fn establish_route(world: &mut WorldState, a: &NodeId, b: &NodeId, eta: u32) -> Result<EventId, DispatchError> {
    ensure_node(world, a)?;
    ensure_node(world, b)?;
    if a == b || eta == 0 {
        return Err(DispatchError::InvalidRoute);
    }
    if world.route_between(a, b).is_some() {
        return Err(DispatchError::RouteExists(a.clone(), b.clone()));
    }

    world.routes.push(Route { a: a.clone(), b: b.clone(), eta });
    world.push_log("ROUTE", format!("Lane {} <-> {} opened ({} ticks)", a, b, eta));
    Ok(world.record(
        "ESTABLISH_ROUTE",
        json!({ "a": a, "b": b, "eta": eta }),
        vec![EntityRef::Node(a.clone()), EntityRef::Node(b.clone())],
    ))
}

// ─── Fleet dispatch ──────────────────────────────────────────────────────────

enum Hull {
    Existing(FleetId),
    Commission(VesselClass),
}

struct Shipment {
    hull: Hull,
    from: NodeId,
    to: NodeId,
    commodity: Commodity,
    quantity: u32,
}

fn dispatch_fleet(world: &mut WorldState, kind: &str, actor: &Actor, order: Shipment) -> Result<EventId, DispatchError> {
    ensure_node(world, &order.from)?;
    ensure_node(world, &order.to)?;
    if order.quantity == 0 {
        return Err(DispatchError::InvalidQuantity);
    }

    let existing = match &order.hull {
        Hull::Existing(id) => {
            let fleet = world.fleets.get(id).ok_or_else(|| DispatchError::UnknownFleet(id.clone()))?;
            ensure_owner(actor, &fleet.owner, id)?;
            if !fleet.is_idle() {
                return Err(DispatchError::FleetNotIdle(id.clone()));
            }
            if fleet.node_from != order.from {
                return Err(DispatchError::FleetNotDocked { fleet: id.clone(), node: order.from.clone() });
            }
            Some(fleet.clone())
        }
        Hull::Commission(_) => None,
    };
    let vessel = match (&existing, &order.hull) {
        (Some(fleet), _) => fleet.vessel,
        (None, Hull::Commission(vessel)) => *vessel,
        (None, Hull::Existing(id)) => return Err(DispatchError::UnknownFleet(id.clone())),
    };
    if order.quantity > vessel.capacity() {
        return Err(DispatchError::CargoExceedsCapacity { quantity: order.quantity, capacity: vessel.capacity() });
    }
    let route_eta = world
        .route_between(&order.from, &order.to)
        .map(|r| r.eta)
        .ok_or_else(|| DispatchError::NoRoute { from: order.from.clone(), to: order.to.clone() })?;
    let eta = lane_eta(world, actor, route_eta);
    let dispatch_price = world
        .price(&order.from, order.commodity)
        .ok_or_else(|| DispatchError::UnknownNode(order.from.clone()))?;
    let commission_cost = if existing.is_none() { Some(vessel.commission_cost()) } else { None };
    if let Some(cost) = commission_cost {
        ensure_funds(world, actor, cost)?;
    }

    // -- mutate --
    let mut fleet = match existing {
        Some(fleet) => fleet,
        None => {
            let id = world.ids.next_fleet();
            idle_fleet(id, actor.clone(), vessel, order.from.clone())
        }
    };
    if let Some(cost) = commission_cost {
        debit(world, actor, cost);
        if let Actor::Trader(trader_id) = actor {
            if let Some(trader) = world.traders.get_mut(trader_id) {
                trader.fleet_ids.push(fleet.id.clone());
            }
        }
    }
    fleet.node_to = order.to.clone();
    fleet.status = FleetStatus::InTransit;
    fleet.eta = eta;
    fleet.transit_total = eta;
    fleet.transit_elapsed = 0;
    fleet.entropy = 0.0;
    fleet.cargo = Some(Cargo { commodity: order.commodity, quantity: order.quantity, dispatch_price });
    fleet.mitigation = world.fleet_mitigation(&fleet);
    let fleet_id = fleet.id.clone();
    let mitigation = fleet.mitigation;
    world.fleets.insert(fleet_id.clone(), fleet);

    if let Some(entry) = market_entry(world, &order.from, order.commodity) {
        pricing::apply_buy(entry);
    }

    info!(
        "{}: {} {} x{} {:?} {} -> {} eta {}",
        kind, actor, fleet_id, order.quantity, order.commodity, order.from, order.to, eta
    );
    world.push_log(
        "DISPATCH",
        format!("{} sent {} with {} {:?} to {}", actor, fleet_id, order.quantity, order.commodity, order.to),
    );
    let mut refs = vec![
        EntityRef::Fleet(fleet_id.clone()),
        EntityRef::Node(order.from.clone()),
        EntityRef::Node(order.to.clone()),
        EntityRef::Commodity(order.commodity),
    ];
    refs.extend(actor_ref(actor));
    Ok(world.record(
        kind,
        json!({
            "fleet": fleet_id,
            "owner": actor,
            "vessel": vessel,
            "from": order.from,
            "to": order.to,
            "commodity": order.commodity,
            "quantity": order.quantity,
            "dispatch_price": dispatch_price,
            "eta": eta,
            "mitigation": mitigation,
            "commission_cost": commission_cost,
        }),
        refs,
    ))
}

fn reroute_fleet(world: &mut WorldState, fleet_id: &FleetId, to: &NodeId) -> Result<EventId, DispatchError> {
    ensure_node(world, to)?;
    let fleet = world.fleets.get(fleet_id).ok_or_else(|| DispatchError::UnknownFleet(fleet_id.clone()))?;
    ensure_owner(&Actor::Player, &fleet.owner, fleet_id)?;
    if fleet.status != FleetStatus::InTransit {
        return Err(DispatchError::FleetNotInTransit(fleet_id.clone()));
    }
    if &fleet.node_to == to {
        return Err(DispatchError::AlreadyBound(fleet_id.clone()));
    }
    let from = fleet.node_from.clone();
    let previous = fleet.node_to.clone();
    let elapsed = fleet.transit_elapsed;
    let route_eta = world
        .route_between(&from, to)
        .map(|r| r.eta)
        .ok_or_else(|| DispatchError::NoRoute { from: from.clone(), to: to.clone() })?;
    let eta = lane_eta(world, &Actor::Player, route_eta).saturating_sub(elapsed).max(1);

    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        fleet.node_to = to.clone();
        fleet.eta = eta;
        fleet.transit_total = elapsed + eta;
    }
    info!("REROUTE_FLEET: {} {} -> {} eta {}", fleet_id, previous, to, eta);
    world.push_log("REROUTE", format!("{} diverted from {} to {}", fleet_id, previous, to));
    Ok(world.record(
        "REROUTE_FLEET",
        json!({ "fleet": fleet_id, "from": from, "previous": previous, "to": to, "eta": eta }),
        vec![
            EntityRef::Fleet(fleet_id.clone()),
            EntityRef::Node(previous),
            EntityRef::Node(to.clone()),
        ],
    ))
}

/// Resolve consequences, queue the settlement and dock the fleet.
fn route_arrived(world: &mut WorldState, fleet_id: &FleetId) -> Result<EventId, DispatchError> {
    let fleet = world.fleets.get(fleet_id).ok_or_else(|| DispatchError::UnknownFleet(fleet_id.clone()))?;
    if fleet.status != FleetStatus::Arrived {
        return Err(DispatchError::FleetNotArrived(fleet_id.clone()));
    }
    let arrival_entropy = fleet.entropy;
    let fresh = entropy::derive_consequences(arrival_entropy);
    let consequences = entropy::merge_consequences(fleet.consequences, fresh);
    let owner = fleet.owner.clone();
    let origin = fleet.node_from.clone();
    let destination = fleet.node_to.clone();
    let cargo = fleet.cargo.clone();

    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        fleet.consequences = consequences;
        fleet.node_from = destination.clone();
        fleet.status = FleetStatus::Idle;
        fleet.eta = 0;
        fleet.transit_total = 0;
        fleet.transit_elapsed = 0;
        fleet.cargo = None;
        fleet.entropy = 0.0;
    }

    let mut refs = vec![
        EntityRef::Fleet(fleet_id.clone()),
        EntityRef::Node(origin.clone()),
        EntityRef::Node(destination.clone()),
    ];
    if let Some(cargo) = &cargo {
        world.pending_settlements.push(PendingSettlement {
            fleet_id: fleet_id.clone(),
            owner: owner.clone(),
            destination: destination.clone(),
            commodity: cargo.commodity,
            quantity: cargo.quantity,
            dispatch_price: cargo.dispatch_price,
            cargo_efficiency_delta: consequences.cargo_efficiency_delta,
            arrival_tick: world.tick,
        });
        if let Some(entry) = market_entry(world, &destination, cargo.commodity) {
            pricing::apply_sell(entry);
        }
        refs.push(EntityRef::Commodity(cargo.commodity));
    }
    refs.extend(actor_ref(&owner));

    debug!("ROUTE_ARRIVED: {} at {} entropy {:.4}", fleet_id, destination, arrival_entropy);
    world.push_log(
        "ARRIVAL",
        format!("{} reached {} (entropy {:.3})", fleet_id, destination, arrival_entropy),
    );
    Ok(world.record(
        "ROUTE_ARRIVED",
        json!({
            "fleet": fleet_id,
            "owner": owner,
            "from": origin,
            "to": destination,
            "entropy": arrival_entropy,
            "fresh": fresh,
            "consequences": consequences,
            "cargo": cargo,
        }),
        refs,
    ))
}

// ─── Market orders ───────────────────────────────────────────────────────────

fn buy(
    world: &mut WorldState,
    kind: &str,
    actor: &Actor,
    node_id: &NodeId,
    commodity: Commodity,
    quantity: u32,
) -> Result<EventId, DispatchError> {
    ensure_node(world, node_id)?;
    if quantity == 0 {
        return Err(DispatchError::InvalidQuantity);
    }
    let price = world.price(node_id, commodity).ok_or_else(|| DispatchError::UnknownNode(node_id.clone()))?;
    let cost = Credits::from_f64(price * quantity as f64);
    ensure_funds(world, actor, cost)?;

    debit(world, actor, cost);
    if let Some(wallet) = world.wallet_mut(actor) {
        wallet.stash(node_id, commodity, quantity);
    }
    if let Some(entry) = market_entry(world, node_id, commodity) {
        pricing::apply_buy(entry);
    }
    info!("{}: {} bought {} {:?} at {} for {}", kind, actor, quantity, commodity, node_id, cost);
    world.push_log("MARKET", format!("{} bought {} {:?} at {}", actor, quantity, commodity, node_id));
    let mut refs = vec![EntityRef::Node(node_id.clone()), EntityRef::Commodity(commodity)];
    refs.extend(actor_ref(actor));
    Ok(world.record(
        kind,
        json!({ "actor": actor, "node": node_id, "commodity": commodity, "quantity": quantity, "price": price, "cost": cost }),
        refs,
    ))
}

fn sell(
    world: &mut WorldState,
    kind: &str,
    actor: &Actor,
    node_id: &NodeId,
    commodity: Commodity,
    quantity: u32,
) -> Result<EventId, DispatchError> {
    ensure_node(world, node_id)?;
    if quantity == 0 {
        return Err(DispatchError::InvalidQuantity);
    }
    let available = world.wallet(actor).map(|w| w.holding(node_id, commodity)).unwrap_or(0);
    if available < quantity {
        return Err(DispatchError::InsufficientHoldings {
            node: node_id.clone(),
            commodity,
            needed: quantity,
            available,
        });
    }
    let price = world.price(node_id, commodity).ok_or_else(|| DispatchError::UnknownNode(node_id.clone()))?;
    let proceeds = Credits::from_f64(price * quantity as f64);

    if let Some(wallet) = world.wallet_mut(actor) {
        wallet.withdraw(node_id, commodity, quantity);
    }
    credit(world, actor, proceeds);
    if let Some(entry) = market_entry(world, node_id, commodity) {
        pricing::apply_sell(entry);
    }
    info!("{}: {} sold {} {:?} at {} for {}", kind, actor, quantity, commodity, node_id, proceeds);
    world.push_log("MARKET", format!("{} sold {} {:?} at {}", actor, quantity, commodity, node_id));
    let mut refs = vec![EntityRef::Node(node_id.clone()), EntityRef::Commodity(commodity)];
    refs.extend(actor_ref(actor));
    Ok(world.record(
        kind,
        json!({ "actor": actor, "node": node_id, "commodity": commodity, "quantity": quantity, "price": price, "proceeds": proceeds }),
        refs,
    ))
}

// ─── Structures & observers ──────────────────────────────────────────────────

fn build_structure(world: &mut WorldState, node_id: &NodeId, structure: StructureKind) -> Result<EventId, DispatchError> {
    let node = world.nodes.get(node_id).ok_or_else(|| DispatchError::UnknownNode(node_id.clone()))?;
    if node.has_structure(structure) {
        return Err(DispatchError::StructureExists { node: node_id.clone(), structure });
    }
    let cost = structure.build_cost();
    ensure_funds(world, &Actor::Player, cost)?;

    debit(world, &Actor::Player, cost);
    if let Some(node) = world.nodes.get_mut(node_id) {
        node.structures.insert(structure);
    }
    info!("BUILD_STRUCTURE: {:?} at {} for {}", structure, node_id, cost);
    world.push_log("BUILD", format!("{:?} commissioned at {}", structure, node_id));
    Ok(world.record(
        "BUILD_STRUCTURE",
        json!({ "node": node_id, "structure": structure, "cost": cost }),
        vec![EntityRef::Node(node_id.clone())],
    ))
}

fn assign_observer(
    world: &mut WorldState,
    kind: &str,
    actor: &Actor,
    observer_id: &ObserverId,
    assignment: &ObserverAssignment,
) -> Result<EventId, DispatchError> {
    let observer = world
        .observers
        .get(observer_id)
        .ok_or_else(|| DispatchError::UnknownObserver(observer_id.clone()))?;
    ensure_owner(actor, &observer.owner, observer_id)?;
    let mut refs = vec![EntityRef::Observer(observer_id.clone())];
    match assignment {
        ObserverAssignment::Node(node) => {
            ensure_node(world, node)?;
            refs.push(EntityRef::Node(node.clone()));
        }
        ObserverAssignment::Fleet(fleet_id) => {
            let fleet = world.fleets.get(fleet_id).ok_or_else(|| DispatchError::UnknownFleet(fleet_id.clone()))?;
            ensure_owner(actor, &fleet.owner, fleet_id)?;
            refs.push(EntityRef::Fleet(fleet_id.clone()));
        }
        ObserverAssignment::Unassigned => {}
    }
    refs.extend(actor_ref(actor));

    if let Some(observer) = world.observers.get_mut(observer_id) {
        observer.assignment = assignment.clone();
    }
    info!("{}: {} -> {:?}", kind, observer_id, assignment);
    Ok(world.record(kind, json!({ "observer": observer_id, "assignment": assignment }), refs))
}

// ─── Reversals ───────────────────────────────────────────────────────────────

fn reverse(
    world: &mut WorldState,
    kind: &str,
    actor: &Actor,
    fleet_id: &FleetId,
    domain: ConsequenceDomain,
) -> Result<EventId, DispatchError> {
    let fleet = world.fleets.get(fleet_id).ok_or_else(|| DispatchError::UnknownFleet(fleet_id.clone()))?;
    ensure_owner(actor, &fleet.owner, fleet_id)?;
    let node_id = fleet.docked_at().cloned().ok_or_else(|| DispatchError::FleetNotIdle(fleet_id.clone()))?;
    let structure = domain.required_structure();
    let has_structure = world.nodes.get(&node_id).map(|n| n.has_structure(structure)).unwrap_or(false);
    if !has_structure {
        return Err(DispatchError::MissingStructure { node: node_id, structure });
    }
    let quote = reversal::quote(&fleet.consequences, domain, effect_bonus(world, actor))
        .ok_or_else(|| DispatchError::NothingToReverse { fleet: fleet_id.clone(), domain })?;
    ensure_funds(world, actor, quote.cost)?;

    debit(world, actor, quote.cost);
    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        reversal::apply(&mut fleet.consequences, &quote);
    }
    info!(
        "{}: {} {:?} {:.4} -> {:.4} for {}",
        kind, fleet_id, domain, quote.delta_before, quote.delta_after, quote.cost
    );
    world.push_log("REVERSAL", format!("{} restored {:?} efficiency on {}", actor, domain, fleet_id));
    let mut refs = vec![EntityRef::Fleet(fleet_id.clone()), EntityRef::Node(node_id.clone())];
    refs.extend(actor_ref(actor));
    Ok(world.record(
        kind,
        json!({
            "fleet": fleet_id,
            "node": node_id,
            "domain": domain,
            "entropy_before": quote.entropy_before,
            "entropy_after": quote.entropy_after,
            "delta_before": quote.delta_before,
            "delta_after": quote.delta_after,
            "cost": quote.cost,
        }),
        refs,
    ))
}

/// Effect-fraction bonus an actor enjoys on reversals.
pub fn effect_bonus(world: &WorldState, actor: &Actor) -> f64 {
    if *actor == Actor::Player && world.tech.has(TechId::ReversalCatalysts) {
        CATALYST_EFFECT_BONUS
    } else {
        0.0
    }
}

// ─── Tech & governance ───────────────────────────────────────────────────────

fn research_tech(world: &mut WorldState, tech: TechId) -> Result<EventId, DispatchError> {
    if world.tech.has(tech) {
        return Err(DispatchError::AlreadyResearched(tech));
    }
    let cost = tech.research_cost();
    ensure_funds(world, &Actor::Player, cost)?;

    debit(world, &Actor::Player, cost);
    world.tech.researched.insert(tech);
    info!("RESEARCH_TECH: {:?} for {}", tech, cost);
    world.push_log("RESEARCH", format!("{:?} researched", tech));
    Ok(world.record("RESEARCH_TECH", json!({ "tech": tech, "cost": cost }), Vec::new()))
}

fn invest_governance(world: &mut WorldState, node_id: &NodeId) -> Result<EventId, DispatchError> {
    let node = world.nodes.get(node_id).ok_or_else(|| DispatchError::UnknownNode(node_id.clone()))?;
    let held = world.governance.seats.get(node_id).copied().unwrap_or(0);
    if held >= node.governance_seats {
        return Err(DispatchError::NoSeatsAvailable(node_id.clone()));
    }
    ensure_funds(world, &Actor::Player, SEAT_PRICE)?;

    debit(world, &Actor::Player, SEAT_PRICE);
    world.governance.seats.insert(node_id.clone(), held + 1);
    world.governance.total_invested += SEAT_PRICE;
    let mut stability = 0.0;
    if let Some(node) = world.nodes.get_mut(node_id) {
        node.stability_bias = (node.stability_bias + SEAT_STABILITY_GAIN).clamp(0.0, 1.0);
        stability = node.stability_bias;
    }
    info!("INVEST_GOVERNANCE: seat {} at {} (stability {:.2})", held + 1, node_id, stability);
    world.push_log("GOVERNANCE", format!("Seat {} secured at {}", held + 1, node_id));
    Ok(world.record(
        "INVEST_GOVERNANCE",
        json!({ "node": node_id, "seats": held + 1, "cost": SEAT_PRICE, "stability": stability }),
        vec![EntityRef::Node(node_id.clone())],
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use crate::config::SimConfig;

    fn world() -> WorldState {
        bootstrap::default_world(&SimConfig::default())
    }

    fn node(n: u32) -> NodeId {
        NodeId(format!("NODE-{}", n))
    }

    fn fleet(n: u32) -> FleetId {
        FleetId(format!("FLEET-{}", n))
    }

    fn send(fleet_id: Option<FleetId>, from: u32, to: u32, commodity: Commodity, quantity: u32) -> GameEvent {
        GameEvent::DispatchFleet { fleet_id, vessel: None, from: node(from), to: node(to), commodity, quantity }
    }

    #[test]
    fn dispatch_puts_fleet_in_transit_and_pressures_origin() {
        let mut w = world();
        let before = w.markets[&node(1)].entries[&Commodity::Rations].demand_pressure;
        dispatch(&mut w, &send(Some(fleet(1)), 1, 2, Commodity::Rations, 10)).unwrap();

        let f = &w.fleets[&fleet(1)];
        assert_eq!(f.status, FleetStatus::InTransit);
        assert_eq!(f.eta, 3);
        assert_eq!(f.node_to, node(2));
        assert_eq!(f.cargo.as_ref().unwrap().quantity, 10);
        let after = w.markets[&node(1)].entries[&Commodity::Rations].demand_pressure;
        assert!((after - before - pricing::BUY_PRESSURE_DELTA).abs() < 1e-12);
        assert_eq!(w.ledger.last().unwrap().event_type, "DISPATCH_FLEET");
    }

    #[test]
    fn rejected_events_leave_world_untouched() {
        let mut w = world();
        let snapshot = w.to_json();
        let cases = vec![
            send(Some(fleet(1)), 1, 2, Commodity::Rations, 101),
            send(Some(fleet(1)), 1, 4, Commodity::Rations, 10),
            send(Some(fleet(4)), 2, 1, Commodity::Rations, 10),
            send(Some(fleet(99)), 1, 2, Commodity::Rations, 10),
            send(None, 1, 2, Commodity::Rations, 0),
            GameEvent::ReverseCargo { fleet_id: fleet(1) },
            GameEvent::PlaceSellOrder { node_id: node(1), commodity: Commodity::Relics, quantity: 1 },
            GameEvent::BuildStructure { node_id: node(1), structure: StructureKind::CargoStabilizer },
            GameEvent::AiBuyOrder {
                trader_id: TraderId::from("TRADER-9"),
                node_id: node(1),
                commodity: Commodity::Alloys,
                quantity: 1,
            },
            GameEvent::RouteArrived { fleet_id: fleet(1) },
            GameEvent::EstablishRoute { a: node(1), b: node(2), eta: 2 },
        ];
        for event in cases {
            assert!(dispatch(&mut w, &event).is_err(), "{:?} should be rejected", event.kind());
            assert_eq!(w.to_json(), snapshot);
        }
    }

    #[test]
    fn over_capacity_reports_capacity() {
        let mut w = world();
        let err = dispatch(&mut w, &send(Some(fleet(3)), 2, 1, Commodity::Alloys, 21)).unwrap_err();
        assert_eq!(err, DispatchError::CargoExceedsCapacity { quantity: 21, capacity: 20 });
    }

    #[test]
    fn commission_creates_and_charges_new_fleet() {
        let mut w = world();
        let credits = w.player.credits;
        dispatch(&mut w, &send(None, 3, 4, Commodity::DataCores, 40)).unwrap();
        let new_id = fleet(6);
        let f = &w.fleets[&new_id];
        assert_eq!(f.vessel, VesselClass::Hauler);
        assert_eq!(f.owner, Actor::Player);
        assert_eq!(w.player.credits, credits - VesselClass::Hauler.commission_cost());
    }

    #[test]
    fn buy_then_sell_moves_holdings_and_credits() {
        let mut w = world();
        let start = w.player.credits;
        dispatch(&mut w, &GameEvent::PlaceBuyOrder { node_id: node(2), commodity: Commodity::Alloys, quantity: 5 }).unwrap();
        assert_eq!(w.player.holding(&node(2), Commodity::Alloys), 5);
        assert!(w.player.credits < start);
        dispatch(&mut w, &GameEvent::PlaceSellOrder { node_id: node(2), commodity: Commodity::Alloys, quantity: 5 }).unwrap();
        assert_eq!(w.player.holding(&node(2), Commodity::Alloys), 0);
        assert!(w.player.holdings.is_empty());
        assert_eq!(w.total_credits(), w.credit_flow.expected_balance());
    }

    #[test]
    fn stock_can_only_be_sold_where_it_was_bought() {
        let mut w = world();
        dispatch(&mut w, &GameEvent::PlaceBuyOrder { node_id: node(4), commodity: Commodity::Rations, quantity: 20 }).unwrap();
        let snapshot = w.to_json();

        let elsewhere = GameEvent::PlaceSellOrder { node_id: node(1), commodity: Commodity::Rations, quantity: 20 };
        assert_eq!(
            dispatch(&mut w, &elsewhere),
            Err(DispatchError::InsufficientHoldings {
                node: node(1),
                commodity: Commodity::Rations,
                needed: 20,
                available: 0,
            })
        );
        assert_eq!(w.to_json(), snapshot);

        dispatch(&mut w, &GameEvent::PlaceSellOrder { node_id: node(4), commodity: Commodity::Rations, quantity: 20 }).unwrap();
        assert_eq!(w.player.holding(&node(4), Commodity::Rations), 0);
    }

    #[test]
    fn arrival_resets_fleet_and_queues_settlement() {
        let mut w = world();
        dispatch(&mut w, &send(Some(fleet(2)), 6, 1, Commodity::RiftShards, 50)).unwrap();
        {
            let f = w.fleets.get_mut(&fleet(2)).unwrap();
            f.entropy = 0.4;
            f.eta = 0;
            f.status = FleetStatus::Arrived;
        }
        dispatch(&mut w, &GameEvent::RouteArrived { fleet_id: fleet(2) }).unwrap();
        let f = &w.fleets[&fleet(2)];
        assert_eq!(f.status, FleetStatus::Idle);
        assert_eq!(f.node_from, node(1));
        assert_eq!(f.entropy, 0.0);
        assert!(f.cargo.is_none());
        assert!(f.consequences.cargo_efficiency_delta < 0.0);
        assert_eq!(w.pending_settlements.len(), 1);
        assert_eq!(w.pending_settlements[0].quantity, 50);
    }

    #[test]
    fn reversal_requires_structure_at_dock() {
        let mut w = world();
        w.fleets.get_mut(&fleet(3)).unwrap().consequences = entropy::derive_consequences(0.5);
        // Forge Kestrel has a hull recalibrator only.
        let err = dispatch(&mut w, &GameEvent::ReverseCargo { fleet_id: fleet(3) }).unwrap_err();
        assert!(matches!(err, DispatchError::MissingStructure { .. }));
        let before = w.fleets[&fleet(3)].consequences.fleet_efficiency_delta;
        dispatch(&mut w, &GameEvent::ReverseFleet { fleet_id: fleet(3) }).unwrap();
        let after = w.fleets[&fleet(3)].consequences.fleet_efficiency_delta;
        assert!(after.abs() < before.abs());
        assert_eq!(w.total_credits(), w.credit_flow.expected_balance());
    }

    #[test]
    fn observer_assignment_checks_ownership() {
        let mut w = world();
        let theirs = GameEvent::AssignObserver {
            observer_id: ObserverId::from("OBS-2"),
            assignment: ObserverAssignment::Node(node(1)),
        };
        assert!(matches!(dispatch(&mut w, &theirs), Err(DispatchError::NotOwner { .. })));
        let onto_rival = GameEvent::AssignObserver {
            observer_id: ObserverId::from("OBS-3"),
            assignment: ObserverAssignment::Fleet(fleet(4)),
        };
        assert!(matches!(dispatch(&mut w, &onto_rival), Err(DispatchError::NotOwner { .. })));
        let ok = GameEvent::AssignObserver {
            observer_id: ObserverId::from("OBS-3"),
            assignment: ObserverAssignment::Fleet(fleet(2)),
        };
        dispatch(&mut w, &ok).unwrap();
        assert_eq!(w.observers[&ObserverId::from("OBS-3")].assignment, ObserverAssignment::Fleet(fleet(2)));
    }

    #[test]
    fn reroute_needs_lane_from_origin() {
        let mut w = world();
        dispatch(&mut w, &send(Some(fleet(1)), 1, 2, Commodity::Rations, 10)).unwrap();
        w.fleets.get_mut(&fleet(1)).unwrap().transit_elapsed = 1;
        let blocked = GameEvent::RerouteFleet { fleet_id: fleet(1), to: node(4) };
        assert!(matches!(dispatch(&mut w, &blocked), Err(DispatchError::NoRoute { .. })));
        dispatch(&mut w, &GameEvent::RerouteFleet { fleet_id: fleet(1), to: node(3) }).unwrap();
        let f = &w.fleets[&fleet(1)];
        assert_eq!(f.node_to, node(3));
        assert_eq!(f.eta, 2);
        assert_eq!(f.transit_total, 3);
    }

    #[test]
    fn tech_and_governance() {
        let mut w = world();
        dispatch(&mut w, &GameEvent::ResearchTech { tech: TechId::LogisticsDrives }).unwrap();
        assert!(matches!(
            dispatch(&mut w, &GameEvent::ResearchTech { tech: TechId::LogisticsDrives }),
            Err(DispatchError::AlreadyResearched(_))
        ));
        dispatch(&mut w, &send(Some(fleet(1)), 1, 2, Commodity::Rations, 10)).unwrap();
        assert_eq!(w.fleets[&fleet(1)].eta, 2);

        let stability = w.nodes[&node(6)].stability_bias;
        dispatch(&mut w, &GameEvent::InvestGovernance { node_id: node(6) }).unwrap();
        dispatch(&mut w, &GameEvent::InvestGovernance { node_id: node(6) }).unwrap();
        assert!(matches!(
            dispatch(&mut w, &GameEvent::InvestGovernance { node_id: node(6) }),
            Err(DispatchError::NoSeatsAvailable(_))
        ));
        assert!((w.nodes[&node(6)].stability_bias - stability - 2.0 * SEAT_STABILITY_GAIN).abs() < 1e-12);
        assert_eq!(w.governance.total_invested, Credits(dec!(500)));
    }
}
