// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Game Events
//
// The closed set of intents the dispatcher accepts. Player and AI variants are
// kept distinct so the ledger records who acted; both run through the same
// validation and mutation paths.

use serde::{Deserialize, Serialize};

use crate::types::{
    Actor, Commodity, ConsequenceDomain, FleetId, NodeId, ObserverAssignment, ObserverId, Screen,
    StructureKind, TechId, TimeMode, TraderId, VesselClass,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    SetTimeMode {
        mode: TimeMode,
    },
    Navigate {
        screen: Screen,
    },
    EstablishRoute {
        a: NodeId,
        b: NodeId,
        eta: u32,
    },
    /// Omitting `fleet_id` commissions a new hull of `vessel` (Hauler by default) at `from`.
    DispatchFleet {
        #[serde(default)]
        fleet_id: Option<FleetId>,
        #[serde(default)]
        vessel: Option<VesselClass>,
        from: NodeId,
        to: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    AiDispatchFleet {
        trader_id: TraderId,
        fleet_id: FleetId,
        to: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    PlaceBuyOrder {
        node_id: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    PlaceSellOrder {
        node_id: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    AiBuyOrder {
        trader_id: TraderId,
        node_id: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    AiSellOrder {
        trader_id: TraderId,
        node_id: NodeId,
        commodity: Commodity,
        quantity: u32,
    },
    BuildStructure {
        node_id: NodeId,
        structure: StructureKind,
    },
    AssignObserver {
        observer_id: ObserverId,
        assignment: ObserverAssignment,
    },
    AiAssignObserver {
        trader_id: TraderId,
        observer_id: ObserverId,
        assignment: ObserverAssignment,
    },
    RerouteFleet {
        fleet_id: FleetId,
        to: NodeId,
    },
    /// Raised by the tick pipeline when a fleet's ETA runs out.
    RouteArrived {
        fleet_id: FleetId,
    },
    ReverseCargo {
        fleet_id: FleetId,
    },
    ReverseFleet {
        fleet_id: FleetId,
    },
    ReverseObserver {
        fleet_id: FleetId,
    },
    AiReverseCargo {
        trader_id: TraderId,
        fleet_id: FleetId,
    },
    AiReverseFleet {
        trader_id: TraderId,
        fleet_id: FleetId,
    },
    AiReverseObserver {
        trader_id: TraderId,
        fleet_id: FleetId,
    },
    ResearchTech {
        tech: TechId,
    },
    InvestGovernance {
        node_id: NodeId,
    },
}

impl GameEvent {
    /// Wire name of the variant, as stored in ledger entries.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::SetTimeMode { .. } => "SET_TIME_MODE",
            GameEvent::Navigate { .. } => "NAVIGATE",
            GameEvent::EstablishRoute { .. } => "ESTABLISH_ROUTE",
            GameEvent::DispatchFleet { .. } => "DISPATCH_FLEET",
            GameEvent::AiDispatchFleet { .. } => "AI_DISPATCH_FLEET",
            GameEvent::PlaceBuyOrder { .. } => "PLACE_BUY_ORDER",
            GameEvent::PlaceSellOrder { .. } => "PLACE_SELL_ORDER",
            GameEvent::AiBuyOrder { .. } => "AI_BUY_ORDER",
            GameEvent::AiSellOrder { .. } => "AI_SELL_ORDER",
            GameEvent::BuildStructure { .. } => "BUILD_STRUCTURE",
            GameEvent::AssignObserver { .. } => "ASSIGN_OBSERVER",
            GameEvent::AiAssignObserver { .. } => "AI_ASSIGN_OBSERVER",
            GameEvent::RerouteFleet { .. } => "REROUTE_FLEET",
            GameEvent::RouteArrived { .. } => "ROUTE_ARRIVED",
            GameEvent::ReverseCargo { .. } => "REVERSE_CARGO",
            GameEvent::ReverseFleet { .. } => "REVERSE_FLEET",
            GameEvent::ReverseObserver { .. } => "REVERSE_OBSERVER",
            GameEvent::AiReverseCargo { .. } => "AI_REVERSE_CARGO",
            GameEvent::AiReverseFleet { .. } => "AI_REVERSE_FLEET",
            GameEvent::AiReverseObserver { .. } => "AI_REVERSE_OBSERVER",
            GameEvent::ResearchTech { .. } => "RESEARCH_TECH",
            GameEvent::InvestGovernance { .. } => "INVEST_GOVERNANCE",
        }
    }

    /// The party on whose behalf the event acts. Engine events act for the player.
    pub fn actor(&self) -> Actor {
        match self {
            GameEvent::AiDispatchFleet { trader_id, .. }
            | GameEvent::AiBuyOrder { trader_id, .. }
            | GameEvent::AiSellOrder { trader_id, .. }
            | GameEvent::AiAssignObserver { trader_id, .. }
            | GameEvent::AiReverseCargo { trader_id, .. }
            | GameEvent::AiReverseFleet { trader_id, .. }
            | GameEvent::AiReverseObserver { trader_id, .. } => Actor::Trader(trader_id.clone()),
            _ => Actor::Player,
        }
    }

    /// Build the reversal event for `domain` on behalf of `actor`.
    pub fn reversal(actor: &Actor, fleet_id: FleetId, domain: ConsequenceDomain) -> GameEvent {
        match (actor, domain) {
            (Actor::Player, ConsequenceDomain::Cargo) => GameEvent::ReverseCargo { fleet_id },
            (Actor::Player, ConsequenceDomain::Fleet) => GameEvent::ReverseFleet { fleet_id },
            (Actor::Player, ConsequenceDomain::Observer) => GameEvent::ReverseObserver { fleet_id },
            (Actor::Trader(id), ConsequenceDomain::Cargo) => GameEvent::AiReverseCargo {
                trader_id: id.clone(),
                fleet_id,
            },
            (Actor::Trader(id), ConsequenceDomain::Fleet) => GameEvent::AiReverseFleet {
                trader_id: id.clone(),
                fleet_id,
            },
            (Actor::Trader(id), ConsequenceDomain::Observer) => GameEvent::AiReverseObserver {
                trader_id: id.clone(),
                fleet_id,
            },
        }
    }

    /// Blocked-diagnostic kind, e.g. `DISPATCH_FLEET_BLOCKED`.
    pub fn blocked_kind(&self) -> String {
        format!("{}_BLOCKED", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tag_matches_kind() {
        let event = GameEvent::AiBuyOrder {
            trader_id: TraderId::from("TRADER-1"),
            node_id: NodeId::from("NODE-2"),
            commodity: Commodity::Alloys,
            quantity: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["commodity"], "ALLOYS");
        assert_eq!(event.actor(), Actor::Trader(TraderId::from("TRADER-1")));
    }

    #[test]
    fn dispatch_without_fleet_parses() {
        let event: GameEvent = serde_json::from_str(
            r#"{"type":"DISPATCH_FLEET","from":"NODE-1","to":"NODE-2","commodity":"RATIONS","quantity":5}"#,
        )
        .unwrap();
        match event {
            GameEvent::DispatchFleet { fleet_id, vessel, .. } => {
                assert!(fleet_id.is_none());
                assert!(vessel.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reversal_builder_picks_variant() {
        let trader = Actor::Trader(TraderId::from("TRADER-1"));
        let e = GameEvent::reversal(&trader, FleetId::from("FLEET-4"), ConsequenceDomain::Fleet);
        assert_eq!(e.kind(), "AI_REVERSE_FLEET");
        let p = GameEvent::reversal(&Actor::Player, FleetId::from("FLEET-1"), ConsequenceDomain::Observer);
        assert_eq!(p.blocked_kind(), "REVERSE_OBSERVER_BLOCKED");
    }
}
