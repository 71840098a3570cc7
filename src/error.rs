// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Error Types

use crate::credits::Credits;
use crate::types::{Commodity, ConsequenceDomain, FleetId, NodeId, ObserverId, StructureKind, TechId, TraderId};

/// Why an event was rejected. A rejected event leaves the world untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown fleet {0}")]
    UnknownFleet(FleetId),

    #[error("unknown observer {0}")]
    UnknownObserver(ObserverId),

    #[error("unknown trader {0}")]
    UnknownTrader(TraderId),

    #[error("no direct route between {from} and {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("route between {0} and {1} already exists")]
    RouteExists(NodeId, NodeId),

    #[error("route endpoints must differ and eta must be positive")]
    InvalidRoute,

    #[error("insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: Credits, available: Credits },

    #[error("insufficient {commodity:?} held at {node}: need {needed}, have {available}")]
    InsufficientHoldings {
        node: NodeId,
        commodity: Commodity,
        needed: u32,
        available: u32,
    },

    #[error("cargo of {quantity} exceeds capacity {capacity}")]
    CargoExceedsCapacity { quantity: u32, capacity: u32 },

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("{node} lacks required {structure:?}")]
    MissingStructure { node: NodeId, structure: StructureKind },

    #[error("{node} already has {structure:?}")]
    StructureExists { node: NodeId, structure: StructureKind },

    #[error("fleet {0} is not idle")]
    FleetNotIdle(FleetId),

    #[error("fleet {0} is not in transit")]
    FleetNotInTransit(FleetId),

    #[error("fleet {fleet} is not docked at {node}")]
    FleetNotDocked { fleet: FleetId, node: NodeId },

    #[error("fleet {0} has not reached its destination")]
    FleetNotArrived(FleetId),

    #[error("fleet {0} is already bound for that node")]
    AlreadyBound(FleetId),

    #[error("{entity} is not owned by the acting party")]
    NotOwner { entity: String },

    #[error("no {domain:?} consequence to reverse on {fleet}")]
    NothingToReverse { fleet: FleetId, domain: ConsequenceDomain },

    #[error("{0:?} already researched")]
    AlreadyResearched(TechId),

    #[error("no governance seats left at {0}")]
    NoSeatsAvailable(NodeId),
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Snapshot could not be restored.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid snapshot json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("snapshot inconsistent: {0}")]
    Inconsistent(String),
}
