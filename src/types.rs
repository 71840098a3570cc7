// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::credits::Credits;

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self { $name(s.to_string()) }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self { $name(s) }
        }
    };
}

entity_id!(
    /// Node in the trade graph (`NODE-n`).
    NodeId
);
entity_id!(
    /// Cargo-carrying fleet (`FLEET-n`).
    FleetId
);
entity_id!(
    /// Observer unit (`OBS-n`).
    ObserverId
);
entity_id!(
    /// AI trader (`TRADER-n`).
    TraderId
);
entity_id!(
    /// Ledger entry (`EVT-n`).
    EventId
);
entity_id!(
    /// UI log line (`LOG-n`).
    LogId
);

// ─── Node Class ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeClass {
    Core,
    Industrial,
    Research,
    Frontier,
    RiftEdge,
}

// ─── Volatility Class ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityClass {
    None,
    Low,
    Medium,
    High,
    Extreme,
}

impl VolatilityClass {
    /// Risk-model input in [0, 1].
    pub fn normalized(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Extreme => 1.0,
        }
    }

    /// Scales pressure effects in the pricing model.
    pub fn price_multiplier(&self) -> f64 {
        match self {
            Self::None => 0.5,
            Self::Low => 0.8,
            Self::Medium => 1.0,
            Self::High => 1.3,
            Self::Extreme => 1.6,
        }
    }
}

// ─── Commodity ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Commodity {
    Rations,
    Alloys,
    DataCores,
    Relics,
    Isotopes,
    RiftShards,
}

impl Commodity {
    pub const ALL: [Commodity; 6] = [
        Commodity::Rations,
        Commodity::Alloys,
        Commodity::DataCores,
        Commodity::Relics,
        Commodity::Isotopes,
        Commodity::RiftShards,
    ];

    pub fn baseline_price(&self) -> f64 {
        match self {
            Self::Rations => 20.0,
            Self::Alloys => 45.0,
            Self::DataCores => 80.0,
            Self::Relics => 95.0,
            Self::Isotopes => 120.0,
            Self::RiftShards => 260.0,
        }
    }

    pub fn volatility(&self) -> VolatilityClass {
        match self {
            Self::Rations => VolatilityClass::None,
            Self::Alloys => VolatilityClass::Low,
            Self::DataCores => VolatilityClass::Medium,
            Self::Relics => VolatilityClass::Medium,
            Self::Isotopes => VolatilityClass::High,
            Self::RiftShards => VolatilityClass::Extreme,
        }
    }

    /// Node class where the commodity is produced locally.
    pub fn home_class(&self) -> NodeClass {
        match self {
            Self::Rations => NodeClass::Core,
            Self::Alloys => NodeClass::Industrial,
            Self::DataCores => NodeClass::Research,
            Self::Relics => NodeClass::Frontier,
            Self::Isotopes => NodeClass::Research,
            Self::RiftShards => NodeClass::RiftEdge,
        }
    }

    /// Node class where the commodity is scarcest.
    pub fn hostile_class(&self) -> NodeClass {
        match self {
            Self::Rations => NodeClass::RiftEdge,
            Self::Alloys => NodeClass::Research,
            Self::DataCores => NodeClass::Frontier,
            Self::Relics => NodeClass::Industrial,
            Self::Isotopes => NodeClass::Core,
            Self::RiftShards => NodeClass::Core,
        }
    }

    pub fn affinity_for(&self, class: NodeClass) -> Affinity {
        if class == self.home_class() {
            Affinity::Match
        } else if class == self.hostile_class() {
            Affinity::Mismatch
        } else {
            Affinity::Neutral
        }
    }
}

// ─── Affinity ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affinity {
    Match,
    Neutral,
    Mismatch,
}

// ─── Vessel Class ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselClass {
    Courier,
    Hauler,
    ContainmentFrigate,
    BulkFreighter,
}

impl VesselClass {
    pub fn capacity(&self) -> u32 {
        match self {
            Self::Courier => 20,
            Self::Hauler => 100,
            Self::ContainmentFrigate => 60,
            Self::BulkFreighter => 200,
        }
    }

    /// Fraction of transit risk absorbed by the hull.
    pub fn dampening(&self) -> f64 {
        match self {
            Self::Courier => 0.10,
            Self::Hauler => 0.20,
            Self::ContainmentFrigate => 0.45,
            Self::BulkFreighter => 0.05,
        }
    }

    /// Price of commissioning a new hull.
    pub fn commission_cost(&self) -> Credits {
        match self {
            Self::Courier => Credits::from_f64(300.0),
            Self::Hauler => Credits::from_f64(800.0),
            Self::ContainmentFrigate => Credits::from_f64(1200.0),
            Self::BulkFreighter => Credits::from_f64(1500.0),
        }
    }
}

// ─── Structures ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructureKind {
    /// Gates cargo reversals.
    CargoStabilizer,
    /// Gates fleet reversals.
    HullRecalibrator,
    /// Gates observer reversals.
    ObserverAnchor,
}

impl StructureKind {
    pub fn build_cost(&self) -> Credits {
        match self {
            Self::CargoStabilizer => Credits::from_f64(600.0),
            Self::HullRecalibrator => Credits::from_f64(750.0),
            Self::ObserverAnchor => Credits::from_f64(500.0),
        }
    }
}

// ─── Consequence Domain ──────────────────────────────────────────────────────

/// The three places arrival entropy leaves a persistent penalty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequenceDomain {
    Cargo,
    Fleet,
    Observer,
}

impl ConsequenceDomain {
    pub const ALL: [ConsequenceDomain; 3] = [
        ConsequenceDomain::Cargo,
        ConsequenceDomain::Fleet,
        ConsequenceDomain::Observer,
    ];

    pub fn required_structure(&self) -> StructureKind {
        match self {
            Self::Cargo => StructureKind::CargoStabilizer,
            Self::Fleet => StructureKind::HullRecalibrator,
            Self::Observer => StructureKind::ObserverAnchor,
        }
    }
}

// ─── Fleet Status ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetStatus {
    Idle,
    InTransit,
    /// ETA reached, awaiting ROUTE_ARRIVED within the same tick
    Arrived,
    /// Reserved. No code path produces it.
    Collapsed,
}

// ─── Time Mode / Screen ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeMode {
    #[default]
    Pause,
    Normal,
    Fast,
}

/// UI navigation target. Stored for the host, ignored by the simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Screen {
    #[default]
    Overview,
    Markets,
    Fleets,
    Ledger,
    Research,
    Governance,
}

// ─── Tech ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechId {
    /// +0.1 mitigation on player fleets.
    EntropyShielding,
    /// +0.1 reversal effect fraction for the player.
    ReversalCatalysts,
    /// −1 tick on player dispatch ETAs (minimum 1).
    LogisticsDrives,
}

impl TechId {
    pub fn research_cost(&self) -> Credits {
        match self {
            Self::EntropyShielding => Credits::from_f64(1200.0),
            Self::ReversalCatalysts => Credits::from_f64(900.0),
            Self::LogisticsDrives => Credits::from_f64(1500.0),
        }
    }
}

// ─── Actors ──────────────────────────────────────────────────────────────────

/// Whoever pays for and profits from an action.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Player,
    Trader(TraderId),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Player => write!(f, "PLAYER"),
            Actor::Trader(id) => write!(f, "{}", id),
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub class: NodeClass,
    pub x: f64,
    pub y: f64,
    pub stability_bias: f64,
    pub population: u32,
    pub political_weight: f64,
    pub governance_seats: u32,
    #[serde(default)]
    pub structures: BTreeSet<StructureKind>,
}

impl Node {
    pub fn has_structure(&self, kind: StructureKind) -> bool {
        self.structures.contains(&kind)
    }
}

/// Undirected lane between two nodes with a fixed transit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub a: NodeId,
    pub b: NodeId,
    pub eta: u32,
}

impl Route {
    pub fn connects(&self, from: &NodeId, to: &NodeId) -> bool {
        (&self.a == from && &self.b == to) || (&self.a == to && &self.b == from)
    }

    /// The far end of the lane when departing `from`.
    pub fn other_end(&self, from: &NodeId) -> Option<&NodeId> {
        if &self.a == from {
            Some(&self.b)
        } else if &self.b == from {
            Some(&self.a)
        } else {
            None
        }
    }
}

// ─── Market ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketEntry {
    pub commodity: Commodity,
    pub baseline: f64,
    pub price: f64,
    pub volatility: VolatilityClass,
    pub demand_pressure: f64,
    pub supply_pressure: f64,
    pub affinity: Affinity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Market {
    pub node_id: NodeId,
    pub entries: BTreeMap<Commodity, MarketEntry>,
}

impl Market {
    pub fn price(&self, commodity: Commodity) -> Option<f64> {
        self.entries.get(&commodity).map(|e| e.price)
    }
}

// ─── Fleet ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cargo {
    pub commodity: Commodity,
    pub quantity: u32,
    /// Origin market price when the fleet left.
    pub dispatch_price: f64,
}

/// Persistent efficiency penalties, each in [floor, 0].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EntropyConsequences {
    pub cargo_efficiency_delta: f64,
    pub fleet_efficiency_delta: f64,
    pub observer_efficiency_delta: f64,
}

impl EntropyConsequences {
    pub fn get(&self, domain: ConsequenceDomain) -> f64 {
        match domain {
            ConsequenceDomain::Cargo => self.cargo_efficiency_delta,
            ConsequenceDomain::Fleet => self.fleet_efficiency_delta,
            ConsequenceDomain::Observer => self.observer_efficiency_delta,
        }
    }

    pub fn set(&mut self, domain: ConsequenceDomain, value: f64) {
        match domain {
            ConsequenceDomain::Cargo => self.cargo_efficiency_delta = value,
            ConsequenceDomain::Fleet => self.fleet_efficiency_delta = value,
            ConsequenceDomain::Observer => self.observer_efficiency_delta = value,
        }
    }

    pub fn is_clear(&self) -> bool {
        ConsequenceDomain::ALL.iter().all(|d| self.get(*d) == 0.0)
    }

    /// Sum of penalty magnitudes across all domains.
    pub fn magnitude(&self) -> f64 {
        ConsequenceDomain::ALL.iter().map(|d| self.get(*d).abs()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fleet {
    pub id: FleetId,
    pub owner: Actor,
    pub vessel: VesselClass,
    /// Current dock while idle, departure node while in transit.
    pub node_from: NodeId,
    pub node_to: NodeId,
    pub status: FleetStatus,
    pub eta: u32,
    pub transit_total: u32,
    pub transit_elapsed: u32,
    pub cargo: Option<Cargo>,
    pub entropy: f64,
    pub mitigation: f64,
    pub consequences: EntropyConsequences,
}

impl Fleet {
    pub fn is_idle(&self) -> bool {
        self.status == FleetStatus::Idle
    }

    /// The node the fleet is docked at, if it is not moving.
    pub fn docked_at(&self) -> Option<&NodeId> {
        match self.status {
            FleetStatus::Idle => Some(&self.node_from),
            _ => None,
        }
    }
}

// ─── Observer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObserverAssignment {
    #[default]
    Unassigned,
    Node(NodeId),
    Fleet(FleetId),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observer {
    pub id: ObserverId,
    pub owner: Actor,
    pub assignment: ObserverAssignment,
    /// Mitigation contributed to covered fleets.
    pub entropy_modifier_delta: f64,
}

// ─── Wallets & Traders ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Wallet {
    pub credits: Credits,
    /// Stock bought on a market stays in that node's warehouse and can only
    /// be sold there. Moving goods between nodes takes a fleet.
    #[serde(default)]
    pub holdings: BTreeMap<NodeId, BTreeMap<Commodity, u32>>,
}

impl Wallet {
    pub fn new(credits: Credits) -> Self {
        Self { credits, holdings: BTreeMap::new() }
    }

    pub fn holding(&self, node: &NodeId, commodity: Commodity) -> u32 {
        self.holdings.get(node).and_then(|stock| stock.get(&commodity)).copied().unwrap_or(0)
    }

    pub(crate) fn stash(&mut self, node: &NodeId, commodity: Commodity, quantity: u32) {
        *self.holdings.entry(node.clone()).or_default().entry(commodity).or_insert(0) += quantity;
    }

    /// Remove up to `quantity`, dropping emptied entries.
    pub(crate) fn withdraw(&mut self, node: &NodeId, commodity: Commodity, quantity: u32) {
        let Some(stock) = self.holdings.get_mut(node) else {
            return;
        };
        let remaining = stock.get(&commodity).copied().unwrap_or(0).saturating_sub(quantity);
        if remaining == 0 {
            stock.remove(&commodity);
        } else {
            stock.insert(commodity, remaining);
        }
        if stock.is_empty() {
            self.holdings.remove(node);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiTrader {
    pub id: TraderId,
    pub name: String,
    pub wallet: Wallet,
    pub fleet_ids: Vec<FleetId>,
    pub observer_ids: Vec<ObserverId>,
}

// ─── Governance / Tech ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Governance {
    /// Seats held by the player, per node.
    pub seats: BTreeMap<NodeId, u32>,
    pub total_invested: Credits,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TechState {
    pub researched: BTreeSet<TechId>,
}

impl TechState {
    pub fn has(&self, tech: TechId) -> bool {
        self.researched.contains(&tech)
    }
}

// ─── Settlement / Logs ───────────────────────────────────────────────────────

/// Profit owed for a completed haul, paid out after prices refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSettlement {
    pub fleet_id: FleetId,
    pub owner: Actor,
    pub destination: NodeId,
    pub commodity: Commodity,
    pub quantity: u32,
    pub dispatch_price: f64,
    pub cargo_efficiency_delta: f64,
    pub arrival_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    pub id: LogId,
    pub tick: u64,
    pub kind: String,
    pub message: String,
}

// ─── TickResult ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TickSummary {
    pub tick: u64,
    pub arrivals: u32,
    pub ai_actions: u32,
    pub ai_skips: u32,
    pub settlements: u32,
    pub settled_credits: Credits,
    pub fleets_in_transit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickResult {
    pub summary: TickSummary,
    pub audit: crate::audit::AuditResult,
}
