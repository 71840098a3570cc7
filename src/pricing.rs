// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Market Pricing Model

use crate::types::{Affinity, Commodity, Market, MarketEntry, Node};

// Node modifier weights
const W_STABILITY: f64 = 0.10;
const W_POPULATION: f64 = 0.20;

// Affinity effects fed into pressure
const AFFINITY_MATCH: f64 = -0.15;
const AFFINITY_MISMATCH: f64 = 0.20;

/// Pressure added to a market by a single buy order.
pub const BUY_PRESSURE_DELTA: f64 = 0.05;
/// Pressure added to a market by a single sell order.
pub const SELL_PRESSURE_DELTA: f64 = 0.05;
/// Per-tick geometric decay of both pressure accumulators.
pub const PRESSURE_DECAY: f64 = 0.98;

pub const PRICE_FLOOR_RATIO: f64 = 0.5;
pub const PRICE_CEILING_RATIO: f64 = 2.5;

/// `stability × wStability + normalizedPopulation × wPopulation`.
///
/// `max_population` is the largest population on the map; a zero maximum
/// disables the population term.
pub fn node_modifier(node: &Node, max_population: u32) -> f64 {
    let normalized_population = if max_population > 0 {
        (node.population as f64 / max_population as f64).min(1.0)
    } else {
        0.0
    };
    node.stability_bias.clamp(0.0, 1.0) * W_STABILITY + normalized_population * W_POPULATION
}

pub fn affinity_effect(affinity: Affinity) -> f64 {
    match affinity {
        Affinity::Match => AFFINITY_MATCH,
        Affinity::Neutral => 0.0,
        Affinity::Mismatch => AFFINITY_MISMATCH,
    }
}

/// `(demand − supply + affinity) × volatilityMultiplier`.
pub fn pressure_effect(entry: &MarketEntry) -> f64 {
    (entry.demand_pressure - entry.supply_pressure + affinity_effect(entry.affinity))
        * entry.volatility.price_multiplier()
}

/// Clamped market price for one entry.
pub fn price(entry: &MarketEntry, node_modifier: f64) -> f64 {
    let raw = entry.baseline * (1.0 + node_modifier + pressure_effect(entry));
    let floor = entry.baseline * PRICE_FLOOR_RATIO;
    let ceiling = entry.baseline * PRICE_CEILING_RATIO;
    if raw.is_nan() {
        return floor;
    }
    raw.clamp(floor, ceiling)
}

/// Price the entry settles back to once its order pressure has decayed.
pub fn resting_price(entry: &MarketEntry, node_modifier: f64) -> f64 {
    let rested = MarketEntry { demand_pressure: 0.0, supply_pressure: 0.0, ..entry.clone() };
    price(&rested, node_modifier)
}

/// Fresh market entry for a commodity at a node, pressures zeroed.
pub fn new_entry(commodity: Commodity, node: &Node, max_population: u32) -> MarketEntry {
    let mut entry = MarketEntry {
        commodity,
        baseline: commodity.baseline_price(),
        price: commodity.baseline_price(),
        volatility: commodity.volatility(),
        demand_pressure: 0.0,
        supply_pressure: 0.0,
        affinity: commodity.affinity_for(node.class),
    };
    entry.price = price(&entry, node_modifier(node, max_population));
    entry
}

pub fn apply_buy(entry: &mut MarketEntry) {
    entry.demand_pressure += BUY_PRESSURE_DELTA;
}

pub fn apply_sell(entry: &mut MarketEntry) {
    entry.supply_pressure += SELL_PRESSURE_DELTA;
}

pub fn decay(market: &mut Market) {
    for entry in market.entries.values_mut() {
        entry.demand_pressure *= PRESSURE_DECAY;
        entry.supply_pressure *= PRESSURE_DECAY;
    }
}

/// Recompute every price in a market from its pressures and node modifier.
pub fn reprice(market: &mut Market, node: &Node, max_population: u32) {
    let modifier = node_modifier(node, max_population);
    for entry in market.entries.values_mut() {
        entry.price = price(entry, modifier);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeClass, NodeId};
    use std::collections::{BTreeMap, BTreeSet};

    fn node(class: NodeClass, stability: f64, population: u32) -> Node {
        Node {
            id: NodeId::from("NODE-1"),
            name: "Test".to_string(),
            class,
            x: 0.0,
            y: 0.0,
            stability_bias: stability,
            population,
            political_weight: 1.0,
            governance_seats: 5,
            structures: BTreeSet::new(),
        }
    }

    #[test]
    fn node_modifier_combines_stability_and_population() {
        let n = node(NodeClass::Core, 0.9, 5000);
        let m = node_modifier(&n, 10000);
        assert!((m - (0.9 * 0.1 + 0.5 * 0.2)).abs() < 1e-12);
        assert!((node_modifier(&n, 0) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn affinity_moves_price_in_expected_direction() {
        let core = node(NodeClass::Core, 0.5, 1000);
        let rift = node(NodeClass::RiftEdge, 0.5, 1000);
        let at_home = new_entry(Commodity::RiftShards, &rift, 1000);
        let abroad = new_entry(Commodity::RiftShards, &core, 1000);
        assert_eq!(at_home.affinity, Affinity::Match);
        assert_eq!(abroad.affinity, Affinity::Mismatch);
        assert!(abroad.price > at_home.price);
    }

    #[test]
    fn price_bounded_under_extreme_pressure() {
        let n = node(NodeClass::Frontier, 1.0, 1000);
        let mut entry = new_entry(Commodity::RiftShards, &n, 1000);
        entry.demand_pressure = 1.0e9;
        assert_eq!(price(&entry, 0.3), entry.baseline * PRICE_CEILING_RATIO);
        entry.demand_pressure = 0.0;
        entry.supply_pressure = 1.0e9;
        assert_eq!(price(&entry, 0.3), entry.baseline * PRICE_FLOOR_RATIO);
    }

    #[test]
    fn resting_price_ignores_pressure() {
        let n = node(NodeClass::Frontier, 0.45, 1000);
        let mut entry = new_entry(Commodity::Relics, &n, 1000);
        let fresh = entry.price;
        entry.demand_pressure = 0.4;
        entry.supply_pressure = 0.1;
        let modifier = node_modifier(&n, 1000);
        assert!(price(&entry, modifier) > fresh);
        assert_eq!(resting_price(&entry, modifier), fresh);
    }

    #[test]
    fn buy_then_decay() {
        let n = node(NodeClass::Industrial, 0.7, 1000);
        let mut market = Market {
            node_id: n.id.clone(),
            entries: BTreeMap::new(),
        };
        market.entries.insert(Commodity::Alloys, new_entry(Commodity::Alloys, &n, 1000));
        apply_buy(market.entries.get_mut(&Commodity::Alloys).unwrap());
        assert_eq!(market.entries[&Commodity::Alloys].demand_pressure, BUY_PRESSURE_DELTA);
        decay(&mut market);
        let after = market.entries[&Commodity::Alloys].demand_pressure;
        assert!((after - BUY_PRESSURE_DELTA * PRESSURE_DECAY).abs() < 1e-15);
    }

    #[test]
    fn demand_raises_and_supply_lowers_price() {
        let n = node(NodeClass::Research, 0.75, 1000);
        let mut market = Market {
            node_id: n.id.clone(),
            entries: BTreeMap::new(),
        };
        market.entries.insert(Commodity::DataCores, new_entry(Commodity::DataCores, &n, 1000));
        let base = market.entries[&Commodity::DataCores].price;

        apply_buy(market.entries.get_mut(&Commodity::DataCores).unwrap());
        reprice(&mut market, &n, 1000);
        let bought = market.entries[&Commodity::DataCores].price;
        assert!(bought > base);

        for _ in 0..3 {
            apply_sell(market.entries.get_mut(&Commodity::DataCores).unwrap());
        }
        reprice(&mut market, &n, 1000);
        assert!(market.entries[&Commodity::DataCores].price < base);
    }
}
