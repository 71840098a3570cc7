// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Event Ledger
//
// Append-only record of every state transition. Entries are never mutated
// or removed; history browsing filters by entity reference and tick range.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Commodity, EventId, FleetId, NodeId, ObserverId, TraderId};

/// Entity an entry is indexed under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityRef {
    Node(NodeId),
    Fleet(FleetId),
    Commodity(Commodity),
    Observer(ObserverId),
    Trader(TraderId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EventId,
    pub tick: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Value,
    pub refs: Vec<EntityRef>,
}

/// History filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerQuery {
    pub entity: Option<EntityRef>,
    pub event_type: Option<String>,
    pub from_tick: Option<u64>,
    pub to_tick: Option<u64>,
}

impl LedgerQuery {
    pub fn for_entity(entity: EntityRef) -> Self {
        Self { entity: Some(entity), ..Self::default() }
    }

    pub fn ticks(from: u64, to: u64) -> Self {
        Self { from_tick: Some(from), to_tick: Some(to), ..Self::default() }
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(entity) = &self.entity {
            if !entry.refs.contains(entity) {
                return false;
            }
        }
        if let Some(kind) = &self.event_type {
            if &entry.event_type != kind {
                return false;
            }
        }
        if self.from_tick.map_or(false, |from| entry.tick < from) {
            return false;
        }
        if self.to_tick.map_or(false, |to| entry.tick > to) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are only appended from inside the engine.
    pub(crate) fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn get(&self, id: &EventId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Entries matching `query`, oldest first.
    pub fn query<'a>(&'a self, query: &LedgerQuery) -> Vec<&'a LedgerEntry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }

    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.entries.iter().filter(move |e| e.event_type == event_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(n: u64, tick: u64, kind: &str, refs: Vec<EntityRef>) -> LedgerEntry {
        LedgerEntry {
            id: EventId(format!("EVT-{}", n)),
            tick,
            event_type: kind.to_string(),
            payload: json!({ "n": n }),
            refs,
        }
    }

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.append(entry(1, 0, "BUILD_STRUCTURE", vec![EntityRef::Node(NodeId::from("NODE-1"))]));
        ledger.append(entry(
            2,
            3,
            "DISPATCH_FLEET",
            vec![
                EntityRef::Fleet(FleetId::from("FLEET-1")),
                EntityRef::Node(NodeId::from("NODE-1")),
                EntityRef::Node(NodeId::from("NODE-2")),
                EntityRef::Commodity(Commodity::Alloys),
            ],
        ));
        ledger.append(entry(
            3,
            6,
            "ROUTE_ARRIVED",
            vec![EntityRef::Fleet(FleetId::from("FLEET-1")), EntityRef::Node(NodeId::from("NODE-2"))],
        ));
        ledger
    }

    #[test]
    fn filter_by_entity() {
        let ledger = sample();
        let q = LedgerQuery::for_entity(EntityRef::Node(NodeId::from("NODE-2")));
        let ids: Vec<_> = ledger.query(&q).iter().map(|e| e.id.0.clone()).collect();
        assert_eq!(ids, vec!["EVT-2", "EVT-3"]);

        let q = LedgerQuery::for_entity(EntityRef::Commodity(Commodity::Alloys));
        assert_eq!(ledger.query(&q).len(), 1);
    }

    #[test]
    fn filter_by_tick_range_is_inclusive() {
        let ledger = sample();
        assert_eq!(ledger.query(&LedgerQuery::ticks(3, 6)).len(), 2);
        assert_eq!(ledger.query(&LedgerQuery::ticks(1, 2)).len(), 0);
    }

    #[test]
    fn combined_filters() {
        let ledger = sample();
        let q = LedgerQuery {
            entity: Some(EntityRef::Fleet(FleetId::from("FLEET-1"))),
            event_type: Some("ROUTE_ARRIVED".to_string()),
            from_tick: Some(0),
            to_tick: None,
        };
        let hits = ledger.query(&q);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tick, 6);
    }

    #[test]
    fn results_outlive_the_query() {
        let ledger = sample();
        let hits = {
            let q = LedgerQuery::for_entity(EntityRef::Fleet(FleetId::from("FLEET-1")));
            ledger.query(&q)
        };
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].event_type, "ROUTE_ARRIVED");
    }

    #[test]
    fn serialized_entry_uses_type_field() {
        let ledger = sample();
        let json = serde_json::to_value(&ledger.entries()[0]).unwrap();
        assert_eq!(json["type"], "BUILD_STRUCTURE");
        assert_eq!(json["refs"][0]["kind"], "NODE");
    }
}
