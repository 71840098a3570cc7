// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite ("The Rift")

pub mod types;
pub mod credits;
pub mod config;
pub mod error;
pub mod pricing;
pub mod entropy;
pub mod reversal;
pub mod ledger;
pub mod events;
pub mod state;
pub mod bootstrap;
pub mod dispatch;
pub mod ai;
pub mod scheduler;
pub mod audit;
pub mod simulation;

pub use config::SimConfig;
pub use credits::Credits;
pub use error::{ConfigError, DispatchError, SnapshotError};
pub use events::GameEvent;
pub use ledger::{EntityRef, LedgerEntry, LedgerQuery};
pub use simulation::RiftSimulation;
pub use state::WorldState;
pub use types::*;

use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Serialize)]
struct DispatchOutcome {
    ok: bool,
    event_id: Option<EventId>,
    error: Option<String>,
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl RiftSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        RiftSimulation::from_config(SimConfig::default())
    }

    /// Build from a JSON config; unspecified fields take their defaults.
    pub fn with_config(config_json: &str) -> Result<RiftSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = SimConfig::from_json(config_json).map_err(js_error)?;
        Ok(RiftSimulation::from_config(config))
    }

    pub fn tick(&mut self) -> JsValue {
        let result = self.tick_core();
        to_js(&result)
    }

    /// Manual single step; returns the new tick number.
    pub fn step(&mut self) -> u64 {
        self.tick_core();
        self.world.tick
    }

    /// Timer wake-up. Returns the tick result, or null when nothing was due.
    pub fn poll(&mut self, now_ms: f64) -> JsValue {
        match self.poll_at(now_ms) {
            Some(result) => to_js(&result),
            None => JsValue::NULL,
        }
    }

    pub fn dispatch(&mut self, event: JsValue) -> JsValue {
        let outcome = match serde_wasm_bindgen::from_value::<GameEvent>(event) {
            Ok(event) => match self.submit(event) {
                Ok(id) => DispatchOutcome { ok: true, event_id: Some(id), error: None },
                Err(err) => DispatchOutcome { ok: false, event_id: None, error: Some(err.to_string()) },
            },
            Err(err) => DispatchOutcome { ok: false, event_id: None, error: Some(err.to_string()) },
        };
        to_js(&outcome)
    }

    pub fn set_time_mode(&mut self, mode: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<TimeMode>(mode) {
            Ok(mode) => self.submit(GameEvent::SetTimeMode { mode }).is_ok(),
            Err(_) => false,
        }
    }

    pub fn snapshot(&self) -> JsValue {
        to_js(&self.world)
    }

    pub fn snapshot_json(&self) -> String {
        self.export_snapshot()
    }

    pub fn load_snapshot(&mut self, json: &str) -> Result<(), JsValue> {
        let world = WorldState::from_json(json).map_err(js_error)?;
        *self = RiftSimulation::from_world(world, self.config.clone());
        Ok(())
    }

    pub fn query_ledger(&self, query: JsValue) -> JsValue {
        let query = if query.is_null() || query.is_undefined() {
            LedgerQuery::default()
        } else {
            match serde_wasm_bindgen::from_value::<LedgerQuery>(query) {
                Ok(q) => q,
                Err(_) => return JsValue::NULL,
            }
        };
        to_js(&self.query(&query))
    }

    pub fn get_diagnostics(&self) -> JsValue {
        let all: Vec<_> = self.diagnostics().collect();
        to_js(&all)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.tick
    }

    /// Run N ticks without returning results (fast batch mode for benchmarking)
    pub fn run_batch(&mut self, ticks: u32) {
        self.run_ticks(ticks);
    }

    /// Reset simulation to initial state
    pub fn reset(&mut self) {
        *self = RiftSimulation::from_config(self.config.clone());
    }
}

impl Default for RiftSimulation {
    fn default() -> Self {
        Self::new()
    }
}
