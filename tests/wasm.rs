#![cfg(target_arch = "wasm32")]

use rift_engine::RiftSimulation;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn steps_advance_tick_counter() {
    let mut sim = RiftSimulation::new();
    assert_eq!(sim.step(), 1);
    sim.run_batch(9);
    assert_eq!(sim.current_tick(), 10);
}

#[wasm_bindgen_test]
fn paused_poll_returns_null() {
    let mut sim = RiftSimulation::new();
    assert!(sim.poll(10_000.0).is_null());
}

#[wasm_bindgen_test]
fn bad_config_is_an_error() {
    assert!(RiftSimulation::with_config("{\"entropy\":{\"base_rate\":7}}").is_err());
    assert!(RiftSimulation::with_config("{\"ai_enabled\":false}").is_ok());
}

#[wasm_bindgen_test]
fn snapshot_json_reloads() {
    let mut sim = RiftSimulation::new();
    sim.run_batch(5);
    let json = sim.snapshot_json();
    let mut other = RiftSimulation::new();
    other.load_snapshot(&json).unwrap();
    assert_eq!(other.current_tick(), 5);
    assert!(other.load_snapshot("not json").is_err());
}

#[wasm_bindgen_test]
fn garbage_event_reports_failure() {
    let mut sim = RiftSimulation::new();
    let outcome = sim.dispatch(JsValue::from_str("nonsense"));
    assert!(!outcome.is_null());
    assert_eq!(sim.current_tick(), 0);
}
