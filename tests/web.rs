#![cfg(target_arch = "wasm32")]

use flowgraph_wasm::FlowGraphWasm;
use serde::Serialize;
use serde_json::json;
use serde_wasm_bindgen as swb;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn js(value: serde_json::Value) -> JsValue {
    value
        .serialize(&swb::Serializer::json_compatible())
        .unwrap()
}

fn loaded() -> FlowGraphWasm {
    let mut graph = FlowGraphWasm::new(js(json!({ "enableForceSimulation": false }))).unwrap();
    let diagnostics = graph
        .set_data(
            js(json!([
                { "id": "a", "name": "A", "dataAmount": 20, "maxCapacity": 100 },
                { "id": "b", "name": "B", "dataAmount": 80, "maxCapacity": 100 }
            ])),
            js(json!([{ "id": "e1", "source": "a", "target": "b", "flow": 10 }])),
        )
        .unwrap();
    let diagnostics: Vec<serde_json::Value> = swb::from_value(diagnostics).unwrap();
    assert!(diagnostics.is_empty());
    graph
}

#[wasm_bindgen_test]
fn construct_with_defaults() {
    assert!(FlowGraphWasm::new(JsValue::UNDEFINED).is_ok());
    assert!(FlowGraphWasm::new(JsValue::NULL).is_ok());
}

#[wasm_bindgen_test]
fn bad_config_is_an_error() {
    assert!(FlowGraphWasm::new(JsValue::from_str("nope")).is_err());
}

#[wasm_bindgen_test]
fn diagnostics_are_returned() {
    let mut graph = FlowGraphWasm::new(JsValue::UNDEFINED).unwrap();
    let out = graph
        .set_data(
            js(json!([{ "id": "a", "dataAmount": 1, "maxCapacity": 2 }])),
            js(json!([{ "id": "e1", "source": "a", "target": "ghost" }])),
        )
        .unwrap();
    let out: Vec<serde_json::Value> = swb::from_value(out).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["kind"], "missingTarget");
    assert_eq!(out[0]["nodeId"], "ghost");
}

#[wasm_bindgen_test]
fn flow_event_frame_round_trip() {
    let mut graph = loaded();
    let added = graph
        .add_flow_event(js(json!({ "id": "f1", "edgeId": "e1", "amount": 60, "duration": 1000 })))
        .unwrap();
    assert!(added);
    graph.tick(500.0);

    let frame: serde_json::Value = swb::from_value(graph.frame().unwrap()).unwrap();
    assert_eq!(frame["nodes"].as_array().map(Vec::len), Some(2));
    assert_eq!(frame["particles"].as_array().map(Vec::len), Some(3));
    assert_eq!(frame["particles"][0]["color"], "#ff9944");

    let events: serde_json::Value = swb::from_value(graph.get_flow_events().unwrap()).unwrap();
    assert_eq!(events[0]["status"], "active");
}

#[wasm_bindgen_test]
fn layout_switch_and_hit_test() {
    let mut graph = loaded();
    let fell_back = graph
        .set_layout(js(json!({ "type": "hierarchical", "rootId": "a" })))
        .unwrap();
    assert!(!fell_back);

    let positions: Vec<serde_json::Value> =
        swb::from_value(graph.get_positions().unwrap()).unwrap();
    let x = positions[0]["x"].as_f64().unwrap();
    let y = positions[0]["y"].as_f64().unwrap();
    assert_eq!(graph.node_at(x, y).as_deref(), Some("a"));

    let fell_back = graph
        .set_layout(js(json!({ "type": "hierarchical", "rootId": "b" })))
        .unwrap();
    assert!(fell_back);
}

#[wasm_bindgen_test]
fn handlers_receive_plain_objects() {
    let mut graph = loaded();
    let seen = js_sys::Array::new();
    let sink = seen.clone();
    let handler = Closure::<dyn FnMut(JsValue)>::new(move |v: JsValue| {
        sink.push(&v);
    });
    graph.on_particles_update(handler.as_ref().unchecked_ref::<js_sys::Function>().clone());
    handler.forget();

    graph.add_flow_event(js(json!({ "id": "f1", "edgeId": "e1", "amount": 1, "duration": 100 })))
        .unwrap();
    graph.tick(16.0);
    assert_eq!(seen.length(), 1);
    assert!(js_sys::Array::is_array(&seen.get(0)));
}
