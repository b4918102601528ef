use crate::ipc::error::ok;
use crate::ipc::helpers::require_store;
use crate::ipc::types::{AppState, Request};
use crate::stats;
use serde_json::json;

fn handle_dashboard_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    // Recomputed from the live collections on every call.
    let dashboard = stats::dashboard(store.students(), store.schedule());
    ok(&req.id, json!(dashboard))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        _ => None,
    }
}
