use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::{EntityStore, StoreError};
use tracing::warn;

/// Store access for data methods: requires a login and an open workspace.
pub fn require_store<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut EntityStore, serde_json::Value> {
    if !state.session.is_logged_in() {
        return Err(err(&req.id, "not_authenticated", "log in first", None));
    }
    state
        .store
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn param_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn param_bool(req: &Request, key: &str) -> bool {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

pub fn store_err(req: &Request, e: StoreError) -> serde_json::Value {
    warn!(method = %req.method, error = %e, "store operation failed");
    err(&req.id, e.code(), e.to_string(), None)
}
