use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::{debug, info};

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let login = match req.params.get("login").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing login", None),
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing password", None),
    };

    // A rejected pair is not an error: the client simply stays on the form.
    let logged_in = state.session.login(login, password);
    if logged_in {
        info!("session logged in");
    } else {
        debug!("login rejected");
    }
    ok(&req.id, json!({ "loggedIn": logged_in }))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.logout();
    info!("session logged out");
    ok(&req.id, json!({ "loggedIn": false }))
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "loggedIn": state.session.is_logged_in() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.status" => Some(handle_status(state, req)),
        _ => None,
    }
}
