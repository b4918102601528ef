use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{param_bool, param_i64, require_store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::ScheduleItem;
use serde_json::json;

fn handle_schedule_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "schedule": store.schedule() }))
}

fn handle_schedule_begin_new(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.begin_new_schedule() {
        Ok(draft) => ok(&req.id, json!({ "draft": draft, "isNew": true })),
        Err(e) => store_err(req, e),
    }
}

fn handle_schedule_begin_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match param_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.begin_edit_schedule(id) {
        Some(draft) => ok(&req.id, json!({ "draft": draft, "isNew": false })),
        None => err(
            &req.id,
            "not_found",
            "schedule item not found",
            Some(json!({ "id": id })),
        ),
    }
}

fn handle_schedule_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    store.cancel_schedule_edit();
    ok(&req.id, json!({ "ok": true }))
}

fn handle_schedule_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "draft": store.schedule_draft() }))
}

fn handle_schedule_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record: ScheduleItem = match req.params.get("item") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(e) => return err(&req.id, "bad_params", format!("invalid item: {e}"), None),
        },
        None => return err(&req.id, "bad_params", "missing item", None),
    };
    let is_new = param_bool(req, "isNew");
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let outcome = match store.save_schedule(record, is_new) {
        Ok(o) => o,
        Err(e) => return store_err(req, e),
    };
    let saved = store.schedule().iter().find(|s| s.id == outcome.id);
    ok(&req.id, json!({ "outcome": outcome, "item": saved }))
}

fn handle_schedule_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match param_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.delete_schedule(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.list" => Some(handle_schedule_list(state, req)),
        "schedule.beginNew" => Some(handle_schedule_begin_new(state, req)),
        "schedule.beginEdit" => Some(handle_schedule_begin_edit(state, req)),
        "schedule.cancelEdit" => Some(handle_schedule_cancel_edit(state, req)),
        "schedule.draft" => Some(handle_schedule_draft(state, req)),
        "schedule.save" => Some(handle_schedule_save(state, req)),
        "schedule.delete" => Some(handle_schedule_delete(state, req)),
        _ => None,
    }
}
