use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{param_bool, param_i64, require_store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::stats::StudentCard;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let students: Vec<StudentCard> = store.students().iter().map(StudentCard::new).collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_begin_new(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.begin_new_student() {
        Ok(draft) => ok(&req.id, json!({ "draft": draft, "isNew": true })),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_begin_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match param_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.begin_edit_student(id) {
        Some(draft) => ok(&req.id, json!({ "draft": draft, "isNew": false })),
        None => err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "id": id })),
        ),
    }
}

fn handle_students_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    store.cancel_student_edit();
    ok(&req.id, json!({ "ok": true }))
}

fn handle_students_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "draft": store.student_draft() }))
}

fn handle_students_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record: Student = match req.params.get("student") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(e) => return err(&req.id, "bad_params", format!("invalid student: {e}"), None),
        },
        None => return err(&req.id, "bad_params", "missing student", None),
    };
    let is_new = param_bool(req, "isNew");
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let outcome = match store.save_student(record, is_new) {
        Ok(o) => o,
        Err(e) => return store_err(req, e),
    };
    let saved = store
        .students()
        .iter()
        .find(|s| s.id == outcome.id)
        .map(StudentCard::new);
    ok(&req.id, json!({ "outcome": outcome, "student": saved }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match param_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match store.delete_student(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.beginNew" => Some(handle_students_begin_new(state, req)),
        "students.beginEdit" => Some(handle_students_begin_edit(state, req)),
        "students.cancelEdit" => Some(handle_students_cancel_edit(state, req)),
        "students.draft" => Some(handle_students_draft(state, req)),
        "students.save" => Some(handle_students_save(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
