use crate::exchange::{self, ExchangeError};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::require_store;
use crate::ipc::types::{AppState, Request};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;

fn exchange_err(req: &Request, e: ExchangeError) -> serde_json::Value {
    warn!(method = %req.method, error = %e, "exchange failed");
    err(&req.id, e.code(), e.to_string(), None)
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_dir = req
        .params
        .get("outDir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.export_dir.clone());
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let now = Utc::now();
    let doc = exchange::export_document(store, now);
    let file_name = exchange::export_file_name(now.date_naive());
    let path = match out_dir {
        Some(dir) => match exchange::write_export(&doc, &dir, now.date_naive()) {
            Ok(p) => Some(p.to_string_lossy().to_string()),
            Err(e) => {
                warn!(dir = %dir.display(), error = %format!("{e:#}"), "export write failed");
                return err(
                    &req.id,
                    "io_failed",
                    format!("{e:#}"),
                    Some(json!({ "outDir": dir.to_string_lossy() })),
                );
            }
        },
        None => None,
    };

    ok(
        &req.id,
        json!({
            "fileName": file_name,
            "path": path,
            "document": doc
        }),
    )
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = req.params.get("text").and_then(|v| v.as_str());
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let store = match require_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    // Inline text wins when both are given.
    let result = match (text, path) {
        (Some(text), _) => exchange::import_text(store, text),
        (None, Some(path)) => exchange::import_file(store, &path),
        (None, None) => return err(&req.id, "bad_params", "missing text or path", None),
    };
    match result {
        Ok(summary) => ok(&req.id, json!(summary)),
        Err(e) => exchange_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exchange.export" => Some(handle_export(state, req)),
        "exchange.import" => Some(handle_import(state, req)),
        _ => None,
    }
}
