use crate::model::{ScheduleItem, Student};
use crate::store::{EntityStore, StoreError};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const EXPORT_FILE_PREFIX: &str = "cyberschool_data_";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExchangeError {
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::Malformed(_) => "malformed_input",
            ExchangeError::Read { .. } => "io_failed",
            ExchangeError::Store(e) => e.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub students: Vec<Student>,
    pub schedule: Vec<ScheduleItem>,
    pub export_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub students_replaced: bool,
    pub schedule_replaced: bool,
    pub student_count: usize,
    pub schedule_count: usize,
}

pub fn export_document(store: &EntityStore, now: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        students: store.students().to_vec(),
        schedule: store.schedule().to_vec(),
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", EXPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

pub fn write_export(doc: &ExportDocument, out_dir: &Path, date: NaiveDate) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let out_path = out_dir.join(export_file_name(date));
    let text = serde_json::to_string_pretty(doc).context("failed to serialize export document")?;
    std::fs::write(&out_path, text)
        .with_context(|| format!("failed to write export file {}", out_path.to_string_lossy()))?;
    info!(path = %out_path.display(), "export written");
    Ok(out_path)
}

#[derive(Debug)]
struct ImportPayload {
    students: Option<Vec<Student>>,
    schedule: Option<Vec<ScheduleItem>>,
}

/// Parses the whole document before anything is applied, so a failure leaves
/// the store untouched. The top level must be an object and each present
/// collection an array; records inside are read leniently (missing or null
/// fields take defaults, fractional grades are rounded).
fn parse_import(text: &str) -> Result<ImportPayload, ExchangeError> {
    let root: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ExchangeError::Malformed(e.to_string()))?;
    let Some(obj) = root.as_object() else {
        return Err(ExchangeError::Malformed(
            "top-level value is not an object".to_string(),
        ));
    };

    let students = match obj.get("students") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            Vec::<Student>::deserialize(v)
                .map_err(|e| ExchangeError::Malformed(format!("students: {e}")))?,
        ),
    };
    let schedule = match obj.get("schedule") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            Vec::<ScheduleItem>::deserialize(v)
                .map_err(|e| ExchangeError::Malformed(format!("schedule: {e}")))?,
        ),
    };
    Ok(ImportPayload { students, schedule })
}

pub fn import_text(store: &mut EntityStore, text: &str) -> Result<ImportSummary, ExchangeError> {
    let payload = parse_import(text)?;
    let students_replaced = payload.students.is_some();
    let schedule_replaced = payload.schedule.is_some();

    store.replace_collections(payload.students, payload.schedule)?;

    let summary = ImportSummary {
        students_replaced,
        schedule_replaced,
        student_count: store.students().len(),
        schedule_count: store.schedule().len(),
    };
    info!(
        students_replaced,
        schedule_replaced,
        students = summary.student_count,
        schedule = summary.schedule_count,
        "import applied"
    );
    Ok(summary)
}

pub fn import_file(store: &mut EntityStore, path: &Path) -> Result<ImportSummary, ExchangeError> {
    let text = std::fs::read_to_string(path).map_err(|e| ExchangeError::Read {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })?;
    import_text(store, &text)
}
