use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::auth::Session;
use crate::db::{self, SqliteSlots};
use crate::store::EntityStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<EntityStore>,
    pub session: Session,
    pub export_dir: Option<PathBuf>,
}

impl AppState {
    /// Opens the workspace database and loads the store from it. On failure
    /// the previously open workspace stays selected.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let conn = db::open_db(path)?;
        let store = EntityStore::load(Box::new(SqliteSlots::new(conn)))?;
        info!(workspace = %path.display(), "workspace opened");
        self.workspace = Some(path.to_path_buf());
        self.store = Some(store);
        Ok(())
    }
}
