use crate::store::SlotStorage;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "cyberschool.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS storage_slots(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

/// Named text slots in `storage_slots`, one row per key.
pub struct SqliteSlots {
    conn: Connection,
}

impl SqliteSlots {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SlotStorage for SqliteSlots {
    fn read_slot(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage_slots WHERE key = ?",
                [key],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        upsert_slot(&self.conn, key, value)
    }

    /// All entries land in one transaction; a failure rolls back every one.
    fn write_slots(&mut self, entries: &[(&'static str, String)]) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            upsert_slot(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn upsert_slot(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO storage_slots(key, value, updated_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (key, value),
    )?;
    Ok(())
}
