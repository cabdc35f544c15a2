// src/db/connection.rs
//! Opening and initialising SQLite with runtime parameters.

use std::{fs, io, path::{Path, PathBuf}, time::Duration};
use rusqlite::Connection;
use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("../../resources/schema.sql");

/// Resolve the configured database path; relative paths hang off `base_dir`.
pub fn db_path(base_dir: &Path, cfg: &DatabaseConfig) -> PathBuf {
    base_dir.join(&cfg.path)
}

pub fn open_db_connection(path: &Path, cfg: &DatabaseConfig) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", cfg.synchronous.as_str())?;
    Ok(conn)
}

/// Every statement is `IF NOT EXISTS`, so this is safe on every start.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Deletes the database together with its `-wal` and `-shm` sidecars, so a
/// stale log cannot be replayed into the fresh file. This is an explicit
/// reset: recorded transactions go with it.
fn purge_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let file = PathBuf::from(file);
        match fs::remove_file(&file) {
            Ok(()) => log::warn!("Purged {}", file.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Could not purge {}: {}", file.display(), e),
        }
    }
}

pub fn init_database(base_dir: &Path, cfg: &DatabaseConfig) -> rusqlite::Result<Connection> {
    let path = db_path(base_dir, cfg);

    if cfg.purge_on_restart {
        purge_files(&path);
    }

    let conn = open_db_connection(&path, cfg)?;
    conn.pragma_update(None, "journal_size_limit", cfg.journal_size_limit as i64)?;
    apply_schema(&conn)?;

    log::info!("Database ready at {}", path.display());
    Ok(conn)
}
