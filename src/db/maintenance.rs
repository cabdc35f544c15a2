// src/db/maintenance.rs
//! Periodic WAL checkpoints.
//!
//! There is no TTL cleanup: transactions are never deleted.

use std::{path::PathBuf, time::Duration};
use rusqlite::Connection;
use tokio::{runtime::Handle, task::JoinHandle};
use crate::config::DatabaseConfig;

pub fn spawn_wal_maintenance(
    rt: &Handle,
    db_path: PathBuf,
    cfg: &DatabaseConfig,
) -> Option<JoinHandle<()>> {
    if cfg.checkpoint_seconds == 0 { return None; }          // disabled
    let period = Duration::from_secs(cfg.checkpoint_seconds);
    Some(rt.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;                                // first tick is immediate
        loop {
            ticker.tick().await;
            match Connection::open(&db_path) {
                Ok(conn) => {
                    if let Err(e) = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);") {
                        log::warn!("WAL checkpoint failed: {}", e);
                    } else {
                        log::debug!("WAL checkpoint done for {}", db_path.display());
                    }
                }
                Err(e) => log::warn!("WAL checkpoint could not open {}: {}", db_path.display(), e),
            }
        }
    }))
}
