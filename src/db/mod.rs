// src/db/mod.rs
//! Public façade for DB helpers (re-exports plus spawn_writer).

pub mod batch_inserts;
pub mod connection;
pub mod db_writer;
pub mod error;
pub mod maintenance;
pub mod store;

use rusqlite::Connection;
use std::time::Duration;
use tokio::{runtime::Handle, sync::mpsc as async_mpsc, task::JoinHandle};
use crate::config::DatabaseConfig;
pub use batch_inserts::BatchInsert;
pub use db_writer::DbWriter;
pub use error::StoreError;
pub use store::{ParticipantStore, SqliteStore};

/// Spawn a dedicated writer task for records of type `E`.
/// The task ends after every sender is dropped and the tail is flushed.
pub fn spawn_writer<E>(
    rt: &Handle,
    conn: Connection,
    rx: async_mpsc::Receiver<E>,
    cfg: &DatabaseConfig,
) -> JoinHandle<()>
where
    E: BatchInsert + Send + 'static,
{
    // Copy what we need so nothing borrowed lives in the async task
    let flush_interval = Duration::from_millis(cfg.flush_interval_ms.max(1));
    let batch_size     = cfg.batch_size.max(1);

    rt.spawn(async move {
        DbWriter::<E> {
            conn,
            rx,
            flush_interval,
            batch_size,
        }
            .run()
            .await;
    })
}
