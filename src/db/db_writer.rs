// src/db/db_writer.rs

use rusqlite::Connection;
use std::{thread::sleep, time::{Duration, Instant}};
use tokio::sync::mpsc;

use crate::db::{BatchInsert, StoreError};

const MAX_LOCK_RETRIES: u64 = 5;

/// Batched writer for append-only records.
/// Performs all DB work synchronously to avoid holding &Connection across .await.
pub struct DbWriter<T> {
    pub conn: Connection,
    pub rx: mpsc::Receiver<T>,
    pub flush_interval: Duration,
    pub batch_size: usize,
}

impl<T> DbWriter<T>
where
    T: BatchInsert + Send + 'static,
{
    /// Start the writer loop; call inside tokio::spawn.
    /// Returns once every sender is dropped and the last batch is flushed.
    pub async fn run(mut self) {
        let mut buffer = Vec::with_capacity(self.batch_size);
        let mut interval = tokio::time::interval(self.flush_interval);

        loop {
            tokio::select! {
                maybe = self.rx.recv() => match maybe {
                    Some(rec) => {
                        buffer.push(rec);
                        if buffer.len() >= self.batch_size {
                            self.flush_logged(&mut buffer);
                        }
                    }
                    None => {
                        self.flush_logged(&mut buffer);
                        break;
                    }
                },
                _ = interval.tick() => {
                    self.flush_logged(&mut buffer);
                }
            }
        }
        log::debug!("db writer stopped");
    }

    fn flush_logged(&mut self, buffer: &mut Vec<T>) {
        if let Err(e) = self.flush_sync(buffer) {
            log::error!("dropping batch after write failure: {}", e);
        }
    }

    /// Synchronous flush with retry + backoff while the database is locked.
    /// The buffer is emptied on return whether or not the write succeeded.
    fn flush_sync(&mut self, buffer: &mut Vec<T>) -> Result<usize, StoreError> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let start = Instant::now();
        let mut attempts = 0;

        let result = loop {
            match write_batch(&mut self.conn, buffer) {
                Err(e) if e.is_locked() && attempts < MAX_LOCK_RETRIES => {
                    attempts += 1;
                    sleep(Duration::from_millis(50 * attempts));
                }
                other => break other,
            }
        };
        buffer.clear();

        if let Ok(n) = result {
            metrics::histogram!("db_flush_duration_seconds").record(start.elapsed().as_secs_f64());
            metrics::histogram!("db_flush_batch_size").record(n as f64);
            metrics::counter!("db_flush_batches_total").increment(1);
        }
        result
    }
}

fn write_batch<T: BatchInsert>(conn: &mut Connection, batch: &[T]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(T::insert_sql())?;
        for rec in batch {
            T::bind_and_execute(&mut stmt, rec)?;
        }
    }
    tx.commit()?;
    Ok(batch.len())
}
