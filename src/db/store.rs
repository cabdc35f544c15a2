// src/db/store.rs

//! # Participant Store
//!
//! The document-store contract the check-in engine runs against, and its
//! SQLite implementation. Participants are keyed by their code; transactions
//! are an append-only collection ordered by creation time.
//!
//! `mark_checked_in` is a conditional update (`... WHERE flag = 0`), so two
//! scanners racing on the same code cannot both flip the flag.

use async_trait::async_trait;
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tokio::task;

use crate::checkin::AuditSink;
use crate::db::{connection::apply_schema, BatchInsert, StoreError};
use crate::model::{Participant, TicketType, Transaction};

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Participant>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Participants whose name equals `name` exactly.
    async fn find_by_name(&self, name: &str) -> Result<Vec<Participant>, StoreError>;

    /// Everyone, ordered by name then id.
    async fn list_by_name(&self) -> Result<Vec<Participant>, StoreError>;

    /// Returns `false` without writing when the id is already taken.
    async fn insert(&self, participant: &Participant) -> Result<bool, StoreError>;

    /// Set `ticket`'s flag if it is still unset. Returns whether this call
    /// flipped it; `false` means absent or already checked in.
    async fn mark_checked_in(&self, id: &str, ticket: TicketType) -> Result<bool, StoreError>;

    /// Newest first.
    async fn transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn append_transaction(&self, tx: &Transaction) -> Result<(), StoreError>;
}

const PARTICIPANT_COLUMNS: &str = "id, name, participant_kit, entry, main_food, snack";

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id:              row.get(0)?,
        name:            row.get(1)?,
        participant_kit: row.get(2)?,
        entry:           row.get(3)?,
        main_food:       row.get(4)?,
        snack:           row.get(5)?,
    })
}

fn transaction_from_parts(
    ts: i64,
    kind: String,
    participant_name: String,
    details: String,
) -> Result<Transaction, StoreError> {
    let timestamp = DateTime::from_timestamp_micros(ts).ok_or(StoreError::Timestamp(ts))?;
    let transaction_type = kind.parse().map_err(StoreError::TransactionType)?;
    let transaction_details: BTreeMap<String, bool> = serde_json::from_str(&details)?;
    Ok(Transaction { timestamp, transaction_type, participant_name, transaction_details })
}

/// SQLite-backed store. One connection behind a mutex; every async method
/// runs its SQL on the blocking pool, so a caller's timeout can give up on a
/// locked database without stalling a runtime worker.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    /// Private in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self::new(conn))
    }

    /// Runs `f` on the caller's thread.
    fn with_conn<R>(
        &self,
        f: impl FnOnce(&Connection) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    /// Runs `f` on a blocking-pool thread. Dropping the returned future does
    /// not cancel `f`; it finishes (or hits the busy timeout) on its own.
    async fn blocking<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&conn)
        })
        .await?
    }

    /// `sql` takes either no parameter or a single `?1`.
    async fn query_participants(
        &self,
        sql: String,
        arg: Option<String>,
    ) -> Result<Vec<Participant>, StoreError> {
        self.blocking(move |c| {
            let mut stmt = c.prepare_cached(&sql)?;
            let rows = match arg {
                Some(a) => stmt.query_map([a], participant_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
                None    => stmt.query_map([], participant_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            };
            Ok(rows)
        })
        .await
    }

    pub fn insert_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        self.with_conn(|c| {
            let mut stmt = c.prepare_cached(Transaction::insert_sql())?;
            Transaction::bind_and_execute(&mut stmt, tx)
        })
    }
}

#[async_trait]
impl ParticipantStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<Participant>, StoreError> {
        let id = id.to_owned();
        self.blocking(move |c| {
            let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = ?1");
            Ok(c.query_row(&sql, [id], participant_from_row).optional()?)
        })
        .await
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_owned();
        self.blocking(move |c| {
            Ok(c.query_row(
                "SELECT EXISTS(SELECT 1 FROM participants WHERE id = ?1)",
                [id],
                |r| r.get(0),
            )?)
        })
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Participant>, StoreError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE name = ?1 ORDER BY id");
        self.query_participants(sql, Some(name.to_owned())).await
    }

    async fn list_by_name(&self) -> Result<Vec<Participant>, StoreError> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY name, id");
        self.query_participants(sql, None).await
    }

    async fn insert(&self, p: &Participant) -> Result<bool, StoreError> {
        let p = p.clone();
        self.blocking(move |c| {
            let changed = c.execute(
                "INSERT OR IGNORE INTO participants \
                   (id, name, participant_kit, entry, main_food, snack) \
                 VALUES (?1,?2,?3,?4,?5,?6)",
                params![p.id, p.name, p.participant_kit, p.entry, p.main_food, p.snack],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn mark_checked_in(&self, id: &str, ticket: TicketType) -> Result<bool, StoreError> {
        let id = id.to_owned();
        self.blocking(move |c| {
            let col = ticket.column();
            let sql = format!("UPDATE participants SET {col} = 1 WHERE id = ?1 AND {col} = 0");
            Ok(c.execute(&sql, [id])? == 1)
        })
        .await
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let raw = self
            .blocking(|c| {
                let mut stmt = c.prepare_cached(
                    "SELECT ts, transaction_type, participant_name, details \
                       FROM transactions ORDER BY ts DESC, seq DESC",
                )?;
                let rows = stmt.query_map([], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;
        raw.into_iter()
            .map(|(ts, kind, name, details)| transaction_from_parts(ts, kind, name, details))
            .collect()
    }

    async fn append_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        let tx = tx.clone();
        self.blocking(move |c| {
            let mut stmt = c.prepare_cached(Transaction::insert_sql())?;
            Transaction::bind_and_execute(&mut stmt, &tx)
        })
        .await
    }
}

/// Writes the audit record straight through on the caller's thread.
/// Used where no batched writer runs (`add`, tests).
impl AuditSink for SqliteStore {
    fn record(&self, tx: Transaction) {
        if let Err(e) = self.insert_transaction(&tx) {
            log::error!("audit append for '{}' failed: {}", tx.participant_name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conditional_update_flips_once() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.insert(&Participant::new("AB12C", "Jo")).await.unwrap());

        assert!(store.mark_checked_in("AB12C", TicketType::Snack).await.unwrap());
        assert!(!store.mark_checked_in("AB12C", TicketType::Snack).await.unwrap());
        assert!(!store.mark_checked_in("ZZZZZ", TicketType::Snack).await.unwrap());

        let p = store.get("AB12C").await.unwrap().unwrap();
        assert_eq!(p.flags(), [false, false, false, true]);
    }

    #[tokio::test]
    async fn insert_refuses_taken_id() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.insert(&Participant::new("AB12C", "Jo")).await.unwrap());
        assert!(!store.insert(&Participant::new("AB12C", "Someone Else")).await.unwrap());
        assert_eq!(store.get("AB12C").await.unwrap().unwrap().name, "Jo");
    }

    #[tokio::test]
    async fn listing_orders_by_name_then_id() {
        let store = SqliteStore::in_memory().unwrap();
        for (id, name) in [("CCCCC", "Bea"), ("BBBBB", "Al"), ("AAAAA", "Bea")] {
            store.insert(&Participant::new(id, name)).await.unwrap();
        }
        let ids: Vec<_> = store.list_by_name().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["BBBBB", "AAAAA", "CCCCC"]);
        assert_eq!(store.find_by_name("Bea").await.unwrap().len(), 2);
        assert!(store.find_by_name("bea").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transactions_come_back_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let mut first = Transaction::scan("Jo", TicketType::Entry);
        first.timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut second = Transaction::scan("Al", TicketType::Snack);
        second.timestamp = DateTime::from_timestamp(1_700_000_060, 0).unwrap();

        store.append_transaction(&first).await.unwrap();
        store.record(second.clone());

        let txs = store.transactions().await.unwrap();
        assert_eq!(txs, vec![second, first]);
    }
}
