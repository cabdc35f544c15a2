// src/db/batch_inserts.rs

use rusqlite::{params, Statement};
use crate::db::StoreError;
use crate::model::Transaction;

/// Defines how one record is bound to a prepared `INSERT`.
pub trait BatchInsert {
    fn insert_sql() -> &'static str;
    fn bind_and_execute(stmt: &mut Statement<'_>, record: &Self) -> Result<(), StoreError>;
}

/// TRANSACTIONS
impl BatchInsert for Transaction {
    fn insert_sql() -> &'static str {
        "INSERT INTO transactions \
           (ts, transaction_type, participant_name, details) \
         VALUES (?1,?2,?3,?4)"
    }

    fn bind_and_execute(stmt: &mut Statement<'_>, rec: &Transaction) -> Result<(), StoreError> {
        stmt.execute(params![
            rec.timestamp.timestamp_micros(),
            rec.transaction_type.as_str(),
            rec.participant_name,
            serde_json::to_string(&rec.transaction_details)?,
        ])?;
        Ok(())
    }
}
