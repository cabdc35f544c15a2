use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("malformed transaction details: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown transaction type '{0}'")]
    TransactionType(String),

    #[error("timestamp {0} out of range")]
    Timestamp(i64),

    #[error("store connection lock poisoned")]
    Poisoned,

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// SQLite reported contention rather than a real failure.
    pub fn is_locked(&self) -> bool {
        match self {
            StoreError::Sql(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}
