use thiserror::Error;

use crate::db::StoreError;
use crate::model::TicketType;

/// Everything a scan or an add-participant request can end in besides
/// success. None of these are fatal; each becomes a message to the operator.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("invalid QR code '{0}'")]
    InvalidCode(String),

    #[error("participant '{0}' not found")]
    NotFound(String),

    #[error("{name} ({code}) already checked in for {ticket}")]
    AlreadyCheckedIn { code: String, name: String, ticket: TicketType },

    #[error("a participant named '{0}' already exists")]
    DuplicateName(String),

    #[error("participant name must not be empty")]
    InvalidName,

    #[error("no unused participant id after {0} attempts")]
    AllocationExhausted(u32),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl CheckInError {
    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckInError::InvalidCode(_)           => "invalid_code",
            CheckInError::NotFound(_)              => "not_found",
            CheckInError::AlreadyCheckedIn { .. }  => "already_checked_in",
            CheckInError::DuplicateName(_)         => "duplicate_name",
            CheckInError::InvalidName              => "invalid_name",
            CheckInError::AllocationExhausted(_)   => "allocation_exhausted",
            CheckInError::StoreUnavailable(_)      => "store_unavailable",
        }
    }
}
