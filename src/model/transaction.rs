// src/model/transaction.rs

//! Audit records. A transaction is written once per successful check-in and
//! is never touched again; the store enforces that with triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use super::TicketType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Scan,
}

impl TransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionType::Scan => "scan",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(TransactionType::Scan),
            other  => Err(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub participant_name: String,
    /// Flag field name → value it was set to.
    pub transaction_details: BTreeMap<String, bool>,
}

impl Transaction {
    /// The record written after `ticket` was checked in for `participant_name`.
    pub fn scan(participant_name: impl Into<String>, ticket: TicketType) -> Self {
        Self {
            timestamp: Utc::now(),
            transaction_type: TransactionType::Scan,
            participant_name: participant_name.into(),
            transaction_details: BTreeMap::from([(ticket.field().to_owned(), true)]),
        }
    }

    pub fn detail(&self, ticket: TicketType) -> Option<bool> {
        self.transaction_details.get(ticket.field()).copied()
    }
}
