// src/config/model.rs

//! Configuration structures.
//!
//! The `[scanner]` table is read into a raw stub first (strings straight from
//! TOML) and converted into the typed runtime `ScannerConfig`, the same split
//! the loader keeps between file format and logic-layer types. Every table is
//! optional; a missing file or section falls back to the defaults below.

use serde::Deserialize;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

use crate::model::{ParseTicketError, TicketType};

/// Top-level runtime config
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging:  LoggingConfig,
    pub database: DatabaseConfig,
    pub scanner:  ScannerConfig,
    pub export:   ExportConfig,
}

/// Mirror of the whole TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub logging:  LoggingConfig,
    pub database: DatabaseConfig,
    pub scanner:  ScannerStub,
    pub export:   ExportConfig,
}

/// Mirror of the `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Also write to `file` (stderr is always on).
    #[serde(default)]            pub enable: bool,
    #[serde(default)]            pub file:   Option<String>,
    #[serde(default = "default_level")] pub level: String,
}
fn default_level() -> String { "INFO".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: default_level() }
    }
}

/// Mirror of the `[database]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path:                String,
    pub purge_on_restart:    bool,
    pub synchronous:         String,
    pub journal_size_limit:  u64,
    pub busy_timeout_ms:     u64,
    /// 0 disables the periodic WAL checkpoint.
    pub checkpoint_seconds:  u64,
    pub flush_interval_ms:   u64,
    pub batch_size:          usize,
    /// Capacity of the queue in front of the transaction writer.
    pub writer_capacity:     usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path:               "checkin.db".into(),
            purge_on_restart:   false,
            synchronous:        "NORMAL".into(),
            journal_size_limit: 50_000_000,
            busy_timeout_ms:    1_000,
            checkpoint_seconds: 300,
            flush_interval_ms:  250,
            batch_size:         100,
            writer_capacity:    1_024,
        }
    }
}

/// Raw `[scanner]` entries from TOML
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScannerStub {
    pub ticket:           String,
    /// humantime string, e.g. `"5s"` or `"1500ms"`
    pub lookup_timeout:   String,
    pub max_id_attempts:  u32,
    pub pause_while_busy: bool,
}

impl Default for ScannerStub {
    fn default() -> Self {
        Self {
            ticket:           TicketType::default().field().into(),
            lookup_timeout:   "5s".into(),
            max_id_attempts:  20,
            pause_while_busy: true,
        }
    }
}

/// Fully-typed scanner settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Ticket type selected when a session starts.
    pub ticket:           TicketType,
    pub lookup_timeout:   Duration,
    pub max_id_attempts:  u32,
    /// Discard payloads that arrive while a check-in is in flight.
    pub pause_while_busy: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ticket:           TicketType::default(),
            lookup_timeout:   Duration::from_secs(5),
            max_id_attempts:  20,
            pause_while_busy: true,
        }
    }
}

impl TryFrom<ScannerStub> for ScannerConfig {
    type Error = ConfigError;

    fn try_from(stub: ScannerStub) -> Result<Self, Self::Error> {
        let ticket = stub.ticket.parse()?;
        let lookup_timeout = humantime::parse_duration(&stub.lookup_timeout)
            .map_err(|e| ConfigError::InvalidDuration(stub.lookup_timeout.clone(), e))?;
        if stub.max_id_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            ticket,
            lookup_timeout,
            max_id_attempts: stub.max_id_attempts,
            pause_while_busy: stub.pause_while_busy,
        })
    }
}

/// Mirror of the `[export]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Defaults to the system temporary directory.
    pub directory:         Option<PathBuf>,
    pub participants_file: String,
    pub transactions_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory:         None,
            participants_file: "participants.csv".into(),
            transactions_file: "transactions.csv".into(),
        }
    }
}

impl ExportConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ticket type: {0}")]
    InvalidTicket(#[from] ParseTicketError),

    #[error("invalid duration '{0}': {1}")]
    InvalidDuration(String, #[source] humantime::DurationError),

    #[error("max_id_attempts must be at least 1")]
    ZeroAttempts,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_defaults_convert_to_runtime_defaults() {
        let cfg = ScannerConfig::try_from(ScannerStub::default()).unwrap();
        assert_eq!(cfg, ScannerConfig::default());
    }

    #[test]
    fn rejects_bad_duration_and_ticket() {
        let stub = ScannerStub { lookup_timeout: "soon".into(), ..Default::default() };
        assert!(matches!(
            ScannerConfig::try_from(stub),
            Err(ConfigError::InvalidDuration(s, _)) if s == "soon"
        ));

        let stub = ScannerStub { ticket: "dessert".into(), ..Default::default() };
        assert!(matches!(ScannerConfig::try_from(stub), Err(ConfigError::InvalidTicket(_))));

        let stub = ScannerStub { max_id_attempts: 0, ..Default::default() };
        assert!(matches!(ScannerConfig::try_from(stub), Err(ConfigError::ZeroAttempts)));
    }
}
