// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads `default.toml`, deserializes into `MasterConfig`, and converts the
//! raw scanner stub into the runtime `ScannerConfig`.

use crate::checkin_log;
use crate::config::model::{Config, ConfigError, MasterConfig};
use log::Level;
use std::{fs, path::Path};

/// Parse a TOML document into a runtime `Config`.
pub fn parse(txt: &str) -> Result<Config, ConfigError> {
    let master: MasterConfig = toml::from_str(txt)?;
    Ok(Config {
        logging:  master.logging,
        database: master.database,
        scanner:  master.scanner.try_into()?,
        export:   master.export,
    })
}

/// Load and parse the configuration from `path`.
/// Logs at DEBUG before reading and INFO on success.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    checkin_log!(Level::Debug, "config", "Reading config from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let cfg = parse(&txt)?;
    checkin_log!(Level::Info, "config", "Loaded config from {:?}", path);
    Ok(cfg)
}

/// Like `load`, but a missing file yields the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        load(path)
    } else {
        checkin_log!(Level::Info, "config", "No config at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketType;
    use std::time::Duration;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let cfg = parse(
            r#"
            [scanner]
            ticket = "main-food"
            lookup_timeout = "1500ms"

            [database]
            path = "event.db"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.scanner.ticket, TicketType::MainFood);
        assert_eq!(cfg.scanner.lookup_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.scanner.max_id_attempts, 20);
        assert_eq!(cfg.database.path, "event.db");
        assert_eq!(cfg.database.synchronous, "NORMAL");
        assert_eq!(cfg.logging.level, "INFO");
        assert_eq!(cfg.export.participants_file, "participants.csv");
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.scanner, Default::default());
        assert!(cfg.export.directory.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.database.batch_size, 100);
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let cfg = parse(include_str!("../../resources/default.toml")).unwrap();
        assert_eq!(cfg.scanner, Default::default());
        assert_eq!(cfg.database.path, "checkin.db");
        assert_eq!(cfg.logging.file.as_deref(), Some("checkin.log"));
    }

    #[test]
    fn malformed_toml_is_reported() {
        assert!(matches!(parse("[scanner"), Err(ConfigError::Toml(_))));
    }
}
