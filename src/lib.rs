// src/lib.rs
// ────────────────────────────────────────────────────────────────────────────
// Public library entry point.  Re-export everything for both `main.rs` and
// integration tests.

mod macros;

pub mod checkin;
pub mod config;
pub mod db;
pub mod directory;
pub mod export;
pub mod model;
pub mod scanner;
