pub mod audit;
pub mod code;
pub mod engine;
pub mod error;

pub use audit::{AuditSink, ChannelAudit};
pub use code::{is_valid_code, IdSource, RandomIds, CODE_ALPHABET, CODE_LENGTH};
pub use engine::{CheckIn, CheckInEngine};
pub use error::CheckInError;
