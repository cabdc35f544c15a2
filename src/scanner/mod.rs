pub mod session;
pub mod source;

pub use session::{ScanReport, ScannerSession};
pub use source::{ChannelSource, ScanEvent, ScanSource};
