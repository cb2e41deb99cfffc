pub mod error;
pub mod header;
pub mod frame;
pub mod reader;
pub mod fixtures;

pub use error::{PersistenceError, Result};
pub use frame::{encode_frame, FrameHeader};
pub use header::LogHeader;
pub use reader::{scan, LogEntry, LogReader, LogScan};
