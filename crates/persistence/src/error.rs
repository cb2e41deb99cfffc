use eventdb_kernel::EventId;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported log version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch for event {id}: expected {expected:016x}, found {found:016x}")]
    ChecksumMismatch {
        id: u64,
        expected: u64,
        found: u64,
    },
    #[error("Frame header says event {header} but body holds event {body}")]
    IdMismatch { header: u64, body: EventId },
    #[error("Event {found} follows event {previous}; ids must increase")]
    OutOfOrder { previous: EventId, found: EventId },
    #[error("Frame at offset {offset} declares {len} body bytes")]
    FrameTooLarge { offset: u64, len: u32 },
    #[error("Incomplete frame at offset {offset}")]
    TornTail { offset: u64 },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
