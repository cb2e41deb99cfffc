// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log Writer
//!
//! This is the durability layer of the file backend.
//! - Every frame is written and fsync'd before `append` returns
//! - Records are never rewritten; the only truncation is cutting a torn tail
//!   on open, or rolling back a frame whose own write failed
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Frame][Frame][Frame]...
//! ```
//! See `eventdb_persistence` for the header and frame layouts.

use crate::events::event_index::LatestIndex;
use crate::events::event_replay::replay_event_log;
use eventdb_kernel::{EventId, EventRecord};
use eventdb_persistence::{encode_frame, LogHeader, PersistenceError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log format error: {0}")]
    Format(#[from] PersistenceError),

    #[error("Expected event {expected}, got {found}")]
    UnexpectedId { expected: EventId, found: EventId },

    #[error("Event log is unusable after a failed rollback")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, EventLogError>;

pub struct EventLogWriter {
    path: PathBuf,
    file: File,
    len: u64,
    next_id: EventId,
    poisoned: bool,
}

impl EventLogWriter {
    /// Open or create an event log file.
    ///
    /// A new file gets a header. An existing file is replayed; the returned index
    /// reflects every committed record.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, LatestIndex)> {
        let path = path.as_ref().to_path_buf();
        let existing_len = match std::fs::metadata(&path) {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let header_len = LogHeader::SIZE as u64;
        match existing_len {
            None | Some(0) => return Self::initialize(path, file, existing_len.is_none()),
            Some(len) if len < header_len => {
                // Creation was interrupted before the header was complete; no frame
                // can have been acknowledged. Anything that is not a header prefix
                // is someone else's file.
                let found = std::fs::read(&path)?;
                if !LogHeader::new().to_bytes().starts_with(&found) {
                    return Err(PersistenceError::InvalidMagic.into());
                }
                tracing::warn!(
                    path = %path.display(),
                    len,
                    "Rewriting incomplete header left by an interrupted log creation"
                );
                file.set_len(0)?;
                return Self::initialize(path, file, false);
            }
            Some(_) => {}
        }

        let replay = replay_event_log(&path)?;
        if let Some(offset) = replay.torn_tail {
            tracing::warn!(
                path = %path.display(),
                offset,
                "Discarding incomplete final frame left by an interrupted append"
            );
            file.set_len(replay.valid_len)?;
            file.sync_all()?;
        }

        let next_id = replay.index.head().map_or(EventId(1), |h| h.next());
        let writer = Self {
            path,
            file,
            len: replay.valid_len,
            next_id,
            poisoned: false,
        };
        Ok((writer, replay.index))
    }

    /// Writes the header into an empty file. A freshly created file also has its
    /// directory entry synced.
    fn initialize(path: PathBuf, mut file: File, created: bool) -> Result<(Self, LatestIndex)> {
        LogHeader::new().write_to(&mut file)?;
        file.sync_all()?;
        if created {
            sync_parent_dir(&path)?;
        }
        let writer = Self {
            path,
            file,
            len: LogHeader::SIZE as u64,
            next_id: EventId(1),
            poisoned: false,
        };
        Ok((writer, LatestIndex::new()))
    }

    /// Id the next appended record must carry.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    /// Append a record and fsync.
    ///
    /// Only returns Ok() after the frame is durable. On failure the partial frame
    /// is cut off so the file still ends on a frame boundary.
    pub fn append(&mut self, record: &EventRecord) -> Result<()> {
        if self.poisoned {
            return Err(EventLogError::Poisoned);
        }
        if record.id != self.next_id {
            return Err(EventLogError::UnexpectedId {
                expected: self.next_id,
                found: record.id,
            });
        }

        let frame = encode_frame(record)?;
        let written = self
            .file
            .write_all(&frame)
            .and_then(|_| self.file.sync_data());

        if let Err(e) = written {
            self.rollback();
            return Err(e.into());
        }

        self.len += frame.len() as u64;
        self.next_id = record.id.next();
        Ok(())
    }

    fn rollback(&mut self) {
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.sync_data());
        if let Err(e) = restored {
            tracing::error!(path = %self.path.display(), error = %e, "Could not roll back failed append");
            self.poisoned = true;
        }
    }

    /// Bytes in the file, header included.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == LogHeader::SIZE as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
