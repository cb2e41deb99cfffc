// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-only event log
//!
//! # Architecture
//! - Event log file = primary truth (append-only, fsync'd)
//! - Latest index = derived, rebuilt from the log on every open
//!
//! # Guarantees
//! - A record is durable before its append returns
//! - A torn final frame is discarded on open; any other damage fails closed
//! - Replaying the same log always yields the same index

pub mod event_log;
pub mod event_index;
pub mod event_replay;

pub use event_index::LatestIndex;
pub use event_log::{EventLogError, EventLogWriter};
pub use event_replay::{replay_event_log, Replay};
