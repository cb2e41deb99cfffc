//! Log files for tests and tooling demos.

use crate::error::Result;
use crate::frame::{encode_frame, FrameHeader};
use crate::header::LogHeader;
use eventdb_kernel::{EventId, EventKey, EventRecord};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Five records over three keys; `acme/temp` is written three times.
pub fn sample_records() -> Vec<EventRecord> {
    let entries: [(&str, &str, &str); 5] = [
        ("acme", "temp", r#"{"c":19.5}"#),
        ("acme", "temp", r#"{"c":20.0}"#),
        ("acme", "door", r#"{"open":true}"#),
        ("globex", "temp", r#"{"c":-3}"#),
        ("acme", "temp", r#"{"c":21.25}"#),
    ];
    entries
        .iter()
        .enumerate()
        .map(|(i, (source, kind, payload))| {
            let key = EventKey::new(*source, *kind).expect("fixture keys are non-empty");
            EventRecord::new(
                EventId(i as u64 + 1),
                &key,
                payload.as_bytes().to_vec(),
                1_700_000_000_000 + i as i64 * 1_000,
            )
        })
        .collect()
}

/// Writes a complete log file holding `records` in the given order.
pub fn write_log(path: &Path, records: &[EventRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    LogHeader::new().write_to(&mut file)?;
    for record in records {
        file.write_all(&encode_frame(record)?)?;
    }
    file.sync_all()?;
    Ok(())
}

/// Appends half of a frame header, as left behind by a crash mid-append.
pub fn append_torn_frame(path: &Path) -> Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(&[0xab; FrameHeader::SIZE / 2])?;
    file.sync_all()?;
    Ok(())
}

/// Writes the sample log into `dir` and returns its path.
pub fn generate_test_log(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let path = dir.join("events.log");
    write_log(&path, &sample_records())?;
    Ok(path)
}
