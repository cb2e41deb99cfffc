use super::format_millis;
use eventdb_kernel::{EventKey, EventRecord};
use eventdb_persistence::scan;
use std::path::Path;

/// Newest record for `source`/`kind` in the log.
pub fn find(log_path: &Path, source: &str, kind: &str) -> anyhow::Result<Option<EventRecord>> {
    let key = EventKey::new(source, kind)?;
    let scan = scan(log_path)?;
    Ok(scan.records.into_iter().rev().find(|r| r.matches(&key)))
}

pub fn run(log_path: &Path, source: &str, kind: &str) -> anyhow::Result<()> {
    let Some(record) = find(log_path, source, kind)? else {
        anyhow::bail!("no event recorded for {source}/{kind}");
    };

    println!("\nID:      {}", record.id);
    println!("Created: {}\n", format_millis(record.created_at_ms));

    match serde_json::from_slice::<serde_json::Value>(&record.payload) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&record.payload)),
    }
    Ok(())
}
