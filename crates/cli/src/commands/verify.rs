use eventdb_persistence::{LogReader, PersistenceError};
use std::path::Path;

/// Checks every frame's checksum and id order.
pub fn run(log_path: &Path) -> anyhow::Result<()> {
    let mut reader = LogReader::open(log_path)?;
    let mut frames = 0u64;
    let mut last_id = None;

    for item in reader.by_ref() {
        match item {
            Ok(entry) => {
                frames += 1;
                last_id = Some(entry.record.id);
            }
            Err(PersistenceError::TornTail { offset }) => {
                println!("\n⚠️  Incomplete final frame at byte {offset}.");
                println!("It was never acknowledged and is dropped when the node opens the log.");
            }
            Err(e) => {
                println!("\n❌ CORRUPTED\n");
                println!("Valid frames: {frames}");
                println!("Valid up to:  byte {}", reader.offset());
                return Err(e.into());
            }
        }
    }

    println!("\n✅ VERIFIED\n");
    println!("Frames:     {frames}");
    match last_id {
        Some(id) => println!("Last ID:    {id}"),
        None => println!("Last ID:    -"),
    }
    println!("Confidence: STRONG (CRC64 per frame)\n");
    Ok(())
}
