use super::format_millis;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use eventdb_persistence::scan;
use std::path::Path;

pub fn run(log_path: &Path, source: Option<&str>, kind: Option<&str>) -> anyhow::Result<()> {
    let scan = scan(log_path)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Created", "Source", "Kind", "Bytes"]);

    let mut shown = 0;
    for record in scan
        .records
        .iter()
        .filter(|r| source.map_or(true, |s| r.source == s))
        .filter(|r| kind.map_or(true, |k| r.kind == k))
    {
        table.add_row(vec![
            record.id.to_string(),
            format_millis(record.created_at_ms),
            record.source.clone(),
            record.kind.clone(),
            record.payload.len().to_string(),
        ]);
        shown += 1;
    }

    println!("\nEvent Timeline ({shown} of {} records)\n", scan.records.len());
    println!("{table}\n");

    if let Some(offset) = scan.torn_tail {
        println!("⚠️  Incomplete frame at byte {offset} ignored.\n");
    }

    Ok(())
}
