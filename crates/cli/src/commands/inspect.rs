use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use eventdb_persistence::scan;
use std::collections::BTreeSet;
use std::path::Path;

pub fn run(log_path: &Path) -> anyhow::Result<()> {
    let size = std::fs::metadata(log_path)?.len();
    let scan = scan(log_path)?;

    let keys: BTreeSet<(&str, &str)> = scan
        .records
        .iter()
        .map(|r| (r.source.as_str(), r.kind.as_str()))
        .collect();
    let first = scan.records.first().map_or("-".to_string(), |r| r.id.to_string());
    let last = scan.records.last().map_or("-".to_string(), |r| r.id.to_string());
    let tail = match scan.torn_tail {
        Some(offset) => format!("TORN at byte {offset} ({} bytes dropped on open)", size - scan.valid_len),
        None => "clean".to_string(),
    };

    println!("\nEvent Log Status Report");
    println!("-----------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Property", "Value"]);

    table.add_row(vec!["File".to_string(), log_path.display().to_string()]);
    table.add_row(vec![
        "Format".to_string(),
        format!(
            "Magic: {:?}, Ver: {}",
            std::str::from_utf8(&scan.header.magic).unwrap_or("BAD"),
            scan.header.version
        ),
    ]);
    table.add_row(vec!["Size".to_string(), format!("{size} bytes")]);
    table.add_row(vec!["Records".to_string(), scan.records.len().to_string()]);
    table.add_row(vec!["First ID".to_string(), first]);
    table.add_row(vec!["Last ID".to_string(), last]);
    table.add_row(vec!["Distinct keys".to_string(), keys.len().to_string()]);
    table.add_row(vec!["Tail".to_string(), tail]);

    println!("{table}\n");

    Ok(())
}
