pub mod inspect;
pub mod latest;
pub mod timeline;
pub mod verify;

/// Renders an insert timestamp for tables.
pub(crate) fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
