//! Human-readable formatting for sizes and durations

/// Binary unit ladder, 1024 bytes per step
const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with binary units
///
/// Two decimal places with trailing zeros trimmed, so 1649267441664 renders
/// as "1.5 TB" and 1024 as "1 KB".
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    // A u64 tops out in the exabyte range, so the index stays in bounds
    let exp = (bytes.ilog2() / 10) as usize;
    let value = bytes as f64 / (1u64 << (10 * exp)) as f64;
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

/// Format a probe duration given in milliseconds
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let secs = ms / 1000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
