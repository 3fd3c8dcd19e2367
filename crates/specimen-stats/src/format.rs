//! Human-readable byte sizes.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with one decimal place, dropping a trailing `.0`.
///
/// `0` -> `"0 B"`, `1536` -> `"1.5 KB"`, `2048` -> `"2 KB"`.
pub fn format_bytes(bytes: usize) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.1}", value);
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);

    format!("{} {}", trimmed, UNITS[unit])
}
