//! Human-readable byte sizes.

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Convert a byte count to a string such as `"1.50KB"`.
///
/// Divides by 1024 until the value drops below 1024 or the largest unit is
/// reached. Zero is rendered as `"0B"`.
pub fn format_size(size_bytes: f64) -> String {
    if size_bytes == 0.0 {
        return "0B".to_string();
    }

    let mut value = size_bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, UNITS[unit])
}
