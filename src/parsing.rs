const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

pub fn parse_bool_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}

/// Parses a whole number of seconds. Whitespace is ignored.
pub fn parse_seconds(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

/// Returns at most `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Database counters come back as signed bigints; anything below zero is treated as zero.
pub fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}
