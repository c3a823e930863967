//! The single encode/decode boundary for delimiter-joined list fields.
//!
//! The relational layer collapses one-to-many story joins into
//! delimiter-joined text columns (GROUP_CONCAT). Everything outside this
//! module works with typed lists; the delimiter conventions below must be
//! reproduced bit-for-bit because cached payloads and round-trip tests
//! depend on them.

/// Story titles, genres and story ids are joined on a single newline.
pub const LINE_DELIMITER: &str = "\n";
/// Synopses are joined on a double newline so paragraph text survives.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";
/// Characters arrive as one semicolon-separated column value.
pub const CHARACTER_DELIMITER: &str = "; ";

/// Splits a delimiter-joined column value into a list, dropping empty
/// entries. `None` and blank input decode to an empty list, never null.
pub fn split_list(value: Option<&str>, delimiter: &str) -> Vec<String> {
    match value {
        Some(text) if !text.is_empty() => text
            .split(delimiter)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Joins a list into one delimiter-joined value, excluding empty entries
/// before joining, matching what GROUP_CONCAT produces upstream.
pub fn join_list(entries: &[String], delimiter: &str) -> String {
    entries
        .iter()
        .filter(|entry| !entry.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(delimiter)
}
