use std::{fs, io, path::Path};

use crate::translator::TranslateError;

/// Parses a textual virtual address: decimal, or hexadecimal with a
/// `0x`/`0X` prefix.
pub fn parse_address(text: &str) -> Result<u64, TranslateError> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| TranslateError::BadAddress(text.to_string()))
}

/// Reads an address list, one textual address per line, skipping
/// blank lines. Parsing is left to the caller so that one bad line
/// does not abort the rest of the batch.
pub fn read_address_lines<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
