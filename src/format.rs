//! Rowdeck - Input format and header schema
//!
//! Decides whether an upload is an accepted format and normalizes header names
//! before they are compared against the fixed five-column schema.

use std::path::Path;

/// Expected column names, in order.
pub const HEADER_SCHEMA: [&str; 5] = ["postId", "id", "name", "email", "body"];

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated values with header row
    Csv,
}

impl InputFormat {
    /// Detect format from a declared file name's extension (case-insensitive).
    ///
    /// Returns `None` for anything that isn't accepted.
    pub fn detect<P: AsRef<Path>>(file_name: P) -> Option<Self> {
        let ext = file_name.as_ref().extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(InputFormat::Csv)
        } else {
            None
        }
    }
}

/// Normalize one header (or field key): trim, strip one surrounding pair of
/// double quotes, lower-case.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_lowercase()
}

/// Whether the header row matches [`HEADER_SCHEMA`] exactly (name, order, count),
/// ignoring case, surrounding whitespace and one pair of quotes.
pub fn headers_match<'a, I>(headers: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let found: Vec<String> = headers.into_iter().map(normalize_header).collect();
    found.len() == HEADER_SCHEMA.len()
        && found
            .iter()
            .zip(HEADER_SCHEMA.iter())
            .all(|(got, want)| *got == want.to_lowercase())
}
