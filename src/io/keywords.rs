use crate::types::{Keywordlist, SarError, SarResult};
use std::fmt::Write;

/// Parse a keyword list from its `key: value` text form.
///
/// Blank lines and lines starting with `#` are ignored. Values keep inner whitespace.
pub fn parse_keywords(text: &str) -> SarResult<Keywordlist> {
    let mut kwl = Keywordlist::new();

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            SarError::Metadata(format!(
                "Keyword line {} has no ':' separator: {}",
                line_number + 1,
                line
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SarError::Metadata(format!(
                "Keyword line {} has an empty key",
                line_number + 1
            )));
        }

        kwl.insert(key.to_string(), value.trim().to_string());
    }

    log::debug!("Parsed {} keywords", kwl.len());
    Ok(kwl)
}

/// Render a keyword list as `key: value` lines, sorted by key
pub fn format_keywords(kwl: &Keywordlist) -> String {
    let mut text = String::new();
    for (key, value) in kwl {
        // Writing into a String cannot fail
        let _ = writeln!(text, "{}: {}", key, value);
    }
    text
}
