//! Conversion between list-typed wire fields and their flat storage form.
//!
//! Tags (ambientes, services) are stored comma-joined, so a tag that itself contains a comma
//! comes back split in two. Attachment paths are stored as a JSON array.

use serde_json::Value;
use tracing::warn;

pub fn encode_tags(tags: &[String]) -> String {
    tags.join(",")
}

pub fn decode_tags(stored: Option<&str>) -> Vec<String> {
    match stored {
        None | Some("") => Vec::new(),
        Some(s) => s.split(',').map(str::to_string).collect(),
    }
}

/// Normalizes tag values as received on the wire: each value may be a single tag or an
/// already comma-joined list. Empty pieces are dropped.
pub fn split_tag_values<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn encode_media(urls: &[String]) -> String {
    Value::from(urls.to_vec()).to_string()
}

/// Never fails: malformed text is logged and read as an empty list.
pub fn decode_media(stored: Option<&str>) -> Vec<String> {
    let Some(text) = stored.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Option<Vec<String>>>(text) {
        Ok(urls) => urls.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, stored = text, "discarding malformed media list");
            Vec::new()
        }
    }
}
