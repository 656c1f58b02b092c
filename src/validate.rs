//! Strict mode: detect keys a file sets that the target type does not know.
//!
//! Uses `serde_ignored` while deserializing, so anything the target type
//! skips is collected and reported with the file path and a best-effort line
//! number.

use std::path::Path;

use serde::de::DeserializeOwned;
use toml::Value;

use crate::error::PatchError;

/// Deserialize `value` into `T`, failing on any key `T` ignores.
///
/// `content` is the source text the unknown keys came from; it is only used
/// to find line numbers. With `strict` off, unknown keys are dropped.
pub fn deserialize_strict<T: DeserializeOwned>(
    value: Value,
    content: &str,
    path: &Path,
    strict: bool,
) -> Result<T, PatchError> {
    let mut unknown_keys: Vec<String> = Vec::new();

    let parsed: T = serde_ignored::deserialize(value, |ignored| {
        unknown_keys.push(ignored.to_string());
    })
    .map_err(|e| PatchError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if !strict || unknown_keys.is_empty() {
        return Ok(parsed);
    }

    let errors: Vec<PatchError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            PatchError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(PatchError::UnknownKeys(errors))
}

/// Find the 1-indexed line a dotted key is assigned on, tracking `[section]`
/// headers. Handles bare keys and standard headers only; returns 0 when the
/// key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((s, l)) => (s.split('.').collect::<Vec<_>>(), l),
        None => (Vec::new(), dotted_key),
    };

    let mut current: Vec<String> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if let Some(header) = trimmed.strip_prefix('[')
            && !header.starts_with('[')
        {
            current = header
                .trim_end_matches(']')
                .split('.')
                .map(|s| s.trim().to_string())
                .collect();
            continue;
        }

        let in_section = current.len() == section.len()
            && current.iter().zip(&section).all(|(a, b)| a == b);

        if in_section
            && let Some(after) = trimmed.strip_prefix(leaf)
            && after.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
