use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a whole command.
///
/// A bad patch line never produces one of these; it is reported as a
/// [`Rejection`] inside the outcome list and the pass keeps going.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<PatchError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to edit {path}: {source}")]
    EditError {
        path: PathBuf,
        source: toml_edit::TomlError,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    SettingsError(#[from] confique::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Config does not match its schema: {0}")]
    SchemaMismatch(String),

    #[error("Failed to convert config: {0}")]
    Convert(String),

    #[error("--write needs a base file, pass --base")]
    NoBaseFile,
}

/// Why one patch line was not applied. Always local to that line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("empty path")]
    EmptyPath,

    #[error("unknown segment '{segment}'")]
    UnknownSegment { segment: String },

    #[error("coercion failed: {detail}")]
    Coercion { detail: String },

    #[error("coercion failed: malformed map entry '{entry}' (expected key:value)")]
    MalformedMapEntry { entry: String },
}

impl Rejection {
    /// Stable machine-readable name, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::EmptyPath => "empty-path",
            Rejection::UnknownSegment { .. } => "unknown-segment",
            Rejection::Coercion { .. } => "coercion",
            Rejection::MalformedMapEntry { .. } => "malformed-map-entry",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_formats_correctly() {
        let err = PatchError::UnknownKey {
            key: "typo_key".into(),
            path: "/home/user/.config/confpatch/confpatch.toml".into(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("typo_key"));
        assert!(msg.contains("confpatch.toml"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn key_not_found_formats() {
        let err = PatchError::KeyNotFound("Scheduler.nope".into());
        assert!(err.to_string().contains("Scheduler.nope"));
    }

    #[test]
    fn unknown_segment_mentions_reason_and_segment() {
        let msg = Rejection::UnknownSegment {
            segment: "Unknown".into(),
        }
        .to_string();
        assert!(msg.contains("unknown segment"));
        assert!(msg.contains("Unknown"));
    }

    #[test]
    fn malformed_entry_is_a_coercion_failure() {
        let msg = Rejection::MalformedMapEntry { entry: "oops".into() }.to_string();
        assert!(msg.starts_with("coercion failed"));
        assert!(msg.contains("oops"));
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            Rejection::EmptyPath.kind(),
            Rejection::UnknownSegment { segment: String::new() }.kind(),
            Rejection::Coercion { detail: String::new() }.kind(),
            Rejection::MalformedMapEntry { entry: String::new() }.kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
