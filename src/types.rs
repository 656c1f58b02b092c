use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How patch path segments are compared with schema names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Casing {
    /// Byte-for-byte match against the canonical name.
    #[default]
    Exact,
    /// ASCII case-insensitive match: `upstreamCheck.Enabled` finds
    /// `UpstreamCheck.enabled`.
    IgnoreAscii,
}

impl Casing {
    pub fn matches(self, canonical: &str, segment: &str) -> bool {
        match self {
            Casing::Exact => canonical == segment,
            Casing::IgnoreAscii => canonical.eq_ignore_ascii_case(segment),
        }
    }
}

/// What happens to a `key:value` map leaf when one entry has no `:`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MapEntryPolicy {
    /// Reject the whole line; the leaf keeps its previous value.
    #[default]
    RejectLine,
    /// Drop the malformed entries and assign the rest.
    SkipEntry,
}

/// Rendering of the per-line outcome report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Where to look for settings files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// A confpatch command, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Run a patch file against the defaults (or a base file).
    Apply {
        patch: PathBuf,
        base: Option<PathBuf>,
        write: bool,
        print_config: bool,
    },
    /// Every leaf path with its current value.
    List { base: Option<PathBuf> },
    /// One leaf value and its descriptor.
    Get { key: String, base: Option<PathBuf> },
    /// The published leaf table: types, delimiters, null policies.
    Schema,
    /// A commented settings file with every option at its default.
    SettingsTemplate,
}
