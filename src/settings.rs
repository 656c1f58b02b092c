//! The tool's own settings: how patches are matched, coerced and reported.
//!
//! [`PatchSettings`] is a confique struct, so defaults, doc comments and the
//! settings template all come from one definition. Values are layered:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Settings files        search paths in order, then explicit files
//!        ↑ overridden by
//! Environment vars      CONFPATCH__KEY
//!        ↑ overridden by
//! Overrides             .set()
//! ```
//!
//! Every layer is sparse. [`resolve`] does the merging with no I/O so the
//! whole pipeline can be tested on synthetic input; [`SettingsLoader`] reads
//! the files and environment and feeds it.

use std::path::PathBuf;

use confique::Config;
use toml::{Table, Value};

use crate::env;
use crate::error::PatchError;
use crate::file;
use crate::merge::{deep_merge, insert_nested};
use crate::types::{Casing, MapEntryPolicy, ReportFormat, SearchPath};
use crate::validate;

pub const APP_NAME: &str = "confpatch";
pub const SETTINGS_FILE: &str = "confpatch.toml";
pub const ENV_PREFIX: &str = "CONFPATCH";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct PatchSettings {
    /// How path segments are matched against section and leaf names:
    /// "exact" or "ignore-ascii".
    #[config(default = "exact")]
    pub casing: Casing,

    /// What a map entry without ':' does: "reject-line" rejects the whole
    /// line, "skip-entry" drops only that entry.
    #[config(default = "reject-line")]
    pub map_entries: MapEntryPolicy,

    /// Emit a trace event for every section and leaf lookup.
    #[config(default = false)]
    pub trace_lookups: bool,

    #[config(nested)]
    pub report: ReportSettings,
}

#[derive(Config, Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Output format of the per-line report: "text" or "json".
    #[config(default = "text")]
    pub format: ReportFormat,

    /// Leave applied lines out of the report.
    #[config(default = false)]
    pub only_rejected: bool,
}

impl PatchSettings {
    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, PatchError> {
        resolve(SettingsInput::default())
    }
}

/// A commented settings file with every option at its default.
pub fn template() -> String {
    confique::toml::template::<PatchSettings>(confique::toml::FormatOptions::default())
}

/// All pre-loaded data needed to resolve settings.
#[derive(Debug, Default)]
pub struct SettingsInput {
    /// File contents, lowest priority first.
    pub files: Vec<(PathBuf, String)>,
    pub env_vars: Vec<(String, String)>,
    /// `None` disables the environment layer.
    pub env_prefix: Option<String>,
    /// `(dotted_key, value)` pairs, highest priority.
    pub overrides: Vec<(String, Value)>,
    /// Reject unknown keys in settings files.
    pub strict: bool,
}

/// Merge every layer and let confique fill in defaults.
pub fn resolve(input: SettingsInput) -> Result<PatchSettings, PatchError> {
    let mut merged = Table::new();
    for (path, content) in &input.files {
        let table: Table = toml::from_str(content).map_err(|e| PatchError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        if input.strict {
            validate::deserialize_strict::<<PatchSettings as Config>::Layer>(
                Value::Table(table.clone()),
                content,
                path,
                true,
            )?;
        }
        deep_merge(&mut merged, table);
    }

    if let Some(prefix) = &input.env_prefix {
        deep_merge(&mut merged, env::env_to_table(prefix, input.env_vars));
    }

    for (dotted_key, value) in input.overrides {
        let segments: Vec<&str> = dotted_key.split('.').collect();
        insert_nested(&mut merged, &segments, value);
    }

    let layer: <PatchSettings as Config>::Layer = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| PatchError::Convert(e.to_string()))?;

    PatchSettings::builder()
        .preloaded(layer)
        .load()
        .map_err(PatchError::from)
}

/// Finds settings files and environment variables, then resolves them.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    search_paths: Vec<SearchPath>,
    files: Vec<PathBuf>,
    env_prefix: Option<String>,
    strict: bool,
    overrides: Vec<(String, Value)>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Platform config dir then CWD, `CONFPATCH__*` env vars, strict.
    pub fn new() -> Self {
        Self {
            search_paths: vec![SearchPath::Platform, SearchPath::Cwd],
            files: Vec::new(),
            env_prefix: Some(ENV_PREFIX.to_string()),
            strict: true,
            overrides: Vec::new(),
        }
    }

    /// Replace the search paths. The last entry has the highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths.push(path);
        self
    }

    /// An explicit settings file. Unlike searched files it must exist.
    /// Explicit files rank above every search path.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    pub fn no_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Override one setting by dotted key. `None` is ignored, which suits
    /// optional CLI flags.
    pub fn set<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.push((key.to_string(), v.into()));
        }
        self
    }

    fn build_input(&self) -> Result<SettingsInput, PatchError> {
        let mut files = file::load_settings_files(&self.search_paths, SETTINGS_FILE, APP_NAME)?;
        for path in &self.files {
            files.push((path.clone(), file::read_file(path)?));
        }
        Ok(SettingsInput {
            files,
            env_vars: std::env::vars().collect(),
            env_prefix: self.env_prefix.clone(),
            overrides: self.overrides.clone(),
            strict: self.strict,
        })
    }

    pub fn load(self) -> Result<PatchSettings, PatchError> {
        let input = self.build_input()?;
        tracing::debug!(files = input.files.len(), "resolving settings");
        resolve(input)
    }
}
