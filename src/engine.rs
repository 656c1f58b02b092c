//! The patch engine: parse a line, resolve its path, coerce, assign.
//!
//! A pass works on the `toml::Table` form of the config. The config is
//! serialized once, every line is applied to the table in input order, and
//! the table is deserialized back at the end. Each line is resolved and
//! coerced before the table is touched, so a rejected line changes nothing.
//!
//! No state survives a line: the walk position, the resolved prefix and the
//! coerced value all live in locals of [`PatchEngine::apply_line`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::coerce::{self, NULL_SENTINEL};
use crate::error::{PatchError, Rejection};
use crate::observe::{NoopObserver, PatchObserver, TracingObserver};
use crate::report::{PatchOutcome, PatchReport, Status};
use crate::schema::Schema;
use crate::settings::PatchSettings;
use crate::types::{Casing, MapEntryPolicy};

/// One `path=value` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    /// 1-based position in the source.
    pub number: usize,
    pub segments: Vec<String>,
    /// The text after the first `=`, or `null` when the line has none.
    pub raw: String,
}

impl PatchLine {
    /// Split on the first `=`, then split the key on `.`.
    ///
    /// A bare key (no `=`) carries the `null` sentinel: it is a reset, not a
    /// syntax error. A trailing `\r` is dropped; nothing else is trimmed.
    pub fn parse(number: usize, text: &str) -> PatchLine {
        let text = text.strip_suffix('\r').unwrap_or(text);
        let (key, raw) = text.split_once('=').unwrap_or((text, NULL_SENTINEL));
        let segments = if key.is_empty() {
            Vec::new()
        } else {
            key.split('.').map(String::from).collect()
        };
        PatchLine {
            number,
            segments,
            raw: raw.to_string(),
        }
    }

    /// The path as written.
    pub fn path(&self) -> String {
        self.segments.join(".")
    }
}

/// Parse a patch text. Blank lines and `#` comments are skipped but still
/// counted, so line numbers match the source.
pub fn parse_lines(text: &str) -> Vec<PatchLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| PatchLine::parse(i + 1, line))
        .collect()
}

/// Serialize a config into the table form the engine patches.
pub fn to_table<C: Serialize>(config: &C) -> Result<Table, PatchError> {
    match Value::try_from(config).map_err(|e| PatchError::Convert(e.to_string()))? {
        Value::Table(table) => Ok(table),
        _ => Err(PatchError::Convert(
            "config did not serialize to a table".into(),
        )),
    }
}

/// Rebuild a config from its table form.
pub fn from_table<C: DeserializeOwned>(table: Table) -> Result<C, PatchError> {
    Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| PatchError::Convert(e.to_string()))
}

/// Applies patch lines to a config described by a [`Schema`].
pub struct PatchEngine<'s> {
    schema: &'s Schema,
    casing: Casing,
    map_entries: MapEntryPolicy,
    observer: Box<dyn PatchObserver + 's>,
}

impl<'s> PatchEngine<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            casing: Casing::default(),
            map_entries: MapEntryPolicy::default(),
            observer: Box::new(NoopObserver),
        }
    }

    /// Engine configured from loaded settings.
    pub fn from_settings(schema: &'s Schema, settings: &PatchSettings) -> Self {
        let engine = Self::new(schema)
            .casing(settings.casing)
            .map_entries(settings.map_entries);
        if settings.trace_lookups {
            engine.observer(TracingObserver)
        } else {
            engine
        }
    }

    pub fn casing(mut self, casing: Casing) -> Self {
        self.casing = casing;
        self
    }

    pub fn map_entries(mut self, policy: MapEntryPolicy) -> Self {
        self.map_entries = policy;
        self
    }

    pub fn observer(mut self, observer: impl PatchObserver + 's) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Apply `lines` to `config` in order and report one outcome per line.
    ///
    /// Only a failure to convert the config to or from its table form is an
    /// error; `config` is left as it was in that case.
    pub fn apply<C, I>(&self, config: &mut C, lines: I) -> Result<PatchReport, PatchError>
    where
        C: Serialize + DeserializeOwned,
        I: IntoIterator<Item = PatchLine>,
    {
        let mut table = to_table(config)?;
        let report = self.apply_to_table(&mut table, lines);
        *config = from_table(table)?;
        Ok(report)
    }

    /// [`apply`](Self::apply) for a whole patch text.
    pub fn apply_text<C>(&self, config: &mut C, text: &str) -> Result<PatchReport, PatchError>
    where
        C: Serialize + DeserializeOwned,
    {
        self.apply(config, parse_lines(text))
    }

    /// Apply `lines` to a config already in table form.
    pub fn apply_to_table<I>(&self, table: &mut Table, lines: I) -> PatchReport
    where
        I: IntoIterator<Item = PatchLine>,
    {
        let mut report = PatchReport::default();
        for line in lines {
            report.push(self.apply_line(table, &line));
        }
        tracing::info!(
            applied = report.applied().count(),
            rejected = report.rejected().count(),
            "patch pass finished"
        );
        report
    }

    /// Apply a single line. Never fails; a bad line yields a `Rejected` outcome.
    pub fn apply_line(&self, table: &mut Table, line: &PatchLine) -> PatchOutcome {
        let status = match self.assign(table, line) {
            Ok(path) => {
                tracing::debug!(line = line.number, path = %path, "applied");
                Status::Applied { path }
            }
            Err((resolved, reason)) => {
                tracing::warn!(
                    line = line.number,
                    path = %line.path(),
                    reason = %reason,
                    "rejected"
                );
                Status::Rejected { resolved, reason }
            }
        };
        PatchOutcome {
            line: line.number,
            path: line.path(),
            status,
        }
    }

    fn assign(&self, table: &mut Table, line: &PatchLine) -> Result<String, (String, Rejection)> {
        let Some((leaf_segment, parents)) = line.segments.split_last() else {
            return Err((String::new(), Rejection::EmptyPath));
        };

        let mut section = self.schema.root();
        let mut resolved: Vec<&'static str> = Vec::new();
        for segment in parents {
            let child = section.resolve_child(segment, self.casing);
            self.observer
                .child_lookup(&attempted(&resolved, segment), child.is_some());
            let Some(child) = child else {
                return Err((resolved.join("."), unknown(segment)));
            };
            resolved.push(child.name);
            section = child;
        }

        let leaf = section.resolve_leaf(leaf_segment, self.casing);
        self.observer
            .leaf_lookup(&attempted(&resolved, leaf_segment), leaf.is_some());
        let Some(leaf) = leaf else {
            return Err((resolved.join("."), unknown(leaf_segment)));
        };
        let parent_names = resolved.clone();
        resolved.push(leaf.name);
        let path = resolved.join(".");

        let value = match coerce::coerce(leaf, &line.raw, self.map_entries) {
            Ok(value) => value,
            Err(reason) => return Err((path, reason)),
        };

        let Some(node) = section_table(table, &parent_names) else {
            return Err((
                path,
                Rejection::Coercion {
                    detail: "config has no table at this section".into(),
                },
            ));
        };
        match &value {
            Some(v) => {
                node.insert(leaf.name.to_string(), v.to_toml());
            }
            None => {
                node.remove(leaf.name);
            }
        }
        self.observer.assigned(&path, value.as_ref());
        Ok(path)
    }
}

fn unknown(segment: &str) -> Rejection {
    Rejection::UnknownSegment {
        segment: segment.to_string(),
    }
}

fn attempted(resolved: &[&str], segment: &str) -> String {
    if resolved.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{segment}", resolved.join("."))
    }
}

/// Walk to the table of a section, creating missing ones.
fn section_table<'t>(table: &'t mut Table, names: &[&str]) -> Option<&'t mut Table> {
    let mut current = table;
    for name in names {
        current = current
            .entry(name.to_string())
            .or_insert_with(|| Value::Table(Table::new()))
            .as_table_mut()?;
    }
    Some(current)
}
