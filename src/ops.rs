//! Operations behind each [`Action`]: apply, list, get, schema.
//!
//! [`run`] is framework agnostic. It returns a [`CommandOutput`] that the
//! caller prints; nothing here writes to stdout.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::{Table, Value};

use crate::base::load_base;
use crate::engine::{PatchEngine, to_table};
use crate::error::PatchError;
use crate::file::read_patch;
use crate::gateway::{GatewayConfig, gateway_schema};
use crate::persist::persist_applied;
use crate::report::PatchReport;
use crate::schema::{LeafRow, Schema};
use crate::settings::{self, PatchSettings};
use crate::types::{Action, Casing, ReportFormat};

/// Result of one command, returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// A finished patch pass.
    Patched {
        report: PatchReport,
        /// The report in the configured format.
        rendered: String,
        /// The patched config as TOML, when asked for.
        config: Option<String>,
        /// The base file the applied leaves were written to.
        written: Option<PathBuf>,
        /// Written leaves that reload as their default instead of unset.
        reverted: Vec<String>,
    },
    /// Every leaf and its current value, in schema order.
    Listing { entries: Vec<(String, String)> },
    /// One leaf's value and descriptor.
    KeyValue {
        key: String,
        value: String,
        row: LeafRow,
    },
    Schema { rows: Vec<LeafRow> },
    Template(String),
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Patched {
                rendered,
                config,
                written,
                reverted,
                ..
            } => {
                write!(f, "{rendered}")?;
                if let Some(config) = config {
                    write!(f, "\n\n{}", config.trim_end())?;
                }
                if let Some(path) = written {
                    write!(f, "\n\nWrote {}", path.display())?;
                }
                for leaf in reverted {
                    write!(f, "\nwarning: {leaf} is unset but will reload as its default")?;
                }
                Ok(())
            }
            CommandOutput::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            CommandOutput::KeyValue { key, value, row } => {
                if !row.doc.is_empty() {
                    writeln!(f, "# {}", row.doc)?;
                }
                writeln!(f, "# {row}")?;
                write!(f, "{key} = {value}")
            }
            CommandOutput::Schema { rows } => {
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{row}")?;
                }
                Ok(())
            }
            CommandOutput::Template(t) => write!(f, "{t}"),
        }
    }
}

/// Run `action` against the gateway configuration.
pub fn run(action: &Action, settings: &PatchSettings) -> Result<CommandOutput, PatchError> {
    let schema = gateway_schema();
    match action {
        Action::Apply {
            patch,
            base,
            write,
            print_config,
        } => {
            if *write && base.is_none() {
                return Err(PatchError::NoBaseFile);
            }
            let mut config = load_config(base.as_deref())?;
            let lines = read_patch(patch)?;
            let report = PatchEngine::from_settings(&schema, settings).apply(&mut config, lines)?;
            let rendered = render_report(&report, settings)?;

            let (written, reverted) = match base {
                Some(path) if *write => {
                    let reverted = persist_applied(path, &report, &config)?;
                    (Some(path.clone()), reverted)
                }
                _ => (None, Vec::new()),
            };
            let config = if *print_config {
                Some(toml::to_string(&config).map_err(|e| PatchError::Convert(e.to_string()))?)
            } else {
                None
            };

            Ok(CommandOutput::Patched {
                report,
                rendered,
                config,
                written,
                reverted,
            })
        }
        Action::List { base } => {
            let config = load_config(base.as_deref())?;
            list_values(&config, &schema)
        }
        Action::Get { key, base } => {
            let config = load_config(base.as_deref())?;
            get_value(&config, &schema, key, settings.casing)
        }
        Action::Schema => Ok(CommandOutput::Schema {
            rows: schema.rows(),
        }),
        Action::SettingsTemplate => Ok(CommandOutput::Template(settings::template())),
    }
}

fn load_config(base: Option<&Path>) -> Result<GatewayConfig, PatchError> {
    match base {
        Some(path) => load_base(path, true),
        None => Ok(GatewayConfig::default()),
    }
}

fn render_report(report: &PatchReport, settings: &PatchSettings) -> Result<String, PatchError> {
    let only_rejected = settings.report.only_rejected;
    match settings.report.format {
        ReportFormat::Text => Ok(report.render_text(only_rejected)),
        ReportFormat::Json => report
            .render_json(only_rejected)
            .map_err(|e| PatchError::Convert(e.to_string())),
    }
}

/// Every leaf of `schema` with its value in `config`; `<not set>` when absent.
pub fn list_values<C: Serialize>(config: &C, schema: &Schema) -> Result<CommandOutput, PatchError> {
    let table = to_table(config)?;
    let entries = schema
        .leaves()
        .into_iter()
        .map(|(path, _)| {
            let display = match table_get(&table, &path) {
                Some(v) => format_value(v),
                None => "<not set>".to_string(),
            };
            (path, display)
        })
        .collect();
    Ok(CommandOutput::Listing { entries })
}

/// One leaf by dotted path, matched with `casing`.
pub fn get_value<C: Serialize>(
    config: &C,
    schema: &Schema,
    key: &str,
    casing: Casing,
) -> Result<CommandOutput, PatchError> {
    let (canonical, leaf) = schema
        .find_leaf(key, casing)
        .ok_or_else(|| PatchError::KeyNotFound(key.into()))?;
    let table = to_table(config)?;
    let value = match table_get(&table, &canonical) {
        Some(v) => format_value(v),
        None => "<not set>".to_string(),
    };
    Ok(CommandOutput::KeyValue {
        row: LeafRow::new(canonical.clone(), leaf),
        key: canonical,
        value,
    })
}

/// Navigate a `toml::Table` by dotted key path (e.g. `"Scheduler.threads"`).
pub fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a Value> {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let tbl = match path {
        Some(path) => {
            let mut current = table;
            for segment in path.split('.') {
                current = current.get(segment)?.as_table()?;
            }
            current
        }
        None => table,
    };

    tbl.get(leaf)
}

/// Format a TOML value for display. Strings are shown bare.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
