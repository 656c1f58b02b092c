//! Clap adapter for the `confpatch` binary.
//!
//! Compiled only with the `cli` feature (on by default). Everything here
//! converts parsed arguments into the framework-agnostic core types: an
//! [`Action`] for [`ops::run`](crate::ops::run) and a [`SettingsLoader`]
//! carrying the command-line overrides. Library users who parse arguments
//! some other way can build those two directly.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::settings::SettingsLoader;
use crate::types::{Action, Casing, MapEntryPolicy, ReportFormat};

/// Apply dotted-path patches to the gateway configuration.
#[derive(Debug, Parser)]
#[command(name = "confpatch", version)]
pub struct Cli {
    /// Extra settings file, ranked above the searched ones. Repeatable.
    #[arg(long = "settings", value_name = "FILE", global = true)]
    pub settings: Vec<PathBuf>,

    /// How path segments are matched against schema names.
    #[arg(long, value_enum, global = true)]
    pub casing: Option<Casing>,

    /// What a map entry without ':' does.
    #[arg(long, value_enum, global = true)]
    pub map_entries: Option<MapEntryPolicy>,

    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a patch file and report every line's outcome.
    Apply {
        /// File of `Section.leaf=value` lines.
        patch: PathBuf,
        /// Sparse TOML config to patch instead of the defaults.
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,
        /// Write applied values back into the base file.
        #[arg(long, requires = "base")]
        write: bool,
        /// Report format.
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
        /// Leave applied lines out of the report.
        #[arg(long)]
        only_rejected: bool,
        /// Print the patched config as TOML after the report.
        #[arg(long)]
        print_config: bool,
    },
    /// Show every leaf and its value.
    List {
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,
    },
    /// Show one leaf's value and descriptor.
    Get {
        /// Dotted leaf path (e.g. "Scheduler.threads").
        key: String,
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,
    },
    /// Show the leaf table: types, delimiters and null policies.
    Schema,
    /// Print a commented settings file with every option at its default.
    SettingsTemplate,
}

fn value_name<V: ValueEnum>(value: Option<V>) -> Option<String> {
    value.and_then(|v| v.to_possible_value().map(|p| p.get_name().to_string()))
}

impl Cli {
    /// A settings loader with the default search paths plus this invocation's
    /// settings files and overrides.
    pub fn settings_loader(&self) -> SettingsLoader {
        let (format, only_rejected) = match &self.command {
            Command::Apply {
                format,
                only_rejected,
                ..
            } => (*format, *only_rejected),
            _ => (None, false),
        };

        self.settings
            .iter()
            .fold(SettingsLoader::new(), |loader, path| loader.file(path))
            .set("casing", value_name(self.casing))
            .set("map_entries", value_name(self.map_entries))
            .set("report.format", value_name(format))
            .set("report.only_rejected", only_rejected.then_some(true))
    }

    pub fn into_action(self) -> Action {
        match self.command {
            Command::Apply {
                patch,
                base,
                write,
                print_config,
                ..
            } => Action::Apply {
                patch,
                base,
                write,
                print_config,
            },
            Command::List { base } => Action::List { base },
            Command::Get { key, base } => Action::Get { key, base },
            Command::Schema => Action::Schema,
            Command::SettingsTemplate => Action::SettingsTemplate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchPath;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parse_apply_minimal() {
        let action = parse(&["confpatch", "apply", "gw.patch"]).into_action();
        assert_eq!(
            action,
            Action::Apply {
                patch: PathBuf::from("gw.patch"),
                base: None,
                write: false,
                print_config: false,
            }
        );
    }

    #[test]
    fn parse_apply_with_base_and_write() {
        let action = parse(&[
            "confpatch",
            "apply",
            "gw.patch",
            "--base",
            "gateway.toml",
            "--write",
            "--print-config",
        ])
        .into_action();
        assert_eq!(
            action,
            Action::Apply {
                patch: PathBuf::from("gw.patch"),
                base: Some(PathBuf::from("gateway.toml")),
                write: true,
                print_config: true,
            }
        );
    }

    #[test]
    fn write_requires_base() {
        assert!(Cli::try_parse_from(["confpatch", "apply", "gw.patch", "--write"]).is_err());
    }

    #[test]
    fn parse_get_list_schema() {
        assert_eq!(
            parse(&["confpatch", "get", "Scheduler.threads"]).into_action(),
            Action::Get {
                key: "Scheduler.threads".into(),
                base: None
            }
        );
        assert_eq!(
            parse(&["confpatch", "list", "--base", "gw.toml"]).into_action(),
            Action::List {
                base: Some(PathBuf::from("gw.toml"))
            }
        );
        assert_eq!(parse(&["confpatch", "schema"]).into_action(), Action::Schema);
        assert_eq!(
            parse(&["confpatch", "settings-template"]).into_action(),
            Action::SettingsTemplate
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&[
            "confpatch",
            "get",
            "upstreamcheck.enabled",
            "--casing",
            "ignore-ascii",
            "-v",
        ]);
        assert_eq!(cli.casing, Some(Casing::IgnoreAscii));
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_unknown_enum_value() {
        assert!(Cli::try_parse_from(["confpatch", "--casing", "loud", "schema"]).is_err());
    }

    #[test]
    fn flags_become_settings_overrides() {
        let cli = parse(&[
            "confpatch",
            "--map-entries",
            "skip-entry",
            "apply",
            "gw.patch",
            "--format",
            "json",
            "--only-rejected",
        ]);
        let settings = cli
            .settings_loader()
            .search_paths(vec![])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(settings.casing, Casing::Exact);
        assert_eq!(settings.map_entries, MapEntryPolicy::SkipEntry);
        assert_eq!(settings.report.format, ReportFormat::Json);
        assert!(settings.report.only_rejected);
    }

    #[test]
    fn settings_files_are_explicit_layers() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("team.toml");
        std::fs::write(&file, "casing = \"ignore-ascii\"\n").unwrap();
        let file_arg = file.to_string_lossy().into_owned();

        let cli = parse(&["confpatch", "--settings", &file_arg, "schema"]);
        let settings = cli
            .settings_loader()
            .search_paths(vec![SearchPath::Path(dir.path().join("nowhere"))])
            .no_env()
            .load()
            .unwrap();
        assert_eq!(settings.casing, Casing::IgnoreAscii);
    }
}
