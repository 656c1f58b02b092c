//! Line-oriented patches for nested, strongly typed configuration trees.
//!
//! A patch is a list of `dotted.path=value` lines. Each line names a leaf of
//! the configuration tree, and its raw value is coerced to that leaf's
//! declared type before anything is stored:
//!
//! ```text
//! Scheduler.enabled=true
//! ExcludePath.paths=/health;/metrics
//! MetricsConfig.props=region:eu;tier:2
//! Local.sha512Key=null
//! ```
//!
//! ```ignore
//! let schema = gateway_schema();
//! let mut config = GatewayConfig::default();
//! let report = PatchEngine::new(&schema).apply_text(&mut config, patch_text)?;
//! print!("{report}");
//! ```
//!
//! # Lines are isolated
//!
//! Every line produces exactly one [`PatchOutcome`], in input order. A line
//! that names an unknown segment, or whose value does not coerce, is
//! reported as `Rejected` with the canonical prefix that did resolve and a
//! [`Rejection`] reason. A rejected line changes nothing, and the pass moves
//! on to the next line. The only errors a pass itself returns
//! ([`PatchError`]) are failures to convert the config to or from its
//! table form.
//!
//! Lines are applied in order, so the last assignment to a leaf wins.
//! Applying the same patch twice gives the same config.
//!
//! # The schema
//!
//! A [`Schema`] is a tree of [`Section`]s holding [`LeafDescriptor`]s. Each
//! leaf declares its [`LeafKind`] (bool, i32, i64, string, or a set, list
//! or map with its own delimiter) and what the sentinel `null` does to it
//! ([`OnNull`]): reset to a fixed value, or unset the leaf entirely.
//!
//! The engine is generic over any `Serialize + DeserializeOwned` config
//! type whose serialized keys are the schema's names.
//! [`Schema::check_against`] verifies the two agree: every serialized key
//! is declared, every leaf round-trips as its declared kind, and every leaf
//! that `null` unsets is optional on the Rust side.
//!
//! [`gateway_schema`] and [`GatewayConfig`] are the tree this crate ships:
//! PascalCase sections, lowerCamel leaves.
//!
//! # Matching
//!
//! Segments match names exactly by default. [`Casing::IgnoreAscii`] makes
//! lookups ASCII case-insensitive, so `upstreamCheck.enabled` resolves to
//! `UpstreamCheck.enabled`. Outcomes always carry the canonical path.
//!
//! # Settings
//!
//! The tool's own behavior lives in [`PatchSettings`], a confique struct
//! layered from compiled defaults, `confpatch.toml` files (platform config
//! directory, then the working directory, then explicit files),
//! `CONFPATCH__*` environment variables, and finally command-line overrides.
//! Unknown keys in settings files fail with the file and line.
//!
//! # Base files and write-back
//!
//! A base file is a sparse TOML gateway config merged over the defaults
//! ([`base::load_base`]). After a pass, [`persist::write_back`] writes the
//! applied leaves into that file with `toml_edit`, so its comments and
//! layout survive.
//!
//! # Observing a pass
//!
//! The engine logs through `tracing`: one `debug` event per applied line,
//! one `warn` per rejected line and an `info` summary per pass. A
//! [`PatchObserver`] sees every section lookup, leaf lookup and assignment;
//! [`TracingObserver`] turns those into `trace` events.

pub mod base;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod ops;
pub mod persist;
pub mod report;
pub mod schema;
pub mod settings;
pub mod types;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;
mod coerce;
mod env;
mod file;
pub(crate) mod merge;
mod observe;
mod validate;

#[cfg(test)]
mod fixtures;

pub use coerce::{MAP_ENTRY_SEP, MAP_KV_SEP, NULL_SENTINEL};
pub use engine::{PatchEngine, PatchLine, parse_lines};
pub use error::{PatchError, Rejection};
pub use gateway::{GatewayConfig, gateway_schema};
pub use observe::{NoopObserver, PatchObserver, TracingObserver};
pub use ops::CommandOutput;
pub use report::{PatchOutcome, PatchReport, Status};
pub use schema::{LeafDescriptor, LeafKind, LeafRow, OnNull, Schema, Section};
pub use settings::{PatchSettings, SettingsLoader};
pub use types::{Action, Casing, MapEntryPolicy, ReportFormat, SearchPath};
pub use value::LeafValue;
