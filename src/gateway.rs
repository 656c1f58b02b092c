//! The gateway configuration tree and its patch schema.
//!
//! Section names are PascalCase and leaf names lowerCamel, both on the serde
//! side and in [`gateway_schema`], so a serialized [`GatewayConfig`] uses
//! exactly the keys a patch line addresses.
//!
//! Fields that a `null` line can unset are `Option`s; everything else always
//! has a value. No container carries `#[serde(default)]`: a key missing from
//! the table form reads as `None`, not as the default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{LeafDescriptor, Schema, Section};
use crate::value::LeafValue;

/// Floor for the scheduler thread count, also what `null` resets it to.
pub const MIN_SCHEDULER_THREADS: i32 = 16;

const SHARED_POOL_QUEUE_MEMORY: i64 = 256 * 1024 * 1024;

/// `max(2 * cpus + 1, 16)`.
pub fn default_scheduler_threads() -> i32 {
    let cpus = std::thread::available_parallelism()
        .map(|n| i32::try_from(n.get()).unwrap_or(i32::MAX / 2))
        .unwrap_or(1);
    cpus.saturating_mul(2)
        .saturating_add(1)
        .max(MIN_SCHEDULER_THREADS)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayConfig {
    pub file_config: FileConfig,
    pub exclude_path: PathFilter,
    pub health: PathFilter,
    pub fallback_path: PathFilter,
    pub ext_plugin: ExtPlugin,
    pub match_cache: MatchCache,
    pub scheduler: Scheduler,
    pub upstream_check: UpstreamCheck,
    pub cross_filter_config: CrossFilterConfig,
    pub instance_config: InstanceConfig,
    pub ribbon_config: RibbonConfig,
    pub local: Local,
    pub websocket_config: WebsocketConfig,
    pub shared_pool: SharedPool,
    pub metrics_config: MetricsConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchConfig {
    pub local: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self { local: true }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub enabled: bool,
    pub max_size: i32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: 10,
        }
    }
}

/// Shape shared by `ExcludePath`, `Health` and `FallbackPath`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PathFilter {
    pub enabled: bool,
    pub paths: Option<Vec<String>>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            paths: Some(Vec::new()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtPlugin {
    pub path: Option<String>,
    pub enabled: bool,
    pub threads: Option<i32>,
    pub schedule_time: Option<i32>,
    pub schedule_delay: Option<i32>,
}

impl Default for ExtPlugin {
    fn default() -> Self {
        Self {
            path: None,
            enabled: false,
            threads: Some(1),
            schedule_time: Some(300),
            schedule_delay: Some(30),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCache {
    pub enabled: bool,
    pub max_free_memory: Option<i32>,
}

impl Default for MatchCache {
    fn default() -> Self {
        Self {
            enabled: false,
            max_free_memory: Some(256),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scheduler {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub threads: i32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: "fixed".into(),
            threads: default_scheduler_threads(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamCheck {
    pub enabled: bool,
    pub timeout: Option<i32>,
    pub healthy_threshold: Option<i32>,
    pub unhealthy_threshold: Option<i32>,
    pub interval: Option<i32>,
    pub print_enabled: bool,
    pub print_interval: Option<i32>,
    #[serde(rename = "SwitchConfig")]
    pub switch_config: SwitchConfig,
}

impl Default for UpstreamCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: Some(3000),
            healthy_threshold: Some(1),
            unhealthy_threshold: Some(1),
            interval: Some(5000),
            print_enabled: false,
            print_interval: Some(60_000),
            switch_config: SwitchConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrossFilterConfig {
    pub enabled: bool,
    pub allowed_headers: String,
    pub allowed_methods: String,
    pub allowed_any_origin: bool,
    pub allowed_expose: String,
    pub max_age: String,
    pub allow_credentials: bool,
    #[serde(rename = "AllowedOrigin")]
    pub allowed_origin: AllowedOrigin,
}

impl Default for CrossFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_headers: String::new(),
            allowed_methods: "*".into(),
            allowed_any_origin: false,
            allowed_expose: String::new(),
            max_age: "18000".into(),
            allow_credentials: false,
            allowed_origin: AllowedOrigin::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllowedOrigin {
    pub spacer: String,
    pub domain: Option<String>,
    pub prefixes: Option<BTreeSet<String>>,
    pub origins: Option<BTreeSet<String>>,
    pub origin_regex: Option<String>,
}

impl Default for AllowedOrigin {
    fn default() -> Self {
        Self {
            spacer: ".".into(),
            domain: None,
            prefixes: Some(BTreeSet::new()),
            origins: None,
            origin_regex: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub enabled: bool,
    pub register_type: Option<String>,
    pub server_lists: Option<String>,
    pub props: Option<BTreeMap<String, String>>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            register_type: None,
            server_lists: None,
            props: Some(BTreeMap::new()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RibbonConfig {
    pub server_list_refresh_interval: i32,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            server_list_refresh_interval: 10_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Local {
    pub enabled: bool,
    pub sha512_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebsocketConfig {
    pub max_frame_payload_size: Option<i32>,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            max_frame_payload_size: Some(10),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedPool {
    pub enable: bool,
    pub prefix: Option<String>,
    pub core_pool_size: Option<i32>,
    pub maximum_pool_size: Option<i32>,
    pub keep_alive_time: Option<i64>,
    pub max_work_queue_memory: Option<i64>,
    pub max_free_memory: Option<i32>,
}

impl Default for SharedPool {
    fn default() -> Self {
        Self {
            enable: false,
            prefix: Some("shenyu-shared".into()),
            core_pool_size: Some(200),
            maximum_pool_size: Some(i32::MAX),
            keep_alive_time: Some(60_000),
            max_work_queue_memory: Some(SHARED_POOL_QUEUE_MEMORY),
            max_free_memory: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    pub enabled: bool,
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub jmx_config: Option<String>,
    pub props: Option<BTreeMap<String, String>>,
}

fn path_filter(name: &'static str, doc: &'static str) -> Section {
    Section::new(name)
        .doc(doc)
        .leaf(LeafDescriptor::bool("enabled"))
        .leaf(LeafDescriptor::list("paths", ';').doc("Path patterns, ';' separated."))
}

/// The dispatch table for [`GatewayConfig`].
pub fn gateway_schema() -> Schema {
    Schema::new(
        Section::new("")
            .child(
                Section::new("FileConfig")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(
                        LeafDescriptor::int32("maxSize")
                            .null_resets_to(LeafValue::Int(0))
                            .doc("Upload size limit in MB."),
                    ),
            )
            .child(path_filter("ExcludePath", "Paths the gateway does not route."))
            .child(path_filter("Health", "Health check endpoints."))
            .child(path_filter("FallbackPath", "Fallback endpoints."))
            .child(
                Section::new("ExtPlugin")
                    .leaf(LeafDescriptor::string("path").doc("Directory scanned for extension jars."))
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::int32("threads"))
                    .leaf(LeafDescriptor::int32("scheduleTime").doc("Scan period in seconds."))
                    .leaf(LeafDescriptor::int32("scheduleDelay").doc("First scan delay in seconds.")),
            )
            .child(
                Section::new("MatchCache")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::int32("maxFreeMemory").doc("Cache memory budget in MB.")),
            )
            .child(
                Section::new("Scheduler")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::string("type").doc("\"fixed\" or \"elastic\"."))
                    .leaf(
                        LeafDescriptor::int32("threads")
                            .null_resets_to(LeafValue::Int(MIN_SCHEDULER_THREADS.into()))
                            .doc("Worker threads; defaults to max(2 * cpus + 1, 16)."),
                    ),
            )
            .child(
                Section::new("UpstreamCheck")
                    .doc("Active health checks against upstreams.")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::int32("timeout").doc("Probe timeout in ms."))
                    .leaf(LeafDescriptor::int32("healthyThreshold"))
                    .leaf(LeafDescriptor::int32("unhealthyThreshold"))
                    .leaf(LeafDescriptor::int32("interval").doc("Probe period in ms."))
                    .leaf(LeafDescriptor::bool("printEnabled"))
                    .leaf(LeafDescriptor::int32("printInterval"))
                    .child(
                        Section::new("SwitchConfig").leaf(
                            LeafDescriptor::bool("local").doc("Serve from the local config cache."),
                        ),
                    ),
            )
            .child(
                Section::new("CrossFilterConfig")
                    .doc("CORS handling.")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::string("allowedHeaders"))
                    .leaf(LeafDescriptor::string("allowedMethods"))
                    .leaf(LeafDescriptor::bool("allowedAnyOrigin"))
                    .leaf(LeafDescriptor::string("allowedExpose"))
                    .leaf(
                        LeafDescriptor::string("maxAge")
                            .null_resets_to(LeafValue::Str("0".into()))
                            .doc("Preflight cache lifetime in seconds."),
                    )
                    .leaf(LeafDescriptor::bool("allowCredentials"))
                    .child(
                        Section::new("AllowedOrigin")
                            .leaf(LeafDescriptor::string("spacer"))
                            .leaf(LeafDescriptor::string("domain"))
                            .leaf(LeafDescriptor::set("prefixes", ','))
                            .leaf(LeafDescriptor::set("origins", ','))
                            .leaf(LeafDescriptor::string("originRegex")),
                    ),
            )
            .child(
                Section::new("InstanceConfig")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::string("registerType"))
                    .leaf(LeafDescriptor::string("serverLists"))
                    .leaf(LeafDescriptor::map("props")),
            )
            .child(
                Section::new("RibbonConfig").leaf(
                    LeafDescriptor::int32("serverListRefreshInterval").null_resets_to(LeafValue::Int(0)),
                ),
            )
            .child(
                Section::new("Local")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(
                        LeafDescriptor::string("sha512Key")
                            .null_unsets()
                            .doc("Key guarding the local config endpoints."),
                    ),
            )
            .child(
                Section::new("WebsocketConfig")
                    .leaf(LeafDescriptor::int32("maxFramePayloadSize").doc("In MB.")),
            )
            .child(
                Section::new("SharedPool")
                    .doc("Thread pool shared by plugins.")
                    .leaf(LeafDescriptor::bool("enable"))
                    .leaf(LeafDescriptor::string("prefix").null_unsets())
                    .leaf(LeafDescriptor::int32("corePoolSize"))
                    .leaf(LeafDescriptor::int32("maximumPoolSize"))
                    .leaf(LeafDescriptor::int64("keepAliveTime").doc("In ms."))
                    .leaf(LeafDescriptor::int64("maxWorkQueueMemory").doc("In bytes."))
                    .leaf(LeafDescriptor::int32("maxFreeMemory")),
            )
            .child(
                Section::new("MetricsConfig")
                    .leaf(LeafDescriptor::bool("enabled"))
                    .leaf(LeafDescriptor::string("name").null_unsets())
                    .leaf(LeafDescriptor::string("host").null_unsets())
                    .leaf(LeafDescriptor::int32("port"))
                    .leaf(LeafDescriptor::string("jmxConfig").null_unsets())
                    .leaf(LeafDescriptor::map("props")),
            ),
    )
}
