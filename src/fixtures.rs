#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use crate::schema::{LeafDescriptor, Schema, Section};
    use crate::value::LeafValue;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "PascalCase")]
    pub struct TestConfig {
        pub server: TestServer,
        pub database: TestDatabase,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct TestServer {
        pub host: String,
        pub port: i32,
        pub debug: bool,
        pub tags: Option<Vec<String>>,
        #[serde(rename = "Tls")]
        pub tls: TestTls,
    }

    impl Default for TestServer {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                tags: Some(Vec::new()),
                tls: TestTls::default(),
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct TestTls {
        pub enabled: bool,
        pub cert: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct TestDatabase {
        pub url: Option<String>,
        pub pool_size: i32,
        pub timeout_ms: i64,
        pub labels: Option<BTreeMap<String, String>>,
    }

    impl Default for TestDatabase {
        fn default() -> Self {
            Self {
                url: None,
                pool_size: 5,
                timeout_ms: 30_000,
                labels: Some(BTreeMap::new()),
            }
        }
    }

    /// Schema for [`TestConfig`].
    pub fn test_schema() -> Schema {
        Schema::new(
            Section::new("")
                .child(
                    Section::new("Server")
                        .leaf(LeafDescriptor::string("host").doc("The server host."))
                        .leaf(
                            LeafDescriptor::int32("port")
                                .null_resets_to(LeafValue::Int(0))
                                .doc("The port number."),
                        )
                        .leaf(LeafDescriptor::bool("debug"))
                        .leaf(LeafDescriptor::list("tags", ','))
                        .child(
                            Section::new("Tls")
                                .leaf(LeafDescriptor::bool("enabled"))
                                .leaf(LeafDescriptor::string("cert").null_unsets()),
                        ),
                )
                .child(
                    Section::new("Database")
                        .leaf(LeafDescriptor::string("url"))
                        .leaf(LeafDescriptor::int32("poolSize").null_resets_to(LeafValue::Int(5)))
                        .leaf(LeafDescriptor::int64("timeoutMs").null_resets_to(LeafValue::Int(0)))
                        .leaf(LeafDescriptor::map("labels")),
                ),
        )
    }

    #[test]
    fn fixture_defaults() {
        let config = TestConfig::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.database.url, None);
    }
}
