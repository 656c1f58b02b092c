//! Base configuration files: the starting point of a patch pass.
//!
//! A base file is sparse. It is deep-merged over the serialized defaults of
//! the config type, checked for unknown keys and deserialized, so a file
//! holding only `[Scheduler]\nthreads = 64` yields a full config.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::engine::to_table;
use crate::error::PatchError;
use crate::file::read_file;
use crate::merge::deep_merge;
use crate::validate::deserialize_strict;

/// Build a config from base file text. `path` is only used in errors.
pub fn base_from_str<C>(content: &str, path: &Path, strict: bool) -> Result<C, PatchError>
where
    C: Serialize + DeserializeOwned + Default,
{
    let sparse: Table = toml::from_str(content).map_err(|e| PatchError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut full = to_table(&C::default())?;
    deep_merge(&mut full, sparse);
    deserialize_strict(Value::Table(full), content, path, strict)
}

/// Read and build a config from a base file.
pub fn load_base<C>(path: &Path, strict: bool) -> Result<C, PatchError>
where
    C: Serialize + DeserializeOwned + Default,
{
    let content = read_file(path)?;
    let config = base_from_str(&content, path, strict)?;
    tracing::debug!(path = %path.display(), "loaded base config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::gateway::GatewayConfig;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn path() -> PathBuf {
        PathBuf::from("base.toml")
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: TestConfig = base_from_str("", &path(), true).unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn sparse_file_overrides_only_what_it_sets() {
        let content = "[Server]\nport = 9000\n\n[Database]\nurl = \"pg://db\"\n";
        let config: TestConfig = base_from_str(content, &path(), true).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.database.url.as_deref(), Some("pg://db"));
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn nested_sections_merge() {
        let content = "[Server.Tls]\nenabled = true\n";
        let config: TestConfig = base_from_str(content, &path(), true).unwrap();
        assert!(config.server.tls.enabled);
        assert_eq!(config.server.tls.cert, None);
    }

    #[test]
    fn strict_rejects_unknown_key_with_line() {
        let content = "[Server]\nport = 1\nprot = 2\n";
        let err = base_from_str::<TestConfig>(content, &path(), true).unwrap_err();
        match err {
            PatchError::UnknownKeys(keys) => match &keys[0] {
                PatchError::UnknownKey { key, line, .. } => {
                    assert_eq!(key, "Server.prot");
                    assert_eq!(*line, 3);
                }
                other => panic!("Expected UnknownKey, got: {other:?}"),
            },
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn lenient_ignores_unknown_key() {
        let config: TestConfig = base_from_str("[Server]\nprot = 2\n", &path(), false).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = base_from_str::<TestConfig>("[Server\n", &path(), true).unwrap_err();
        assert!(matches!(err, PatchError::ParseError { .. }));
    }

    #[test]
    fn gateway_base_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gateway.toml");
        std::fs::write(
            &file,
            "[Scheduler]\nthreads = 64\n\n[CrossFilterConfig.AllowedOrigin]\norigins = [\"a\", \"b\"]\n",
        )
        .unwrap();
        let config: GatewayConfig = load_base(&file, true).unwrap();
        assert_eq!(config.scheduler.threads, 64);
        assert_eq!(config.scheduler.kind, "fixed");
        assert_eq!(
            config.cross_filter_config.allowed_origin.origins.map(|o| o.len()),
            Some(2)
        );
    }

    #[test]
    fn missing_base_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_base::<GatewayConfig>(&dir.path().join("absent.toml"), true).unwrap_err();
        assert!(matches!(err, PatchError::IoError { .. }));
    }
}
