//! Write a patch pass back into the base file, keeping its comments.
//!
//! Only the leaves a pass applied are touched. Each one is set to the value
//! it holds in the patched config, or removed from the document when the
//! config no longer holds a value there. Everything else in the document,
//! comments and layout included, is left as it was.
//!
//! TOML has no null. A removed leaf reloads as its default, so an unset leaf
//! whose default holds a value does not survive the round trip;
//! [`persist_applied`] returns those paths and warns about each.

use std::path::Path;

use serde::Serialize;
use toml_edit::{DocumentMut, InlineTable, Item};

use crate::engine::to_table;
use crate::error::PatchError;
use crate::ops::table_get;
use crate::report::PatchReport;

/// Apply the report's applied leaves to a TOML document string.
///
/// `document` is the current file content, `None` when there is no file
/// yet. `path` is only used in errors.
pub fn write_back<C: Serialize>(
    document: Option<&str>,
    path: &Path,
    report: &PatchReport,
    config: &C,
) -> Result<String, PatchError> {
    let mut doc: DocumentMut =
        document
            .unwrap_or_default()
            .parse()
            .map_err(|e| PatchError::EditError {
                path: path.to_path_buf(),
                source: e,
            })?;
    let table = to_table(config)?;

    for leaf_path in report.applied_paths() {
        let segments: Vec<&str> = leaf_path.split('.').collect();
        match table_get(&table, leaf_path) {
            Some(value) => set_in_document(doc.as_item_mut(), &segments, to_edit_value(value)),
            None => remove_in_document(doc.as_item_mut(), &segments),
        }
    }

    Ok(doc.to_string())
}

/// Applied leaves that `config` leaves unset but `C::default()` fills in.
///
/// Writing them back removes the key, so reloading the file gives the
/// default rather than the patched state.
pub fn reverted_on_reload<C: Serialize + Default>(
    report: &PatchReport,
    config: &C,
) -> Result<Vec<String>, PatchError> {
    let patched = to_table(config)?;
    let defaults = to_table(&C::default())?;
    Ok(report
        .applied_paths()
        .into_iter()
        .filter(|path| table_get(&patched, path).is_none() && table_get(&defaults, path).is_some())
        .map(str::to_string)
        .collect())
}

/// Read `path` (if it exists), write the applied leaves into it, save it.
///
/// Returns the leaves that will reload as their default, see
/// [`reverted_on_reload`].
pub fn persist_applied<C: Serialize + Default>(
    path: &Path,
    report: &PatchReport,
    config: &C,
) -> Result<Vec<String>, PatchError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => Some(c),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(PatchError::IoError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let new_content = write_back(content.as_deref(), path, report, config)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| PatchError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, &new_content).map_err(|e| PatchError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(
        path = %path.display(),
        leaves = report.applied_paths().len(),
        "wrote patched values"
    );

    let reverted = reverted_on_reload(report, config)?;
    for leaf in &reverted {
        tracing::warn!(
            path = %path.display(),
            leaf = %leaf,
            "unset leaf removed from file, reloading gives its default"
        );
    }
    Ok(reverted)
}

fn set_in_document(root: &mut Item, segments: &[&str], mut value: toml_edit::Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        if !current.get(*segment).is_some_and(Item::is_table_like) {
            // A table item inside an inline table is dropped on output.
            current[*segment] = if current.is_inline_table() {
                Item::Value(toml_edit::Value::InlineTable(InlineTable::new()))
            } else {
                let mut table = toml_edit::Table::new();
                table.set_implicit(true);
                Item::Table(table)
            };
        }
        current = &mut current[*segment];
    }

    // Keep a trailing comment on a replaced value.
    if let Some(old) = current.get(*leaf).and_then(Item::as_value) {
        *value.decor_mut() = old.decor().clone();
    }
    current[*leaf] = Item::Value(value);
}

fn remove_in_document(root: &mut Item, segments: &[&str]) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(next) if next.is_table_like() => current = next,
            _ => return,
        }
    }
    if let Some(table) = current.as_table_like_mut() {
        table.remove(leaf);
    }
}

fn to_edit_value(value: &toml::Value) -> toml_edit::Value {
    match value {
        toml::Value::String(s) => s.as_str().into(),
        toml::Value::Integer(i) => (*i).into(),
        toml::Value::Float(f) => (*f).into(),
        toml::Value::Boolean(b) => (*b).into(),
        toml::Value::Datetime(d) => (*d).into(),
        toml::Value::Array(items) => {
            toml_edit::Value::Array(items.iter().map(to_edit_value).collect())
        }
        toml::Value::Table(entries) => {
            let mut inline = InlineTable::new();
            for (k, v) in entries {
                inline.insert(k.as_str(), to_edit_value(v));
            }
            toml_edit::Value::InlineTable(inline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::base_from_str;
    use crate::engine::PatchEngine;
    use crate::fixtures::test::{TestConfig, test_schema};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn run(document: Option<&str>, patch: &str) -> String {
        let schema = test_schema();
        let mut config: TestConfig = match document {
            Some(d) => base_from_str(d, &path(), true).unwrap(),
            None => TestConfig::default(),
        };
        let report = PatchEngine::new(&schema).apply_text(&mut config, patch).unwrap();
        write_back(document, &path(), &report, &config).unwrap()
    }

    fn path() -> PathBuf {
        PathBuf::from("base.toml")
    }

    #[test]
    fn set_existing_key() {
        let out = run(Some("[Server]\nport = 8080\nhost = \"a\"\n"), "Server.port=3000");
        assert!(out.contains("port = 3000"));
        assert!(out.contains("host = \"a\""));
    }

    #[test]
    fn preserves_comments() {
        let content = "# gateway base\n[Server]\n# listen port\nport = 8080 # keep me\n";
        let out = run(Some(content), "Server.port=3000");
        assert!(out.contains("# gateway base"));
        assert!(out.contains("# listen port"));
        assert!(out.contains("port = 3000 # keep me"));
    }

    #[test]
    fn new_section_is_created() {
        let out = run(Some("[Server]\nport = 1\n"), "Database.poolSize=9");
        let reparsed: toml::Table = out.parse().unwrap();
        assert_eq!(reparsed["Database"]["poolSize"].as_integer(), Some(9));
        assert_eq!(reparsed["Server"]["port"].as_integer(), Some(1));
    }

    #[test]
    fn nested_section_uses_implicit_parent() {
        let out = run(None, "Server.Tls.cert=/etc/cert.pem");
        assert!(out.contains("[Server.Tls]"));
        assert!(!out.contains("[Server]\n"));
        assert!(out.contains("cert = \"/etc/cert.pem\""));
    }

    #[test]
    fn unset_leaf_is_removed() {
        let content = "[Server.Tls]\ncert = \"/old\"\nenabled = true\n";
        let out = run(Some(content), "Server.Tls.cert=null");
        assert!(!out.contains("cert"));
        assert!(out.contains("enabled = true"));
    }

    #[test]
    fn nested_leaf_under_inline_parent() {
        let content = "Server = { port = 1 }\n";
        let out = run(Some(content), "Server.Tls.cert=/c\nServer.debug=true");
        let reloaded: TestConfig = base_from_str(&out, &path(), true).unwrap();
        assert_eq!(reloaded.server.tls.cert.as_deref(), Some("/c"));
        assert!(reloaded.server.debug);
        assert_eq!(reloaded.server.port, 1);
        assert!(out.starts_with("Server = {"));
    }

    #[test]
    fn rejected_lines_do_not_touch_the_document() {
        let content = "[Server]\nport = 8080\n";
        let out = run(Some(content), "Server.port=abc\nNope.x=1");
        assert_eq!(out, content);
    }

    #[test]
    fn collections_are_written_as_toml_shapes() {
        let out = run(None, "Server.tags=b,a\nDatabase.labels=env:prod;tier:1");
        let reparsed: toml::Table = out.parse().unwrap();
        let tags: Vec<&str> = reparsed["Server"]["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(tags, ["b", "a"]);
        assert_eq!(reparsed["Database"]["labels"]["env"].as_str(), Some("prod"));
    }

    #[test]
    fn written_file_reloads_to_the_patched_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("base.toml");
        fs::write(&file, "# base\n[Server]\nport = 8080\n").unwrap();

        let schema = test_schema();
        let content = fs::read_to_string(&file).unwrap();
        let mut config: TestConfig = base_from_str(&content, &file, true).unwrap();
        let report = PatchEngine::new(&schema)
            .apply_text(&mut config, "Server.port=9\nServer.debug=true\nDatabase.url=pg://x")
            .unwrap();
        assert!(persist_applied(&file, &report, &config).unwrap().is_empty());

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("# base"));
        let reloaded: TestConfig = base_from_str(&content, &file, true).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn unset_leaf_with_default_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("base.toml");
        fs::write(&file, "[Server]\ntags = [\"a\"]\n\n[Server.Tls]\ncert = \"/old\"\n").unwrap();

        let schema = test_schema();
        let content = fs::read_to_string(&file).unwrap();
        let mut config: TestConfig = base_from_str(&content, &file, true).unwrap();
        let report = PatchEngine::new(&schema)
            .apply_text(&mut config, "Server.tags=null\nServer.Tls.cert=null\nServer.port=9")
            .unwrap();
        assert_eq!(config.server.tags, None);

        let reverted = persist_applied(&file, &report, &config).unwrap();
        assert_eq!(reverted, ["Server.tags"]);

        let reloaded: TestConfig =
            base_from_str(&fs::read_to_string(&file).unwrap(), &file, true).unwrap();
        assert_eq!(reloaded.server.tags, Some(Vec::new()));
        assert_eq!(reloaded.server.tls.cert, None);
        assert_eq!(reloaded.server.port, 9);
    }

    #[test]
    fn persist_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sub").join("base.toml");
        let schema = test_schema();
        let mut config = TestConfig::default();
        let report = PatchEngine::new(&schema)
            .apply_text(&mut config, "Server.host=example.org")
            .unwrap();
        persist_applied(&file, &report, &config).unwrap();
        assert!(fs::read_to_string(&file).unwrap().contains("host = \"example.org\""));
    }
}
