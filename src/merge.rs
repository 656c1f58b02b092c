//! Table layering helpers shared by settings resolution and base files.

use toml::{Table, Value};

/// Lay `overlay` over `base` in place.
/// Tables present on both sides are merged key by key; anything else in
/// `overlay` replaces what `base` had.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, overlay_val) in overlay {
        match (base.get_mut(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                deep_merge(base_tbl, overlay_tbl);
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
}

/// Store `value` under the nested key `segments`, creating intermediate
/// tables. A non-table value in the way is replaced by a table.
pub fn insert_nested(table: &mut Table, segments: &[&str], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = table;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        let Value::Table(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    fn merged(base: &str, overlay: &str) -> Table {
        let mut base = table(base);
        deep_merge(&mut base, table(overlay));
        base
    }

    #[test]
    fn disjoint_keys_merge() {
        let m = merged(r#"casing = "exact""#, "trace_lookups = true");
        assert_eq!(m["casing"].as_str(), Some("exact"));
        assert_eq!(m["trace_lookups"].as_bool(), Some(true));
    }

    #[test]
    fn overlay_scalar_wins() {
        let m = merged(r#"casing = "exact""#, r#"casing = "ignore-ascii""#);
        assert_eq!(m["casing"].as_str(), Some("ignore-ascii"));
    }

    #[test]
    fn nested_tables_merge_key_by_key() {
        let m = merged(
            "[Scheduler]\nenabled = false\nthreads = 16\n",
            "[Scheduler]\nthreads = 32\n",
        );
        assert_eq!(m["Scheduler"]["enabled"].as_bool(), Some(false));
        assert_eq!(m["Scheduler"]["threads"].as_integer(), Some(32));
    }

    #[test]
    fn overlay_array_replaces_array() {
        let m = merged(
            "[Health]\npaths = [\"/a\", \"/b\"]\n",
            "[Health]\npaths = [\"/c\"]\n",
        );
        assert_eq!(m["Health"]["paths"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_overlay_keeps_base() {
        let base = table("port = 8080");
        let m = merged("port = 8080", "");
        assert_eq!(m, base);
    }

    #[test]
    fn insert_nested_creates_tables() {
        let mut t = Table::new();
        insert_nested(&mut t, &["report", "format"], Value::String("json".into()));
        assert_eq!(t["report"]["format"].as_str(), Some("json"));
    }

    #[test]
    fn insert_nested_replaces_scalar_in_the_way() {
        let mut t = table("report = 1");
        insert_nested(&mut t, &["report", "only_rejected"], Value::Boolean(true));
        assert_eq!(t["report"]["only_rejected"].as_bool(), Some(true));
    }

    #[test]
    fn insert_nested_last_write_wins() {
        let mut t = Table::new();
        insert_nested(&mut t, &["casing"], Value::String("exact".into()));
        insert_nested(&mut t, &["casing"], Value::String("ignore-ascii".into()));
        assert_eq!(t["casing"].as_str(), Some("ignore-ascii"));
    }
}
