use toml::{Table, Value};

use crate::merge::insert_nested;

/// Build a settings layer from environment variables named `{PREFIX}__*`.
///
/// `__` separates nesting levels and segments are lowercased, so
/// `CONFPATCH__REPORT__FORMAT=json` becomes `report.format = "json"`.
/// Values are `true`/`false` → bool, then integer, then string.
///
/// Takes an iterator so tests can pass synthetic pairs instead of `std::env::vars()`.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        let segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        if segments.iter().any(String::is_empty) {
            continue;
        }
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        insert_nested(&mut table, &segments, parse_env_value(&value));
    }

    table
}

fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        Value::Boolean(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Boolean(false)
    } else if let Ok(i) = s.parse::<i64>() {
        Value::Integer(i)
    } else {
        Value::String(s.to_string())
    }
}
