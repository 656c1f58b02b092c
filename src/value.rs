//! Typed leaf values and how they are stored in a `toml::Table`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use toml::Value;

/// A coerced leaf value, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Set(BTreeSet<String>),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl LeafValue {
    /// The TOML shape serde produces for the matching Rust field type.
    pub fn to_toml(&self) -> Value {
        match self {
            LeafValue::Bool(b) => Value::Boolean(*b),
            LeafValue::Int(i) => Value::Integer(*i),
            LeafValue::Str(s) => Value::String(s.clone()),
            LeafValue::Set(items) => strings(items.iter()),
            LeafValue::List(items) => strings(items.iter()),
            LeafValue::Map(entries) => Value::Table(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

fn strings<'a>(items: impl Iterator<Item = &'a String>) -> Value {
    Value::Array(items.cloned().map(Value::String).collect())
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafValue::Bool(b) => write!(f, "{b}"),
            LeafValue::Int(i) => write!(f, "{i}"),
            LeafValue::Str(s) => write!(f, "{s:?}"),
            LeafValue::Set(items) => {
                let items: Vec<&str> = items.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            LeafValue::List(items) => write!(f, "[{}]", items.join(", ")),
            LeafValue::Map(entries) => {
                let pairs: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keeps_order_in_toml() {
        let v = LeafValue::List(vec!["/b".into(), "/a".into()]).to_toml();
        let items: Vec<&str> = v
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i.as_str().unwrap())
            .collect();
        assert_eq!(items, ["/b", "/a"]);
    }

    #[test]
    fn map_becomes_string_table() {
        let entries = BTreeMap::from([("a".to_string(), "1".to_string())]);
        let v = LeafValue::Map(entries).to_toml();
        assert_eq!(v["a"].as_str(), Some("1"));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(LeafValue::Int(3).to_string(), "3");
        assert_eq!(LeafValue::Str("x".into()).to_string(), "\"x\"");
        assert_eq!(
            LeafValue::List(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
        let map = BTreeMap::from([("k".to_string(), "v".to_string())]);
        assert_eq!(LeafValue::Map(map).to_string(), "{k: v}");
    }
}
