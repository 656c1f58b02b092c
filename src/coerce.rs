//! Raw string → typed leaf value, per the leaf's descriptor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::Rejection;
use crate::schema::{LeafDescriptor, LeafKind, OnNull};
use crate::types::MapEntryPolicy;
use crate::value::LeafValue;

/// The raw value that means "reset this leaf", for every leaf type.
pub const NULL_SENTINEL: &str = "null";

/// Separator between entries of a map leaf.
pub const MAP_ENTRY_SEP: char = ';';

/// Separator between key and value inside one map entry.
pub const MAP_KV_SEP: char = ':';

/// Convert `raw` into the leaf's declared type.
///
/// `Ok(None)` means the leaf must become absent. Nothing is stored here; the
/// caller decides what to do with the result, so an error leaves the leaf
/// untouched.
pub fn coerce(
    leaf: &LeafDescriptor,
    raw: &str,
    map_entries: MapEntryPolicy,
) -> Result<Option<LeafValue>, Rejection> {
    if raw == NULL_SENTINEL {
        return Ok(match &leaf.on_null {
            OnNull::Reset(value) => Some(value.clone()),
            OnNull::Unset => None,
        });
    }

    let value = match leaf.kind {
        LeafKind::Bool => LeafValue::Bool(parse_bool(raw)?),
        LeafKind::Int32 => LeafValue::Int(parse_int::<i32>(raw, "32-bit")?.into()),
        LeafKind::Int64 => LeafValue::Int(parse_int::<i64>(raw, "64-bit")?),
        LeafKind::Str => LeafValue::Str(raw.to_string()),
        LeafKind::Set { delimiter } => {
            LeafValue::Set(tokens(raw, delimiter).map(String::from).collect::<BTreeSet<_>>())
        }
        LeafKind::List { delimiter } => {
            LeafValue::List(tokens(raw, delimiter).map(String::from).collect())
        }
        LeafKind::Map => LeafValue::Map(parse_map(raw, map_entries)?),
    };
    Ok(Some(value))
}

fn parse_bool(raw: &str) -> Result<bool, Rejection> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Rejection::Coercion {
            detail: format!("'{raw}' is not a boolean"),
        })
    }
}

fn parse_int<T>(raw: &str, width: &str) -> Result<T, Rejection>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| Rejection::Coercion {
        detail: format!("'{raw}' is not a {width} integer: {e}"),
    })
}

/// Split on `delimiter`, dropping empty tokens (`"/a;;/b;"` has two).
fn tokens(raw: &str, delimiter: char) -> impl Iterator<Item = &str> {
    raw.split(delimiter).filter(|t| !t.is_empty())
}

fn parse_map(raw: &str, policy: MapEntryPolicy) -> Result<BTreeMap<String, String>, Rejection> {
    let mut entries = BTreeMap::new();
    for entry in tokens(raw, MAP_ENTRY_SEP) {
        match entry.split_once(MAP_KV_SEP) {
            Some((key, value)) if !key.is_empty() => {
                entries.insert(key.to_string(), value.to_string());
            }
            _ => match policy {
                MapEntryPolicy::RejectLine => {
                    return Err(Rejection::MalformedMapEntry {
                        entry: entry.to_string(),
                    });
                }
                MapEntryPolicy::SkipEntry => {
                    tracing::debug!(entry, "skipping malformed map entry");
                }
            },
        }
    }
    Ok(entries)
}
