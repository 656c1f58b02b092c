//! The dispatch table a patch is resolved against.
//!
//! A [`Schema`] is a tree of [`Section`]s. Each section owns typed
//! [`LeafDescriptor`]s and child sections, addressed by exact segment name.
//! The descriptor carries everything coercion needs that the Rust field type
//! cannot say on its own: the collection delimiter and what the `null`
//! sentinel means for that particular leaf.
//!
//! Segment names are the serde names of the config type, so a resolved path
//! is also a key path into the config's `toml::Table` form.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::coerce::{MAP_ENTRY_SEP, MAP_KV_SEP};
use crate::error::PatchError;
use crate::types::Casing;
use crate::value::LeafValue;

/// Declared type of a leaf. Collection delimiters belong to the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Bool,
    Int32,
    Int64,
    Str,
    /// Unordered, de-duplicated strings split on `delimiter`.
    Set { delimiter: char },
    /// Ordered strings split on `delimiter`.
    List { delimiter: char },
    /// `key:value` entries separated by `;`.
    Map,
}

impl LeafKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LeafKind::Bool => "bool",
            LeafKind::Int32 => "i32",
            LeafKind::Int64 => "i64",
            LeafKind::Str => "string",
            LeafKind::Set { .. } => "set",
            LeafKind::List { .. } => "list",
            LeafKind::Map => "map",
        }
    }

    /// The separators a raw value is split on, if any.
    pub fn delimiters(&self) -> Option<String> {
        match self {
            LeafKind::Set { delimiter } | LeafKind::List { delimiter } => {
                Some(delimiter.to_string())
            }
            LeafKind::Map => Some(format!("{MAP_ENTRY_SEP} {MAP_KV_SEP}")),
            _ => None,
        }
    }

    fn accepts(&self, value: &LeafValue) -> bool {
        matches!(
            (self, value),
            (LeafKind::Bool, LeafValue::Bool(_))
                | (LeafKind::Int32 | LeafKind::Int64, LeafValue::Int(_))
                | (LeafKind::Str, LeafValue::Str(_))
                | (LeafKind::Set { .. }, LeafValue::Set(_))
                | (LeafKind::List { .. }, LeafValue::List(_))
                | (LeafKind::Map, LeafValue::Map(_))
        )
    }
}

/// What the raw value `null` does to a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnNull {
    /// Store this value.
    Reset(LeafValue),
    /// Remove the value; the field reads as absent.
    Unset,
}

impl fmt::Display for OnNull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnNull::Reset(v) => write!(f, "{v}"),
            OnNull::Unset => write!(f, "<absent>"),
        }
    }
}

/// A terminal, typed, directly assignable field.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafDescriptor {
    pub name: &'static str,
    pub kind: LeafKind,
    pub on_null: OnNull,
    pub doc: &'static str,
}

impl LeafDescriptor {
    fn new(name: &'static str, kind: LeafKind, on_null: OnNull) -> Self {
        Self {
            name,
            kind,
            on_null,
            doc: "",
        }
    }

    /// Boolean leaf; `null` always means `false`.
    pub fn bool(name: &'static str) -> Self {
        Self::new(name, LeafKind::Bool, OnNull::Reset(LeafValue::Bool(false)))
    }

    /// 32-bit integer leaf; `null` unsets unless told otherwise.
    pub fn int32(name: &'static str) -> Self {
        Self::new(name, LeafKind::Int32, OnNull::Unset)
    }

    /// 64-bit integer leaf; `null` unsets unless told otherwise.
    pub fn int64(name: &'static str) -> Self {
        Self::new(name, LeafKind::Int64, OnNull::Unset)
    }

    /// String leaf; `null` means `""` unless told otherwise.
    pub fn string(name: &'static str) -> Self {
        Self::new(name, LeafKind::Str, OnNull::Reset(LeafValue::Str(String::new())))
    }

    pub fn set(name: &'static str, delimiter: char) -> Self {
        Self::new(name, LeafKind::Set { delimiter }, OnNull::Unset)
    }

    pub fn list(name: &'static str, delimiter: char) -> Self {
        Self::new(name, LeafKind::List { delimiter }, OnNull::Unset)
    }

    pub fn map(name: &'static str) -> Self {
        Self::new(name, LeafKind::Map, OnNull::Unset)
    }

    pub fn null_resets_to(mut self, value: LeafValue) -> Self {
        self.on_null = OnNull::Reset(value);
        self
    }

    pub fn null_unsets(mut self) -> Self {
        self.on_null = OnNull::Unset;
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }
}

/// A named node of the tree. Children are owned; there is no sharing.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: &'static str,
    pub doc: &'static str,
    leaves: Vec<LeafDescriptor>,
    children: Vec<Section>,
}

impl Section {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            doc: "",
            leaves: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub fn leaf(mut self, leaf: LeafDescriptor) -> Self {
        self.leaves.push(leaf);
        self
    }

    pub fn child(mut self, section: Section) -> Self {
        self.children.push(section);
        self
    }

    pub fn leaves(&self) -> &[LeafDescriptor] {
        &self.leaves
    }

    pub fn children(&self) -> &[Section] {
        &self.children
    }

    /// Child section named `segment`. No partial or fuzzy matching.
    pub fn resolve_child(&self, segment: &str, casing: Casing) -> Option<&Section> {
        self.children.iter().find(|c| casing.matches(c.name, segment))
    }

    /// Leaf of this section named `segment`.
    pub fn resolve_leaf(&self, segment: &str, casing: Casing) -> Option<&LeafDescriptor> {
        self.leaves.iter().find(|l| casing.matches(l.name, segment))
    }
}

/// One row of the published leaf table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafRow {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub delimiters: Option<String>,
    pub on_null: String,
    pub doc: &'static str,
}

impl LeafRow {
    pub fn new(path: String, leaf: &LeafDescriptor) -> Self {
        Self {
            path,
            kind: leaf.kind.type_name(),
            delimiters: leaf.kind.delimiters(),
            on_null: leaf.on_null.to_string(),
            doc: leaf.doc,
        }
    }
}

impl fmt::Display for LeafRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind)?;
        if let Some(d) = &self.delimiters {
            write!(f, " split '{d}'")?;
        }
        write!(f, " null -> {}", self.on_null)
    }
}

/// Root of a configuration tree. The root section itself is unnamed.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Section,
}

impl Schema {
    pub fn new(root: Section) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    /// Every leaf with its canonical dotted path, depth first, leaves of a
    /// section before its children.
    pub fn leaves(&self) -> Vec<(String, &LeafDescriptor)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, "", &mut out);
        out
    }

    /// Look up a leaf by dotted path. Returns the canonical path.
    pub fn find_leaf(&self, dotted: &str, casing: Casing) -> Option<(String, &LeafDescriptor)> {
        let (parents, leaf) = match dotted.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, dotted),
        };
        let mut section = &self.root;
        let mut canonical = Vec::new();
        if let Some(parents) = parents {
            for segment in parents.split('.') {
                section = section.resolve_child(segment, casing)?;
                canonical.push(section.name);
            }
        }
        let leaf = section.resolve_leaf(leaf, casing)?;
        canonical.push(leaf.name);
        Some((canonical.join("."), leaf))
    }

    /// The per-leaf type, delimiter and null-policy table.
    pub fn rows(&self) -> Vec<LeafRow> {
        self.leaves()
            .into_iter()
            .map(|(path, leaf)| LeafRow::new(path, leaf))
            .collect()
    }

    /// Verify that `config`'s type has exactly the shape this schema describes.
    ///
    /// Every serialized key must be declared, every leaf must be a field of
    /// the declared kind, every `Reset` value must fit the leaf's kind, and
    /// every `Unset` leaf must really be optional on the Rust side.
    pub fn check_against<C: Serialize + DeserializeOwned>(
        &self,
        config: &C,
    ) -> Result<(), PatchError> {
        let table = crate::engine::to_table(config)?;
        check_section(&self.root, &table, "")?;

        for (path, leaf) in self.leaves() {
            let sample = sample_value(leaf.kind).to_toml();
            let mut trial = table.clone();
            insert_path(&mut trial, &path, sample.clone());
            let stored = crate::engine::from_table::<C>(trial)
                .and_then(|c| crate::engine::to_table(&c))
                .ok()
                .and_then(|t| crate::ops::table_get(&t, &path).cloned());
            if stored.as_ref() != Some(&sample) {
                return Err(PatchError::SchemaMismatch(format!(
                    "{path}: not a {} field of the config type",
                    leaf.kind.type_name()
                )));
            }

            match &leaf.on_null {
                OnNull::Reset(v) if !leaf.kind.accepts(v) => {
                    return Err(PatchError::SchemaMismatch(format!(
                        "{path}: null value {v} is not a {}",
                        leaf.kind.type_name()
                    )));
                }
                OnNull::Reset(_) => {}
                OnNull::Unset => {
                    let mut trial = table.clone();
                    remove_path(&mut trial, &path);
                    if Value::Table(trial).try_into::<C>().is_err() {
                        return Err(PatchError::SchemaMismatch(format!(
                            "{path}: null unsets it, but the field is not optional"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn collect_leaves<'a>(
    section: &'a Section,
    prefix: &str,
    out: &mut Vec<(String, &'a LeafDescriptor)>,
) {
    for leaf in &section.leaves {
        out.push((join(prefix, leaf.name), leaf));
    }
    for child in &section.children {
        collect_leaves(child, &join(prefix, child.name), out);
    }
}

fn check_section(section: &Section, table: &Table, prefix: &str) -> Result<(), PatchError> {
    for (key, value) in table {
        let path = join(prefix, key);
        if let Some(child) = section.children.iter().find(|c| c.name == key.as_str()) {
            let Some(sub) = value.as_table() else {
                return Err(PatchError::SchemaMismatch(format!("{path}: expected a section")));
            };
            check_section(child, sub, &path)?;
        } else if section.leaves.iter().all(|l| l.name != key.as_str()) {
            return Err(PatchError::SchemaMismatch(format!("{path}: not declared")));
        }
    }
    for child in &section.children {
        if !table.contains_key(child.name) {
            return Err(PatchError::SchemaMismatch(format!(
                "{}: section missing",
                join(prefix, child.name)
            )));
        }
    }
    Ok(())
}

fn sample_value(kind: LeafKind) -> LeafValue {
    match kind {
        LeafKind::Bool => LeafValue::Bool(true),
        LeafKind::Int32 | LeafKind::Int64 => LeafValue::Int(7),
        LeafKind::Str => LeafValue::Str("sample".into()),
        LeafKind::Set { .. } => LeafValue::Set(["sample".to_string()].into()),
        LeafKind::List { .. } => LeafValue::List(vec!["sample".into()]),
        LeafKind::Map => LeafValue::Map([("k".to_string(), "v".to_string())].into()),
    }
}

fn insert_path(table: &mut Table, dotted: &str, value: Value) {
    let segments: Vec<&str> = dotted.split('.').collect();
    crate::merge::insert_nested(table, &segments, value);
}

fn remove_path(table: &mut Table, dotted: &str) {
    let (parents, leaf) = match dotted.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted),
    };
    let mut current = table;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            match current.get_mut(segment).and_then(Value::as_table_mut) {
                Some(next) => current = next,
                None => return,
            }
        }
    }
    current.remove(leaf);
}
