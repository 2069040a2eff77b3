//! Events: the field trees produced by assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Nested field map; keys are path segments.
pub type FieldTree = BTreeMap<String, FieldValue>;

/// A leaf value or a nested subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Object(FieldTree),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FieldTree> {
        match self {
            FieldValue::Object(tree) => Some(tree),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Identity of an event within one cycle: `(label, value)` for every key
/// label of the mapping, ordered by label name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<(String, String)>);

impl GroupKey {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One assembled monitoring event.
///
/// Serializes as its field tree only; the group key is already present
/// in the fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    key: GroupKey,
    fields: FieldTree,
}

impl Event {
    /// Create an event seeded with one text field per key label.
    pub fn new(key: GroupKey) -> Self {
        let fields = key
            .pairs()
            .iter()
            .map(|(name, value)| (name.clone(), FieldValue::Text(value.clone())))
            .collect();
        Self { key, fields }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn fields(&self) -> &FieldTree {
        &self.fields
    }

    pub fn into_fields(self) -> FieldTree {
        self.fields
    }

    /// Write `value` at a top-level field, replacing what was there.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Write `value` at a dotted path, replacing any leaf that sits where
    /// a container is needed. Last write wins.
    pub fn put(&mut self, path: &str, value: impl Into<FieldValue>) {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        self.container_mut(parent)
            .insert(leaf.to_string(), value.into());
    }

    /// Write `value` under the container at dotted `path`, using `name` as
    /// a single key even if it contains dots.
    pub fn put_entry(&mut self, path: &str, name: &str, value: impl Into<FieldValue>) {
        self.container_mut(Some(path))
            .insert(name.to_string(), value.into());
    }

    fn container_mut(&mut self, path: Option<&str>) -> &mut FieldTree {
        let mut node = &mut self.fields;
        for segment in path.into_iter().flat_map(|p| p.split('.')) {
            let slot = node
                .entry(segment.to_string())
                .or_insert_with(|| FieldValue::Object(FieldTree::new()));
            if !matches!(slot, FieldValue::Object(_)) {
                *slot = FieldValue::Object(FieldTree::new());
            }
            node = match slot {
                FieldValue::Object(tree) => tree,
                _ => unreachable!("slot was just made an object"),
            };
        }
        node
    }

    /// Read the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.fields).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Event {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
