//! Recursive flattening of nested scheme records.
//!
//! A raw record is an arbitrary JSON tree with no fixed schema. [`flatten`]
//! reduces it to a [`FlatMap`] from a path to a scalar string:
//!
//! ```text
//! {"basicDetails": {"level": {"label": "State"}}}   basicDetails.level.label = "State"
//! {"benefits": [{"text": "a"}, {"text": "b"}]}       benefits[0].text = "a"
//!                                                    benefits[1].text = "b"
//! {"tags": ["Student", "Girl"]}                      tags = "Student, Girl"
//! ```
//!
//! Sequences are expanded per index only when every element is a mapping;
//! any other sequence collapses into one comma-joined value.
//!
//! Entries keep the record's document order. Prefix harvesting in
//! [`crate::synthesize`] depends on that order, so [`FlatMap`] never sorts.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Deepest nesting accepted before a record is rejected as malformed.
pub const MAX_DEPTH: usize = 128;

/// Insertion-ordered mapping from a flattened path to its scalar text.
///
/// Re-inserting an existing path replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: String, value: String) {
        match self.positions.get(&path) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.positions.insert(path.clone(), self.entries.len());
                self.entries.push((path, value));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.positions
            .get(path)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut flat = FlatMap::new();
        for (path, value) in iter {
            flat.insert(path, value);
        }
        flat
    }
}

/// Flatten a record into a [`FlatMap`].
///
/// # Errors
///
/// [`Error::MalformedInput`] when the tree nests deeper than [`MAX_DEPTH`].
pub fn flatten(record: &Value) -> Result<FlatMap> {
    let mut flat = FlatMap::new();
    flatten_into(record, "", 0, &mut flat)?;
    Ok(flat)
}

fn flatten_into(value: &Value, path: &str, depth: usize, flat: &mut FlatMap) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::MalformedInput(format!(
            "record nests deeper than {} levels at '{}'",
            MAX_DEPTH, path
        )));
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_into(child, &child_path, depth + 1, flat)?;
            }
        }
        Value::Array(items) if items.iter().all(Value::is_object) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{}[{}]", path, i), depth + 1, flat)?;
            }
        }
        Value::Array(items) => {
            let joined = items.iter().map(stringify).collect::<Vec<_>>().join(", ");
            flat.insert(path.to_string(), joined);
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            flat.insert(path.to_string(), stringify(value));
        }
    }

    Ok(())
}

/// Render a JSON value as display text.
///
/// `null` is empty and booleans are `True` / `False`. Numbers and strings
/// use their natural form. A mapping with a `label` (or else `value`) field
/// renders that field, and anything else falls back to compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("label").or_else(|| map.get("value")) {
            Some(inner) => stringify(inner),
            None => value.to_string(),
        },
        Value::Array(_) => value.to_string(),
    }
}
