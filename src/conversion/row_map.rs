use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::translation::NamedParams;
use crate::types::{Param, SqlValue};

/// The case-folded form of a column name, shared by every case-insensitive column lookup.
pub(crate) fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Column name → value mapping for one row.
///
/// Lookups ignore ASCII/Unicode case while keys keep the case they were inserted with, and
/// iteration follows insertion order. Inserting a key that already exists under any case replaces
/// the value in place and adopts the new spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: Vec<(String, SqlValue)>,
    index: HashMap<String, usize>,
}

impl RowMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace; returns the previous value stored under the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: SqlValue) -> Option<SqlValue> {
        let key = key.into();
        let folded = fold_name(&key);
        if let Some(&slot) = self.index.get(&folded) {
            let previous = std::mem::replace(&mut self.entries[slot], (key, value));
            return Some(previous.1);
        }
        self.index.insert(folded, self.entries.len());
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.index
            .get(&fold_name(key))
            .map(|&slot| &self.entries[slot].1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&fold_name(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order, with their stored case.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        let mut map = RowMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for RowMap {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for RowMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl NamedParams for RowMap {
    fn named_param(&self, name: &str) -> Option<Param> {
        self.get(name).cloned().map(Param::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_last_wins_in_place() {
        let mut map = RowMap::new();
        map.insert("ID", SqlValue::Int(1));
        map.insert("name", SqlValue::from("a"));
        let old = map.insert("id", SqlValue::Int(2));
        assert_eq!(old, Some(SqlValue::Int(1)));
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(map.get("Id"), Some(&SqlValue::Int(2)));
        assert!(map.contains_key("NAME"));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let map: RowMap = [("b", SqlValue::Int(1)), ("a", SqlValue::Null)]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"b":1,"a":null}"#);
    }
}
