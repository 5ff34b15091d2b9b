//! The variable store: a flat map of names to string values.
//!
//! Names may carry array indices (`root[3]`) or share a prefix
//! (`Ship_Name`, `Ship_Cargo`); built-ins treat such groups as
//! pseudo-arrays by scanning names in store order.

use std::collections::BTreeMap;

/// Ordered name → value map owned by one expansion session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Variables {
            values: BTreeMap::new(),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All names in enumeration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries whose name starts with `prefix`, in enumeration order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter().filter(move |(k, _)| k.starts_with(prefix))
    }

    /// Flatten a JSON value into variables rooted at `prefix`.
    ///
    /// Object members append `_key` (or just `key` at an empty root),
    /// array elements append a 1-based `[n]` and record `_Count`.
    /// Booleans are stored as `1`/`0`, null as an empty string.
    pub fn add_json(&mut self, value: &serde_json::Value, prefix: &str) {
        use serde_json::Value as Json;
        match value {
            Json::Object(map) => {
                for (key, member) in map {
                    let name = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}_{}", prefix, key)
                    };
                    self.add_json(member, &name);
                }
            }
            Json::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.add_json(item, &format!("{}[{}]", prefix, i + 1));
                }
                self.set(format!("{}_Count", prefix), items.len().to_string());
            }
            Json::String(s) => self.set(prefix, s.as_str()),
            Json::Number(n) => self.set(prefix, n.to_string()),
            Json::Bool(b) => self.set(prefix, if *b { "1" } else { "0" }),
            Json::Null => self.set(prefix, ""),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        vars.extend(iter);
        vars
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}
