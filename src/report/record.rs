/// Generic parsed record: normalized field name -> value.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A VM reference embedded in another report (`vm2 (UUID: 1234-...)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRef {
    pub name: String,
    pub uuid: String,
}

/// A record field: plain text, or machine references lifted out of an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Vms(Vec<VmRef>),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Vms(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// One logical entity from a block report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: FieldValue) {
        self.0.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Text value of `key`, if present and textual.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Remove and return the text value of the first of `keys` present.
    ///
    /// Nested values are left in place.
    pub fn take_text(&mut self, keys: &[&str]) -> Option<String> {
        for key in keys {
            if let Some(FieldValue::Text(_)) = self.0.get(*key) {
                if let Some(FieldValue::Text(s)) = self.0.remove(*key) {
                    return Some(s);
                }
            }
        }
        None
    }

    /// Remove and return `key` whatever its shape.
    pub fn take(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}
