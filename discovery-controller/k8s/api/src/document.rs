//! Schemaless access to raw API objects.
//!
//! Snapshots carry API objects as JSON text whose schema is only partially trusted. A [`Document`]
//! holds the parsed tree and [`Node`] walks it: every step may land on an absent value, and every
//! accessor returns an `Option` instead of assuming a field is present or well-typed.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A parsed raw record.
#[derive(Clone, Debug, PartialEq)]
pub struct Document(Value);

/// A possibly-absent position within a [`Document`].
#[derive(Copy, Clone, Debug)]
pub struct Node<'d>(Option<&'d Value>);

// === impl Document ===

impl Document {
    /// Parses a raw record.
    ///
    /// Only syntactically invalid JSON is an error; a well-formed value of any shape parses.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw).map(Self)
    }

    #[inline]
    pub fn root(&self) -> Node<'_> {
        Node(Some(&self.0))
    }

    #[inline]
    pub fn get(&self, key: &str) -> Node<'_> {
        self.root().get(key)
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// === impl Node ===

impl<'d> Node<'d> {
    /// Steps into an object member. Absent if this node is not an object or lacks `key`.
    pub fn get(self, key: &str) -> Self {
        Self(self.0.and_then(Value::as_object).and_then(|o| o.get(key)))
    }

    /// Indicates whether a value (including `null`) is present at this position.
    #[inline]
    pub fn is_present(self) -> bool {
        self.0.is_some()
    }

    pub fn as_str(self) -> Option<&'d str> {
        self.0.and_then(Value::as_str)
    }

    /// Returns the string at this position if it is non-empty.
    pub fn non_empty_str(self) -> Option<&'d str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    pub fn as_u64(self) -> Option<u64> {
        self.0.and_then(Value::as_u64)
    }

    pub fn as_object(self) -> Option<&'d Map<String, Value>> {
        self.0.and_then(Value::as_object)
    }

    /// Iterates over array elements. Non-arrays have no elements.
    pub fn elements(self) -> impl Iterator<Item = Node<'d>> {
        self.0
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|v| Node(Some(v)))
    }

    /// Iterates over object members. Non-objects have no members.
    pub fn entries(self) -> impl Iterator<Item = (&'d str, Node<'d>)> {
        self.as_object()
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), Node(Some(v))))
    }

    /// Collects the string-valued members of an object, ignoring members of any other type.
    pub fn strings(self) -> BTreeMap<String, String> {
        self.entries()
            .filter_map(|(k, v)| Some((k.to_string(), v.as_str()?.to_string())))
            .collect()
    }
}
