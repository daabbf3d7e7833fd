use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw API objects fetched for one cluster, keyed by resource kind.
///
/// Each kind holds an ordered list of JSON object bodies exactly as they were fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Vec<String>>);

// === impl Snapshot ===

impl Snapshot {
    /// Returns the raw records for `kind`, or an empty list if the kind was not fetched.
    pub fn records(&self, kind: &str) -> &[String] {
        self.0.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn insert(&mut self, kind: impl Into<String>, records: Vec<String>) {
        self.0.insert(kind.into(), records);
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (K, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
