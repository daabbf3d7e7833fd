use crate::Lcuuid;
use serde::{Deserialize, Serialize};
use std::collections::{btree_set, BTreeSet};

/// An ordered set of identities.
///
/// Iteration is always in ascending identity order so that anything derived from a set (emitted
/// entities, merged port maps) is reproducible from pass to pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LcuuidSet(BTreeSet<Lcuuid>);

// === impl LcuuidSet ===

impl LcuuidSet {
    /// Intersects all of the provided sets.
    ///
    /// Returns an empty set when no sets are provided.
    pub fn intersect_all<'s>(sets: impl IntoIterator<Item = &'s LcuuidSet>) -> Self {
        let mut sets = sets.into_iter();
        let first = match sets.next() {
            Some(first) => first.clone(),
            None => return Self::default(),
        };
        sets.fold(first, |acc, set| acc.intersection(set))
    }

    pub fn insert(&mut self, id: Lcuuid) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn union_with(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Lcuuid> {
        self.0.iter()
    }
}

impl FromIterator<Lcuuid> for LcuuidSet {
    fn from_iter<T: IntoIterator<Item = Lcuuid>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<&'static str> for LcuuidSet {
    fn from_iter<T: IntoIterator<Item = &'static str>>(iter: T) -> Self {
        iter.into_iter().map(Lcuuid::from).collect()
    }
}

impl<'s> IntoIterator for &'s LcuuidSet {
    type Item = &'s Lcuuid;
    type IntoIter = btree_set::Iter<'s, Lcuuid>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for LcuuidSet {
    type Item = Lcuuid;
    type IntoIter = btree_set::IntoIter<Lcuuid>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
