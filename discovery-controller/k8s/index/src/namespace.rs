use ahash::AHashMap as HashMap;
use discovery_controller_core::Lcuuid;

/// Maps namespace names to their identities.
#[derive(Clone, Debug, Default)]
pub struct NamespaceIndex {
    index: HashMap<String, Lcuuid>,
}

// === impl NamespaceIndex ===

impl NamespaceIndex {
    pub fn insert(&mut self, name: impl Into<String>, lcuuid: Lcuuid) {
        self.index.insert(name.into(), lcuuid);
    }

    pub fn get(&self, name: &str) -> Option<&Lcuuid> {
        self.index.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Lcuuid)> for NamespaceIndex {
    fn from_iter<T: IntoIterator<Item = (N, Lcuuid)>>(iter: T) -> Self {
        Self {
            index: iter.into_iter().map(|(n, id)| (n.into(), id)).collect(),
        }
    }
}
