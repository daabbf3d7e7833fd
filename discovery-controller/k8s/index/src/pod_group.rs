//! Pod group indices built by workload resolvers earlier in the pass.

use ahash::AHashMap as HashMap;
use discovery_controller_core::{Lcuuid, LcuuidSet};
use std::{collections::BTreeMap, num::NonZeroU16};

/// Maps labels and workload references to the pod groups that carry them, within a namespace.
///
/// A workload reference is an opaque key registered by the resolver that owns the workload kind,
/// e.g. `statefulset:<ns>:<name>`. Extensions use these to link services to workloads directly.
#[derive(Clone, Debug, Default)]
pub struct LabelIndex {
    by_ns: HashMap<String, NsPodGroups>,
}

#[derive(Clone, Debug, Default)]
struct NsPodGroups {
    /// Label key -> label value -> pod groups.
    labels: HashMap<String, HashMap<String, LcuuidSet>>,

    workloads: HashMap<String, LcuuidSet>,
}

/// Maps each pod group to its named container ports.
#[derive(Clone, Debug, Default)]
pub struct PortIndex {
    index: HashMap<Lcuuid, BTreeMap<String, NonZeroU16>>,
}

// === impl LabelIndex ===

impl LabelIndex {
    pub fn insert_label(
        &mut self,
        ns: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        pod_group: Lcuuid,
    ) {
        self.by_ns
            .entry(ns.into())
            .or_default()
            .labels
            .entry(key.into())
            .or_default()
            .entry(value.into())
            .or_default()
            .insert(pod_group);
    }

    pub fn insert_workload(
        &mut self,
        ns: impl Into<String>,
        reference: impl Into<String>,
        pod_group: Lcuuid,
    ) {
        self.by_ns
            .entry(ns.into())
            .or_default()
            .workloads
            .entry(reference.into())
            .or_default()
            .insert(pod_group);
    }

    /// Returns the pod groups in `ns` labeled `key=value`.
    pub fn label(&self, ns: &str, key: &str, value: &str) -> Option<&LcuuidSet> {
        self.by_ns.get(ns)?.labels.get(key)?.get(value)
    }

    /// Returns the pod groups in `ns` registered under a workload reference.
    pub fn workload(&self, ns: &str, reference: &str) -> Option<&LcuuidSet> {
        self.by_ns.get(ns)?.workloads.get(reference)
    }
}

// === impl PortIndex ===

impl PortIndex {
    pub fn insert(&mut self, pod_group: Lcuuid, name: impl Into<String>, port: NonZeroU16) {
        self.index
            .entry(pod_group)
            .or_default()
            .insert(name.into(), port);
    }

    pub fn get(&self, pod_group: &str) -> Option<&BTreeMap<String, NonZeroU16>> {
        self.index.get(pod_group)
    }

    /// Resolves a port name against a set of pod groups.
    ///
    /// Pod groups are consulted in identity order; the first that names the port wins.
    pub fn resolve<'s>(
        &self,
        pod_groups: impl IntoIterator<Item = &'s Lcuuid>,
        name: &str,
    ) -> Option<NonZeroU16> {
        pod_groups
            .into_iter()
            .filter_map(|pg| self.get(pg.as_str()))
            .find_map(|ports| ports.get(name).copied())
    }
}
