//! Indices written by the service resolver for resolvers that run later in the pass.

use discovery_controller_core::Lcuuid;
use serde::Serialize;
use std::collections::BTreeMap;

/// All indices the service resolver writes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Linkage {
    pub pod_group_services: PodGroupServices,
    pub service_ports: ServicePortIndex,
}

/// Maps each pod group to the services that select it, in the order they were linked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PodGroupServices(BTreeMap<Lcuuid, Vec<Lcuuid>>);

/// Maps a service's namespace and name to its identity and named ports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServicePortIndex(BTreeMap<String, BTreeMap<String, ServicePorts>>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServicePorts {
    pub service: Lcuuid,
    pub ports: BTreeMap<String, u16>,
}

/// Index writes for one record, applied only if the record resolves.
#[derive(Debug, Default)]
pub(crate) struct PendingLinks {
    pod_groups: Vec<Lcuuid>,
    ports: BTreeMap<String, u16>,
}

// === impl PodGroupServices ===

impl PodGroupServices {
    pub fn get(&self, pod_group: &str) -> &[Lcuuid] {
        self.0.get(pod_group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Links a service to a pod group. Linking the same pair again has no effect.
    pub fn link(&mut self, pod_group: Lcuuid, service: &Lcuuid) {
        let services = self.0.entry(pod_group).or_default();
        if !services.contains(service) {
            services.push(service.clone());
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// === impl ServicePortIndex ===

impl ServicePortIndex {
    pub fn get(&self, ns: &str, name: &str) -> Option<&ServicePorts> {
        self.0.get(ns)?.get(name)
    }

    pub fn set(&mut self, ns: impl Into<String>, name: impl Into<String>, ports: ServicePorts) {
        self.0.entry(ns.into()).or_default().insert(name.into(), ports);
    }

    /// Removes the entry for a service, returning it if it existed.
    pub fn remove(&mut self, ns: &str, name: &str) -> Option<ServicePorts> {
        let names = self.0.get_mut(ns)?;
        let removed = names.remove(name);
        if names.is_empty() {
            self.0.remove(ns);
        }
        removed
    }
}

// === impl PendingLinks ===

impl PendingLinks {
    pub(crate) fn add_port(&mut self, name: &str, port: u16) {
        self.ports.insert(name.to_string(), port);
    }

    pub(crate) fn add_pod_group(&mut self, pod_group: &Lcuuid) {
        if !self.pod_groups.contains(pod_group) {
            self.pod_groups.push(pod_group.clone());
        }
    }

    /// Applies these writes for a resolved service.
    ///
    /// Named ports are only recorded once at least one port resolved. Otherwise an existing entry
    /// for the service is left in place.
    pub(crate) fn commit(self, links: &mut Linkage, ns: &str, name: &str, service: &Lcuuid) {
        for pod_group in self.pod_groups {
            links.pod_group_services.link(pod_group, service);
        }
        if self.ports.is_empty() {
            return;
        }
        links.service_ports.set(
            ns,
            name,
            ServicePorts {
                service: service.clone(),
                ports: self.ports,
            },
        );
    }
}
