use crate::{core::Lcuuid, index::Upstream, k8s::Snapshot};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, num::NonZeroU16, path::Path};

/// Everything one pass reads: the raw snapshot and the indices built by upstream resolvers.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PassInput {
    pub snapshot: Snapshot,
    pub namespaces: BTreeMap<String, Lcuuid>,
    pub pod_group_labels: Vec<PodGroupLabel>,
    pub pod_group_workloads: Vec<PodGroupWorkload>,
    pub pod_group_ports: BTreeMap<Lcuuid, BTreeMap<String, NonZeroU16>>,
}

/// The pod groups in a namespace that carry a label.
#[derive(Clone, Debug, Deserialize)]
pub struct PodGroupLabel {
    pub namespace: String,
    pub key: String,
    pub value: String,
    pub pod_groups: Vec<Lcuuid>,
}

/// The pod groups registered under a workload reference.
#[derive(Clone, Debug, Deserialize)]
pub struct PodGroupWorkload {
    pub namespace: String,
    pub reference: String,
    pub pod_groups: Vec<Lcuuid>,
}

// === impl PassInput ===

impl PassInput {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to decode {}", path.display()))
    }

    /// Builds the indices the service resolver reads.
    pub fn upstream(&self) -> Upstream {
        let mut upstream = Upstream {
            namespaces: self
                .namespaces
                .iter()
                .map(|(ns, id)| (ns.clone(), id.clone()))
                .collect(),
            ..Default::default()
        };

        for label in &self.pod_group_labels {
            for pg in &label.pod_groups {
                upstream.pod_groups.insert_label(
                    label.namespace.as_str(),
                    label.key.as_str(),
                    label.value.as_str(),
                    pg.clone(),
                );
            }
        }
        for workload in &self.pod_group_workloads {
            for pg in &workload.pod_groups {
                upstream.pod_groups.insert_workload(
                    workload.namespace.as_str(),
                    workload.reference.as_str(),
                    pg.clone(),
                );
            }
        }
        for (pg, ports) in &self.pod_group_ports {
            for (name, port) in ports {
                upstream.ports.insert(pg.clone(), name.as_str(), *port);
            }
        }

        upstream
    }
}
