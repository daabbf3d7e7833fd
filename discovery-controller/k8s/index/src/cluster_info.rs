use crate::{AggregationLevel, AnnotationFilter};
use discovery_controller_core::{Lcuuid, OrgId};

/// Holds cluster metadata.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    /// The tenant that owns this cluster. Every generated identity is scoped to it.
    pub org_id: OrgId,

    /// The cluster's display name, e.g. "prod-east".
    pub name: String,

    /// Seeds the identity of the cluster's synthetic service network.
    pub uuid_seed: String,

    pub vpc_lcuuid: Lcuuid,
    pub az_lcuuid: Lcuuid,
    pub region_lcuuid: Lcuuid,
    pub pod_cluster_lcuuid: Lcuuid,

    /// Selects and bounds the annotations rendered on each service.
    pub annotations: AnnotationFilter,

    /// Bounds how far cluster IP blocks may be widened during aggregation.
    pub aggregation: AggregationLevel,
}

impl ClusterInfo {
    pub(crate) fn lcuuid(&self, key: impl AsRef<str>) -> Lcuuid {
        Lcuuid::generate(self.org_id, key)
    }

    pub(crate) fn service_network_name(&self) -> String {
        format!("{}_SVC_NET", self.name)
    }
}
