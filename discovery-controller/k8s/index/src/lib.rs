//! Kubernetes Service Discovery
//!
//! Converts a cluster's raw `Service` (and `ServiceRule`) records into identity-stable entities
//! for the resource store. Each synchronization pass runs the same stages:
//!
//! - Indices built by resolvers that run earlier in the pass map namespaces to identities, pod
//!   group labels and workload references to pod groups, and pod groups to their named ports.
//! - The service resolver selects pod groups for each service (label selector intersection plus a
//!   small table of provider extensions), resolves target ports, and emits `PodService`,
//!   `PodServicePort`, and `PodGroupPort` entities. It also links pod groups to services for
//!   resolvers that run later in the pass.
//! - The cluster IPs of resolved services are aggregated into a minimal set of CIDR blocks.
//! - A synthetic service network is built over those blocks with one interface and IP per
//!   service cluster IP.
//!
//! ```text
//! [ Snapshot ] -> [ ServiceResolver ] -> [ cidr::aggregate ] -> [ network::synthesize ]
//!                   ^ Upstream indices     |
//!                   '-> Linkage -----------'---> later resolvers
//! ```
//!
//! A record that lacks what discovery needs is skipped (and logged). A record that isn't valid
//! JSON, or a cluster IP that isn't an IP address, fails the whole pass: no entities are
//! returned and the linkage indices are left as they were.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod annotations;
pub mod cidr;
mod cluster_info;
mod error;
mod extension;
pub mod linkage;
mod namespace;
pub mod network;
pub mod pod_group;
pub mod service;


pub use self::{
    annotations::AnnotationFilter,
    cidr::{AggregationLevel, Cidrs},
    cluster_info::ClusterInfo,
    error::Error,
    linkage::{Linkage, PodGroupServices, ServicePortIndex},
    namespace::NamespaceIndex,
    pod_group::{LabelIndex, PortIndex},
    service::ServiceResolver,
};
use discovery_controller_core::model::{
    Ip, Network, PodGroupPort, PodService, PodServicePort, Subnet, VInterface,
};
use discovery_controller_k8s_api::Snapshot;
use serde::Serialize;
use tracing::{debug, error, instrument};

/// Indices contributed by resolvers that run before services in the same pass.
///
/// These must be complete before services are resolved; they are only read here.
#[derive(Clone, Debug, Default)]
pub struct Upstream {
    pub namespaces: NamespaceIndex,
    pub pod_groups: LabelIndex,
    pub ports: PortIndex,
}

/// Every entity produced for a cluster's services in one pass.
///
/// Entity lists are sorted by identity, except subnets, which follow address order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceBundle {
    pub services: Vec<PodService>,
    pub service_ports: Vec<PodServicePort>,
    pub pod_group_ports: Vec<PodGroupPort>,
    pub network: Network,
    pub subnets: Vec<Subnet>,
    pub vinterfaces: Vec<VInterface>,
    pub ips: Vec<Ip>,
}

/// Runs service discovery for one cluster.
///
/// `links` is only updated when the pass succeeds.
#[instrument(skip_all, fields(org = %cluster.org_id, cluster = %cluster.name))]
pub fn discover(
    cluster: &ClusterInfo,
    snapshot: &Snapshot,
    upstream: &Upstream,
    links: &mut Linkage,
) -> Result<ServiceBundle, Error> {
    debug!("Discovering services");
    let mut staged = links.clone();
    let resolved = ServiceResolver::new(cluster, upstream).resolve(snapshot, &mut staged)?;

    let cluster_ips = resolved.cluster_ips().map_err(|error| {
        error!(%error, "Invalid cluster IP");
        error
    })?;
    let cidrs = cidr::aggregate(cluster_ips.values().copied(), cluster.aggregation);
    let net = network::synthesize(cluster, &cidrs, &cluster_ips);

    *links = staged;
    debug!(
        services = resolved.services.len(),
        subnets = net.subnets.len(),
        "Discovered services"
    );
    Ok(ServiceBundle {
        services: resolved.services,
        service_ports: resolved.service_ports,
        pod_group_ports: resolved.pod_group_ports,
        network: net.network,
        subnets: net.subnets,
        vinterfaces: net.vinterfaces,
        ips: net.ips,
    })
}
