//! Synthesizes the virtual network that holds a cluster's service IPs.

use crate::{Cidrs, ClusterInfo};
use discovery_controller_core::{
    model::{DeviceType, Ip, Network, Scope, Subnet, VInterface},
    Lcuuid, VIF_DEFAULT_MAC,
};
use std::{collections::BTreeMap, net::IpAddr};
use tracing::warn;

/// The service network of one cluster and the interfaces attached to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceNetwork {
    pub network: Network,
    pub subnets: Vec<Subnet>,
    pub vinterfaces: Vec<VInterface>,
    pub ips: Vec<Ip>,
}

/// Builds the service network over the aggregated `cidrs`, with one interface and IP for each
/// service cluster IP.
///
/// Every address in `cluster_ips` must be covered by `cidrs`.
pub fn synthesize(
    cluster: &ClusterInfo,
    cidrs: &Cidrs,
    cluster_ips: &BTreeMap<Lcuuid, IpAddr>,
) -> ServiceNetwork {
    let name = cluster.service_network_name();
    let network_lcuuid = cluster.lcuuid(format!("{}{}", cluster.uuid_seed, name));

    // The first subnet keeps the identity it had before services could span several blocks.
    let subnets = cidrs
        .iter()
        .enumerate()
        .map(|(i, cidr)| Subnet {
            lcuuid: if i == 0 {
                cluster.lcuuid(&network_lcuuid)
            } else {
                cluster.lcuuid(format!("{network_lcuuid}{cidr}"))
            },
            name: name.clone(),
            cidr,
            network_lcuuid: network_lcuuid.clone(),
            vpc_lcuuid: cluster.vpc_lcuuid.clone(),
        })
        .collect::<Vec<_>>();

    let mut vinterfaces = Vec::with_capacity(cluster_ips.len());
    let mut ips = Vec::with_capacity(cluster_ips.len());
    for (service, ip) in cluster_ips {
        let subnet = match subnets.iter().find(|s| s.cidr.contains(ip)) {
            Some(subnet) => subnet,
            None => {
                warn!(%service, %ip, "Cluster IP is not covered by a service subnet");
                continue;
            }
        };

        let vinterface_lcuuid = cluster.lcuuid(format!("{service}{VIF_DEFAULT_MAC}{ip}"));
        vinterfaces.push(VInterface {
            lcuuid: vinterface_lcuuid.clone(),
            vif_type: Scope::Lan,
            mac: VIF_DEFAULT_MAC.to_string(),
            device_lcuuid: service.clone(),
            device_type: DeviceType::PodService,
            network_lcuuid: network_lcuuid.clone(),
            vpc_lcuuid: cluster.vpc_lcuuid.clone(),
            region_lcuuid: cluster.region_lcuuid.clone(),
        });
        ips.push(Ip {
            lcuuid: cluster.lcuuid(format!("{service}{ip}")),
            vinterface_lcuuid,
            ip: *ip,
            region_lcuuid: cluster.region_lcuuid.clone(),
            subnet_lcuuid: subnet.lcuuid.clone(),
        });
    }
    vinterfaces.sort_by(|a, b| a.lcuuid.cmp(&b.lcuuid));
    ips.sort_by(|a, b| a.lcuuid.cmp(&b.lcuuid));

    let network = Network {
        lcuuid: network_lcuuid,
        name,
        segmentation_id: 1,
        shared: false,
        external: false,
        net_type: Scope::Lan,
        az_lcuuid: cluster.az_lcuuid.clone(),
        vpc_lcuuid: cluster.vpc_lcuuid.clone(),
        region_lcuuid: cluster.region_lcuuid.clone(),
    };

    ServiceNetwork {
        network,
        subnets,
        vinterfaces,
        ips,
    }
}
