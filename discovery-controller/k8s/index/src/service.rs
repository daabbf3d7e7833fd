use crate::{
    cidr,
    extension::{Detection, EXTENSIONS},
    linkage::PendingLinks,
    ClusterInfo, Error, Linkage, Upstream,
};
use discovery_controller_core::{
    model::{PodGroupPort, PodService, PodServicePort, ServiceType},
    Lcuuid, LcuuidSet,
};
use discovery_controller_k8s_api::{
    Document, Kind, ServicePortSpec, ServiceRecord, Snapshot, TargetPort,
};
use std::{collections::BTreeMap, net::IpAddr, num::NonZeroU16};
use tracing::{debug, error, info, instrument, trace};

/// Resolves service records against the upstream pod group indices.
#[derive(Debug)]
pub struct ServiceResolver<'a> {
    cluster: &'a ClusterInfo,
    upstream: &'a Upstream,
}

/// Entities resolved from service records, sorted by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedServices {
    pub services: Vec<PodService>,
    pub service_ports: Vec<PodServicePort>,
    pub pod_group_ports: Vec<PodGroupPort>,
}

/// The entities of a single resolved record.
#[derive(Debug)]
struct Resolved {
    service: PodService,
    ports: Vec<PodServicePort>,
    pod_group_ports: Vec<PodGroupPort>,
}

// === impl ServiceResolver ===

impl<'a> ServiceResolver<'a> {
    pub fn new(cluster: &'a ClusterInfo, upstream: &'a Upstream) -> Self {
        Self { cluster, upstream }
    }

    /// Resolves every `Service` and `ServiceRule` record in the snapshot.
    ///
    /// Pod group links and named ports of resolved services are written to `links`. A record
    /// that does not resolve writes nothing and clears any named ports previously recorded under
    /// its namespace and name.
    pub fn resolve(
        &self,
        snapshot: &Snapshot,
        links: &mut Linkage,
    ) -> Result<ResolvedServices, Error> {
        let mut services = BTreeMap::new();
        let mut service_ports = BTreeMap::new();
        let mut pod_group_ports = BTreeMap::new();

        for kind in Kind::ALL {
            let records = snapshot.records(kind.snapshot_key());
            debug!(%kind, records = records.len(), "Resolving services");
            for (index, raw) in records.iter().enumerate() {
                let doc = Document::parse(raw).map_err(|source| {
                    error!(%kind, index, error = %source, "Invalid service record");
                    Error::InvalidDocument {
                        kind,
                        index,
                        source,
                    }
                })?;

                let record = match ServiceRecord::from_document(kind, &doc) {
                    Ok(record) => record,
                    Err(reason) => {
                        info!(%kind, index, %reason, "Skipping service");
                        continue;
                    }
                };

                if let Some(resolved) = self.resolve_record(&record, links) {
                    for port in resolved.ports {
                        service_ports.insert(port.lcuuid.clone(), port);
                    }
                    for port in resolved.pod_group_ports {
                        pod_group_ports.insert(port.lcuuid.clone(), port);
                    }
                    services.insert(resolved.service.lcuuid.clone(), resolved.service);
                }
            }
        }

        Ok(ResolvedServices {
            services: services.into_values().collect(),
            service_ports: service_ports.into_values().collect(),
            pod_group_ports: pod_group_ports.into_values().collect(),
        })
    }

    #[instrument(
        skip(self, record, links),
        fields(
            ns = %record.namespace,
            name = %record.name,
            uid = %record.uid,
        )
    )]
    fn resolve_record(&self, record: &ServiceRecord, links: &mut Linkage) -> Option<Resolved> {
        let Some(ns_lcuuid) = self.upstream.namespaces.get(&record.namespace) else {
            info!(reason = "namespace not found", "Skipping service");
            return None;
        };
        let Some(service_type) = ServiceType::from_spec(&record.service_type) else {
            info!(
                reason = "type not supported",
                service_type = %record.service_type,
                "Skipping service"
            );
            return None;
        };

        let lcuuid = self.cluster.lcuuid(&record.uid);
        let pod_groups = self.select_pod_groups(record);

        // Every port selects the same pod groups, so a service either has pod groups on all of its
        // ports or on none of them.
        if pod_groups.is_empty() || record.ports.is_empty() {
            if links
                .service_ports
                .remove(&record.namespace, &record.name)
                .is_some()
            {
                debug!("Removed named ports");
            }
            info!(reason = "pod group not found", "Skipping service");
            return None;
        }

        let mut pending = PendingLinks::default();
        let mut ports = Vec::with_capacity(record.ports.len());
        let mut pod_group_ports = Vec::new();
        for spec in &record.ports {
            let Some(target_port) = self.target_port(spec, &pod_groups) else {
                debug!(
                    port = spec.port,
                    target_port = ?spec.target_port,
                    "Skipping port: target port not found"
                );
                continue;
            };

            let node_port = spec.node_port.map_or(0, NonZeroU16::get);
            let port = PodServicePort {
                lcuuid: self.cluster.lcuuid(format!(
                    "{lcuuid}{}{}{node_port}{target_port}",
                    spec.port, spec.protocol
                )),
                name: spec.name.clone(),
                protocol: spec.protocol.to_uppercase(),
                port: spec.port,
                target_port,
                node_port: spec.node_port,
                pod_service_lcuuid: lcuuid.clone(),
            };
            trace!(port = port.port, %target_port, "Resolved port");

            pending.add_port(&spec.name, spec.port);
            for pg in &pod_groups {
                pod_group_ports.push(PodGroupPort {
                    lcuuid: self.cluster.lcuuid(format!(
                        "{lcuuid}{pg}{}{target_port}",
                        spec.protocol
                    )),
                    name: spec.name.clone(),
                    port: target_port,
                    protocol: spec.protocol.to_uppercase(),
                    pod_group_lcuuid: pg.clone(),
                    pod_service_lcuuid: lcuuid.clone(),
                });
                pending.add_pod_group(pg);
            }
            ports.push(port);
        }

        pending.commit(links, &record.namespace, &record.name, &lcuuid);
        debug!(
            ports = ports.len(),
            pod_groups = pod_groups.len(),
            "Resolved service"
        );

        let service = PodService {
            lcuuid,
            name: record.name.clone(),
            label: record.labels.render(),
            annotation: self.cluster.annotations.render(&record.annotations),
            service_type,
            selector: record.selector.render(),
            cluster_ip: record.cluster_ip.clone(),
            pod_namespace_lcuuid: ns_lcuuid.clone(),
            vpc_lcuuid: self.cluster.vpc_lcuuid.clone(),
            az_lcuuid: self.cluster.az_lcuuid.clone(),
            region_lcuuid: self.cluster.region_lcuuid.clone(),
            pod_cluster_lcuuid: self.cluster.pod_cluster_lcuuid.clone(),
        };
        Some(Resolved {
            service,
            ports,
            pod_group_ports,
        })
    }

    /// Selects the pod groups that back a service.
    ///
    /// A pod group is selected if extensions reference it directly, or if every key of the
    /// selector matches it. A selector key that matches no pod group at all selects nothing,
    /// unless an extension that bypasses the selector applies.
    fn select_pod_groups(&self, record: &ServiceRecord) -> LcuuidSet {
        let ns = record.namespace.as_str();
        let index = &self.upstream.pod_groups;

        let mut selected = LcuuidSet::default();
        let mut bypass = false;
        for ext in EXTENSIONS {
            match ext.detect(record) {
                Detection::NotApplicable => {}
                Detection::Invalid(error) => {
                    info!(extension = ext.name, %error, "Invalid workload reference");
                    return LcuuidSet::default();
                }
                Detection::References(refs) => {
                    bypass |= ext.bypasses_selector;
                    for reference in &refs {
                        if let Some(pgs) = index.workload(ns, reference) {
                            selected.union_with(pgs);
                        }
                    }
                    trace!(extension = ext.name, ?refs, "Resolved workload references");
                }
            }
        }
        if bypass {
            return selected;
        }

        let candidates = record
            .selector
            .iter()
            .filter_map(|(k, v)| index.label(ns, k, v).filter(|pgs| !pgs.is_empty()))
            .collect::<Vec<_>>();
        if candidates.len() == record.selector.len() {
            selected.union_with(&LcuuidSet::intersect_all(candidates));
        } else {
            debug!(
                keys = record.selector.len(),
                matched = candidates.len(),
                "Selector keys without pod groups"
            );
        }
        selected
    }

    fn target_port(&self, spec: &ServicePortSpec, pod_groups: &LcuuidSet) -> Option<NonZeroU16> {
        match spec.target_port.as_ref()? {
            TargetPort::Number(port) => Some(*port),
            TargetPort::Name(name) => self.upstream.ports.resolve(pod_groups, name),
        }
    }
}

// === impl ResolvedServices ===

impl ResolvedServices {
    /// Parses the cluster IP of every service that has one.
    pub fn cluster_ips(&self) -> Result<BTreeMap<Lcuuid, IpAddr>, Error> {
        self.services
            .iter()
            .filter_map(|svc| Some((&svc.lcuuid, svc.cluster_ip.as_deref()?)))
            .map(|(svc, ip)| Ok((svc.clone(), cidr::parse_addr(svc, ip)?)))
            .collect()
    }
}
