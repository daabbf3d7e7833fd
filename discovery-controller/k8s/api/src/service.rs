//! Typed partial view of Service-like records.

use crate::{labels::Map, Document, Labels, Node, Selector};
use std::{fmt, num::NonZeroU16};
use thiserror::Error;

/// The resource kinds that describe services.
///
/// `ServiceRule` records are a provider variant of `Service` and are resolved in the same stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Service,
    ServiceRule,
}

/// A record that cannot describe a service. The record is skipped; the pass continues.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Invalid {
    #[error("metadata not found")]
    MissingMetadata,

    #[error("uid not found")]
    MissingUid,

    #[error("name not found")]
    MissingName,

    #[error("selector not found")]
    EmptySelector,
}

/// The fields of a service record that discovery depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRecord {
    pub kind: Kind,
    pub uid: String,
    pub name: String,

    /// May be empty; resolving it is left to the namespace index.
    pub namespace: String,

    pub labels: Labels,
    pub annotations: Map,
    pub selector: Selector,

    /// The raw `spec.type` value.
    pub service_type: String,

    /// `None` when unset, empty, or the literal `None` used by headless services.
    pub cluster_ip: Option<String>,

    pub ports: Vec<ServicePortSpec>,
}

/// One entry of `spec.ports`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServicePortSpec {
    pub name: String,
    pub protocol: String,

    /// Zero when unset.
    pub port: u16,

    pub node_port: Option<NonZeroU16>,
    pub target_port: Option<TargetPort>,
}

/// References a pod group's port by name or number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetPort {
    Number(NonZeroU16),
    Name(String),
}

// === impl Kind ===

impl Kind {
    /// All service kinds, in the order they are resolved.
    pub const ALL: [Self; 2] = [Self::Service, Self::ServiceRule];

    /// The label on `ServiceRule` records that is renamed so that it can't collide with an
    /// ordinary label of the same name.
    pub const SERVICE_RULE_RESOURCE_LABEL: &'static str = "servicerule.resource.name";

    /// The snapshot key under which records of this kind are stored.
    pub const fn snapshot_key(self) -> &'static str {
        match self {
            Self::Service => "*v1.Service",
            Self::ServiceRule => "*v1.ServiceRule",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.snapshot_key())
    }
}

// === impl ServiceRecord ===

impl ServiceRecord {
    pub fn from_document(kind: Kind, doc: &Document) -> Result<Self, Invalid> {
        let metadata = doc.get("metadata");
        if !metadata.is_present() {
            return Err(Invalid::MissingMetadata);
        }
        let uid = metadata
            .get("uid")
            .non_empty_str()
            .ok_or(Invalid::MissingUid)?;
        let name = metadata
            .get("name")
            .non_empty_str()
            .ok_or(Invalid::MissingName)?;
        let namespace = metadata.get("namespace").as_str().unwrap_or_default();

        let spec = doc.get("spec");
        // Non-string selector values still participate in matching, as empty values.
        let selector = spec
            .get("selector")
            .entries()
            .map(|(k, v)| (k.to_string(), v.as_str().unwrap_or_default().to_string()))
            .collect::<Selector>();
        if selector.is_empty() {
            return Err(Invalid::EmptySelector);
        }

        let cluster_ip = spec
            .get("clusterIP")
            .non_empty_str()
            .filter(|ip| *ip != "None")
            .map(str::to_string);

        let mut labels = Labels::from(metadata.get("labels").strings());
        if kind == Kind::ServiceRule {
            labels.rename(
                Kind::SERVICE_RULE_RESOURCE_LABEL,
                format!("{}_servicerule", Kind::SERVICE_RULE_RESOURCE_LABEL),
            );
        }

        Ok(Self {
            kind,
            uid: uid.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels,
            annotations: metadata.get("annotations").strings(),
            selector,
            service_type: spec.get("type").as_str().unwrap_or_default().to_string(),
            cluster_ip,
            ports: spec
                .get("ports")
                .elements()
                .map(ServicePortSpec::from_node)
                .collect(),
        })
    }
}

// === impl ServicePortSpec ===

impl ServicePortSpec {
    fn from_node(port: Node<'_>) -> Self {
        let number = |node: Node<'_>| node.as_u64().and_then(|n| u16::try_from(n).ok());
        Self {
            name: port.get("name").as_str().unwrap_or_default().to_string(),
            protocol: port.get("protocol").as_str().unwrap_or_default().to_string(),
            port: number(port.get("port")).unwrap_or_default(),
            node_port: number(port.get("nodePort")).and_then(NonZeroU16::new),
            target_port: TargetPort::from_node(port.get("targetPort")),
        }
    }
}

// === impl TargetPort ===

impl TargetPort {
    /// Reads an int-or-string port reference. Zero, negative, and out-of-range numbers are
    /// ignored, as are empty names.
    fn from_node(node: Node<'_>) -> Option<Self> {
        if let Some(name) = node.as_str() {
            return match name.parse::<NonZeroU16>() {
                Ok(port) => Some(Self::Number(port)),
                Err(_) if name.is_empty() => None,
                Err(_) => Some(Self::Name(name.to_string())),
            };
        }
        node.as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .and_then(NonZeroU16::new)
            .map(Self::Number)
    }
}

impl fmt::Display for TargetPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::Name(n) => fmt::Display::fmt(n, f),
        }
    }
}
