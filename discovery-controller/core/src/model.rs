//! Entities emitted by a synchronization pass.
//!
//! Every entity is identified by an [`Lcuuid`] and references its owners by identity. Entities are
//! never updated in place: each pass emits a complete set and the merger compares identities
//! against the previous pass.

use crate::{IpNet, Lcuuid};
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, num::NonZeroU16};

/// The service types that are synchronized. Other types (e.g. `LoadBalancer`, `ExternalName`) are
/// skipped.
///
/// Serialized as the resource store's numeric code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ServiceType {
    ClusterIp,
    NodePort,
}

/// Where a network or interface is attached. Service networks are always internal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Scope {
    Lan,
}

/// The kind of device that owns an interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DeviceType {
    PodService,
}

/// A numeric code that names no known variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownCode(pub u8);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodService {
    pub lcuuid: Lcuuid,
    pub name: String,
    pub label: String,
    pub annotation: String,
    pub service_type: ServiceType,
    pub selector: String,
    pub cluster_ip: Option<String>,
    pub pod_namespace_lcuuid: Lcuuid,
    pub vpc_lcuuid: Lcuuid,
    pub az_lcuuid: Lcuuid,
    pub region_lcuuid: Lcuuid,
    pub pod_cluster_lcuuid: Lcuuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodServicePort {
    pub lcuuid: Lcuuid,
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub target_port: NonZeroU16,
    pub node_port: Option<NonZeroU16>,
    pub pod_service_lcuuid: Lcuuid,
}

/// One edge between a service and a pod group it selects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodGroupPort {
    pub lcuuid: Lcuuid,
    pub name: String,
    pub port: NonZeroU16,
    pub protocol: String,
    pub pod_group_lcuuid: Lcuuid,
    pub pod_service_lcuuid: Lcuuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub lcuuid: Lcuuid,
    pub name: String,
    pub segmentation_id: u32,
    pub shared: bool,
    pub external: bool,
    pub net_type: Scope,
    pub az_lcuuid: Lcuuid,
    pub vpc_lcuuid: Lcuuid,
    pub region_lcuuid: Lcuuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub lcuuid: Lcuuid,
    pub name: String,
    pub cidr: IpNet,
    pub network_lcuuid: Lcuuid,
    pub vpc_lcuuid: Lcuuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VInterface {
    pub lcuuid: Lcuuid,
    pub vif_type: Scope,
    pub mac: String,
    pub device_lcuuid: Lcuuid,
    pub device_type: DeviceType,
    pub network_lcuuid: Lcuuid,
    pub vpc_lcuuid: Lcuuid,
    pub region_lcuuid: Lcuuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip {
    pub lcuuid: Lcuuid,
    pub vinterface_lcuuid: Lcuuid,
    pub ip: IpAddr,
    pub region_lcuuid: Lcuuid,
    pub subnet_lcuuid: Lcuuid,
}

// === impl ServiceType ===

impl ServiceType {
    /// Parses a `spec.type` value. Unsupported types yield `None`.
    pub fn from_spec(s: &str) -> Option<Self> {
        match s {
            "ClusterIP" => Some(Self::ClusterIp),
            "NodePort" => Some(Self::NodePort),
            _ => None,
        }
    }

    /// The numeric code used by the resource store.
    pub const fn code(self) -> u8 {
        match self {
            Self::ClusterIp => 1,
            Self::NodePort => 2,
        }
    }
}

impl From<ServiceType> for u8 {
    fn from(t: ServiceType) -> Self {
        t.code()
    }
}

impl TryFrom<u8> for ServiceType {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::ClusterIp),
            2 => Ok(Self::NodePort),
            _ => Err(UnknownCode(code)),
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClusterIp => f.write_str("ClusterIP"),
            Self::NodePort => f.write_str("NodePort"),
        }
    }
}

// === impl Scope ===

impl Scope {
    pub const fn code(self) -> u8 {
        match self {
            Self::Lan => 4,
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        scope.code()
    }
}

impl TryFrom<u8> for Scope {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            4 => Ok(Self::Lan),
            _ => Err(UnknownCode(code)),
        }
    }
}

// === impl DeviceType ===

impl DeviceType {
    pub const fn code(self) -> u8 {
        match self {
            Self::PodService => 12,
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(t: DeviceType) -> Self {
        t.code()
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            12 => Ok(Self::PodService),
            _ => Err(UnknownCode(code)),
        }
    }
}

// === impl UnknownCode ===

impl std::fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown code {}", self.0)
    }
}

impl std::error::Error for UnknownCode {}
