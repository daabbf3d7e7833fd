//! Reduces a set of addresses to the CIDR blocks that cover them.

use crate::Error;
use discovery_controller_core::{IpNet, Ipv4Net, Ipv6Net, Lcuuid};
use std::net::IpAddr;

/// Bounds how far aggregated blocks may be widened, per address family.
///
/// By default no widening occurs and aggregation produces the minimal set of blocks that covers
/// exactly the input addresses. When a maximum prefix length is set, any block longer than it is
/// widened to that length and the result is aggregated again.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregationLevel {
    pub max_prefix_len_v4: Option<u8>,
    pub max_prefix_len_v6: Option<u8>,
}

/// Aggregated blocks, in ascending address order within each family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cidrs {
    pub v4: Vec<Ipv4Net>,
    pub v6: Vec<Ipv6Net>,
}

/// Parses a service's cluster IP.
pub fn parse_addr(service: &Lcuuid, addr: &str) -> Result<IpAddr, Error> {
    addr.trim()
        .parse()
        .map_err(|source| Error::InvalidAddress {
            service: service.clone(),
            addr: addr.to_string(),
            source,
        })
}

/// Aggregates addresses into CIDR blocks.
///
/// The result does not depend on the order of the input.
pub fn aggregate(addrs: impl IntoIterator<Item = IpAddr>, level: AggregationLevel) -> Cidrs {
    let (mut v4, mut v6) = (Vec::new(), Vec::new());
    for addr in addrs {
        match addr {
            IpAddr::V4(a) => v4.push(Ipv4Net::from(a)),
            IpAddr::V6(a) => v6.push(Ipv6Net::from(a)),
        }
    }

    let mut v4 = Ipv4Net::aggregate(&v4);
    if let Some(max) = level.max_prefix_len_v4 {
        let widened: Vec<_> = v4
            .iter()
            .map(|net| match Ipv4Net::new(net.addr(), max) {
                Ok(wide) if net.prefix_len() > max => wide.trunc(),
                _ => *net,
            })
            .collect();
        v4 = Ipv4Net::aggregate(&widened);
    }

    let mut v6 = Ipv6Net::aggregate(&v6);
    if let Some(max) = level.max_prefix_len_v6 {
        let widened: Vec<_> = v6
            .iter()
            .map(|net| match Ipv6Net::new(net.addr(), max) {
                Ok(wide) if net.prefix_len() > max => wide.trunc(),
                _ => *net,
            })
            .collect();
        v6 = Ipv6Net::aggregate(&widened);
    }

    v4.sort();
    v6.sort();
    Cidrs { v4, v6 }
}

// === impl Cidrs ===

impl Cidrs {
    /// Iterates over all blocks, IPv4 first.
    pub fn iter(&self) -> impl Iterator<Item = IpNet> + '_ {
        self.v4
            .iter()
            .copied()
            .map(IpNet::V4)
            .chain(self.v6.iter().copied().map(IpNet::V6))
    }
}
