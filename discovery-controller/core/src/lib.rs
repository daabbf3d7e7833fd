#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod lcuuid;
pub mod model;
mod set;

pub use self::{
    lcuuid::{Lcuuid, OrgId},
    set::LcuuidSet,
};
pub use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// The hardware address shared by every synthetic interface that fronts a service cluster IP.
pub const VIF_DEFAULT_MAC: &str = "00:00:00:00:00:00";
