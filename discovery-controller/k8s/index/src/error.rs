use discovery_controller_core::Lcuuid;
use discovery_controller_k8s_api::Kind;
use thiserror::Error;

/// Fails an entire discovery pass.
///
/// These indicate a corrupt snapshot rather than an incomplete record; records that merely lack
/// fields are skipped instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} record {index} is not valid JSON")]
    InvalidDocument {
        kind: Kind,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("service {service} has an invalid cluster IP {addr:?}")]
    InvalidAddress {
        service: Lcuuid,
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}
