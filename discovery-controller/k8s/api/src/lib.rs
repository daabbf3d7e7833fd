#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod document;
pub mod labels;
pub mod service;
mod snapshot;

pub use self::{
    document::{Document, Node},
    labels::{Labels, Selector},
    service::{Kind, ServicePortSpec, ServiceRecord, TargetPort},
    snapshot::Snapshot,
};
