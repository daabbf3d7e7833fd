#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use discovery_controller_core as core;
pub use discovery_controller_k8s_api as k8s;
pub use discovery_controller_k8s_index as index;

mod args;
mod input;
mod log;
mod pass;

pub use self::{
    args::Args,
    input::{PassInput, PodGroupLabel, PodGroupWorkload},
    log::{InvalidLogFormat, LogFormat},
    pass::{Pass, PassOutput},
};
