//! Provider-specific ways of linking a service to pod groups beyond its label selector.
//!
//! The set of extensions is fixed. Each one inspects a record and may name workload references
//! that are looked up directly in the label index.

use discovery_controller_k8s_api::ServiceRecord;

pub(crate) struct Extension {
    pub name: &'static str,

    /// When set, a record this extension applies to skips ordinary selector intersection.
    pub bypasses_selector: bool,

    detect: fn(&ServiceRecord) -> Detection,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Detection {
    NotApplicable,
    References(Vec<String>),
    Invalid(String),
}

/// Rancher lists the workloads a service targets in an annotation.
const TARGET_WORKLOADS: Extension = Extension {
    name: "target-workloads",
    bypasses_selector: false,
    detect: target_workloads,
};

/// openGauss clusters are selected by cluster name, which no pod group label carries.
const OPENGAUSS_CLUSTER: Extension = Extension {
    name: "opengauss-cluster",
    bypasses_selector: true,
    detect: opengauss_cluster,
};

pub(crate) const EXTENSIONS: &[Extension] = &[TARGET_WORKLOADS, OPENGAUSS_CLUSTER];

const TARGET_WORKLOADS_ANNOTATION: &str = "field.cattle.io/targetWorkloadIds";
const OPENGAUSS_CLUSTER_SELECTOR: &str = "opengauss.cluster";

// === impl Extension ===

impl Extension {
    #[inline]
    pub(crate) fn detect(&self, record: &ServiceRecord) -> Detection {
        (self.detect)(record)
    }
}

fn target_workloads(record: &ServiceRecord) -> Detection {
    let ids = match record.annotations.get(TARGET_WORKLOADS_ANNOTATION) {
        Some(ids) if ids != "[]" && ids != "null" => ids,
        _ => return Detection::NotApplicable,
    };
    match serde_json::from_str::<serde_json::Value>(ids) {
        // Non-string elements can't reference a workload.
        Ok(serde_json::Value::Array(ids)) => Detection::References(
            ids.into_iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect(),
        ),
        // Well-formed JSON that isn't a list names no workloads.
        Ok(_) => Detection::NotApplicable,
        Err(error) => Detection::Invalid(format!("{TARGET_WORKLOADS_ANNOTATION}: {error}")),
    }
}

fn opengauss_cluster(record: &ServiceRecord) -> Detection {
    match record.selector.get(OPENGAUSS_CLUSTER_SELECTOR) {
        Some(cluster) => Detection::References(vec![format!(
            "statefulset:{}:{}",
            record.namespace, cluster
        )]),
        None => Detection::NotApplicable,
    }
}
