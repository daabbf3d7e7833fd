use crate::{
    index::{self, ClusterInfo, Linkage, PodGroupServices, ServiceBundle},
    PassInput,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument};

/// Runs discovery passes for one cluster.
#[derive(Clone, Debug)]
pub struct Pass {
    cluster: ClusterInfo,
    input: PathBuf,
    output: Option<PathBuf>,
}

/// What one pass writes: the entity bundle and the pod group linkage for later resolvers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PassOutput {
    #[serde(flatten)]
    pub bundle: ServiceBundle,
    pub pod_group_services: PodGroupServices,
}

// === impl Pass ===

impl Pass {
    /// Writes to stdout when `output` is unset.
    pub fn new(cluster: ClusterInfo, input: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            cluster,
            input,
            output,
        }
    }

    pub fn cluster(&self) -> &ClusterInfo {
        &self.cluster
    }

    /// Runs a pass on the blocking pool.
    pub async fn spawn(self: Arc<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .context("discovery pass panicked")?
    }

    #[instrument(skip(self), fields(input = %self.input.display()))]
    pub fn run(&self) -> Result<()> {
        let input = PassInput::read(&self.input)?;
        let output = Self::discover(&self.cluster, &input)?;
        info!(
            services = output.bundle.services.len(),
            ips = output.bundle.ips.len(),
            "Pass complete"
        );

        match self.output.as_deref() {
            Some(path) => Self::write_file(path, &output),
            None => {
                let stdout = std::io::stdout();
                Self::write(stdout.lock(), &output)
            }
        }
    }

    /// Discovers services from one input.
    ///
    /// Linkage is rebuilt on every pass, as the upstream indices are.
    pub fn discover(cluster: &ClusterInfo, input: &PassInput) -> Result<PassOutput> {
        let upstream = input.upstream();
        debug!(namespaces = upstream.namespaces.len(), "Loaded upstream indices");

        let mut links = Linkage::default();
        let bundle = index::discover(cluster, &input.snapshot, &upstream, &mut links)?;
        Ok(PassOutput {
            bundle,
            pod_group_services: links.pod_group_services,
        })
    }

    fn write_file(path: &Path, output: &PassOutput) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Self::write(std::io::BufWriter::new(file), output)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn write(mut w: impl Write, output: &PassOutput) -> Result<()> {
        serde_json::to_writer_pretty(&mut w, output)?;
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }
}
