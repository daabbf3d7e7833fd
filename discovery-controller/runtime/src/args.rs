use crate::{
    core::OrgId,
    index::{AggregationLevel, AnnotationFilter, ClusterInfo},
    LogFormat, Pass,
};
use anyhow::Result;
use clap::Parser;
use regex::Regex;
use std::{path::PathBuf, sync::Arc};
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{info, info_span, warn, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "discovery", about = "Discovers Kubernetes services as resource entities")]
pub struct Args {
    #[clap(
        long,
        default_value = "discovery=info,warn",
        env = "DISCOVERY_CONTROLLER_LOG"
    )]
    log_level: String,

    #[clap(long, default_value = "plain")]
    log_format: LogFormat,

    /// The tenant that owns the cluster.
    #[clap(long, default_value = "1")]
    org_id: OrgId,

    #[clap(long)]
    cluster_name: String,

    /// Seeds the identity of the cluster's service network.
    #[clap(long)]
    cluster_uuid_seed: String,

    #[clap(long)]
    vpc_lcuuid: String,

    #[clap(long)]
    az_lcuuid: String,

    #[clap(long)]
    region_lcuuid: String,

    #[clap(long)]
    pod_cluster_lcuuid: String,

    /// Only annotations with matching keys are recorded on services.
    #[clap(long)]
    annotation_regex: Option<Regex>,

    #[clap(long, default_value = "256")]
    custom_tag_len_max: usize,

    /// Widens aggregated IPv4 service blocks up to this prefix length.
    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=32))]
    cidr_max_prefix_v4: Option<u8>,

    /// Widens aggregated IPv6 service blocks up to this prefix length.
    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=128))]
    cidr_max_prefix_v6: Option<u8>,

    /// A pass input file. It is read again on every pass.
    #[clap(long)]
    input: PathBuf,

    /// Where each pass's output is written. Defaults to stdout.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Seconds between passes.
    #[clap(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Runs a single pass and exits.
    #[clap(long)]
    once: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        self.log_format.try_init(&self.log_level)?;

        let once = self.once;
        let interval = Duration::from_secs(self.interval);
        let pass = Arc::new(self.into_pass());

        if once {
            return pass.spawn().await;
        }

        let mut timer = time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(?interval, "Running discovery passes");
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    // A failed pass is retried with fresh input on the next tick.
                    if let Err(error) = pass.clone().spawn().instrument(info_span!("pass")).await {
                        warn!(error = ?error, "Discovery pass failed");
                    }
                }
                res = &mut shutdown => {
                    res?;
                    info!("Shutting down");
                    return Ok(());
                }
            }
        }
    }

    fn into_pass(self) -> Pass {
        let Self {
            org_id,
            cluster_name,
            cluster_uuid_seed,
            vpc_lcuuid,
            az_lcuuid,
            region_lcuuid,
            pod_cluster_lcuuid,
            annotation_regex,
            custom_tag_len_max,
            cidr_max_prefix_v4,
            cidr_max_prefix_v6,
            input,
            output,
            ..
        } = self;

        let cluster = ClusterInfo {
            org_id,
            name: cluster_name,
            uuid_seed: cluster_uuid_seed,
            vpc_lcuuid: vpc_lcuuid.into(),
            az_lcuuid: az_lcuuid.into(),
            region_lcuuid: region_lcuuid.into(),
            pod_cluster_lcuuid: pod_cluster_lcuuid.into(),
            annotations: AnnotationFilter::new(annotation_regex, custom_tag_len_max),
            aggregation: AggregationLevel {
                max_prefix_len_v4: cidr_max_prefix_v4,
                max_prefix_len_v6: cidr_max_prefix_v6,
            },
        };
        Pass::new(cluster, input, output)
    }
}
