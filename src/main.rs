//! # AWS Provider
//!
//! Kubernetes provider reconciling ElastiCache, Service Catalog and S3
//! managed resources against AWS.
//!
//! Configuration comes from the environment (see [`provider_aws::config`]);
//! command-line flags take precedence.
//!
//! ```bash
//! provider-aws --poll 5m --max-reconcile-rate 20 --debug
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use provider_aws::config::{load_config, parse_kubernetes_duration};
use provider_aws::runtime::{init_tracing, initialize, run_watch_loop};

#[derive(Debug, Parser)]
#[command(name = "provider-aws", version, about = "AWS provider for Kubernetes")]
struct Args {
    /// Verbose logging when RUST_LOG is not set
    #[arg(long)]
    debug: bool,

    /// How often an up-to-date resource is observed again
    #[arg(long, value_parser = parse_kubernetes_duration)]
    poll: Option<Duration>,

    /// Requeue interval while AWS is still applying a change
    #[arg(long, value_parser = parse_kubernetes_duration)]
    short_wait: Option<Duration>,

    /// Deadline for a single reconciliation pass
    #[arg(long, value_parser = parse_kubernetes_duration)]
    reconcile_timeout: Option<Duration>,

    /// Maximum parallel reconciliations per kind
    #[arg(long)]
    max_reconcile_rate: Option<u16>,

    /// Port serving /metrics, /healthz and /readyz
    #[arg(long)]
    metrics_port: Option<u16>,

    /// ProviderConfig used by resources that name none
    #[arg(long)]
    default_provider_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let (mut controller_config, mut server_config) = load_config();
    if let Some(poll) = args.poll {
        controller_config.poll_interval = poll;
    }
    if let Some(short_wait) = args.short_wait {
        controller_config.short_wait = short_wait;
    }
    if let Some(timeout) = args.reconcile_timeout {
        controller_config.reconcile_timeout = timeout;
    }
    if let Some(rate) = args.max_reconcile_rate {
        controller_config.max_reconcile_rate = rate;
    }
    if let Some(name) = args.default_provider_config {
        controller_config.default_provider_config = name;
    }
    if let Some(port) = args.metrics_port {
        server_config.metrics_port = port;
    }
    controller_config.normalize();

    let init_result = initialize(&server_config)
        .await
        .context("Failed to initialize provider")?;

    run_watch_loop(init_result.client, controller_config).await?;

    Ok(())
}
