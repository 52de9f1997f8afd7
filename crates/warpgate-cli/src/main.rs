//! warpgate - デモ用のホストとクライアント
//!
//! ```text
//! warpgate serve --bind 0.0.0.0:8080
//! warpgate warp add 2 3
//! warpgate warp divide 1 0
//! warpgate burst --count 50
//! ```

mod units;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use warpgate_core::impls::http_server;
use warpgate_core::{Gate, GateError, Scheduler, WarpgateConfig};

use crate::units::{Add, Adder, Arrive, Divide, Divider, Gatekeeper, Join, ResetRendezvous};

#[derive(Debug, Parser)]
#[command(name = "warpgate", version, about = "Run tasks inside a live host process")]
struct Cli {
    /// TOML config with [gate] and [host] sections
    #[arg(long, global = true, env = "WARPGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the demo units on POST /warpunit-insider
    Serve {
        #[arg(long, env = "WARPGATE_BIND")]
        bind: Option<String>,
    },

    /// Send a single task and print its value
    Warp {
        #[arg(long, env = "WARPGATE_ENDPOINT")]
        endpoint: Option<String>,

        #[command(subcommand)]
        task: WarpTask,
    },

    /// Submit many additions through the scheduler and wait for all of them
    Burst {
        #[arg(long, env = "WARPGATE_ENDPOINT")]
        endpoint: Option<String>,

        #[arg(long, default_value_t = 20)]
        count: i64,
    },
}

#[derive(Debug, Subcommand)]
enum WarpTask {
    Add { a: i64, b: i64 },
    Divide { a: i64, b: i64 },
    /// Register one more party on the host's rendezvous
    Join,
    Arrive,
    Reset,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warpgate=info,warpgate_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<WarpgateConfig> {
    match path {
        Some(path) => WarpgateConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(WarpgateConfig::default()),
    }
}

fn connect(config: &WarpgateConfig, endpoint: Option<String>) -> anyhow::Result<Gate> {
    let mut gate_config = config.gate.clone();
    if let Some(endpoint) = endpoint {
        gate_config.endpoint = endpoint;
    }
    Gate::connect(&gate_config, units::catalog()).context("building http client")
}

async fn serve(mut config: WarpgateConfig, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.host.bind_addr = bind;
    }
    let host = Arc::new(units::host()?);
    info!(units = ?host.registry().registered_units(), "units registered");

    let listener = http_server::bind(&config.host)
        .await
        .with_context(|| format!("binding {}", config.host.bind_addr))?;
    http_server::serve(host, listener, http_server::shutdown_signal()).await?;
    Ok(())
}

async fn warp(gate: &Gate, task: WarpTask) -> Result<String, GateError> {
    let rendered = match task {
        WarpTask::Add { a, b } => gate.warp(&gate.handle::<Adder>(), &Add(a, b)).await?.to_string(),
        WarpTask::Divide { a, b } => {
            gate.warp(&gate.handle::<Divider>(), &Divide(a, b)).await?.to_string()
        }
        WarpTask::Join => format!("{:?}", gate.warp(&gate.handle::<Gatekeeper>(), &Join).await?),
        WarpTask::Arrive => {
            format!("{:?}", gate.warp(&gate.handle::<Gatekeeper>(), &Arrive).await?)
        }
        WarpTask::Reset => {
            gate.warp(&gate.handle::<Gatekeeper>(), &ResetRendezvous).await?;
            "reset".to_string()
        }
    };
    Ok(rendered)
}

async fn burst(config: &WarpgateConfig, gate: Gate, count: i64) -> anyhow::Result<()> {
    let scheduler = Scheduler::new(Arc::new(gate), config.gate.scheduler());
    let adder = scheduler.gate().handle::<Adder>();

    let handles: Vec<_> = (0..count)
        .map(|i| (i, scheduler.submit(adder.clone(), Add(i, i))))
        .collect();

    let mut failed = 0usize;
    for (i, handle) in handles {
        match handle.await {
            Ok(sum) if sum == i * 2 => {}
            Ok(sum) => {
                failed += 1;
                warn!(i, sum, "unexpected sum");
            }
            Err(err) => {
                failed += 1;
                warn!(i, error = %err, "warp failed");
            }
        }
    }
    scheduler.shutdown().await;

    info!(count, failed, "burst finished");
    anyhow::ensure!(failed == 0, "{failed} of {count} warps failed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Warp { endpoint, task } => {
            let gate = connect(&config, endpoint)?;
            match warp(&gate, task).await {
                Ok(value) => {
                    println!("{value}");
                    Ok(())
                }
                Err(err) if err.is_remote_task_failure() => {
                    anyhow::bail!("task failed on {}: {err}", gate.endpoint())
                }
                Err(err) => Err(err).context("warp did not complete"),
            }
        }
        Command::Burst { endpoint, count } => {
            let gate = connect(&config, endpoint)?;
            burst(&config, gate, count).await
        }
    }
}
