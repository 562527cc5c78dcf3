//! The phunk ethscriptions indexer daemon.

use clap::Parser;
use eyre::WrapErr;
use phunk_chain::{EthscriptionsValidator, RpcChainClient};
use phunk_config::Config;
use phunk_indexer::{load_dictionary, Coordinator, Processor};
use phunk_storage::{Datastore, InMemoryDatastore};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Indexes phunk ethscriptions from an Ethereum JSON-RPC endpoint.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short = 'c', default_value = "phunkd.toml", env = "PHUNKD_CONFIG")]
    config: PathBuf,

    /// Override the L1 RPC endpoint from the config file.
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_path(&cli.config)
        .wrap_err_with(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(rpc_url) = cli.rpc_url {
        config.l1.rpc_url = rpc_url;
    }

    // An unloadable dictionary is fatal: without it every creation would be
    // silently dropped.
    let dictionary = load_dictionary(&config.dictionary_path)
        .wrap_err_with(|| format!("failed to load dictionary from {}", config.dictionary_path))?;
    info!(entries = dictionary.len(), "collection dictionary loaded");

    let store = Arc::new(InMemoryDatastore::new());
    store.seed_collection(dictionary).await?;

    let validator =
        EthscriptionsValidator::new(&config.ethscriptions_api_url, config.l1.rpc_timeout)?;
    let chain = Arc::new(
        RpcChainClient::connect(
            &config.l1.rpc_url,
            config.l1.points_address,
            validator,
            config.l1.rpc_timeout,
        )
        .await
        .wrap_err("failed to connect to the L1 RPC endpoint")?,
    );

    // The bridge-out worker is an external service; until it attaches, log
    // and drop its work items.
    let (bridge_tx, mut bridge_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(item) = bridge_rx.recv().await {
            info!(?item, "bridge-out work item emitted");
        }
    });

    let processor = Processor::new(chain.clone(), store.clone(), config.l1.clone())
        .with_bridge_out(bridge_tx);
    let coordinator = Coordinator::new(chain, store, config.l1.clone(), processor);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "ctrl-c listener failed");
        }
        let _ = shutdown_tx.send(true);
    });

    info!(chain_id = config.l1.chain_id, origin = config.l1.origin_block, "phunkd starting");
    coordinator.run(shutdown_rx).await?;
    Ok(())
}
