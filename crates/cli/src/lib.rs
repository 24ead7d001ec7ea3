pub mod args;
mod balances;
mod check_key;
mod preview;
mod stake;

use std::{sync::Arc, time::Duration};

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::{Cli, Commands};
use lstake_sdk::{
    Network,
    chain::RpcChainClient,
    connection::ConnectionManager,
    orchestrator::{OrchestratorConfig, StakingOrchestrator},
    retry::RetryPolicy,
};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let private_key = cli
        .private_key
        .as_deref()
        .context("private key is required, see `--private-key`")?;

    match &cli.command {
        Commands::CheckKey => check_key::render(private_key),
        Commands::Balances => {
            let (connection, orchestrator) = open_session(&cli, private_key).await?;
            let result = balances::render(&orchestrator).await;
            connection.disconnect();
            result
        },
        Commands::Preview { amount } => {
            let (connection, orchestrator) = open_session(&cli, private_key).await?;
            let result = preview::render(&orchestrator, amount).await;
            connection.disconnect();
            result
        },
        Commands::Stake { amount } => {
            let (connection, orchestrator) = open_session(&cli, private_key).await?;
            let result = stake::render(&orchestrator, amount).await;
            connection.disconnect();
            result
        },
    }
}

/// Connects to the RPC, checks the chain and opens a staking session.
///
/// Ctrl+C disconnects the returned session.
async fn open_session(
    cli: &Cli,
    private_key: &str,
) -> anyhow::Result<(Arc<ConnectionManager>, StakingOrchestrator<RpcChainClient>)> {
    let client = if cli.rpc == args::DEFAULT_RPC_PROVIDER || cli.rpc_throttle.is_some() {
        // Apply throttling with default RPC
        RpcClient::builder()
            .layer(ThrottleLayer::new(cli.rpc_throttle.unwrap_or(args::DEFAULT_RPC_THROTTLING)))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(500));

    let default = Network::hyperliquid();
    let network = Network::custom(
        cli.chain_id.unwrap_or(default.chain_id()),
        cli.manager.unwrap_or(default.manager()),
        cli.token.unwrap_or(default.token()),
        cli.accountant.unwrap_or(default.accountant()),
    );
    let chain_id = ProviderBuilder::new()
        .connect_client(client.clone())
        .get_chain_id()
        .await
        .context("fetching chain ID")?;
    if chain_id != network.chain_id() {
        return Err(anyhow::anyhow!(
            "RPC serves chain {}, expected {}, see `--chain-id`",
            chain_id,
            network.chain_id()
        ));
    }

    let connection = Arc::new(ConnectionManager::new());
    let identity = connection.connect_with_private_key(private_key)?;
    let orchestrator = StakingOrchestrator::with_config(
        RpcChainClient::new(&network, client, &identity),
        identity,
        connection.session_token().context("session closed")?,
        OrchestratorConfig {
            retry: RetryPolicy::new(cli.retries, Duration::from_millis(cli.retry_delay)),
            ..Default::default()
        },
    );

    tokio::spawn({
        let connection = connection.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                connection.disconnect();
            }
        }
    });

    Ok((connection, orchestrator))
}
