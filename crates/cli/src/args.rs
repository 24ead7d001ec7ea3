use alloy::primitives::Address;
use clap::{Parser, Subcommand};

pub(crate) const DEFAULT_RPC_PROVIDER: &str = lstake_sdk::HYPERLIQUID_RPC_URL;
pub(crate) const DEFAULT_RPC_THROTTLING: u32 = 15;

#[derive(Parser, Debug)]
#[command(name = "lstake-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to
    #[arg(long, global = true, default_value_t = DEFAULT_RPC_PROVIDER.to_string())]
    pub rpc: String,

    /// RPC throttling (req/sec) [default: 15 for default RPC provider and
    /// none for custom]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Expected chain ID [default: HyperEVM mainnet]
    #[arg(long, global = true)]
    pub chain_id: Option<u64>,

    /// Staking manager contract address [default: Kinetiq deployment]
    #[arg(long, global = true)]
    pub manager: Option<Address>,

    /// Derived token contract address [default: Kinetiq deployment]
    #[arg(long, global = true)]
    pub token: Option<Address>,

    /// Staking accountant contract address [default: Kinetiq deployment]
    #[arg(long, global = true)]
    pub accountant: Option<Address>,

    /// Private key of the staking account
    #[arg(long, global = true, env = "LSTAKE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Attempts of balance and limit reads before giving up
    #[arg(long, global = true, default_value_t = 3)]
    pub retries: u32,

    /// Initial delay between read attempts, doubled after each failure (ms)
    #[arg(long, global = true, default_value_t = 1000)]
    pub retry_delay: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the private key and print the derived address, no network
    /// access
    CheckKey,
    /// Show balances and protocol limits of the account
    Balances,
    /// Validate an amount and preview the kHYPE it would mint
    Preview {
        /// Amount of HYPE, e.g. `12.5`
        amount: String,
    },
    /// Stake HYPE for kHYPE
    Stake {
        /// Amount of HYPE, e.g. `12.5`
        amount: String,
    },
}
