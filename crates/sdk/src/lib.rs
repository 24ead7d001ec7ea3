//! Liquid staking SDK.
//!
//! # Overview
//!
//! Orchestrates staking of a chain's base asset (HYPE) for a derived receipt
//! token (kHYPE) through the protocol's manager, token and accountant
//! contracts.
//!
//! Use [`connection::ConnectionManager`] to turn a private key into a
//! [`connection::SignerIdentity`], bind a [`chain::RpcChainClient`] to it, then
//! drive a [`orchestrator::StakingOrchestrator`]:
//! [`load_initial_data`], [`on_amount_changed`] for live validation and rate
//! preview, [`stake`] to submit.
//!
//! All orchestrator state is exposed as [`tokio::sync::watch`] channels, so it
//! can be rendered by any front-end or observed headless in tests.
//!
//! # Limitations/follow-ups
//!
//! * WalletConnect sessions are not supported, only raw private keys.
//!
//! * External wallet apps can be launched through
//!   [`connection::ExternalWalletLauncher`], but the resulting session is not
//!   bridged back into the SDK.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for state types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory chain with the staking contracts
//! emulated and failures injectable.
//!
//! [`load_initial_data`]: orchestrator::StakingOrchestrator::load_initial_data
//! [`on_amount_changed`]: orchestrator::StakingOrchestrator::on_amount_changed
//! [`stake`]: orchestrator::StakingOrchestrator::stake

pub mod abi;
pub mod chain;
pub mod connection;
pub mod error;
pub mod key;
pub mod num;
pub mod orchestrator;
pub mod retry;
pub mod state;
#[cfg(feature = "testing")]
pub mod testing;

use alloy::primitives::{Address, address};

/// Public RPC endpoint of [`Network::hyperliquid`].
pub const HYPERLIQUID_RPC_URL: &str = "https://rpc.hyperliquid.xyz/evm";

/// Chain and contracts the staking protocol is deployed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    chain_id: u64,
    manager: Address,
    token: Address,
    accountant: Address,
}

impl Network {
    /// Hyperliquid EVM mainnet deployment.
    pub fn hyperliquid() -> Self {
        Self {
            chain_id: 999,
            manager: address!("0x393D0B87Ed38fc779FD9611144aE649BA6082109"),
            token: address!("0xfD739d4e423301CE9385c1fb8850539D657C296D"),
            accountant: address!("0x9209648Ec9D448EF57116B73A2f081835643dc7A"),
        }
    }

    pub fn custom(chain_id: u64, manager: Address, token: Address, accountant: Address) -> Self {
        Self { chain_id, manager, token, accountant }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    /// Staking manager: stake entry point and limits.
    pub fn manager(&self) -> Address { self.manager }

    /// Derived token.
    pub fn token(&self) -> Address { self.token }

    /// Staking accountant: base to derived rate.
    pub fn accountant(&self) -> Address { self.accountant }
}
