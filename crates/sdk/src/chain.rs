//! Boundary to the chain: three remote procedures against the staking
//! contracts.

use alloy::{
    eips::BlockId,
    network::ReceiptResponse,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
};
use alloy_sol_types::decode_revert_reason;

use crate::{
    Network,
    abi::{
        DerivedToken::DerivedTokenInstance, StakingAccountant::StakingAccountantInstance,
        StakingManager::StakingManagerInstance,
    },
    connection::SignerIdentity,
    error::StakingError,
};

/// Logical contract the call is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractRole {
    /// Stake entry point and limits.
    Manager,
    /// Derived token.
    Token,
    /// Base to derived rate converter.
    Accountant,
}

/// Read-only contract call returning a single `uint256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadCall {
    MinStakeAmount,
    MaxStakeAmount,
    StakingLimit,
    TotalStaked,
    BalanceOf(Address),
    BaseToDerived(U256),
}

/// State-mutating contract call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxCall {
    /// Payable stake of the transaction value.
    Stake,
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    status: bool,
    tx_hash: TxHash,
    revert_reason: Option<String>,
}

/// Chain access bound to a single signer.
///
/// Implemented by [`RpcChainClient`] for real networks and by
/// [`crate::testing::MockChain`] for tests.
pub trait ChainClient: Send + Sync {
    /// Calls a view function returning a single `uint256`.
    fn read_uint(&self, call: ReadCall)
    -> impl Future<Output = Result<U256, StakingError>> + Send;

    /// Signs and submits a transaction, then waits for its receipt.
    fn send_transaction(
        &self,
        call: TxCall,
        value: U256,
    ) -> impl Future<Output = Result<TxReceipt, StakingError>> + Send;

    /// Native balance of the account, in smallest units.
    fn read_native_balance(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<U256, StakingError>> + Send;
}

impl ReadCall {
    pub fn contract(&self) -> ContractRole {
        match self {
            ReadCall::MinStakeAmount
            | ReadCall::MaxStakeAmount
            | ReadCall::StakingLimit
            | ReadCall::TotalStaked => ContractRole::Manager,
            ReadCall::BalanceOf(_) => ContractRole::Token,
            ReadCall::BaseToDerived(_) => ContractRole::Accountant,
        }
    }

    /// Solidity function name.
    pub fn method(&self) -> &'static str {
        match self {
            ReadCall::MinStakeAmount => "minStakeAmount",
            ReadCall::MaxStakeAmount => "maxStakeAmount",
            ReadCall::StakingLimit => "stakingLimit",
            ReadCall::TotalStaked => "totalStaked",
            ReadCall::BalanceOf(_) => "balanceOf",
            ReadCall::BaseToDerived(_) => "HYPEToKHYPE",
        }
    }
}

impl TxReceipt {
    pub fn new(status: bool, tx_hash: TxHash, revert_reason: Option<String>) -> Self {
        Self { status, tx_hash, revert_reason }
    }

    /// Whether the transaction succeeded.
    pub fn status(&self) -> bool { self.status }

    pub fn tx_hash(&self) -> TxHash { self.tx_hash }

    /// Decoded revert reason of a failed transaction, when available.
    pub fn revert_reason(&self) -> Option<&str> { self.revert_reason.as_deref() }
}

/// [`ChainClient`] over JSON-RPC, signing with the connected identity.
///
/// It is recommended to setup the RPC client with
/// [`alloy::transports::layers::RetryBackoffLayer`] for transport-level
/// retries of rate-limited requests.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: DynProvider,
    sender: Address,
    manager: StakingManagerInstance<DynProvider>,
    token: DerivedTokenInstance<DynProvider>,
    accountant: StakingAccountantInstance<DynProvider>,
}

impl RpcChainClient {
    pub fn new(network: &Network, client: RpcClient, identity: &SignerIdentity) -> Self {
        let provider =
            ProviderBuilder::new().wallet(identity.wallet()).connect_client(client).erased();
        Self {
            manager: StakingManagerInstance::new(network.manager(), provider.clone()),
            token: DerivedTokenInstance::new(network.token(), provider.clone()),
            accountant: StakingAccountantInstance::new(network.accountant(), provider.clone()),
            sender: identity.address(),
            provider,
        }
    }

    pub fn provider(&self) -> &DynProvider { &self.provider }

    /// Replays a failed stake at its block to recover the revert reason,
    /// receipts do not carry it.
    async fn stake_revert_reason(&self, value: U256, block: Option<u64>) -> Option<String> {
        let mut call = self.manager.stake().value(value).from(self.sender);
        if let Some(block) = block {
            call = call.block(BlockId::number(block));
        }
        match call.call().await {
            Ok(_) => None,
            Err(err) => match contract_error(err) {
                StakingError::Contract(reason) => Some(reason),
                _ => None,
            },
        }
    }
}

impl ChainClient for RpcChainClient {
    async fn read_uint(&self, call: ReadCall) -> Result<U256, StakingError> {
        tracing::debug!(contract = ?call.contract(), method = call.method(), "read");
        let result = match call {
            ReadCall::MinStakeAmount => self.manager.minStakeAmount().call().await,
            ReadCall::MaxStakeAmount => self.manager.maxStakeAmount().call().await,
            ReadCall::StakingLimit => self.manager.stakingLimit().call().await,
            ReadCall::TotalStaked => self.manager.totalStaked().call().await,
            ReadCall::BalanceOf(account) => self.token.balanceOf(account).call().await,
            ReadCall::BaseToDerived(amount) => self.accountant.HYPEToKHYPE(amount).call().await,
        };
        result.map_err(contract_error)
    }

    async fn send_transaction(&self, call: TxCall, value: U256) -> Result<TxReceipt, StakingError> {
        let pending = match call {
            TxCall::Stake => self.manager.stake().value(value).send().await.map_err(contract_error)?,
        };
        tracing::info!(tx_hash = %pending.tx_hash(), "transaction submitted");

        let receipt = pending.get_receipt().await?;
        let status = receipt.status();
        let revert_reason = if status {
            None
        } else {
            self.stake_revert_reason(value, receipt.block_number()).await
        };
        Ok(TxReceipt::new(status, receipt.transaction_hash(), revert_reason))
    }

    async fn read_native_balance(&self, address: Address) -> Result<U256, StakingError> {
        Ok(self.provider.get_balance(address).await?)
    }
}

/// Extracts the revert reason of a failed call, if the node returned one.
fn contract_error(err: alloy::contract::Error) -> StakingError {
    match err.as_revert_data().and_then(|data| decode_revert_reason(&data)) {
        Some(reason) => StakingError::Contract(reason),
        None => StakingError::Call(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_call_routing() {
        assert_eq!(ReadCall::TotalStaked.contract(), ContractRole::Manager);
        assert_eq!(ReadCall::BalanceOf(Address::ZERO).contract(), ContractRole::Token);
        assert_eq!(ReadCall::BaseToDerived(U256::ZERO).contract(), ContractRole::Accountant);
        assert_eq!(ReadCall::BaseToDerived(U256::ZERO).method(), "HYPEToKHYPE");
    }
}
