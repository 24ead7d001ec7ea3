use thiserror::Error;

use crate::num::Amount;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("contract error: {0}")]
    Contract(String),

    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("contract call error: {0}")]
    Call(#[from] alloy::contract::Error),

    #[error("pending transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    /// Transaction was mined with a failure status.
    #[error("transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: alloy::primitives::TxHash, reason: String },

    #[error("a stake is already in progress")]
    StakeInProgress,

    #[error("a connection attempt is already in progress")]
    AlreadyConnecting,

    #[error("{0}")]
    Unsupported(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Malformed or unusable private key. Always local, never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Private key cannot be empty")]
    Empty,

    #[error("Private key must be 64 characters long (currently {0})")]
    InvalidLength(usize),

    #[error("Private key contains invalid characters. Only 0-9 and a-f are allowed")]
    InvalidCharacters,

    #[error("Private key cannot be all zeros")]
    AllZeros,

    #[error("Private key cannot be all ones")]
    AllOnes,

    /// Well-formed hex which is not a valid secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidScalar(String),
}

/// Stake amount rule violation, see [`crate::state::validate`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Amount must be greater than 0")]
    NotPositive,

    #[error("Amount below minimum stake of {min}")]
    BelowMinimum { min: Amount },

    #[error("Amount exceeds maximum stake of {max}")]
    AboveMaximum { max: Amount },

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Would exceed protocol staking limit")]
    ExceedsLimit,
}

/// Coarse failure class driving retry and presentation policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Amount rule violation, shown inline.
    Validation,
    /// Timeout, connection or endpoint failure. Retried for reads.
    Network,
    /// Revert, insufficient funds or gas. Surfaced immediately.
    Contract,
    /// Malformed private key.
    Key,
}

/// User action a failure is reported for. Selects the fallback message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    LoadData,
    Stake,
}

pub const MSG_BELOW_MIN_STAKE: &str = "Amount below minimum stake requirement";
pub const MSG_ABOVE_MAX_STAKE: &str = "Amount exceeds maximum stake limit";
pub const MSG_EXCEEDS_STAKING_LIMIT: &str =
    "This stake would exceed the protocol's total staking limit";
pub const MSG_INSUFFICIENT_BALANCE: &str = "Insufficient HYPE balance";
pub const MSG_INSUFFICIENT_GAS: &str = "Insufficient gas funds for transaction";
pub const MSG_TRANSACTION_REVERT: &str =
    "Transaction failed. Please check your input and try again.";
pub const MSG_NETWORK_TIMEOUT: &str = "Network timeout. Please try again.";
pub const MSG_RPC_CONNECTION: &str = "Unable to connect to network. Please check your connection.";
pub const MSG_ENDPOINT_NOT_FOUND: &str = "Network endpoint not found. Please check your connection.";

pub const MSG_LOAD_TIMEOUT: &str = "Request timeout. Please try again.";
pub const MSG_LOAD_CONNECTION: &str = "Network connection failed. Please check your internet.";
pub const MSG_LOAD_REVERT: &str =
    "Contract execution failed. Please check your wallet connection.";
pub const MSG_LOAD_INSUFFICIENT_FUNDS: &str = "Insufficient HYPE balance for transaction";
pub const MSG_LOAD_BELOW_MIN_STAKE: &str = "Stake amount is below the minimum required";
pub const MSG_LOAD_ABOVE_MAX_STAKE: &str = "Stake amount exceeds the maximum allowed";
pub const MSG_LOAD_EXCEEDS_STAKING_LIMIT: &str = "This stake would exceed the protocol limit";

type Marker = (&'static str, &'static str, ErrorKind);

// Contract-specific reasons are matched before the generic revert marker,
// the latter usually prefixes the former.
const STAKE_MARKERS: &[Marker] = &[
    ("Below minimum stake", MSG_BELOW_MIN_STAKE, ErrorKind::Contract),
    ("Above maximum stake", MSG_ABOVE_MAX_STAKE, ErrorKind::Contract),
    ("Would exceed staking limit", MSG_EXCEEDS_STAKING_LIMIT, ErrorKind::Contract),
    ("insufficient funds", MSG_INSUFFICIENT_BALANCE, ErrorKind::Contract),
    ("insufficient gas", MSG_INSUFFICIENT_GAS, ErrorKind::Contract),
    ("execution reverted", MSG_TRANSACTION_REVERT, ErrorKind::Contract),
    ("timeout", MSG_NETWORK_TIMEOUT, ErrorKind::Network),
    ("connection", MSG_RPC_CONNECTION, ErrorKind::Network),
    ("404", MSG_ENDPOINT_NOT_FOUND, ErrorKind::Network),
];

// Reads fail mostly on transport, network markers come first.
const LOAD_MARKERS: &[Marker] = &[
    ("404", MSG_ENDPOINT_NOT_FOUND, ErrorKind::Network),
    ("timeout", MSG_LOAD_TIMEOUT, ErrorKind::Network),
    ("connection", MSG_LOAD_CONNECTION, ErrorKind::Network),
    ("execution reverted", MSG_LOAD_REVERT, ErrorKind::Contract),
    ("insufficient funds", MSG_LOAD_INSUFFICIENT_FUNDS, ErrorKind::Contract),
    ("Below minimum stake", MSG_LOAD_BELOW_MIN_STAKE, ErrorKind::Contract),
    ("Above maximum stake", MSG_LOAD_ABOVE_MAX_STAKE, ErrorKind::Contract),
    ("Would exceed staking limit", MSG_LOAD_EXCEEDS_STAKING_LIMIT, ErrorKind::Contract),
];

impl Operation {
    fn markers(&self) -> &'static [Marker] {
        match self {
            Operation::LoadData => LOAD_MARKERS,
            Operation::Stake => STAKE_MARKERS,
        }
    }
}

/// Maps raw failure text to a fixed user-facing message.
///
/// Each operation has its own marker table, the first matching marker wins.
/// Unknown failures fall back to an operation-specific prefix followed by the
/// raw detail.
pub fn classify(operation: Operation, raw: &str) -> String {
    let markers = operation.markers();
    if let Some((_, message, _)) = markers.iter().find(|(marker, _, _)| raw.contains(marker)) {
        return message.to_string();
    }
    let detail = if raw.is_empty() { "Unknown error" } else { raw };
    match operation {
        Operation::LoadData => format!("Failed to load initial data: {detail}"),
        Operation::Stake => format!("Staking failed: {detail}"),
    }
}

impl StakingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StakingError::Validation(_) | StakingError::InvalidAmount(_) => ErrorKind::Validation,
            StakingError::Key(_) => ErrorKind::Key,
            StakingError::Network(_) | StakingError::Transport(_) | StakingError::Cancelled => {
                ErrorKind::Network
            },
            StakingError::Contract(_) | StakingError::Reverted { .. } => ErrorKind::Contract,
            _ => {
                let raw = self.to_string();
                STAKE_MARKERS
                    .iter()
                    .find(|(marker, _, _)| raw.contains(marker))
                    .map(|(_, _, kind)| *kind)
                    .unwrap_or(ErrorKind::Contract)
            },
        }
    }

    /// User-facing message for the failure of the given operation.
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            StakingError::Validation(err) => err.to_string(),
            StakingError::Key(err) => err.to_string(),
            StakingError::Reverted { reason, .. } => format!("Staking failed: {reason}"),
            _ => classify(operation, &self.to_string()),
        }
    }
}
