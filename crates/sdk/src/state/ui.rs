use alloy::primitives::TxHash;

use super::Amount;

/// State of the staking screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StakeUiState {
    #[default]
    Idle,
    Loading,
    /// `actual` is `None` when the stake was mined but the balance after it
    /// could not be read.
    Success { tx_hash: TxHash, expected: Amount, actual: Option<Amount> },
    Error(String),
}

/// Completed stake.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StakeOutcome {
    pub tx_hash: TxHash,
    /// Derived amount quoted by the accountant before submission.
    pub expected: Amount,
    /// Increase of the derived token balance, unknown if it could not be
    /// read after mining.
    pub actual: Option<Amount>,
}

/// Expected derived output for a candidate amount.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preview {
    /// Sequence number of the amount change the preview belongs to.
    pub seq: u64,
    pub amount: Amount,
    pub expected: Amount,
}

impl Default for Preview {
    fn default() -> Self { Self { seq: 0, amount: Amount::ZERO, expected: Amount::ZERO } }
}

impl From<StakeOutcome> for StakeUiState {
    fn from(outcome: StakeOutcome) -> Self {
        StakeUiState::Success {
            tx_hash: outcome.tx_hash,
            expected: outcome.expected,
            actual: outcome.actual,
        }
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for StakeUiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        match self {
            StakeUiState::Idle => write!(f, "Idle"),
            StakeUiState::Loading => write!(f, "{}", "Loading...".yellow()),
            StakeUiState::Success { tx_hash, expected, actual } => write!(
                f,
                "{} {}\n    Expected kHYPE: {} | Received kHYPE: {}",
                "Staked in tx".green(),
                tx_hash,
                expected,
                actual.map_or("unknown".yellow(), |actual| actual.to_string().green()),
            ),
            StakeUiState::Error(message) => write!(f, "{}", message.red()),
        }
    }
}
