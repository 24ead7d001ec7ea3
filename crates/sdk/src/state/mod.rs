//! Staking state observed by front-ends.

mod slippage;
mod snapshot;
mod ui;
mod validation;

pub use slippage::*;
pub use snapshot::StakingSnapshot;
pub use ui::{Preview, StakeOutcome, StakeUiState};
pub use validation::{ValidationState, check, validate};

use crate::num::Amount;
