use super::Amount;

/// Balances of the connected account and protocol limits, all in human units.
///
/// Always replaced as a whole, so validation never observes a mix of fresh
/// and stale readings.
#[derive(Clone, PartialEq, derive_more::Debug)]
pub struct StakingSnapshot {
    #[debug("{hype_balance}")]
    hype_balance: Amount,
    #[debug("{khype_balance}")]
    khype_balance: Amount,
    #[debug("{min_stake}")]
    min_stake: Amount,
    #[debug("{max_stake}")]
    max_stake: Amount,
    #[debug("{staking_limit}")]
    staking_limit: Amount,
    #[debug("{total_staked}")]
    total_staked: Amount,
}

impl Default for StakingSnapshot {
    fn default() -> Self {
        Self {
            hype_balance: Amount::ZERO,
            khype_balance: Amount::ZERO,
            min_stake: Amount::ZERO,
            max_stake: Amount::ZERO,
            staking_limit: Amount::ZERO,
            total_staked: Amount::ZERO,
        }
    }
}

impl StakingSnapshot {
    pub fn new(
        hype_balance: Amount,
        khype_balance: Amount,
        min_stake: Amount,
        max_stake: Amount,
        staking_limit: Amount,
        total_staked: Amount,
    ) -> Self {
        Self { hype_balance, khype_balance, min_stake, max_stake, staking_limit, total_staked }
    }

    /// Native balance of the account.
    pub fn hype_balance(&self) -> Amount { self.hype_balance }

    /// Derived token balance of the account.
    pub fn khype_balance(&self) -> Amount { self.khype_balance }

    /// Minimum amount of a single stake.
    pub fn min_stake(&self) -> Amount { self.min_stake }

    /// Maximum amount of a single stake.
    pub fn max_stake(&self) -> Amount { self.max_stake }

    /// Protocol-wide cap of the total staked amount.
    pub fn staking_limit(&self) -> Amount { self.staking_limit }

    pub fn total_staked(&self) -> Amount { self.total_staked }

    /// Room left under the protocol-wide cap.
    pub fn remaining_capacity(&self) -> Amount {
        if self.total_staked > self.staking_limit {
            return Amount::ZERO;
        }
        self.staking_limit - self.total_staked
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for StakingSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;
        use tabled::{builder::Builder, settings::Style};

        let mut builder = Builder::default();
        for (name, value) in [
            ("HYPE balance", self.hype_balance.to_string().green().to_string()),
            ("kHYPE balance", self.khype_balance.to_string().green().to_string()),
            ("Min stake", self.min_stake.to_string()),
            ("Max stake", self.max_stake.to_string()),
            ("Staking limit", self.staking_limit.to_string()),
            ("Total staked", self.total_staked.to_string()),
            ("Remaining capacity", self.remaining_capacity().to_string()),
        ] {
            builder.push_record([name.to_string(), value]);
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}
