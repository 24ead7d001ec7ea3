use super::{Amount, StakingSnapshot};
use crate::error::ValidationError;

/// Outcome of the stake amount validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ValidationState {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationState {
    pub fn is_valid(&self) -> bool { matches!(self, ValidationState::Valid) }
}

/// Checks the amount against the snapshot, the first failing rule wins:
///
/// 1. amount must be positive;
/// 2. not below the minimum stake;
/// 3. not above the maximum stake;
/// 4. covered by the native balance;
/// 5. total staked plus the amount must fit under the staking limit.
pub fn check(amount: Amount, snapshot: &StakingSnapshot) -> Result<(), ValidationError> {
    if amount <= Amount::ZERO {
        return Err(ValidationError::NotPositive);
    }
    if amount < snapshot.min_stake() {
        return Err(ValidationError::BelowMinimum { min: snapshot.min_stake() });
    }
    if amount > snapshot.max_stake() {
        return Err(ValidationError::AboveMaximum { max: snapshot.max_stake() });
    }
    if amount > snapshot.hype_balance() {
        return Err(ValidationError::InsufficientBalance);
    }
    if snapshot.total_staked() + amount > snapshot.staking_limit() {
        return Err(ValidationError::ExceedsLimit);
    }
    Ok(())
}

/// [`check`] in the form published to observers.
pub fn validate(amount: Amount, snapshot: &StakingSnapshot) -> ValidationState {
    match check(amount, snapshot) {
        Ok(()) => ValidationState::Valid,
        Err(err) => ValidationState::Invalid(err),
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        match self {
            ValidationState::Valid => write!(f, "{}", "Valid".green()),
            ValidationState::Invalid(err) => write!(f, "{}", err.to_string().red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use fastnum::dec256;

    use super::*;

    fn snapshot(balance: Amount, total_staked: Amount) -> StakingSnapshot {
        StakingSnapshot::new(
            balance,
            dec256!(0),
            dec256!(10),
            dec256!(1000),
            dec256!(5000),
            total_staked,
        )
    }

    #[test]
    fn test_rule_precedence() {
        let s = snapshot(dec256!(3), dec256!(4995));

        assert_eq!(validate(dec256!(0), &s), ValidationState::Invalid(ValidationError::NotPositive));
        assert_eq!(validate(dec256!(-1), &s), ValidationState::Invalid(ValidationError::NotPositive));
        // Minimum is checked before the balance
        assert_eq!(
            validate(dec256!(5), &s),
            ValidationState::Invalid(ValidationError::BelowMinimum { min: dec256!(10) })
        );
        assert_eq!(
            validate(dec256!(2000), &s),
            ValidationState::Invalid(ValidationError::AboveMaximum { max: dec256!(1000) })
        );
        assert_eq!(
            validate(dec256!(50), &s),
            ValidationState::Invalid(ValidationError::InsufficientBalance)
        );

        let s = snapshot(dec256!(100), dec256!(4995));
        assert_eq!(validate(dec256!(50), &s), ValidationState::Invalid(ValidationError::ExceedsLimit));

        let s = snapshot(dec256!(100), dec256!(0));
        assert_eq!(validate(dec256!(20), &s), ValidationState::Valid);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let s = StakingSnapshot::new(
            dec256!(1000),
            dec256!(0),
            dec256!(10),
            dec256!(1000),
            dec256!(5000),
            dec256!(4000),
        );
        assert!(validate(dec256!(10), &s).is_valid());
        assert!(validate(dec256!(1000), &s).is_valid());
        assert!(validate(dec256!(9.999999999999999999), &s) != ValidationState::Valid);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::NotPositive.to_string(), "Amount must be greater than 0");
        assert_eq!(
            ValidationError::BelowMinimum { min: dec256!(10) }.to_string(),
            "Amount below minimum stake of 10"
        );
    }
}
