use fastnum::dec256;

use super::Amount;

/// Shortfall of the received amount, in percent, above which a warning is
/// raised.
pub const SLIPPAGE_TOLERANCE_PERCENT: Amount = dec256!(0.5);

pub const WARNING_SLIPPAGE: &str = "Received less kHYPE than expected";

/// Result of comparing the expected and actually received derived amounts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlippageCheck {
    /// Either amount is not positive, nothing to compare.
    Skipped,
    /// Shortfall within tolerance, carries the percentage.
    Within(Amount),
    /// Shortfall above tolerance, carries the percentage.
    Exceeded(Amount),
}

/// Percentage shortfall `(expected - actual) / expected * 100`, rounded
/// half-up to 4 decimal places. `None` unless both amounts are positive.
pub fn slippage_percent(expected: Amount, actual: Amount) -> Option<Amount> {
    if expected <= Amount::ZERO || actual <= Amount::ZERO {
        return None;
    }
    Some(((expected - actual) / expected * dec256!(100)).round(4))
}

pub fn check_slippage(expected: Amount, actual: Amount) -> SlippageCheck {
    match slippage_percent(expected, actual) {
        None => SlippageCheck::Skipped,
        Some(pct) if pct > SLIPPAGE_TOLERANCE_PERCENT => SlippageCheck::Exceeded(pct),
        Some(pct) => SlippageCheck::Within(pct),
    }
}

impl SlippageCheck {
    /// User-facing warning for an exceeded tolerance.
    pub fn warning(&self) -> Option<String> {
        match self {
            SlippageCheck::Exceeded(pct) => Some(format!("{WARNING_SLIPPAGE} ({pct}% difference)")),
            _ => None,
        }
    }
}
