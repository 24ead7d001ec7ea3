//! Conversion between on-chain fixed-point integers and exact decimals.

use alloy::primitives::U256;
use fastnum::{
    D256,
    decimal::{Context, RoundingMode, Sign},
};

use crate::error::StakingError;

/// Human-unit quantity of the base asset or the derived token.
///
/// Signed so that balance differences can be represented as is. The 256-bit
/// coefficient holds any `uint256` read from chain.
pub type Amount = D256;

/// Decimals of the base asset and the derived token.
pub const DECIMALS: u8 = 18;

/// Converter between smallest-unit integers and decimal [`Amount`]s.
///
/// Works on the decimal's coefficient and scale directly, so neither
/// direction depends on how an amount is formatted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Default for Converter {
    fn default() -> Self { Self::new(DECIMALS) }
}

impl Converter {
    pub const fn new(decimals: u8) -> Self { Self { decimals } }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Converts a smallest-unit integer into a decimal amount.
    ///
    /// Trailing fractional zeros are dropped, whole numbers keep scale 0.
    pub fn from_unsigned(&self, value: U256) -> Result<Amount, StakingError> {
        let digits = fastnum::U256::from_be_slice(&value.to_be_bytes::<32>())
            .ok_or_else(|| StakingError::InvalidAmount(format!("{value} out of range")))?;
        let amount = Amount::from_parts(
            digits,
            -i32::from(self.decimals),
            Sign::Plus,
            Context::default(),
        )
        .reduce();
        if amount.fractional_digits_count() < 0 { Ok(amount.rescale(0)) } else { Ok(amount) }
    }

    /// Converts a non-negative decimal amount into a smallest-unit integer.
    ///
    /// Digits finer than the smallest unit are truncated.
    pub fn to_unsigned(&self, amount: Amount) -> Result<U256, StakingError> {
        if amount.is_negative() {
            return Err(StakingError::InvalidAmount(format!("negative amount {amount}")));
        }
        let scale = i16::from(self.decimals);
        let scaled = amount.with_rounding_mode(RoundingMode::Down).rescale(scale);
        if scaled.is_nan() || scaled.fractional_digits_count() != scale {
            return Err(StakingError::InvalidAmount(format!("{amount} out of range")));
        }
        U256::try_from_be_slice(&scaled.digits().to_radix_be(256))
            .ok_or_else(|| StakingError::InvalidAmount(format!("{amount} out of range")))
    }
}

/// Parses user input as a decimal amount.
///
/// Anything that is not a plain (optionally signed) decimal number, including
/// empty input, is treated as zero.
pub fn parse_amount(raw: &str) -> Amount {
    let raw = raw.trim();
    let well_formed = !raw.is_empty()
        && raw
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')));
    if !well_formed {
        return Amount::ZERO;
    }
    raw.parse().unwrap_or(Amount::ZERO)
}

#[cfg(test)]
mod tests {
    use fastnum::dec256;

    use super::*;

    fn wei(n: u64) -> U256 { U256::from(n) * U256::from(10u64).pow(U256::from(18u64)) }

    #[test]
    fn test_from_unsigned() {
        let c = Converter::default();
        assert_eq!(c.from_unsigned(U256::from(1_500_000_000_000_000_000u128)).unwrap(), dec256!(1.5));
        assert_eq!(c.from_unsigned(U256::ZERO).unwrap(), dec256!(0));
        assert_eq!(c.from_unsigned(U256::from(1u64)).unwrap(), dec256!(0.000000000000000001));
        assert_eq!(c.from_unsigned(wei(5000)).unwrap().to_string(), "5000");
        assert_eq!(c.from_unsigned(U256::from(1_500_000_000_000_000_000u128)).unwrap().to_string(), "1.5");
    }

    #[test]
    fn test_full_uint_range() {
        let c = Converter::default();
        let max = c.from_unsigned(U256::MAX).unwrap();
        assert!(max > c.from_unsigned(U256::from(1u64) << 200usize).unwrap());
        assert_eq!(c.to_unsigned(max).unwrap(), U256::MAX);

        let unlimited = c.from_unsigned(U256::from(1u64) << 200usize).unwrap();
        assert_eq!(c.to_unsigned(unlimited).unwrap(), U256::from(1u64) << 200usize);
    }

    #[test]
    fn test_to_unsigned() {
        let c = Converter::default();
        assert_eq!(c.to_unsigned(dec256!(50)).unwrap(), wei(50));
        assert_eq!(c.to_unsigned(dec256!(0.25)).unwrap(), U256::from(250_000_000_000_000_000u128));
        assert_eq!(c.to_unsigned(Amount::ZERO).unwrap(), U256::ZERO);
        assert!(c.to_unsigned(dec256!(-1)).is_err());
    }

    #[test]
    fn test_to_unsigned_small_amounts() {
        let c = Converter::default();
        // Formatted in scientific notation, converted exactly regardless
        assert_eq!(c.to_unsigned(parse_amount("0.0000001")).unwrap(), U256::from(100_000_000_000u64));
        assert_eq!(c.to_unsigned(parse_amount("0.000000000000000001")).unwrap(), U256::from(1u64));
        assert_eq!(c.to_unsigned(dec256!(0.000000000000000001)).unwrap(), U256::from(1u64));
        // Below the smallest unit
        assert_eq!(c.to_unsigned(parse_amount("0.0000000000000000019")).unwrap(), U256::from(1u64));
        assert_eq!(c.to_unsigned(parse_amount("0.0000000000000000001")).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50"), dec256!(50));
        assert_eq!(parse_amount(" 0.5 "), dec256!(0.5));
        assert_eq!(parse_amount("-3"), dec256!(-3));
        assert_eq!(parse_amount(""), Amount::ZERO);
        assert_eq!(parse_amount("abc"), Amount::ZERO);
        assert_eq!(parse_amount("1.2.3"), Amount::ZERO);
        assert_eq!(parse_amount("1e5"), Amount::ZERO);
        assert_eq!(parse_amount("NaN"), Amount::ZERO);
    }
}
