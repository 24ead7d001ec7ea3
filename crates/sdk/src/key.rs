//! Raw private key validation.
//!
//! Pure string checks only, the key is turned into a signer by
//! [`crate::connection::ConnectionManager`].

use crate::error::KeyError;

const KEY_HEX_LEN: usize = 64;

/// Validates a raw private key string.
///
/// Rules are applied in order, the first failure wins:
///
/// 1. surrounding whitespace is trimmed, empty input is rejected;
/// 2. an optional `0x` prefix is stripped;
/// 3. exactly 64 characters must remain;
/// 4. every character must be a hex digit;
/// 5. the all-zero and all-one keys are rejected as degenerate.
///
/// Returns the key re-prefixed with `0x`, hex digits kept as given.
pub fn validate(raw: &str) -> Result<String, KeyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Empty);
    }

    let hex = strip_prefix(trimmed);

    let len = hex.chars().count();
    if len != KEY_HEX_LEN {
        return Err(KeyError::InvalidLength(len));
    }

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyError::InvalidCharacters);
    }

    if hex.chars().all(|c| c == '0') {
        return Err(KeyError::AllZeros);
    }

    if hex.chars().all(|c| c == '1') {
        return Err(KeyError::AllOnes);
    }

    Ok(format!("0x{hex}"))
}

pub fn is_valid(raw: &str) -> bool { validate(raw).is_ok() }

/// Trims the key and normalizes it to carry exactly one `0x` prefix.
pub fn clean(raw: &str) -> String { format!("0x{}", strip_prefix(raw.trim())) }

/// Masks the key for display, keeping the first 6 and the last 4 characters.
pub fn mask(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn strip_prefix(key: &str) -> &str {
    key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate(KEY).unwrap(), format!("0x{KEY}"));
        assert_eq!(validate(&format!("  0x{KEY}\n")).unwrap(), format!("0x{KEY}"));

        let upper = KEY.to_uppercase();
        assert_eq!(validate(&upper).unwrap(), format!("0x{upper}"));
        assert!(is_valid(KEY));
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(validate("   "), Err(KeyError::Empty));
        assert_eq!(validate("0x"), Err(KeyError::InvalidLength(0)));
        assert_eq!(validate("abc"), Err(KeyError::InvalidLength(3)));
        assert_eq!(validate(&format!("{KEY}00")), Err(KeyError::InvalidLength(66)));
        assert_eq!(validate(&"g".repeat(64)), Err(KeyError::InvalidCharacters));
        // Length is checked before the alphabet
        assert_eq!(validate(&"g".repeat(63)), Err(KeyError::InvalidLength(63)));
        assert_eq!(validate(&"0".repeat(64)), Err(KeyError::AllZeros));
        assert_eq!(validate(&format!("0x{}", "1".repeat(64))), Err(KeyError::AllOnes));
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in [KEY.to_string(), format!("0x{KEY}"), format!(" {KEY} ")] {
            let cleaned = validate(&raw).unwrap();
            assert_eq!(clean(&cleaned), cleaned);
            assert_eq!(validate(&cleaned).unwrap(), cleaned);
        }
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(&format!("0x{KEY}")), "0x4c08...2318");
        assert_eq!(mask("0x1234"), "****");
    }
}
