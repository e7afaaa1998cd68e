//! Phone number comparison across formats.
//!
//! Provider payloads and user settings spell the same line differently
//! (`+33327786256`, `0327786256`, `03 27 78 62 56`). Comparing the trailing
//! digits ignores country codes, trunk prefixes and separators.

use crate::constants::PHONE_MATCH_DIGITS;

/// Trailing [`PHONE_MATCH_DIGITS`] digits of `number`, separators dropped.
///
/// Numbers with fewer digits are returned whole.
pub fn phone_suffix(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    let start = digits.len().saturating_sub(PHONE_MATCH_DIGITS);
    digits[start..].iter().collect()
}

/// `true` when both numbers share the same non-empty suffix.
pub fn numbers_match(a: &str, b: &str) -> bool {
    let left = phone_suffix(a);
    !left.is_empty() && left == phone_suffix(b)
}
