//! Internal utility functions and helpers.
//!
//! Small helpers shared across the crate: parsing human-readable memory
//! sizes for byte budgets, and prefix matching for configuration strings.

use crate::error::BlockError;

/// Parses a memory-size string such as "256k", "150M", or "2g" into bytes.
///
/// A bare number is taken as bytes. Suffixes `k`, `m`, `g`, `t` (case
/// insensitive, optionally followed by `b`) scale by powers of 1024.
///
/// # Errors
///
/// Returns [`BlockError::InvalidMemoryString`] if the input is empty or
/// the numeric part does not parse.
///
/// # Example
///
/// ```
/// use blockrs::util::parse_memory_string;
///
/// assert_eq!(parse_memory_string("256k")?, 256 * 1024);
/// assert_eq!(parse_memory_string("150M")?, 150 * 1024 * 1024);
/// assert_eq!(parse_memory_string("4096")?, 4096);
/// # Ok::<(), blockrs::BlockError>(())
/// ```
pub fn parse_memory_string(input: &str) -> Result<u64, BlockError> {
    let trimmed = input.trim();
    let invalid = || BlockError::InvalidMemoryString {
        input: input.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let lower = trimmed.to_ascii_lowercase();
    let stripped = lower.strip_suffix('b').unwrap_or(&lower);
    let (digits, multiplier) = match stripped.strip_suffix(['k', 'm', 'g', 't']) {
        Some(num) => {
            let mult = match stripped.as_bytes()[stripped.len() - 1] {
                b'k' => 1u64 << 10,
                b'm' => 1 << 20,
                b'g' => 1 << 30,
                _ => 1 << 40,
            };
            (num, mult)
        }
        None => (stripped, 1),
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Selects the single candidate that `prefix` unambiguously abbreviates.
///
/// Matching is case sensitive. Fails if no candidate starts with the
/// prefix or if more than one does.
pub(crate) fn select_by_matching_prefix<'a>(
    prefix: &str,
    candidates: &[&'a str],
) -> Result<&'a str, BlockError> {
    if prefix.is_empty() {
        return Err(BlockError::InvalidUnits {
            message: format!("empty prefix; valid choices are {:?}", candidates),
        });
    }
    let mut matches = candidates.iter().filter(|c| c.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(&m), None) => Ok(m),
        (Some(_), Some(_)) => Err(BlockError::InvalidUnits {
            message: format!("ambiguous prefix '{}' among {:?}", prefix, candidates),
        }),
        (None, _) => Err(BlockError::InvalidUnits {
            message: format!("no valid choice matches prefix '{}'; valid choices are {:?}", prefix, candidates),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!(parse_memory_string("1024").unwrap(), 1024);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_memory_string("1k").unwrap(), 1024);
        assert_eq!(parse_memory_string("1K").unwrap(), 1024);
        assert_eq!(parse_memory_string("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_memory_string("3G").unwrap(), 3u64 << 30);
        assert_eq!(parse_memory_string("1t").unwrap(), 1u64 << 40);
    }

    #[test]
    fn test_parse_b_suffix() {
        assert_eq!(parse_memory_string("512kb").unwrap(), 512 * 1024);
        assert_eq!(parse_memory_string("100b").unwrap(), 100);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_memory_string("").is_err());
        assert!(parse_memory_string("12q").is_err());
        assert!(parse_memory_string("k").is_err());
        assert!(parse_memory_string("-5k").is_err());
    }

    #[test]
    fn test_prefix_match() {
        let candidates = ["pixels", "splits"];
        assert_eq!(select_by_matching_prefix("pix", &candidates).unwrap(), "pixels");
        assert_eq!(select_by_matching_prefix("s", &candidates).unwrap(), "splits");
        assert!(select_by_matching_prefix("q", &candidates).is_err());
        assert!(select_by_matching_prefix("", &candidates).is_err());
    }

    #[test]
    fn test_prefix_ambiguous() {
        let candidates = ["splits", "spans"];
        assert!(select_by_matching_prefix("sp", &candidates).is_err());
        assert_eq!(select_by_matching_prefix("spl", &candidates).unwrap(), "splits");
    }
}
