//! Free-text penalty parsing for manual audits

/// Penalty used when the operator's input carries no usable number
pub const DEFAULT_MANUAL_PENALTY: u64 = 500;

/// Largest penalty a single audit can carry; the ledger is signed 64-bit.
pub const MAX_PENALTY: u64 = i64::MAX as u64;

/// Keep only the ASCII digits of `raw` and parse them.
///
/// Falls back to [`DEFAULT_MANUAL_PENALTY`] when nothing parses, when the
/// result is zero, or when it exceeds [`MAX_PENALTY`].
pub fn parse_penalty(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .ok()
        .filter(|penalty| (1..=MAX_PENALTY).contains(penalty))
        .unwrap_or(DEFAULT_MANUAL_PENALTY)
}
