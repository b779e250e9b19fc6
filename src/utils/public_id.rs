//! Public referral identifiers.
//!
//! A public id is the base-62 representation of the store-assigned sequence
//! id, using the alphabet `0-9a-z A-Z` (case-sensitive), prefixed with
//! [`PREFIX`]. The prefix keeps consumers that trim leading zeros or parse
//! numbers from mangling the code.
//!
//! ```ignore
//! assert_eq!(encode(1).unwrap(), "r1");
//! assert_eq!(encode(62).unwrap(), "r10");
//! assert_eq!(decode("rZ").unwrap(), 61);
//! ```

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Non-digit prefix carried by every public id.
pub const PREFIX: char = 'r';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublicIdError {
    #[error("sequence id must be positive, got {0}")]
    NonPositive(i64),
    #[error("public id must start with '{PREFIX}'")]
    MissingPrefix,
    #[error("public id has no digits")]
    Empty,
    #[error("public id has a leading zero")]
    LeadingZero,
    #[error("invalid base-62 digit '{0}'")]
    InvalidDigit(char),
    #[error("public id exceeds the sequence range")]
    Overflow,
}

/// Encodes a positive sequence id into its public id.
///
/// # Errors
///
/// Returns [`PublicIdError::NonPositive`] for zero or negative input.
pub fn encode(sequence_id: i64) -> Result<String, PublicIdError> {
    if sequence_id <= 0 {
        return Err(PublicIdError::NonPositive(sequence_id));
    }

    let mut n = sequence_id as u64;
    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }

    let mut out = String::with_capacity(digits.len() + 1);
    out.push(PREFIX);
    out.extend(digits.iter().rev().map(|&b| b as char));
    Ok(out)
}

/// Decodes a canonical public id back into its sequence id.
///
/// # Errors
///
/// Rejects anything [`encode`] cannot produce: missing prefix, empty body,
/// leading zero, characters outside the alphabet, values above `i64::MAX`.
pub fn decode(public_id: &str) -> Result<i64, PublicIdError> {
    let body = public_id
        .strip_prefix(PREFIX)
        .ok_or(PublicIdError::MissingPrefix)?;

    if body.is_empty() {
        return Err(PublicIdError::Empty);
    }
    if body.starts_with('0') {
        return Err(PublicIdError::LeadingZero);
    }

    body.chars().try_fold(0i64, |acc, c| {
        let digit = digit_value(c).ok_or(PublicIdError::InvalidDigit(c))?;
        acc.checked_mul(62)
            .and_then(|v| v.checked_add(digit))
            .ok_or(PublicIdError::Overflow)
    })
}

fn digit_value(c: char) -> Option<i64> {
    match c {
        '0'..='9' => Some(c as i64 - '0' as i64),
        'a'..='z' => Some(c as i64 - 'a' as i64 + 10),
        'A'..='Z' => Some(c as i64 - 'A' as i64 + 36),
        _ => None,
    }
}
