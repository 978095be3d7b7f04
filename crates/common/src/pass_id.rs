use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Digits in a freshly generated identifier.
pub const SHORT_DIGITS: u32 = 4;

/// Digits used once short identifiers keep colliding.
pub const WIDE_DIGITS: u32 = 8;

/// Human-readable pass identifier, `<PREFIX>-<digits>` (e.g. `KAIROS-1234`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(String);

impl PassId {
    /// Generate a random identifier with the given prefix and digit count.
    pub fn generate(prefix: &str, digits: u32) -> Self {
        let modulus = 10u128.pow(digits);
        let number = Uuid::new_v4().as_u128() % modulus;
        Self(format!(
            "{}-{:0width$}",
            prefix.to_ascii_uppercase(),
            number,
            width = digits as usize
        ))
    }

    /// Parse an identifier, accepting any case for the prefix.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (prefix, digits) = value.rsplit_once('-')?;

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        if digits.len() < SHORT_DIGITS as usize || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(Self(format!("{}-{}", prefix.to_ascii_uppercase(), digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PassId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_matches_pattern() {
        for _ in 0..50 {
            let id = PassId::generate("kairos", SHORT_DIGITS);
            let (prefix, digits) = id.as_str().split_once('-').unwrap();
            assert_eq!(prefix, "KAIROS");
            assert_eq!(digits.len(), 4);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(PassId::parse(id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_wide_ids() {
        let id = PassId::generate("KAIROS", WIDE_DIGITS);
        assert_eq!(id.as_str().len(), "KAIROS-".len() + 8);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(PassId::parse("KAIROS").is_none());
        assert!(PassId::parse("KAIROS-12").is_none());
        assert!(PassId::parse("KAIROS-12a4").is_none());
        assert!(PassId::parse("-1234").is_none());
        assert_eq!(
            PassId::parse(" kairos-0042 ").map(PassId::into_string),
            Some("KAIROS-0042".to_string())
        );
    }
}
