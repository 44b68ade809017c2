//! # Uint256
//!
//! 256-bit unsigned integer used for exact intermediate arithmetic in the
//! reward feedback controller and for wire values that exceed `u64`.
//!
//! ## Encodings
//!
//! | Form | Layout |
//! |------|--------|
//! | SSZ | exactly 32 bytes, little-endian |
//! | JSON | quoted base-10 string, e.g. `"1000000000"` |
//!
//! The decimal form is canonical: `"0"` is the only string starting with `0`.
//!
//! JSON numbers are rejected: a bare number cannot carry 256 bits through
//! most JSON tooling without silent precision loss.

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Byte length of the SSZ encoding.
pub const UINT256_SSZ_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Uint256Error {
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty decimal string")]
    Empty,

    #[error("invalid decimal digit in {0:?}")]
    InvalidDigit(String),

    #[error("leading zero in {0:?}")]
    LeadingZero(String),

    #[error("value does not fit in 256 bits")]
    Overflow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint256(U256);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256(U256([0; 4]));
    pub const MAX: Uint256 = Uint256(U256([u64::MAX; 4]));

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    // ── SSZ ─────────────────────────────────────────────────────────────

    pub fn to_ssz_bytes(&self) -> [u8; UINT256_SSZ_LEN] {
        let mut out = [0u8; UINT256_SSZ_LEN];
        self.0.to_little_endian(&mut out);
        out
    }

    pub fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, Uint256Error> {
        if bytes.len() != UINT256_SSZ_LEN {
            return Err(Uint256Error::InvalidLength {
                expected: UINT256_SSZ_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Uint256(U256::from_little_endian(bytes)))
    }

    // ── ARITHMETIC ──────────────────────────────────────────────────────

    pub fn checked_add(self, rhs: Uint256) -> Option<Uint256> {
        self.0.checked_add(rhs.0).map(Uint256)
    }

    pub fn checked_sub(self, rhs: Uint256) -> Option<Uint256> {
        self.0.checked_sub(rhs.0).map(Uint256)
    }

    pub fn checked_mul(self, rhs: Uint256) -> Option<Uint256> {
        self.0.checked_mul(rhs.0).map(Uint256)
    }

    /// `None` on division by zero.
    pub fn checked_div(self, rhs: Uint256) -> Option<Uint256> {
        self.0.checked_div(rhs.0).map(Uint256)
    }

    pub fn abs_diff(self, rhs: Uint256) -> Uint256 {
        if self >= rhs {
            Uint256(self.0 - rhs.0)
        } else {
            Uint256(rhs.0 - self.0)
        }
    }
}

impl From<u64> for Uint256 {
    fn from(v: u64) -> Self {
        Uint256(U256::from(v))
    }
}

impl From<u128> for Uint256 {
    fn from(v: u128) -> Self {
        Uint256(U256::from(v))
    }
}

impl TryFrom<Uint256> for u64 {
    type Error = Uint256Error;

    fn try_from(v: Uint256) -> Result<u64, Uint256Error> {
        if v.0 > U256::from(u64::MAX) {
            return Err(Uint256Error::Overflow);
        }
        Ok(v.0.low_u64())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DECIMAL
// ════════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uint256 {
    type Err = Uint256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Uint256Error::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Uint256Error::InvalidDigit(s.to_string()));
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(Uint256Error::LeadingZero(s.to_string()));
        }
        // digits are validated above, so the only remaining failure is overflow
        U256::from_dec_str(s)
            .map(Uint256)
            .map_err(|_| Uint256Error::Overflow)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SERDE
// ════════════════════════════════════════════════════════════════════════════════

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct Uint256Visitor;

impl<'de> Visitor<'de> for Uint256Visitor {
    type Value = Uint256;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quoted base-10 string in [0, 2^256)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Uint256, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(Uint256Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_DEC: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";

    #[test]
    fn max_decimal_matches_constant() {
        assert_eq!(Uint256::MAX.to_string(), MAX_DEC);
        assert_eq!(MAX_DEC.parse::<Uint256>().unwrap(), Uint256::MAX);
    }

    #[test]
    fn ssz_is_little_endian() {
        let bytes = Uint256::from(1u64).to_ssz_bytes();
        assert_eq!(bytes[0], 1);
        assert!(bytes[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn ssz_wrong_length_rejected() {
        assert_eq!(
            Uint256::from_ssz_bytes(&[0u8; 31]),
            Err(Uint256Error::InvalidLength { expected: 32, actual: 31 })
        );
        assert!(Uint256::from_ssz_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn decimal_rejects_malformed() {
        assert_eq!("".parse::<Uint256>(), Err(Uint256Error::Empty));
        assert!(matches!("-1".parse::<Uint256>(), Err(Uint256Error::InvalidDigit(_))));
        assert!(matches!("0x10".parse::<Uint256>(), Err(Uint256Error::InvalidDigit(_))));
        assert!(matches!("1.5".parse::<Uint256>(), Err(Uint256Error::InvalidDigit(_))));
        assert!(matches!(" 1".parse::<Uint256>(), Err(Uint256Error::InvalidDigit(_))));
    }

    #[test]
    fn decimal_rejects_leading_zeros() {
        assert_eq!("0".parse::<Uint256>(), Ok(Uint256::ZERO));
        assert_eq!("007".parse::<Uint256>(), Err(Uint256Error::LeadingZero("007".into())));
        assert!(matches!("00".parse::<Uint256>(), Err(Uint256Error::LeadingZero(_))));
        assert!(serde_json::from_str::<Uint256>("\"0100\"").is_err());
    }

    #[test]
    fn decimal_rejects_two_pow_256() {
        let two_pow_256 =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert_eq!(two_pow_256.parse::<Uint256>(), Err(Uint256Error::Overflow));
    }

    #[test]
    fn json_is_quoted_decimal() {
        let v = Uint256::from(32_000_000_000u64);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"32000000000\"");
        let back: Uint256 = serde_json::from_str("\"32000000000\"").unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn json_rejects_unquoted_number() {
        assert!(serde_json::from_str::<Uint256>("32000000000").is_err());
        assert!(serde_json::from_str::<Uint256>("null").is_err());
        assert!(serde_json::from_str::<Uint256>("\"\"").is_err());
    }

    #[test]
    fn u64_conversion_bounds() {
        assert_eq!(u64::try_from(Uint256::from(u64::MAX)), Ok(u64::MAX));
        let over = Uint256::from(u64::MAX).checked_add(Uint256::from(1u64)).unwrap();
        assert_eq!(u64::try_from(over), Err(Uint256Error::Overflow));
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Uint256::from(10u64);
        let b = Uint256::from(3u64);
        assert_eq!(a.abs_diff(b), Uint256::from(7u64));
        assert_eq!(b.abs_diff(a), Uint256::from(7u64));
    }

    #[test]
    fn checked_div_by_zero_is_none() {
        assert!(Uint256::from(1u64).checked_div(Uint256::ZERO).is_none());
    }
}
