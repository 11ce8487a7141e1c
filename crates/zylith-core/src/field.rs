//! BN254 scalar field wrapper with checked wire conversions.
//!
//! Internal APIs exchange [`FieldElement`] values; decimal and hex strings
//! appear only at wire boundaries. Construction from strings rejects anything
//! outside `[0, p)` before the value ever reaches a hash.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup as _, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// BN254 scalar field modulus as a decimal string.
pub const FIELD_MODULUS_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

static FIELD_MODULUS: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::from_str(FIELD_MODULUS_DEC).expect("modulus constant is a decimal integer")
});

/// A canonical BN254 scalar.
///
/// Every value of this type is already reduced; constructors that accept
/// external input enforce the bound instead of silently reducing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self(Fr::ZERO);

    /// Parse a decimal string, rejecting values `>= p`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidField`] for empty, non-decimal or
    /// out-of-range input.
    pub fn from_decimal(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::InvalidField("empty string"));
        }
        let value = BigUint::from_str(s)
            .map_err(|_| CoreError::InvalidField("not a decimal integer"))?;
        Self::from_biguint(&value)
    }

    /// Parse a `0x`-prefixed hex string (addresses, roots), rejecting `>= p`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidField`] for a missing prefix, non-hex
    /// digits or out-of-range input.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(CoreError::InvalidField("missing 0x prefix"))?;
        if digits.is_empty() {
            return Err(CoreError::InvalidField("empty hex string"));
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or(CoreError::InvalidField("not a hex integer"))?;
        Self::from_biguint(&value)
    }

    /// Convert from an arbitrary-precision integer, rejecting values `>= p`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidField`] when the value is out of range.
    pub fn from_biguint(value: &BigUint) -> Result<Self, CoreError> {
        if value >= &FIELD_MODULUS {
            return Err(CoreError::InvalidField("exceeds field modulus"));
        }
        Ok(Self(Fr::from(value.clone())))
    }

    /// Lift a `u64`. Always canonical.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Lift a `u128`. Always canonical.
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        Self(Fr::from(value))
    }

    /// Sample a uniformly random scalar.
    #[must_use]
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        use ark_std::UniformRand as _;
        Self(Fr::rand(rng))
    }

    /// The underlying arkworks scalar.
    #[must_use]
    pub const fn fr(&self) -> Fr {
        self.0
    }

    /// Canonical integer representation.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        self.0.into_bigint().into()
    }

    /// Canonical decimal string (wire form for field elements).
    #[must_use]
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_string()
    }

    /// `0x`-prefixed, zero-padded hex string (wire form for addresses/roots).
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{:064x}", self.to_biguint())
    }

    /// Whether this is the zero scalar.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        use ark_ff::Zero as _;
        self.0.is_zero()
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl PartialOrd for FieldElement {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldElement {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.into_bigint().cmp(&other.0.into_bigint())
    }
}

impl FromStr for FieldElement {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for fields carried as `0x`-hex on the wire.
///
/// Usage: `#[serde(with = "zylith_core::field::hex_repr")]`.
pub mod hex_repr {
    use serde::{Deserialize as _, Deserializer, Serializer};

    use super::FieldElement;

    /// Serialize as `0x`-prefixed hex.
    ///
    /// # Errors
    /// Never fails for a canonical element.
    pub fn serialize<S: Serializer>(
        value: &FieldElement,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_hex())
    }

    /// Deserialize from `0x`-prefixed hex.
    ///
    /// # Errors
    /// Fails on malformed or out-of-range input.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FieldElement, D::Error> {
        let s = String::deserialize(deserializer)?;
        FieldElement::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    mod from_decimal {
        use super::*;

        #[test]
        fn round_trips() {
            for s in ["0", "1", "12345", "340282366920938463463374607431768211456"] {
                let fe = FieldElement::from_decimal(s).unwrap();
                assert_eq!(fe.to_decimal(), s);
            }
        }

        #[test]
        fn rejects_modulus_and_above() {
            assert_eq!(
                FieldElement::from_decimal(FIELD_MODULUS_DEC),
                Err(CoreError::InvalidField("exceeds field modulus"))
            );
        }

        #[test]
        fn rejects_garbage() {
            assert!(FieldElement::from_decimal("").is_err());
            assert!(FieldElement::from_decimal("-1").is_err());
            assert!(FieldElement::from_decimal("12a").is_err());
        }

        #[test]
        fn max_canonical_value_accepted() {
            use num_bigint::BigUint;
            use std::str::FromStr as _;
            let p = BigUint::from_str(FIELD_MODULUS_DEC).unwrap();
            let max = &p - 1u32;
            let fe = FieldElement::from_decimal(&max.to_string()).unwrap();
            assert_eq!(fe.to_decimal(), max.to_string());
        }
    }

    mod hex {
        use super::*;

        #[test]
        fn round_trips() {
            let fe = FieldElement::from_hex("0xdeadbeef").unwrap();
            assert_eq!(fe.to_decimal(), "3735928559");
            assert!(fe.to_hex().ends_with("deadbeef"));
            assert_eq!(fe.to_hex().len(), 66);
        }

        #[test]
        fn requires_prefix() {
            assert_eq!(
                FieldElement::from_hex("deadbeef"),
                Err(CoreError::InvalidField("missing 0x prefix"))
            );
        }
    }

    #[test]
    fn ordering_is_integer_ordering() {
        let small = FieldElement::from_u64(5);
        let big = FieldElement::from_u64(1 << 40);
        assert!(small < big);
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let fe = FieldElement::from_u64(42);
        let json = serde_json::to_string(&fe).unwrap();
        assert_eq!(json, "\"42\"");
        let back: FieldElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fe);
    }
}
