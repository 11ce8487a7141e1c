//! 256-bit unsigned amounts.
//!
//! Circuits consume amounts as two u128 halves (`low = value mod 2^128`,
//! `high = value >> 128`); the wire carries each half as a decimal string.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "BigUint arithmetic is arbitrary precision and cannot overflow"
)]

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;

use crate::error::CoreError;
use crate::field::FieldElement;

/// A u256 amount as (low, high) u128 halves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    high: u128,
    low: u128,
}

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self { high: 0, low: 0 };

    /// Assemble from u128 halves.
    #[must_use]
    pub const fn from_halves(low: u128, high: u128) -> Self {
        Self { high, low }
    }

    /// Lift a u128 value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self {
            high: 0,
            low: value,
        }
    }

    /// Parse a full-width decimal string.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidAmount`] for non-decimal input and
    /// [`CoreError::AmountOverflow`] above `2^256 - 1`.
    pub fn from_decimal(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::InvalidAmount("empty string"));
        }
        let value =
            BigUint::from_str(s).map_err(|_| CoreError::InvalidAmount("not a decimal integer"))?;
        Self::from_biguint(&value)
    }

    /// Split an arbitrary-precision value into halves.
    ///
    /// # Errors
    /// Returns [`CoreError::AmountOverflow`] above `2^256 - 1`.
    pub fn from_biguint(value: &BigUint) -> Result<Self, CoreError> {
        if value.bits() > 256 {
            return Err(CoreError::AmountOverflow);
        }
        let mask: BigUint = (BigUint::from(1u8) << 128u32) - 1u8;
        let low: u128 = (value & &mask)
            .try_into()
            .map_err(|_| CoreError::AmountOverflow)?;
        let high: u128 = (value >> 128u32)
            .try_into()
            .map_err(|_| CoreError::AmountOverflow)?;
        Ok(Self { high, low })
    }

    /// Recombine the halves into one integer.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        (BigUint::from(self.high) << 128u32) | BigUint::from(self.low)
    }

    /// Full-width decimal string.
    #[must_use]
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_string()
    }

    /// Low half (`value mod 2^128`).
    #[must_use]
    pub const fn low(&self) -> u128 {
        self.low
    }

    /// High half (`value >> 128`).
    #[must_use]
    pub const fn high(&self) -> u128 {
        self.high
    }

    /// Low half as a field element.
    #[must_use]
    pub fn low_field(&self) -> FieldElement {
        FieldElement::from_u128(self.low)
    }

    /// High half as a field element.
    #[must_use]
    pub fn high_field(&self) -> FieldElement {
        FieldElement::from_u128(self.high)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Whether the amount fits in 128 bits.
    #[must_use]
    pub const fn fits_u128(&self) -> bool {
        self.high == 0
    }

    /// Checked subtraction across the full 256-bit range.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let (low, borrow) = self.low.overflowing_sub(other.low);
        let high = self
            .high
            .checked_sub(other.high)?
            .checked_sub(u128::from(borrow))?;
        Some(Self { high, low })
    }

    /// Checked addition across the full 256-bit range.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let (low, carry) = self.low.overflowing_add(other.low);
        let high = self
            .high
            .checked_add(other.high)?
            .checked_add(u128::from(carry))?;
        Some(Self { high, low })
    }
}

impl serde::Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    #[test]
    fn split_combine_round_trip() {
        let cases = [
            BigUint::from(0u8),
            BigUint::from(1u8),
            BigUint::from(u128::MAX),
            BigUint::from(u128::MAX) + 1u8,
            (BigUint::from(1u8) << 256u32) - 1u8,
        ];
        for value in cases {
            let amount = Amount::from_biguint(&value).unwrap();
            assert_eq!(amount.to_biguint(), value);
        }
    }

    #[test]
    fn rejects_257_bits() {
        let too_big = BigUint::from(1u8) << 256u32;
        assert_eq!(
            Amount::from_biguint(&too_big),
            Err(CoreError::AmountOverflow)
        );
    }

    #[test]
    fn halves_are_mod_and_shift() {
        let value = (BigUint::from(7u8) << 128u32) + 9u8;
        let amount = Amount::from_biguint(&value).unwrap();
        assert_eq!(amount.low(), 9);
        assert_eq!(amount.high(), 7);
    }

    #[test]
    fn decimal_round_trip() {
        let amount = Amount::from_decimal("1000000").unwrap();
        assert_eq!(amount.to_decimal(), "1000000");
        assert_eq!(amount.low(), 1_000_000);
        assert!(amount.fits_u128());
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn sub_borrows_across_halves() {
            let a = Amount::from_halves(0, 1); // 2^128
            let b = Amount::from_u128(1);
            let diff = a.checked_sub(&b).unwrap();
            assert_eq!(diff, Amount::from_u128(u128::MAX));
        }

        #[test]
        fn sub_underflow_is_none() {
            let a = Amount::from_u128(1);
            let b = Amount::from_u128(2);
            assert!(a.checked_sub(&b).is_none());
        }

        #[test]
        fn add_carries_across_halves() {
            let a = Amount::from_u128(u128::MAX);
            let b = Amount::from_u128(1);
            assert_eq!(a.checked_add(&b).unwrap(), Amount::from_halves(0, 1));
        }

        #[test]
        fn add_overflow_is_none() {
            let max = Amount::from_halves(u128::MAX, u128::MAX);
            assert!(max.checked_add(&Amount::from_u128(1)).is_none());
        }
    }
}
