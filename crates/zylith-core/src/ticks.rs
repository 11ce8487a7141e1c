//! Signed and offset tick representations.
//!
//! Ticks are signed on the wire and in vault storage; circuits and
//! commitments consume the unsigned offset form (`tick + 887272`). The
//! transform lives here and nowhere else: commitment code accepts only
//! [`OffsetTick`], so an unshifted signed tick cannot reach a hash.

use std::fmt;

use crate::error::CoreError;
use crate::field::FieldElement;

/// Shift applied to signed ticks before circuit consumption.
pub const TICK_OFFSET: i32 = 887_272;
/// Smallest representable tick.
pub const MIN_TICK: i32 = -887_272;
/// Largest representable tick.
pub const MAX_TICK: i32 = 887_272;

/// A validated signed tick in `[-887272, 887272]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Tick(i32);

/// A tick in offset (unsigned) form, in `[0, 1774544]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OffsetTick(u32);

impl Tick {
    /// Validate a raw signed tick.
    ///
    /// # Errors
    /// Returns [`CoreError::TickOutOfRange`] outside `[-887272, 887272]`.
    pub fn new(value: i32) -> Result<Self, CoreError> {
        if !(MIN_TICK..=MAX_TICK).contains(&value) {
            return Err(CoreError::TickOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// The raw signed value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Shift into offset form.
    #[must_use]
    pub fn to_offset(&self) -> OffsetTick {
        // In range by construction: MIN_TICK + TICK_OFFSET == 0.
        #[allow(
            clippy::arithmetic_side_effects,
            reason = "value is in [-887272, 887272], the sum is in [0, 1774544]"
        )]
        let shifted = self.0 + TICK_OFFSET;
        OffsetTick(shifted.unsigned_abs())
    }
}

impl OffsetTick {
    /// The raw offset value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Shift back into signed form.
    #[must_use]
    pub fn to_signed(&self) -> Tick {
        #[allow(
            clippy::arithmetic_side_effects,
            clippy::cast_possible_wrap,
            reason = "offset values are in [0, 1774544], the difference is in tick range"
        )]
        let signed = i64::from(self.0) - i64::from(TICK_OFFSET);
        // i64 in [-887272, 887272] always fits i32.
        Tick(i32::try_from(signed).unwrap_or(MIN_TICK))
    }

    /// Offset value as a circuit signal.
    #[must_use]
    pub fn field(&self) -> FieldElement {
        FieldElement::from_u64(u64::from(self.0))
    }
}

impl serde::Serialize for Tick {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Tick {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <i32 as serde::Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OffsetTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a `(tick_lower, tick_upper)` pair.
///
/// # Errors
/// Returns [`CoreError::TickOutOfRange`] when either tick is out of range or
/// the range is empty (`lower >= upper`).
pub fn tick_range(lower: i32, upper: i32) -> Result<(Tick, Tick), CoreError> {
    let lower = Tick::new(lower)?;
    let upper = Tick::new(upper)?;
    if lower >= upper {
        return Err(CoreError::TickOutOfRange(lower.get()));
    }
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::arithmetic_side_effects,
        reason = "Tests"
    )]

    use super::*;

    #[test]
    fn offset_round_trip_over_boundaries() {
        for value in [MIN_TICK, -1000, -1, 0, 1, 1000, MAX_TICK] {
            let tick = Tick::new(value).unwrap();
            assert_eq!(tick.to_offset().to_signed(), tick);
        }
    }

    #[test]
    fn offset_endpoints() {
        assert_eq!(Tick::new(MIN_TICK).unwrap().to_offset().get(), 0);
        assert_eq!(Tick::new(MAX_TICK).unwrap().to_offset().get(), 1_774_544);
        assert_eq!(Tick::new(0).unwrap().to_offset().get(), 887_272);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(Tick::new(MIN_TICK - 1).is_err());
        assert!(Tick::new(MAX_TICK + 1).is_err());
    }

    #[test]
    fn range_requires_lower_below_upper() {
        assert!(tick_range(-1000, 1000).is_ok());
        assert!(tick_range(1000, 1000).is_err());
        assert!(tick_range(1000, -1000).is_err());
    }
}
