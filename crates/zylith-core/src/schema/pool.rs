//! Pool identification and fee tiers.

use serde::{Deserialize, Serialize};

/// Identifies a CLMM pool: `(token0, token1, fee, tick_spacing)`.
///
/// Token addresses are `0x`-hex on the wire; `token_0 < token_1` as
/// field-valued integers is validated before any pool operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolKey {
    /// Lower-ordered token address.
    pub token_0: String,
    /// Higher-ordered token address.
    pub token_1: String,
    /// Fee in hundredths of a bip.
    pub fee: u32,
    /// Tick spacing for the fee tier.
    pub tick_spacing: i32,
}

/// Predefined fee tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    /// 0.05%, tick spacing 10.
    Low,
    /// 0.30%, tick spacing 60.
    Medium,
    /// 1.00%, tick spacing 200.
    High,
}

impl FeeTier {
    /// Fee in hundredths of a bip.
    #[must_use]
    pub const fn fee(&self) -> u32 {
        match self {
            Self::Low => 500,
            Self::Medium => 3_000,
            Self::High => 10_000,
        }
    }

    /// Tick spacing for the tier.
    #[must_use]
    pub const fn tick_spacing(&self) -> i32 {
        match self {
            Self::Low => 10,
            Self::Medium => 60,
            Self::High => 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_constants() {
        assert_eq!(FeeTier::Low.fee(), 500);
        assert_eq!(FeeTier::Low.tick_spacing(), 10);
        assert_eq!(FeeTier::Medium.fee(), 3_000);
        assert_eq!(FeeTier::Medium.tick_spacing(), 60);
        assert_eq!(FeeTier::High.fee(), 10_000);
        assert_eq!(FeeTier::High.tick_spacing(), 200);
    }
}
