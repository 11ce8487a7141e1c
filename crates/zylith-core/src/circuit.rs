//! Circuit identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four shielded-operation circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitKind {
    /// Single-note membership proof (withdraw).
    Membership,
    /// Swap: one input note, output + change commitments.
    Swap,
    /// Mint LP: two input notes, position + two change commitments.
    Mint,
    /// Burn LP: one position note, two output commitments.
    Burn,
}

impl CircuitKind {
    /// All circuits, in artifact-loading order.
    pub const ALL: [Self; 4] = [Self::Membership, Self::Swap, Self::Mint, Self::Burn];

    /// Artifact/wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Membership => "membership",
            Self::Swap => "swap",
            Self::Mint => "mint",
            Self::Burn => "burn",
        }
    }

    /// Number of public signals the circuit declares.
    #[must_use]
    pub const fn public_count(&self) -> usize {
        match self {
            Self::Membership => 2,
            Self::Swap => 8,
            Self::Mint => 8,
            Self::Burn => 6,
        }
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitKind {
    type Err = UnknownCircuit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "membership" => Ok(Self::Membership),
            "swap" => Ok(Self::Swap),
            "mint" => Ok(Self::Mint),
            "burn" => Ok(Self::Burn),
            other => Err(UnknownCircuit(other.to_owned())),
        }
    }
}

/// Parse error for circuit names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown circuit: {0}")]
pub struct UnknownCircuit(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in CircuitKind::ALL {
            assert_eq!(kind.as_str().parse::<CircuitKind>(), Ok(kind));
        }
        assert!("groth".parse::<CircuitKind>().is_err());
    }

    #[test]
    fn public_counts() {
        assert_eq!(CircuitKind::Membership.public_count(), 2);
        assert_eq!(CircuitKind::Swap.public_count(), 8);
        assert_eq!(CircuitKind::Mint.public_count(), 8);
        assert_eq!(CircuitKind::Burn.public_count(), 6);
    }
}
