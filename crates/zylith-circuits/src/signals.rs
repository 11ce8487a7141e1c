//! Signal assignment containers.

use serde_json::{Map, Value};
use zylith_core::{Amount, CircuitKind, FieldElement, Tick};
use zylith_tree::MerkleProof;

use crate::error::BuildError;

/// The opening of a note commitment: what the prover must know to spend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOpening {
    /// Note secret.
    pub secret: FieldElement,
    /// Note nullifier.
    pub nullifier: FieldElement,
    /// Note amount.
    pub amount: Amount,
    /// Token address.
    pub token: FieldElement,
}

/// The opening of a position commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOpening {
    /// Position secret.
    pub secret: FieldElement,
    /// Position nullifier.
    pub nullifier: FieldElement,
    /// Signed lower tick.
    pub tick_lower: Tick,
    /// Signed upper tick.
    pub tick_upper: Tick,
    /// Position liquidity.
    pub liquidity: u128,
}

/// Fresh secrets for a note an operation will create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshSecrets {
    /// New note secret.
    pub secret: FieldElement,
    /// New note nullifier.
    pub nullifier: FieldElement,
}

/// A complete signal assignment for one circuit invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitInputs {
    /// The circuit these signals feed.
    pub circuit: CircuitKind,
    /// Named signal assignment (decimal strings; arrays for paths).
    pub signals: Map<String, Value>,
    /// Predicted public signals in the circuit's declared order.
    pub publics: Vec<FieldElement>,
}

impl CircuitInputs {
    /// Assemble and enforce the declared public count.
    ///
    /// # Errors
    /// Returns [`BuildError::PublicCount`] on a mismatch, which is a
    /// builder bug, not a user error.
    pub fn new(
        circuit: CircuitKind,
        signals: Map<String, Value>,
        publics: Vec<FieldElement>,
    ) -> Result<Self, BuildError> {
        let expected = circuit.public_count();
        if publics.len() != expected {
            return Err(BuildError::PublicCount {
                circuit,
                expected,
                actual: publics.len(),
            });
        }
        Ok(Self {
            circuit,
            signals,
            publics,
        })
    }
}

/// Helper for assembling signal maps in a fixed order.
#[derive(Debug, Default)]
pub struct SignalWriter {
    map: Map<String, Value>,
}

impl SignalWriter {
    /// Empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar signal.
    pub fn set(&mut self, name: &str, value: FieldElement) {
        self.map
            .insert(name.to_owned(), Value::String(value.to_decimal()));
    }

    /// Set a scalar signal from a raw decimal value.
    pub fn set_u64(&mut self, name: &str, value: u64) {
        self.map
            .insert(name.to_owned(), Value::String(value.to_string()));
    }

    /// Set a scalar signal from a u128 value.
    pub fn set_u128(&mut self, name: &str, value: u128) {
        self.map
            .insert(name.to_owned(), Value::String(value.to_string()));
    }

    /// Set the two path arrays from a Merkle proof.
    pub fn set_path(&mut self, elements_name: &str, indices_name: &str, proof: &MerkleProof) {
        let elements: Vec<Value> = proof
            .path_elements
            .iter()
            .map(|fe| Value::String(fe.to_decimal()))
            .collect();
        let indices: Vec<Value> = proof
            .path_indices
            .iter()
            .map(|bit| Value::String(bit.to_string()))
            .collect();
        self.map
            .insert(elements_name.to_owned(), Value::Array(elements));
        self.map
            .insert(indices_name.to_owned(), Value::Array(indices));
    }

    /// Finish the assignment.
    #[must_use]
    pub fn finish(self) -> Map<String, Value> {
        self.map
    }
}

/// Validate a path length against the deployment height.
///
/// # Errors
/// Returns [`BuildError::PathLength`] on a mismatch.
pub fn check_path(proof: &MerkleProof, height: usize) -> Result<(), BuildError> {
    if proof.path_elements.len() != height || proof.path_indices.len() != height {
        return Err(BuildError::PathLength {
            expected: height,
            actual: proof.path_elements.len(),
        });
    }
    Ok(())
}

/// Reject any pairwise-equal nullifiers.
///
/// # Errors
/// Returns [`BuildError::DuplicateNullifier`] when two coincide.
pub fn check_distinct(nullifiers: &[FieldElement]) -> Result<(), BuildError> {
    for (i, a) in nullifiers.iter().enumerate() {
        for b in nullifiers.iter().skip(i.saturating_add(1)) {
            if a == b {
                return Err(BuildError::DuplicateNullifier);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    #[test]
    fn distinctness() {
        let fe = FieldElement::from_u64;
        assert!(check_distinct(&[fe(1), fe(2), fe(3)]).is_ok());
        assert_eq!(
            check_distinct(&[fe(1), fe(2), fe(1)]),
            Err(BuildError::DuplicateNullifier)
        );
    }

    #[test]
    fn public_count_is_enforced() {
        let result = CircuitInputs::new(
            CircuitKind::Membership,
            Map::new(),
            vec![FieldElement::from_u64(1)],
        );
        assert_eq!(
            result,
            Err(BuildError::PublicCount {
                circuit: CircuitKind::Membership,
                expected: 2,
                actual: 1,
            })
        );
    }
}
