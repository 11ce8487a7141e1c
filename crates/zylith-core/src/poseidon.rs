//! Poseidon hashing handle.
//!
//! Wraps the circomlib BN254 parameterization of Poseidon for arities 1..=6.
//! The handle is constructed explicitly and passed into every caller; there
//! is no global hasher. Construction is fail-fast: all arities are
//! instantiated eagerly so a bad parameter set surfaces at startup, not at
//! the first hash.

use std::fmt;
use std::sync::Mutex;

use ark_bn254::Fr;
use light_poseidon::{Poseidon as LightPoseidon, PoseidonHasher as _};

use crate::error::CoreError;
use crate::field::FieldElement;

/// Largest input count accepted by [`PoseidonHasher::hash`].
pub const MAX_ARITY: usize = 6;

/// A reusable Poseidon hasher for arities 1..=6.
///
/// Identical output to circomlib's `poseidon` over BN254; any parameter
/// deviation breaks circuit compatibility.
pub struct PoseidonHasher {
    // One instance per arity; light-poseidon hashing needs `&mut`.
    instances: Mutex<Vec<LightPoseidon<Fr>>>,
}

impl PoseidonHasher {
    /// Instantiate hashers for every supported arity.
    ///
    /// # Errors
    /// Returns [`CoreError::Poseidon`] when parameter construction fails for
    /// any arity.
    pub fn new() -> Result<Self, CoreError> {
        let mut instances = Vec::with_capacity(MAX_ARITY);
        for arity in 1..=MAX_ARITY {
            let instance = LightPoseidon::<Fr>::new_circom(arity)
                .map_err(|e| CoreError::Poseidon(e.to_string()))?;
            instances.push(instance);
        }
        Ok(Self {
            instances: Mutex::new(instances),
        })
    }

    /// Hash 1..=6 field elements to a single field element.
    ///
    /// Deterministic and bit-exact across implementations; the inputs are
    /// canonical by construction of [`FieldElement`].
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedArity`] for an input count outside
    /// 1..=6 and [`CoreError::Poseidon`] on permutation failure.
    pub fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement, CoreError> {
        if inputs.is_empty() || inputs.len() > MAX_ARITY {
            return Err(CoreError::UnsupportedArity(inputs.len()));
        }
        let frs: Vec<Fr> = inputs.iter().map(FieldElement::fr).collect();
        let mut instances = self
            .instances
            .lock()
            .map_err(|_| CoreError::Poseidon("hasher lock poisoned".into()))?;
        let index = inputs.len().saturating_sub(1);
        let instance = instances
            .get_mut(index)
            .ok_or(CoreError::UnsupportedArity(inputs.len()))?;
        let out = instance
            .hash(&frs)
            .map_err(|e| CoreError::Poseidon(e.to_string()))?;
        Ok(FieldElement::from(out))
    }
}

impl fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseidonHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn deterministic_across_handles() {
        let a = PoseidonHasher::new().unwrap();
        let b = PoseidonHasher::new().unwrap();
        let inputs = [fe(1), fe(2)];
        assert_eq!(a.hash(&inputs).unwrap(), b.hash(&inputs).unwrap());
    }

    #[test]
    fn circomlib_vector_hash_of_one_two() {
        // poseidon([1, 2]) from circomlib's reference implementation.
        let hasher = PoseidonHasher::new().unwrap();
        let out = hasher.hash(&[fe(1), fe(2)]).unwrap();
        assert_eq!(
            out.to_decimal(),
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
        );
    }

    #[test]
    fn circomlib_vector_hash_of_one() {
        // poseidon([1]) from circomlib's reference implementation.
        let hasher = PoseidonHasher::new().unwrap();
        let out = hasher.hash(&[fe(1)]).unwrap();
        assert_eq!(
            out.to_decimal(),
            "18586133768512220936620570745912940619677854269274689475585506675881198879027"
        );
    }

    #[test]
    fn rejects_unsupported_arities() {
        let hasher = PoseidonHasher::new().unwrap();
        assert_eq!(hasher.hash(&[]), Err(CoreError::UnsupportedArity(0)));
        let seven = vec![fe(1); 7];
        assert_eq!(hasher.hash(&seven), Err(CoreError::UnsupportedArity(7)));
    }

    #[test]
    fn arity_changes_output() {
        let hasher = PoseidonHasher::new().unwrap();
        let one = hasher.hash(&[fe(5)]).unwrap();
        let two = hasher.hash(&[fe(5), FieldElement::ZERO]).unwrap();
        assert_ne!(one, two);
    }
}
