//! Burn circuit inputs.
//!
//! Public block (6): `[newCommitment0, newCommitment1, root,
//! positionNullifierHash, tickLower, tickUpper]` with ticks in offset form.
//!
//! A burn spends a position note and produces one output note per pool
//! token; the output amounts come from the pool (tokens owed for the burned
//! liquidity) and are supplied by the caller.

use zylith_core::commitment::{note_commitment, nullifier_hash, position_commitment};
use zylith_core::{Amount, CircuitKind, FieldElement, PoseidonHasher};
use zylith_tree::{MerkleProof, TREE_HEIGHT};

use crate::error::BuildError;
use crate::signals::{
    check_distinct, check_path, CircuitInputs, FreshSecrets, PositionOpening, SignalWriter,
};

/// Outcome of a burn build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnBuild {
    /// The signal assignment.
    pub inputs: CircuitInputs,
    /// Commitment of the token0 output note.
    pub new_commitment_0: FieldElement,
    /// Commitment of the token1 output note.
    pub new_commitment_1: FieldElement,
}

/// Build the burn witness.
///
/// # Errors
/// Rejects unordered tokens, non-distinct nullifiers (position plus the two
/// outputs), zero amounts/liquidity and malformed paths.
#[allow(
    clippy::too_many_arguments,
    reason = "The burn circuit genuinely takes this many distinct inputs"
)]
pub fn burn_inputs(
    hasher: &PoseidonHasher,
    position: &PositionOpening,
    proof: &MerkleProof,
    token0: FieldElement,
    token1: FieldElement,
    amount0: &Amount,
    amount1: &Amount,
    output0: &FreshSecrets,
    output1: &FreshSecrets,
) -> Result<BurnBuild, BuildError> {
    if token0 >= token1 {
        return Err(BuildError::TokenOrder);
    }
    if position.liquidity == 0 {
        return Err(BuildError::ZeroLiquidity);
    }
    if amount0.is_zero() || amount1.is_zero() {
        return Err(BuildError::ZeroAmount);
    }
    check_distinct(&[position.nullifier, output0.nullifier, output1.nullifier])?;
    check_path(proof, TREE_HEIGHT)?;

    let tick_lower = position.tick_lower.to_offset();
    let tick_upper = position.tick_upper.to_offset();
    let nh = nullifier_hash(hasher, position.nullifier)?;
    // Recomputed so a mismatched opening fails here, not in the prover.
    let pos_commitment = position_commitment(
        hasher,
        position.secret,
        position.nullifier,
        tick_lower,
        tick_upper,
        position.liquidity,
    )?;
    let new_commitment_0 =
        note_commitment(hasher, output0.secret, output0.nullifier, amount0, token0)?;
    let new_commitment_1 =
        note_commitment(hasher, output1.secret, output1.nullifier, amount1, token1)?;

    let mut signals = SignalWriter::new();
    signals.set("root", proof.root);
    signals.set("positionNullifierHash", nh);
    signals.set("newCommitment0", new_commitment_0);
    signals.set("newCommitment1", new_commitment_1);
    signals.set_u64("tickLower", u64::from(tick_lower.get()));
    signals.set_u64("tickUpper", u64::from(tick_upper.get()));
    // Private - position being burned
    signals.set("positionSecret", position.secret);
    signals.set("positionNullifier", position.nullifier);
    signals.set_u128("liquidity", position.liquidity);
    signals.set("positionCommitment", pos_commitment);
    signals.set_path("pathElements", "pathIndices", proof);
    // Private - output notes
    signals.set("token0", token0);
    signals.set("token1", token1);
    signals.set("amount0_low", amount0.low_field());
    signals.set("amount0_high", amount0.high_field());
    signals.set("amount1_low", amount1.low_field());
    signals.set("amount1_high", amount1.high_field());
    signals.set("outputSecret0", output0.secret);
    signals.set("outputNullifier0", output0.nullifier);
    signals.set("outputSecret1", output1.secret);
    signals.set("outputNullifier1", output1.nullifier);

    let inputs = CircuitInputs::new(
        CircuitKind::Burn,
        signals.finish(),
        vec![
            new_commitment_0,
            new_commitment_1,
            proof.root,
            nh,
            tick_lower.field(),
            tick_upper.field(),
        ],
    )?;

    Ok(BurnBuild {
        inputs,
        new_commitment_0,
        new_commitment_1,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use std::sync::Arc;

    use zylith_core::Tick;
    use zylith_tree::LeanImt;

    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    fn fresh(s: u64, n: u64) -> FreshSecrets {
        FreshSecrets {
            secret: fe(s),
            nullifier: fe(n),
        }
    }

    struct Fixture {
        hasher: Arc<PoseidonHasher>,
        position: PositionOpening,
        proof: MerkleProof,
    }

    fn fixture() -> Fixture {
        let hasher = Arc::new(PoseidonHasher::new().unwrap());
        let position = PositionOpening {
            secret: fe(5),
            nullifier: fe(6),
            tick_lower: Tick::new(-1000).unwrap(),
            tick_upper: Tick::new(1000).unwrap(),
            liquidity: 500_000,
        };
        let commitment = position_commitment(
            &hasher,
            position.secret,
            position.nullifier,
            position.tick_lower.to_offset(),
            position.tick_upper.to_offset(),
            position.liquidity,
        )
        .unwrap();
        let mut tree = LeanImt::with_default_height(Arc::clone(&hasher));
        tree.insert(commitment).unwrap();
        let proof = tree.proof(0).unwrap();
        Fixture {
            hasher,
            position,
            proof,
        }
    }

    #[test]
    fn builds_six_publics() {
        let f = fixture();
        let build = burn_inputs(
            &f.hasher,
            &f.position,
            &f.proof,
            fe(100),
            fe(200),
            &Amount::from_u128(300_000),
            &Amount::from_u128(600_000),
            &fresh(21, 22),
            &fresh(23, 24),
        )
        .unwrap();

        assert_eq!(build.inputs.publics.len(), 6);
        assert_eq!(
            build.inputs.publics.first().copied().unwrap(),
            build.new_commitment_0
        );
        assert_eq!(
            build.inputs.publics.get(3).copied().unwrap(),
            f.hasher.hash(&[fe(6)]).unwrap()
        );
    }

    #[test]
    fn rejects_position_nullifier_reuse() {
        let f = fixture();
        assert_eq!(
            burn_inputs(
                &f.hasher,
                &f.position,
                &f.proof,
                fe(100),
                fe(200),
                &Amount::from_u128(1),
                &Amount::from_u128(1),
                &fresh(21, 6),
                &fresh(23, 24),
            ),
            Err(BuildError::DuplicateNullifier)
        );
    }

    #[test]
    fn rejects_unordered_tokens() {
        let f = fixture();
        assert_eq!(
            burn_inputs(
                &f.hasher,
                &f.position,
                &f.proof,
                fe(200),
                fe(100),
                &Amount::from_u128(1),
                &Amount::from_u128(1),
                &fresh(21, 22),
                &fresh(23, 24),
            ),
            Err(BuildError::TokenOrder)
        );
    }
}
