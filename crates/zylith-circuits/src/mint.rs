//! Mint circuit inputs.
//!
//! Public block (8): `[changeCommitment0, changeCommitment1, root,
//! nullifierHash0, nullifierHash1, positionCommitment, tickLower,
//! tickUpper]` with ticks in offset form.
//!
//! A mint consumes one note of each pool token in the same tree snapshot and
//! produces a position commitment plus up to two change commitments.

use zylith_core::commitment::{note_commitment, nullifier_hash, position_commitment};
use zylith_core::{Amount, CircuitKind, FieldElement, PoseidonHasher};
use zylith_tree::{MerkleProof, TREE_HEIGHT};

use crate::error::BuildError;
use crate::signals::{
    check_distinct, check_path, CircuitInputs, FreshSecrets, NoteOpening, PositionOpening,
    SignalWriter,
};

/// Outcome of a mint build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintBuild {
    /// The signal assignment.
    pub inputs: CircuitInputs,
    /// Commitment of the new position.
    pub position_commitment: FieldElement,
    /// Commitment of the token0 change note; zero when fully consumed.
    pub change_commitment_0: FieldElement,
    /// Commitment of the token1 change note; zero when fully consumed.
    pub change_commitment_1: FieldElement,
    /// Token0 change amount.
    pub change_amount_0: Amount,
    /// Token1 change amount.
    pub change_amount_1: Amount,
}

/// Build the mint witness.
///
/// Both Merkle proofs must come from the same tree snapshot; the five
/// nullifiers (two inputs, position, two change notes) must be pairwise
/// distinct; `note0`/`note1` must carry `token0 < token1`.
///
/// # Errors
/// Rejects ordering/distinctness/amount violations before any hashing of
/// the witness begins.
#[allow(
    clippy::too_many_arguments,
    reason = "The mint circuit genuinely takes this many distinct inputs"
)]
pub fn mint_inputs(
    hasher: &PoseidonHasher,
    note0: &NoteOpening,
    proof0: &MerkleProof,
    note1: &NoteOpening,
    proof1: &MerkleProof,
    position: &PositionOpening,
    amount0: &Amount,
    amount1: &Amount,
    change0: &FreshSecrets,
    change1: &FreshSecrets,
) -> Result<MintBuild, BuildError> {
    if note0.token >= note1.token {
        return Err(BuildError::TokenOrder);
    }
    if position.liquidity == 0 {
        return Err(BuildError::ZeroLiquidity);
    }
    if amount0.is_zero() || amount1.is_zero() {
        return Err(BuildError::ZeroAmount);
    }
    check_distinct(&[
        note0.nullifier,
        note1.nullifier,
        position.nullifier,
        change0.nullifier,
        change1.nullifier,
    ])?;
    check_path(proof0, TREE_HEIGHT)?;
    check_path(proof1, TREE_HEIGHT)?;
    if proof0.root != proof1.root {
        return Err(BuildError::RootMismatch);
    }

    let change_amount_0 = note0
        .amount
        .checked_sub(amount0)
        .ok_or(BuildError::AmountExceedsBalance)?;
    let change_amount_1 = note1
        .amount
        .checked_sub(amount1)
        .ok_or(BuildError::AmountExceedsBalance)?;

    let nh0 = nullifier_hash(hasher, note0.nullifier)?;
    let nh1 = nullifier_hash(hasher, note1.nullifier)?;
    let tick_lower = position.tick_lower.to_offset();
    let tick_upper = position.tick_upper.to_offset();
    let pos_commitment = position_commitment(
        hasher,
        position.secret,
        position.nullifier,
        tick_lower,
        tick_upper,
        position.liquidity,
    )?;
    let change_commitment_0 = if change_amount_0.is_zero() {
        FieldElement::ZERO
    } else {
        note_commitment(
            hasher,
            change0.secret,
            change0.nullifier,
            &change_amount_0,
            note0.token,
        )?
    };
    let change_commitment_1 = if change_amount_1.is_zero() {
        FieldElement::ZERO
    } else {
        note_commitment(
            hasher,
            change1.secret,
            change1.nullifier,
            &change_amount_1,
            note1.token,
        )?
    };

    let mut signals = SignalWriter::new();
    signals.set("root", proof0.root);
    signals.set("nullifierHash0", nh0);
    signals.set("nullifierHash1", nh1);
    signals.set("positionCommitment", pos_commitment);
    signals.set_u64("tickLower", u64::from(tick_lower.get()));
    signals.set_u64("tickUpper", u64::from(tick_upper.get()));
    // Private - input note 0
    signals.set("secret0", note0.secret);
    signals.set("nullifier0", note0.nullifier);
    signals.set("balance0_low", note0.amount.low_field());
    signals.set("balance0_high", note0.amount.high_field());
    signals.set("token0", note0.token);
    signals.set_path("pathElements0", "pathIndices0", proof0);
    // Private - input note 1
    signals.set("secret1", note1.secret);
    signals.set("nullifier1", note1.nullifier);
    signals.set("balance1_low", note1.amount.low_field());
    signals.set("balance1_high", note1.amount.high_field());
    signals.set("token1", note1.token);
    signals.set_path("pathElements1", "pathIndices1", proof1);
    // Private - position
    signals.set("positionSecret", position.secret);
    signals.set("positionNullifier", position.nullifier);
    signals.set_u128("liquidity", position.liquidity);
    signals.set("amount0_low", amount0.low_field());
    signals.set("amount0_high", amount0.high_field());
    signals.set("amount1_low", amount1.low_field());
    signals.set("amount1_high", amount1.high_field());
    // Private - change notes
    signals.set("changeSecret0", change0.secret);
    signals.set("changeNullifier0", change0.nullifier);
    signals.set("changeSecret1", change1.secret);
    signals.set("changeNullifier1", change1.nullifier);

    let inputs = CircuitInputs::new(
        CircuitKind::Mint,
        signals.finish(),
        vec![
            change_commitment_0,
            change_commitment_1,
            proof0.root,
            nh0,
            nh1,
            pos_commitment,
            tick_lower.field(),
            tick_upper.field(),
        ],
    )?;

    Ok(MintBuild {
        inputs,
        position_commitment: pos_commitment,
        change_commitment_0,
        change_commitment_1,
        change_amount_0,
        change_amount_1,
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

    struct Fixture {
        hasher: Arc<PoseidonHasher>,
        note0: NoteOpening,
        note1: NoteOpening,
        proof0: MerkleProof,
        proof1: MerkleProof,
        position: PositionOpening,
    }

    fn fixture() -> Fixture {
        let hasher = Arc::new(PoseidonHasher::new().unwrap());
        let note0 = NoteOpening {
            secret: fe(1),
            nullifier: fe(2),
            amount: Amount::from_u128(1_000_000),
            token: fe(100),
        };
        let note1 = NoteOpening {
            secret: fe(3),
            nullifier: fe(4),
            amount: Amount::from_u128(2_000_000),
            token: fe(200),
        };
        let mut tree = LeanImt::with_default_height(Arc::clone(&hasher));
        let c0 = note_commitment(&hasher, note0.secret, note0.nullifier, &note0.amount, note0.token)
            .unwrap();
        let c1 = note_commitment(&hasher, note1.secret, note1.nullifier, &note1.amount, note1.token)
            .unwrap();
        tree.insert(c0).unwrap();
        tree.insert(c1).unwrap();
        let proof0 = tree.proof(0).unwrap();
        let proof1 = tree.proof(1).unwrap();
        let position = PositionOpening {
            secret: fe(5),
            nullifier: fe(6),
            tick_lower: Tick::new(-1000).unwrap(),
            tick_upper: Tick::new(1000).unwrap(),
            liquidity: 500_000,
        };
        Fixture {
            hasher,
            note0,
            note1,
            proof0,
            proof1,
            position,
        }
    }

    fn fresh(s: u64, n: u64) -> FreshSecrets {
        FreshSecrets {
            secret: fe(s),
            nullifier: fe(n),
        }
    }

    #[test]
    fn builds_eight_publics_with_change() {
        let f = fixture();
        let build = mint_inputs(
            &f.hasher,
            &f.note0,
            &f.proof0,
            &f.note1,
            &f.proof1,
            &f.position,
            &Amount::from_u128(300_000),
            &Amount::from_u128(600_000),
            &fresh(11, 12),
            &fresh(13, 14),
        )
        .unwrap();

        assert_eq!(build.inputs.publics.len(), 8);
        assert_eq!(build.change_amount_0, Amount::from_u128(700_000));
        assert_eq!(build.change_amount_1, Amount::from_u128(1_400_000));
        assert!(!build.change_commitment_0.is_zero());
        assert!(!build.change_commitment_1.is_zero());
        // Offset ticks in the public block.
        assert_eq!(
            build.inputs.publics.get(6).copied().unwrap(),
            fe(886_272)
        );
        assert_eq!(
            build.inputs.publics.get(7).copied().unwrap(),
            fe(888_272)
        );
    }

    #[test]
    fn rejects_unordered_tokens() {
        let f = fixture();
        let mut note0 = f.note0.clone();
        note0.token = fe(300);
        assert_eq!(
            mint_inputs(
                &f.hasher,
                &note0,
                &f.proof0,
                &f.note1,
                &f.proof1,
                &f.position,
                &Amount::from_u128(1),
                &Amount::from_u128(1),
                &fresh(11, 12),
                &fresh(13, 14),
            ),
            Err(BuildError::TokenOrder)
        );
    }

    #[test]
    fn rejects_five_way_nullifier_collision() {
        let f = fixture();
        assert_eq!(
            mint_inputs(
                &f.hasher,
                &f.note0,
                &f.proof0,
                &f.note1,
                &f.proof1,
                &f.position,
                &Amount::from_u128(1),
                &Amount::from_u128(1),
                &fresh(11, 6), // collides with the position nullifier
                &fresh(13, 14),
            ),
            Err(BuildError::DuplicateNullifier)
        );
    }

    #[test]
    fn rejects_split_snapshots() {
        let f = fixture();
        let other_hasher = Arc::new(PoseidonHasher::new().unwrap());
        let mut other = LeanImt::with_default_height(other_hasher);
        other.insert(fe(42)).unwrap();
        let foreign = other.proof(0).unwrap();
        assert_eq!(
            mint_inputs(
                &f.hasher,
                &f.note0,
                &f.proof0,
                &f.note1,
                &foreign,
                &f.position,
                &Amount::from_u128(1),
                &Amount::from_u128(1),
                &fresh(11, 12),
                &fresh(13, 14),
            ),
            Err(BuildError::RootMismatch)
        );
    }
}
