//! Swap circuit inputs.
//!
//! Public block (8): `[newCommitment, changeCommitment, root, nullifierHash,
//! tokenIn, tokenOut, amountInLow, amountInHigh]`.
//!
//! A swap consumes one input note and produces an output note of
//! `tokenOut` plus a change note of `tokenIn`; an exact-input swap leaves
//! the change commitment at zero and no change note is created.

use zylith_core::commitment::{note_commitment, nullifier_hash};
use zylith_core::{Amount, CircuitKind, FieldElement, PoseidonHasher};
use zylith_tree::{MerkleProof, TREE_HEIGHT};

use crate::error::BuildError;
use crate::signals::{check_distinct, check_path, CircuitInputs, FreshSecrets, NoteOpening, SignalWriter};

/// Economic parameters of a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSpec {
    /// Token being sold.
    pub token_in: FieldElement,
    /// Token being bought.
    pub token_out: FieldElement,
    /// Amount of `token_in` consumed.
    pub amount_in: Amount,
    /// Expected amount of `token_out` received.
    pub expected_out: Amount,
}

/// Outcome of a swap build: the assignment plus the commitments the caller
/// must track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapBuild {
    /// The signal assignment.
    pub inputs: CircuitInputs,
    /// Commitment of the output note.
    pub new_commitment: FieldElement,
    /// Commitment of the change note; zero when the swap is exact-input.
    pub change_commitment: FieldElement,
    /// Change amount (`balance - amount_in`).
    pub change_amount: Amount,
}

/// Build the swap witness.
///
/// # Errors
/// Rejects equal tokens, a token mismatch with the input note, non-distinct
/// nullifiers, zero or over-balance amounts and malformed paths.
pub fn swap_inputs(
    hasher: &PoseidonHasher,
    input: &NoteOpening,
    proof: &MerkleProof,
    params: &SwapSpec,
    output: &FreshSecrets,
    change: &FreshSecrets,
) -> Result<SwapBuild, BuildError> {
    if params.token_in == params.token_out {
        return Err(BuildError::TokenEqual);
    }
    if input.token != params.token_in {
        return Err(BuildError::TokenMismatch("token_in"));
    }
    if params.amount_in.is_zero() || params.expected_out.is_zero() {
        return Err(BuildError::ZeroAmount);
    }
    check_distinct(&[input.nullifier, output.nullifier, change.nullifier])?;
    check_path(proof, TREE_HEIGHT)?;

    let change_amount = input
        .amount
        .checked_sub(&params.amount_in)
        .ok_or(BuildError::AmountExceedsBalance)?;

    let nh = nullifier_hash(hasher, input.nullifier)?;
    let new_commitment = note_commitment(
        hasher,
        output.secret,
        output.nullifier,
        &params.expected_out,
        params.token_out,
    )?;
    let change_commitment = if change_amount.is_zero() {
        FieldElement::ZERO
    } else {
        note_commitment(
            hasher,
            change.secret,
            change.nullifier,
            &change_amount,
            params.token_in,
        )?
    };

    let mut signals = SignalWriter::new();
    signals.set("root", proof.root);
    signals.set("nullifierHash", nh);
    signals.set("newCommitment", new_commitment);
    signals.set("changeCommitment", change_commitment);
    signals.set("tokenIn", params.token_in);
    signals.set("tokenOut", params.token_out);
    signals.set("amountIn_low", params.amount_in.low_field());
    signals.set("amountIn_high", params.amount_in.high_field());
    // Private - input note
    signals.set("secret", input.secret);
    signals.set("nullifier", input.nullifier);
    signals.set("balance_low", input.amount.low_field());
    signals.set("balance_high", input.amount.high_field());
    signals.set_path("pathElements", "pathIndices", proof);
    // Private - produced notes
    signals.set("outputSecret", output.secret);
    signals.set("outputNullifier", output.nullifier);
    signals.set("expectedOut_low", params.expected_out.low_field());
    signals.set("expectedOut_high", params.expected_out.high_field());
    signals.set("changeSecret", change.secret);
    signals.set("changeNullifier", change.nullifier);

    let inputs = CircuitInputs::new(
        CircuitKind::Swap,
        signals.finish(),
        vec![
            new_commitment,
            change_commitment,
            proof.root,
            nh,
            params.token_in,
            params.token_out,
            params.amount_in.low_field(),
            params.amount_in.high_field(),
        ],
    )?;

    Ok(SwapBuild {
        inputs,
        new_commitment,
        change_commitment,
        change_amount,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use std::sync::Arc;

    use zylith_tree::LeanImt;

    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    struct Fixture {
        hasher: Arc<PoseidonHasher>,
        input: NoteOpening,
        proof: MerkleProof,
    }

    fn fixture(balance: u128) -> Fixture {
        let hasher = Arc::new(PoseidonHasher::new().unwrap());
        let input = NoteOpening {
            secret: fe(1),
            nullifier: fe(2),
            amount: Amount::from_u128(balance),
            token: fe(100),
        };
        let commitment = note_commitment(
            &hasher,
            input.secret,
            input.nullifier,
            &input.amount,
            input.token,
        )
        .unwrap();
        let mut tree = LeanImt::with_default_height(Arc::clone(&hasher));
        tree.insert(commitment).unwrap();
        let proof = tree.proof(0).unwrap();
        Fixture {
            hasher,
            input,
            proof,
        }
    }

    fn spec(amount_in: u128, expected_out: u128) -> SwapSpec {
        SwapSpec {
            token_in: fe(100),
            token_out: fe(200),
            amount_in: Amount::from_u128(amount_in),
            expected_out: Amount::from_u128(expected_out),
        }
    }

    fn fresh(s: u64, n: u64) -> FreshSecrets {
        FreshSecrets {
            secret: fe(s),
            nullifier: fe(n),
        }
    }

    #[test]
    fn swap_with_change_produces_both_commitments() {
        let f = fixture(1000);
        let build = swap_inputs(
            &f.hasher,
            &f.input,
            &f.proof,
            &spec(600, 550),
            &fresh(11, 12),
            &fresh(13, 14),
        )
        .unwrap();

        assert_eq!(build.change_amount, Amount::from_u128(400));
        assert!(!build.change_commitment.is_zero());
        assert_eq!(build.inputs.publics.len(), 8);
        assert_eq!(build.inputs.publics.first().copied().unwrap(), build.new_commitment);
        let expected_change = note_commitment(
            &f.hasher,
            fe(13),
            fe(14),
            &Amount::from_u128(400),
            fe(100),
        )
        .unwrap();
        assert_eq!(build.change_commitment, expected_change);
    }

    #[test]
    fn exact_input_swap_has_zero_change() {
        let f = fixture(1000);
        let build = swap_inputs(
            &f.hasher,
            &f.input,
            &f.proof,
            &spec(1000, 950),
            &fresh(11, 12),
            &fresh(13, 14),
        )
        .unwrap();
        assert!(build.change_commitment.is_zero());
        assert!(build.change_amount.is_zero());
    }

    #[test]
    fn rejects_equal_tokens() {
        let f = fixture(1000);
        let mut s = spec(600, 550);
        s.token_out = s.token_in;
        assert_eq!(
            swap_inputs(&f.hasher, &f.input, &f.proof, &s, &fresh(11, 12), &fresh(13, 14)),
            Err(BuildError::TokenEqual)
        );
    }

    #[test]
    fn rejects_overdraw() {
        let f = fixture(500);
        assert_eq!(
            swap_inputs(
                &f.hasher,
                &f.input,
                &f.proof,
                &spec(600, 550),
                &fresh(11, 12),
                &fresh(13, 14)
            ),
            Err(BuildError::AmountExceedsBalance)
        );
    }

    #[test]
    fn rejects_shared_nullifiers() {
        let f = fixture(1000);
        assert_eq!(
            swap_inputs(
                &f.hasher,
                &f.input,
                &f.proof,
                &spec(600, 550),
                &fresh(11, 2), // collides with the input nullifier
                &fresh(13, 14)
            ),
            Err(BuildError::DuplicateNullifier)
        );
    }

    #[test]
    fn rejects_wrong_input_token() {
        let f = fixture(1000);
        let mut s = spec(600, 550);
        s.token_in = fe(101);
        s.token_out = fe(200);
        assert_eq!(
            swap_inputs(&f.hasher, &f.input, &f.proof, &s, &fresh(11, 12), &fresh(13, 14)),
            Err(BuildError::TokenMismatch("token_in"))
        );
    }
}
