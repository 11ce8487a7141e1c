//! Membership circuit inputs (withdraw).
//!
//! Public block (2): `[root, nullifierHash]`.

use zylith_core::commitment::nullifier_hash;
use zylith_core::{CircuitKind, PoseidonHasher};
use zylith_tree::{MerkleProof, TREE_HEIGHT};

use crate::error::BuildError;
use crate::signals::{check_path, CircuitInputs, NoteOpening, SignalWriter};

/// Build the membership witness for spending `note` at `proof`'s leaf.
///
/// # Errors
/// Rejects zero amounts and malformed paths; propagates hash failures.
pub fn membership_inputs(
    hasher: &PoseidonHasher,
    note: &NoteOpening,
    proof: &MerkleProof,
) -> Result<CircuitInputs, BuildError> {
    if note.amount.is_zero() {
        return Err(BuildError::ZeroAmount);
    }
    check_path(proof, TREE_HEIGHT)?;

    let nh = nullifier_hash(hasher, note.nullifier)?;

    let mut signals = SignalWriter::new();
    signals.set("root", proof.root);
    signals.set("nullifierHash", nh);
    signals.set("secret", note.secret);
    signals.set("nullifier", note.nullifier);
    signals.set("balance_low", note.amount.low_field());
    signals.set("balance_high", note.amount.high_field());
    signals.set("token", note.token);
    signals.set_path("pathElements", "pathIndices", proof);

    CircuitInputs::new(CircuitKind::Membership, signals.finish(), vec![proof.root, nh])
}
