//! Note and position commitment equations.
//!
//! `note_commitment(s, n, aL, aH, t) = H(H(s, n), aL, aH, t)`
//! `position_commitment(s, n, tl, tu, liq) = H(s, n, tl, tu, liq)`
//! `nullifier_hash(n) = H(n)`
//!
//! Inputs are canonical field elements by construction; ticks arrive in
//! offset form only.

use crate::amount::Amount;
use crate::error::CoreError;
use crate::field::FieldElement;
use crate::poseidon::PoseidonHasher;
use crate::ticks::OffsetTick;

/// Commitment to a shielded note.
///
/// # Errors
/// Propagates hash-layer failures.
pub fn note_commitment(
    hasher: &PoseidonHasher,
    secret: FieldElement,
    nullifier: FieldElement,
    amount: &Amount,
    token: FieldElement,
) -> Result<FieldElement, CoreError> {
    let inner = hasher.hash(&[secret, nullifier])?;
    hasher.hash(&[inner, amount.low_field(), amount.high_field(), token])
}

/// Commitment to a shielded LP position.
///
/// # Errors
/// Propagates hash-layer failures.
pub fn position_commitment(
    hasher: &PoseidonHasher,
    secret: FieldElement,
    nullifier: FieldElement,
    tick_lower: OffsetTick,
    tick_upper: OffsetTick,
    liquidity: u128,
) -> Result<FieldElement, CoreError> {
    hasher.hash(&[
        secret,
        nullifier,
        tick_lower.field(),
        tick_upper.field(),
        FieldElement::from_u128(liquidity),
    ])
}

/// Hash revealed on spend to prevent double-spends.
///
/// # Errors
/// Propagates hash-layer failures.
pub fn nullifier_hash(
    hasher: &PoseidonHasher,
    nullifier: FieldElement,
) -> Result<FieldElement, CoreError> {
    hasher.hash(&[nullifier])
}
