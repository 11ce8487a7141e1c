//! Note and position domain types.

use serde::{Deserialize, Serialize};
use zylith_core::commitment::{note_commitment, nullifier_hash, position_commitment};
use zylith_core::{Amount, FieldElement, PoseidonHasher, Tick};

use crate::error::VaultError;

/// A shielded UTXO.
///
/// The commitment and nullifier hash are derived at construction and stored
/// alongside the opening so spent-marking and index lookups never need the
/// hasher again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Random note secret, non-zero.
    pub secret: FieldElement,
    /// Random note nullifier, non-zero.
    pub nullifier: FieldElement,
    /// Note amount, positive.
    pub amount: Amount,
    /// Token address.
    pub token: FieldElement,
    /// Derived commitment published to the tree.
    pub commitment: FieldElement,
    /// Derived `Poseidon(nullifier)`, revealed on spend.
    pub nullifier_hash: FieldElement,
    /// Position in the tree, assigned when the ASP reports it.
    pub leaf_index: Option<u64>,
    /// Set irreversibly once the nullifier hash has been consumed.
    pub spent: bool,
}

impl Note {
    /// Build a note, deriving its commitment and nullifier hash.
    ///
    /// # Errors
    /// Rejects a zero secret, zero nullifier or zero amount and propagates
    /// hash failures.
    pub fn new(
        hasher: &PoseidonHasher,
        secret: FieldElement,
        nullifier: FieldElement,
        amount: Amount,
        token: FieldElement,
    ) -> Result<Self, VaultError> {
        if secret.is_zero() {
            return Err(VaultError::InvalidNote("secret must be non-zero"));
        }
        if nullifier.is_zero() {
            return Err(VaultError::InvalidNote("nullifier must be non-zero"));
        }
        if amount.is_zero() {
            return Err(VaultError::InvalidNote("amount must be positive"));
        }
        let commitment = note_commitment(hasher, secret, nullifier, &amount, token)?;
        let nh = nullifier_hash(hasher, nullifier)?;
        Ok(Self {
            secret,
            nullifier,
            amount,
            token,
            commitment,
            nullifier_hash: nh,
            leaf_index: None,
            spent: false,
        })
    }
}

/// A shielded LP position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionNote {
    /// Random position secret, non-zero.
    pub secret: FieldElement,
    /// Random position nullifier, non-zero.
    pub nullifier: FieldElement,
    /// Signed lower tick. Stored signed; hashed in offset form.
    pub tick_lower: Tick,
    /// Signed upper tick.
    pub tick_upper: Tick,
    /// Position liquidity, positive.
    pub liquidity: u128,
    /// Derived commitment published to the tree.
    pub commitment: FieldElement,
    /// Derived `Poseidon(nullifier)`.
    pub nullifier_hash: FieldElement,
    /// Position in the tree, assigned when the ASP reports it.
    pub leaf_index: Option<u64>,
    /// Set irreversibly once the position has been burned.
    pub spent: bool,
}

impl PositionNote {
    /// Build a position note, deriving its commitment and nullifier hash.
    ///
    /// The ticks are offset inside this constructor; callers pass signed
    /// values and never perform the shift themselves.
    ///
    /// # Errors
    /// Rejects a zero secret/nullifier, zero liquidity or an empty tick
    /// range, and propagates hash failures.
    pub fn new(
        hasher: &PoseidonHasher,
        secret: FieldElement,
        nullifier: FieldElement,
        tick_lower: Tick,
        tick_upper: Tick,
        liquidity: u128,
    ) -> Result<Self, VaultError> {
        if secret.is_zero() {
            return Err(VaultError::InvalidNote("secret must be non-zero"));
        }
        if nullifier.is_zero() {
            return Err(VaultError::InvalidNote("nullifier must be non-zero"));
        }
        if liquidity == 0 {
            return Err(VaultError::InvalidNote("liquidity must be positive"));
        }
        if tick_lower >= tick_upper {
            return Err(VaultError::InvalidNote("tick_lower must be below tick_upper"));
        }
        let commitment = position_commitment(
            hasher,
            secret,
            nullifier,
            tick_lower.to_offset(),
            tick_upper.to_offset(),
            liquidity,
        )?;
        let nh = nullifier_hash(hasher, nullifier)?;
        Ok(Self {
            secret,
            nullifier,
            tick_lower,
            tick_upper,
            liquidity,
            commitment,
            nullifier_hash: nh,
            leaf_index: None,
            spent: false,
        })
    }
}
