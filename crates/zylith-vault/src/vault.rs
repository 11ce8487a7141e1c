//! The note vault.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use zylith_core::{Amount, FieldElement, PoseidonHasher};

use crate::crypto::{self, EncryptedBlob};
use crate::error::VaultError;
use crate::note::{Note, PositionNote};
use crate::store::VaultStore;

/// Current vault body version.
pub const VAULT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct VaultBody {
    version: u32,
    notes: Vec<Note>,
    positions: Vec<PositionNote>,
}

/// In-memory view of a user's notes and positions.
///
/// The vault is single-writer: callers serialize mutations. Loading returns
/// a snapshot; concurrent saves are not coordinated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoteVault {
    notes: Vec<Note>,
    positions: Vec<PositionNote>,
}

impl NoteVault {
    /// An empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a note, deriving its commitment and nullifier hash first.
    ///
    /// Returns the commitment. A note with the same commitment is stored
    /// once; re-adding returns the existing commitment unchanged.
    ///
    /// # Errors
    /// Propagates invariant violations from [`Note::new`].
    pub fn add_note(
        &mut self,
        hasher: &PoseidonHasher,
        secret: FieldElement,
        nullifier: FieldElement,
        amount: Amount,
        token: FieldElement,
    ) -> Result<FieldElement, VaultError> {
        let note = Note::new(hasher, secret, nullifier, amount, token)?;
        let commitment = note.commitment;
        if !self.notes.iter().any(|n| n.commitment == commitment) {
            self.notes.push(note);
        }
        Ok(commitment)
    }

    /// Store a position note. Same semantics as [`NoteVault::add_note`].
    ///
    /// # Errors
    /// Propagates invariant violations from [`PositionNote::new`].
    pub fn add_position_note(&mut self, position: PositionNote) -> Result<FieldElement, VaultError> {
        let commitment = position.commitment;
        if !self.positions.iter().any(|p| p.commitment == commitment) {
            self.positions.push(position);
        }
        Ok(commitment)
    }

    /// Mark whichever note or position carries `nullifier_hash` as spent.
    ///
    /// Idempotent; returns `true` when a state change occurred.
    pub fn mark_spent(&mut self, nullifier_hash: FieldElement) -> bool {
        let mut changed = false;
        for note in &mut self.notes {
            if note.nullifier_hash == nullifier_hash && !note.spent {
                note.spent = true;
                changed = true;
            }
        }
        for position in &mut self.positions {
            if position.nullifier_hash == nullifier_hash && !position.spent {
                position.spent = true;
                changed = true;
            }
        }
        changed
    }

    /// Record the tree position of a commitment.
    ///
    /// Returns `true` when a note or position was updated.
    pub fn set_leaf_index(&mut self, commitment: FieldElement, index: u64) -> bool {
        let mut changed = false;
        for note in &mut self.notes {
            if note.commitment == commitment && note.leaf_index != Some(index) {
                note.leaf_index = Some(index);
                changed = true;
            }
        }
        for position in &mut self.positions {
            if position.commitment == commitment && position.leaf_index != Some(index) {
                position.leaf_index = Some(index);
                changed = true;
            }
        }
        changed
    }

    /// Unspent notes, optionally filtered by token.
    #[must_use]
    pub fn unspent_notes(&self, token: Option<FieldElement>) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| !n.spent)
            .filter(|n| token.is_none_or(|t| n.token == t))
            .collect()
    }

    /// Unspent LP positions.
    #[must_use]
    pub fn unspent_positions(&self) -> Vec<&PositionNote> {
        self.positions.iter().filter(|p| !p.spent).collect()
    }

    /// Sum of unspent note amounts for `token`.
    #[must_use]
    pub fn balance(&self, token: FieldElement) -> Amount {
        self.notes
            .iter()
            .filter(|n| !n.spent && n.token == token)
            .fold(Amount::ZERO, |acc, n| {
                acc.checked_add(&n.amount).unwrap_or(acc)
            })
    }

    /// All notes, including spent ones.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// All positions, including spent ones.
    #[must_use]
    pub fn positions(&self) -> &[PositionNote] {
        &self.positions
    }

    /// Commitments that have no leaf index yet (input for sync-commitments).
    #[must_use]
    pub fn commitments_missing_index(&self) -> Vec<FieldElement> {
        self.notes
            .iter()
            .filter(|n| n.leaf_index.is_none())
            .map(|n| n.commitment)
            .chain(
                self.positions
                    .iter()
                    .filter(|p| p.leaf_index.is_none())
                    .map(|p| p.commitment),
            )
            .collect()
    }

    /// Serialize and seal the vault under `passphrase`.
    ///
    /// # Errors
    /// Propagates serialization and encryption failures.
    pub fn export_encrypted(&self, passphrase: &SecretString) -> Result<Vec<u8>, VaultError> {
        let body = VaultBody {
            version: VAULT_VERSION,
            notes: self.notes.clone(),
            positions: self.positions.clone(),
        };
        let plaintext =
            serde_json::to_vec(&body).map_err(|e| VaultError::Serialization(e.to_string()))?;
        let blob = crypto::encrypt(passphrase, &plaintext)?;
        serde_json::to_vec(&blob).map_err(|e| VaultError::Serialization(e.to_string()))
    }

    /// Open a sealed blob.
    ///
    /// # Errors
    /// [`VaultError::DecryptionFailure`] for a wrong passphrase;
    /// [`VaultError::Serialization`] / [`VaultError::UnsupportedVersion`]
    /// for a malformed body.
    pub fn import_encrypted(blob: &[u8], passphrase: &SecretString) -> Result<Self, VaultError> {
        let blob: EncryptedBlob =
            serde_json::from_slice(blob).map_err(|e| VaultError::Serialization(e.to_string()))?;
        let plaintext = crypto::decrypt(passphrase, &blob)?;
        let body: VaultBody = serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::Serialization(e.to_string()))?;
        if body.version != VAULT_VERSION {
            return Err(VaultError::UnsupportedVersion(body.version));
        }
        Ok(Self {
            notes: body.notes,
            positions: body.positions,
        })
    }

    /// Seal and persist through `store` atomically.
    ///
    /// # Errors
    /// Propagates encryption and storage failures.
    pub fn save(&self, store: &dyn VaultStore, passphrase: &SecretString) -> Result<(), VaultError> {
        let blob = self.export_encrypted(passphrase)?;
        store.save(&blob)
    }

    /// Load and open the vault from `store`.
    ///
    /// # Errors
    /// [`VaultError::Io`] when storage is unreachable,
    /// [`VaultError::DecryptionFailure`] when the passphrase is wrong.
    pub fn load(store: &dyn VaultStore, passphrase: &SecretString) -> Result<Self, VaultError> {
        let blob = store.load()?;
        Self::import_encrypted(&blob, passphrase)
    }
}
