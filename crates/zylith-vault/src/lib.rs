//! Encrypted note/position UTXO vault.
//!
//! The vault owns every note and LP position a user controls, tracks
//! spent/unspent state and leaf-index assignment, and persists as a single
//! authenticated blob: PBKDF2-HMAC-SHA256 (100k iterations) derives a
//! 256-bit key from the passphrase, AES-256-GCM seals the serialized body.

/// Blob encryption and key derivation.
pub mod crypto;
/// Error types for the vault.
pub mod error;
/// Note and position domain types.
pub mod note;
/// Persistence capability: in-memory and file-backed stores.
pub mod store;
/// The vault itself.
pub mod vault;

pub use error::VaultError;
pub use note::{Note, PositionNote};
pub use store::{FileStore, MemoryStore, VaultStore};
pub use vault::NoteVault;
