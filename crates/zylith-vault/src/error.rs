//! Error types for the vault.

use zylith_core::CoreError;

/// Errors produced by vault operations.
///
/// A wrong passphrase is always [`VaultError::DecryptionFailure`];
/// unreachable storage is always an [`VaultError::Io`]; callers can rely on
/// the distinction.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Authenticated decryption failed: wrong passphrase or corrupted blob.
    #[error("vault decryption failed: wrong passphrase or corrupted data")]
    DecryptionFailure,

    /// Encryption failed.
    #[error("vault encryption failed")]
    EncryptionFailure,

    /// Storage is unreachable or unwritable.
    #[error("vault storage: {0}")]
    Io(#[from] std::io::Error),

    /// The decrypted body is not a valid vault.
    #[error("vault serialization: {0}")]
    Serialization(String),

    /// Vault body version this build does not understand.
    #[error("unsupported vault version {0}")]
    UnsupportedVersion(u32),

    /// A note violates its invariants.
    #[error("invalid note: {0}")]
    InvalidNote(&'static str),

    /// Hash-layer failure while deriving commitments.
    #[error("hash: {0}")]
    Hash(#[from] CoreError),
}
