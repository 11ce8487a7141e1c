//! Blob encryption and key derivation.
//!
//! The persisted format is JSON `{salt, iv, ciphertext}` with hex-encoded
//! byte fields. The key is PBKDF2-HMAC-SHA256 over the passphrase with a
//! random 16-byte salt and 100_000 iterations; the body is sealed with
//! AES-256-GCM under a random 12-byte nonce. The format is identical across
//! store variants.

use aes_gcm::aead::{Aead as _, KeyInit as _};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore as _;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize as _;

use crate::error::VaultError;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes.
pub const IV_LEN: usize = 12;
/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;
/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// The encrypted vault blob as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// PBKDF2 salt (16 bytes, hex on disk).
    #[serde(with = "hex")]
    pub salt: Vec<u8>,
    /// AES-GCM nonce (12 bytes, hex on disk).
    #[serde(with = "hex")]
    pub iv: Vec<u8>,
    /// Sealed vault body (hex on disk).
    #[serde(with = "hex")]
    pub ciphertext: Vec<u8>,
}

fn derive_key(passphrase: &SecretString, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        &mut key,
    );
    key
}

/// Seal `plaintext` under `passphrase` with a fresh salt and nonce.
///
/// # Errors
/// Returns [`VaultError::EncryptionFailure`] on AEAD failure.
pub fn encrypt(passphrase: &SecretString, plaintext: &[u8]) -> Result<EncryptedBlob, VaultError> {
    let mut salt = vec![0u8; SALT_LEN];
    let mut iv = vec![0u8; IV_LEN];
    let mut rng = rand::rngs::OsRng;
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    let mut key = derive_key(passphrase, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| VaultError::EncryptionFailure)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| VaultError::EncryptionFailure)?;
    key.zeroize();

    Ok(EncryptedBlob {
        salt,
        iv,
        ciphertext,
    })
}

/// Open a sealed blob.
///
/// # Errors
/// Returns [`VaultError::DecryptionFailure`] for a wrong passphrase or a
/// tampered blob, never an IO error.
pub fn decrypt(passphrase: &SecretString, blob: &EncryptedBlob) -> Result<Vec<u8>, VaultError> {
    if blob.salt.len() != SALT_LEN || blob.iv.len() != IV_LEN {
        return Err(VaultError::DecryptionFailure);
    }
    let mut key = derive_key(passphrase, &blob.salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| VaultError::DecryptionFailure)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&blob.iv), blob.ciphertext.as_slice())
        .map_err(|_| VaultError::DecryptionFailure);
    key.zeroize();
    plaintext
}
