//! AES-256-GCM sealing and opening.
//!
//! One fresh random 96-bit nonce per encryption; the nonce travels in the
//! container header, not inside the ciphertext. Opening failures return a
//! single generic [`PqfError::Authentication`] so callers cannot distinguish
//! a bad tag from a wrong key.

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, KeyInit, Nonce};

use pqf_core::{PqfError, PqfResult, KEY_SIZE, NONCE_SIZE};

/// Seal `plaintext` under a 32-byte key. Returns the ciphertext (with the
/// 16-byte GCM tag appended) and the nonce used.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> PqfResult<(Vec<u8>, [u8; NONCE_SIZE])> {
    let cipher = cipher_for(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| PqfError::Resource("AEAD encryption failed".into()))?;
    Ok((ciphertext, nonce.into()))
}

/// Open `ciphertext` under a 32-byte key and the nonce it was sealed with.
pub fn decrypt(key: &[u8], ciphertext: &[u8], nonce: &[u8]) -> PqfResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    if nonce.len() != NONCE_SIZE {
        return Err(PqfError::Key(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| PqfError::Authentication("AEAD authentication failed".into()))
}

fn cipher_for(key: &[u8]) -> PqfResult<Aes256Gcm> {
    if key.len() != KEY_SIZE {
        return Err(PqfError::Key(format!(
            "AEAD key must be {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| PqfError::Key(format!("AEAD key must be {KEY_SIZE} bytes")))
}
