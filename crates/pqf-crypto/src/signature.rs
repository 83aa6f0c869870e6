//! Dilithium3 detached signatures over the plaintext SHA-256 digest.
//!
//! The engine never signs the plaintext itself; signing the 32-byte digest
//! keeps signature time independent of file size and binds the signature to
//! the same value the integrity check recomputes.

use pqcrypto_dilithium::dilithium3;
use pqcrypto_traits::sign::DetachedSignature as _;

use pqf_core::{PqfError, PqfResult, DIGEST_SIZE};

use crate::keys::{SignaturePublicKey, SignatureSecretKey};

/// Sign a plaintext digest, returning the detached signature bytes
/// (3293 bytes for Dilithium3).
pub fn sign_digest(digest: &[u8], key: &SignatureSecretKey) -> PqfResult<Vec<u8>> {
    check_digest_len(digest)?;
    let sig = dilithium3::detached_sign(digest, &key.0);
    Ok(sig.as_bytes().to_vec())
}

/// Verify a detached signature over a plaintext digest. Returns `Ok(false)`
/// for any malformed or non-matching signature; `Err` only for a malformed
/// digest argument.
pub fn verify_digest(
    digest: &[u8],
    signature: &[u8],
    key: &SignaturePublicKey,
) -> PqfResult<bool> {
    check_digest_len(digest)?;
    let sig = match dilithium3::DetachedSignature::from_bytes(signature) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };
    Ok(dilithium3::verify_detached_signature(&sig, digest, &key.0).is_ok())
}

fn check_digest_len(digest: &[u8]) -> PqfResult<()> {
    if digest.len() != DIGEST_SIZE {
        return Err(PqfError::Key(format!(
            "digest must be {DIGEST_SIZE} bytes, got {}",
            digest.len()
        )));
    }
    Ok(())
}
