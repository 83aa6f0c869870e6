//! Hybrid key agreement: ML-KEM-768 encapsulation combined with ephemeral
//! X25519 Diffie-Hellman.
//!
//! Both ends derive `SHA-256(kem_secret ‖ ecdh_secret)`; the concatenation
//! order is fixed and must match on both sides. An attacker has to break
//! both primitives to recover the derived secret.
//!
//! Decapsulation reports every cryptographic failure as
//! [`PqfError::Authentication`] with the same message, so a caller probing
//! ciphertexts cannot tell which sub-step rejected the input. ML-KEM itself
//! uses implicit rejection: a forged KEM ciphertext of the right length
//! yields a pseudorandom secret and surfaces later as an AEAD tag failure.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Ciphertext, MlKem768};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};
use zeroize::Zeroize;

use pqf_core::{PqfError, PqfResult, ECDH_PUBLIC_KEY_SIZE, KEY_SIZE};

use crate::keys::{HybridPrivateKey, HybridPublicKey};

/// Combined 256-bit secret shared by sender and recipient. Zeroized on drop.
pub struct SharedSecret {
    bytes: [u8; KEY_SIZE],
}

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Output of [`HybridEncryptor::encapsulate`]. The ephemeral X25519 private
/// key is consumed by the agreement and never leaves that call.
pub struct Encapsulation {
    /// ML-KEM-768 ciphertext (1088 bytes), stored in the container header.
    pub kem_ciphertext: Vec<u8>,
    /// Ephemeral X25519 public key, stored in the container header.
    pub ephemeral_ecdh_pub: [u8; ECDH_PUBLIC_KEY_SIZE],
    /// Derived secret for the AEAD engine.
    pub shared_secret: SharedSecret,
}

/// Sender side of the hybrid agreement.
pub struct HybridEncryptor<'a> {
    recipient: &'a HybridPublicKey,
}

impl<'a> HybridEncryptor<'a> {
    pub fn new(recipient: &'a HybridPublicKey) -> Self {
        Self { recipient }
    }

    /// Run KEM encapsulation and an ephemeral ECDH exchange against the
    /// recipient's public key, combining both into one derived secret.
    pub fn encapsulate(&self) -> PqfResult<Encapsulation> {
        let (kem_ciphertext, kem_secret) = self
            .recipient
            .kem
            .encapsulate(&mut OsRng)
            .map_err(|_| PqfError::Resource("ML-KEM encapsulation failed".into()))?;

        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_pub = X25519PublicKey::from(&ephemeral);
        let ecdh_secret = ephemeral.diffie_hellman(&self.recipient.ecdh);
        if !ecdh_secret.was_contributory() {
            return Err(PqfError::Key(
                "recipient ECDH public key is a low-order point".into(),
            ));
        }

        let shared_secret = combine(kem_secret.as_slice(), ecdh_secret.as_bytes());
        Ok(Encapsulation {
            kem_ciphertext: kem_ciphertext.as_slice().to_vec(),
            ephemeral_ecdh_pub: *ephemeral_pub.as_bytes(),
            shared_secret,
        })
    }
}

/// Recipient side of the hybrid agreement.
pub struct HybridDecryptor<'a> {
    recipient: &'a HybridPrivateKey,
}

impl<'a> HybridDecryptor<'a> {
    pub fn new(recipient: &'a HybridPrivateKey) -> Self {
        Self { recipient }
    }

    /// Recover the derived secret from the header's KEM ciphertext and
    /// ephemeral ECDH public key.
    pub fn decapsulate(
        &self,
        kem_ciphertext: &[u8],
        ephemeral_ecdh_pub: &[u8],
    ) -> PqfResult<SharedSecret> {
        let ct: Ciphertext<MlKem768> = kem_ciphertext
            .try_into()
            .map_err(|_| PqfError::Authentication("hybrid decapsulation failed".into()))?;
        let kem_secret = self
            .recipient
            .kem
            .decapsulate(&ct)
            .map_err(|_| PqfError::Authentication("hybrid decapsulation failed".into()))?;

        let point: [u8; ECDH_PUBLIC_KEY_SIZE] = ephemeral_ecdh_pub
            .try_into()
            .map_err(|_| PqfError::Key("invalid ephemeral ECDH public key".into()))?;
        let ecdh_secret = self
            .recipient
            .ecdh
            .diffie_hellman(&X25519PublicKey::from(point));
        if !ecdh_secret.was_contributory() {
            return Err(PqfError::Authentication("hybrid decapsulation failed".into()));
        }

        Ok(combine(kem_secret.as_slice(), ecdh_secret.as_bytes()))
    }
}

/// `SHA-256(kem_secret ‖ ecdh_secret)`, fixed order.
fn combine(kem_secret: &[u8], ecdh_secret: &[u8]) -> SharedSecret {
    let mut hasher = Sha256::new();
    hasher.update(kem_secret);
    hasher.update(ecdh_secret);
    SharedSecret {
        bytes: hasher.finalize().into(),
    }
}
