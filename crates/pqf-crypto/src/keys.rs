//! Key types for the three primitives, plus key-pair generation.
//!
//! Each primitive keeps its own concrete type; nothing in the engine passes
//! keys around as untyped blobs. Private halves redact their `Debug` output
//! and zeroize what the underlying crates let us zeroize (the X25519 scalar
//! does so on drop; the lattice keys are opaque to us, which leaves their
//! zeroization a best-effort hardening goal).

use ml_kem::kem::{DecapsulationKey, EncapsulationKey};
use ml_kem::{EncodedSizeUser, KemCore, MlKem768, MlKem768Params};
use pqcrypto_dilithium::dilithium3;
use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use pqf_core::{PqfError, PqfResult, ECDH_PUBLIC_KEY_SIZE, ML_KEM_PRIVATE_KEY_SIZE, ML_KEM_PUBLIC_KEY_SIZE};

pub type KemPublicKey = EncapsulationKey<MlKem768Params>;
pub type KemPrivateKey = DecapsulationKey<MlKem768Params>;

/// Recipient public key: ML-KEM-768 encapsulation key + X25519 point.
///
/// Immutable once loaded; shared read-only across encryption calls.
pub struct HybridPublicKey {
    pub(crate) kem: KemPublicKey,
    pub(crate) ecdh: X25519PublicKey,
}

impl HybridPublicKey {
    pub fn from_bytes(kem: &[u8], ecdh: &[u8; ECDH_PUBLIC_KEY_SIZE]) -> PqfResult<Self> {
        let kem = KemPublicKey::from_bytes(&kem.try_into().map_err(|_| {
            PqfError::Key(format!(
                "ML-KEM-768 public key must be {ML_KEM_PUBLIC_KEY_SIZE} bytes"
            ))
        })?);
        Ok(Self {
            kem,
            ecdh: X25519PublicKey::from(*ecdh),
        })
    }

    pub fn kem_bytes(&self) -> Vec<u8> {
        self.kem.as_bytes().to_vec()
    }

    pub fn ecdh_bytes(&self) -> [u8; ECDH_PUBLIC_KEY_SIZE] {
        *self.ecdh.as_bytes()
    }
}

impl std::fmt::Debug for HybridPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridPublicKey")
            .field("kem", &"ml-kem-768")
            .field("ecdh", &"x25519")
            .finish()
    }
}

/// Recipient private key: ML-KEM-768 decapsulation key + X25519 scalar.
///
/// Immutable after load. Never logged; `Debug` is redacted.
pub struct HybridPrivateKey {
    pub(crate) kem: KemPrivateKey,
    pub(crate) ecdh: StaticSecret,
}

impl HybridPrivateKey {
    pub fn from_bytes(kem: &[u8], ecdh: [u8; ECDH_PUBLIC_KEY_SIZE]) -> PqfResult<Self> {
        let kem = KemPrivateKey::from_bytes(&kem.try_into().map_err(|_| {
            PqfError::Key(format!(
                "ML-KEM-768 private key must be {ML_KEM_PRIVATE_KEY_SIZE} bytes"
            ))
        })?);
        Ok(Self {
            kem,
            ecdh: StaticSecret::from(ecdh),
        })
    }

    /// Serialized decapsulation key, for key-store persistence only.
    pub fn kem_bytes(&self) -> Vec<u8> {
        self.kem.as_bytes().to_vec()
    }

    /// Raw X25519 scalar, for key-store persistence only.
    pub fn ecdh_bytes(&self) -> [u8; ECDH_PUBLIC_KEY_SIZE] {
        self.ecdh.to_bytes()
    }

    /// The public half matching this private key.
    pub fn public_ecdh(&self) -> X25519PublicKey {
        X25519PublicKey::from(&self.ecdh)
    }
}

impl std::fmt::Debug for HybridPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridPrivateKey")
            .field("kem", &"[REDACTED]")
            .field("ecdh", &"[REDACTED]")
            .finish()
    }
}

/// Dilithium3 verifying key.
#[derive(Clone)]
pub struct SignaturePublicKey(pub(crate) dilithium3::PublicKey);

impl SignaturePublicKey {
    pub fn from_bytes(bytes: &[u8]) -> PqfResult<Self> {
        dilithium3::PublicKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| PqfError::Key("malformed Dilithium3 public key".into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SignaturePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePublicKey")
            .field("bytes", &self.0.as_bytes().len())
            .finish()
    }
}

/// Dilithium3 signing key. `Debug` is redacted.
#[derive(Clone)]
pub struct SignatureSecretKey(pub(crate) dilithium3::SecretKey);

impl SignatureSecretKey {
    pub fn from_bytes(bytes: &[u8]) -> PqfResult<Self> {
        dilithium3::SecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| PqfError::Key("malformed Dilithium3 secret key".into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SignatureSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureSecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Dilithium3 signing key pair.
#[derive(Debug, Clone)]
pub struct SignatureKeyPair {
    pub public: SignaturePublicKey,
    pub secret: SignatureSecretKey,
}

/// Everything `generate_keypairs` produces.
#[derive(Debug)]
pub struct GeneratedKeys {
    pub public: HybridPublicKey,
    pub private: HybridPrivateKey,
    pub signing: SignatureKeyPair,
}

/// Generate a hybrid ML-KEM-768 + X25519 key pair.
pub fn generate_hybrid_keypair() -> (HybridPublicKey, HybridPrivateKey) {
    let (kem_private, kem_public) = MlKem768::generate(&mut OsRng);
    let ecdh_private = StaticSecret::random_from_rng(OsRng);
    let ecdh_public = X25519PublicKey::from(&ecdh_private);
    (
        HybridPublicKey {
            kem: kem_public,
            ecdh: ecdh_public,
        },
        HybridPrivateKey {
            kem: kem_private,
            ecdh: ecdh_private,
        },
    )
}

/// Generate a Dilithium3 signing key pair.
pub fn generate_signature_keypair() -> SignatureKeyPair {
    let (public, secret) = dilithium3::keypair();
    SignatureKeyPair {
        public: SignaturePublicKey(public),
        secret: SignatureSecretKey(secret),
    }
}

/// Generate all three key pairs, running the independent primitive
/// generations on the rayon pool and joining before returning. No partial
/// key material escapes this function.
pub fn generate_keypairs() -> PqfResult<GeneratedKeys> {
    let (kem, (ecdh, signing)) = rayon::join(
        || MlKem768::generate(&mut OsRng),
        || {
            rayon::join(
                || StaticSecret::random_from_rng(OsRng),
                generate_signature_keypair,
            )
        },
    );
    let (kem_private, kem_public) = kem;
    let ecdh_public = X25519PublicKey::from(&ecdh);
    Ok(GeneratedKeys {
        public: HybridPublicKey {
            kem: kem_public,
            ecdh: ecdh_public,
        },
        private: HybridPrivateKey {
            kem: kem_private,
            ecdh,
        },
        signing,
    })
}
