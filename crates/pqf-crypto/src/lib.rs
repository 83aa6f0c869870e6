//! pqf-crypto: post-quantum hybrid file encryption engine
//!
//! Pipeline (encrypt): plaintext → hybrid encapsulation (ML-KEM-768 +
//! ephemeral X25519, combined via SHA-256) → AES-256-GCM under the derived
//! secret → SHA-256 digest of the plaintext → Dilithium3 signature over the
//! digest → container header + ciphertext.
//!
//! ```text
//! derived secret = SHA-256(kem_secret ‖ ecdh_secret)
//!   ├── AES-256-GCM: confidentiality + tag (whole-message AEAD)
//!   ├── SHA-256(plaintext): defense-in-depth integrity check
//!   └── Dilithium3(digest): sender authenticity
//! ```
//!
//! Decryption runs the exact inverse order and fails closed at every step:
//! parse/validate header, decapsulate, AEAD open, digest compare, signature
//! verify. See [`ops`] for the orchestrator and for the documented
//! whole-buffer limitation of the "streaming" entry points.

pub mod aead;
pub mod cache;
pub mod digest;
pub mod hybrid;
pub mod keys;
pub mod keystore;
pub mod ops;
pub mod pool;
pub mod signature;

pub use cache::{CachedKey, KeyCache, KeyKind};
pub use hybrid::{Encapsulation, HybridDecryptor, HybridEncryptor, SharedSecret};
pub use keys::{
    generate_hybrid_keypair, generate_keypairs, generate_signature_keypair, GeneratedKeys,
    HybridPrivateKey, HybridPublicKey, SignatureKeyPair, SignaturePublicKey, SignatureSecretKey,
};
pub use keystore::{CachedKeyStore, KeyStore};
pub use ops::{
    decrypt_bytes, decrypt_file, encrypt_bytes, encrypt_file, inspect, inspect_file,
    verify_file_digest, DecryptedFile, EncryptedContainer, StreamingDecryptor,
    StreamingEncryptor,
};
pub use pool::{optimal_buffer_size, BufferPool, PooledBuffer};

pub use pqf_core::{DIGEST_SIZE, KEY_SIZE, NONCE_SIZE};
