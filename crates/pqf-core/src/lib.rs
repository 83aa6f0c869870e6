//! pqf-core: shared pieces of the pqfile workspace
//!
//! Holds the closed error taxonomy every crate reports through, the
//! configuration structs, and the constants that pin down the container
//! format and algorithm suite. No cryptography lives here.

pub mod config;
pub mod error;

pub use config::CacheConfig;
pub use error::{PqfError, PqfResult};

/// Container magic: three ASCII tag bytes plus a one-byte format marker.
pub const MAGIC: [u8; 4] = [b'P', b'Q', b'F', 0x01];

/// The only container version the decoder accepts.
pub const VERSION_V1: u16 = 0x0100;

/// Algorithm byte for the ML-KEM-768 + X25519 + AES-256-GCM suite.
pub const ALG_MLKEM768_X25519_AESGCM: u8 = 0x02;

/// Size of the AEAD key and of every derived shared secret (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce.
pub const NONCE_SIZE: usize = 12;

/// Size of a SHA-256 digest.
pub const DIGEST_SIZE: usize = 32;

/// Size of an X25519 public key.
pub const ECDH_PUBLIC_KEY_SIZE: usize = 32;

/// ML-KEM-768 ciphertext length in bytes (FIPS 203).
pub const ML_KEM_CIPHERTEXT_SIZE: usize = 1088;

/// ML-KEM-768 encapsulation key length in bytes (FIPS 203).
pub const ML_KEM_PUBLIC_KEY_SIZE: usize = 1184;

/// ML-KEM-768 decapsulation key length in bytes (FIPS 203).
pub const ML_KEM_PRIVATE_KEY_SIZE: usize = 2400;
