//! pqf-format: the pqfile on-disk container format
//!
//! A container is a header immediately followed by the AEAD ciphertext, with
//! no framing or padding between them. All integers are big-endian and every
//! variable-length field is preceded by its explicit length:
//!
//! ```text
//! [4  magic "PQF" 0x01][2 version][1 algorithm][1 flags]
//! [1  filename_len][N filename (UTF-8)]
//! [8  file_size][4 timestamp]
//! [2  kem_ciphertext_len][M kem_ciphertext]
//! [1  ecdh_pub_len (32|0)][32 ecdh_pub]
//! [1  iv_len (12|0)][12 iv]
//! [2  sig_len][S signature]
//! [32 sha256_hash]
//! ```
//!
//! The parser reads fields strictly in this order and rejects early: bad
//! magic, unknown version, and unknown algorithm are all refused before any
//! variable-length field is read. [`header::FileHeader::validate`] re-checks
//! the decoded header for semantic consistency (every `*_len` field must
//! equal the actual length of its payload) so a structurally parseable but
//! hand-edited header is still refused.

pub mod header;
pub mod parser;

pub use header::FileHeader;
pub use parser::{parse_header, parse_header_bytes};

/// Fixed leading bytes before the filename: magic(4) + version(2) +
/// algorithm(1) + flags(1) + filename_len(1).
pub const FIXED_PREFIX_SIZE: usize = 9;
