//! SHA-256 digest helpers over buffers and readers.

use std::io::Read;

use sha2::{Digest, Sha256};

use pqf_core::{PqfResult, DIGEST_SIZE};

const CHUNK_SIZE: usize = 64 * 1024;

/// Digest an in-memory buffer.
pub fn sha256(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Digest a reader in 64 KiB chunks without loading it into memory.
pub fn sha256_reader<R: Read>(r: &mut R) -> PqfResult<[u8; DIGEST_SIZE]> {
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = r.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hasher.finalize().into())
}
