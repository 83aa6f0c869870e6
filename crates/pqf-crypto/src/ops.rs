//! Encrypt/decrypt orchestration over whole buffers and files.
//!
//! Decryption is strictly ordered and fails closed: parse header, validate
//! it, slice the ciphertext, decapsulate, open the AEAD, recompute the
//! plaintext digest, verify the signature. No step runs before the previous
//! one has accepted its input, and nothing decrypted is released until every
//! step has passed.
//!
//! The file entry points are "streaming" only in their I/O: reads go
//! through the buffer pool, but the AEAD seals and opens the whole message
//! in memory. Peak memory is proportional to file size; chunked AEAD is a
//! format change and out of scope for v1.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use pqf_core::{PqfError, PqfResult};
use pqf_format::{parse_header, parse_header_bytes, FileHeader};

use crate::aead;
use crate::digest::{sha256, sha256_reader};
use crate::hybrid::{HybridDecryptor, HybridEncryptor};
use crate::keys::{HybridPrivateKey, HybridPublicKey, SignaturePublicKey, SignatureSecretKey};
use crate::pool::{optimal_buffer_size, BufferPool};
use crate::signature::{sign_digest, verify_digest};

/// An encrypted file: its header and the AEAD ciphertext that follows it.
#[derive(Debug, Clone)]
pub struct EncryptedContainer {
    pub header: FileHeader,
    pub ciphertext: Vec<u8>,
}

impl EncryptedContainer {
    /// Serialize header and ciphertext into one buffer, wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.header_size() + self.ciphertext.len());
        out.extend_from_slice(&self.header.to_bytes_preallocated());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn total_size(&self) -> usize {
        self.header.header_size() + self.ciphertext.len()
    }
}

/// A fully verified decryption result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    /// Original filename embedded in the header.
    pub filename: String,
    pub plaintext: Vec<u8>,
}

/// Encrypt a buffer for `recipient`, optionally signing the plaintext
/// digest with `signer`. An unsigned container carries `sig_len = 0`.
pub fn encrypt_bytes(
    plaintext: &[u8],
    filename: &str,
    recipient: &HybridPublicKey,
    signer: Option<&SignatureSecretKey>,
) -> PqfResult<EncryptedContainer> {
    let encapsulation = HybridEncryptor::new(recipient).encapsulate()?;
    let (ciphertext, iv) = aead::encrypt(encapsulation.shared_secret.as_bytes(), plaintext)?;

    let digest = sha256(plaintext);
    let signature = match signer {
        Some(key) => sign_digest(&digest, key)?,
        None => Vec::new(),
    };

    let header = FileHeader::new(
        filename,
        plaintext.len() as u64,
        encapsulation.kem_ciphertext,
        encapsulation.ephemeral_ecdh_pub,
        iv,
        signature,
        digest,
    )?;
    debug!(
        filename,
        plaintext_len = plaintext.len(),
        signed = signer.is_some(),
        "encrypted buffer"
    );
    Ok(EncryptedContainer { header, ciphertext })
}

/// Decrypt a container, enforcing the full verification order. Pass a
/// `verifier` to check the sender's signature; a container without a
/// signature is accepted with a warning.
pub fn decrypt_bytes(
    container: &[u8],
    recipient: &HybridPrivateKey,
    verifier: Option<&SignaturePublicKey>,
) -> PqfResult<DecryptedFile> {
    let header = parse_header_bytes(container)?;
    header.validate()?;

    let header_size = header.header_size();
    if container.len() <= header_size {
        return Err(PqfError::Format("no ciphertext after header".into()));
    }
    let ciphertext = &container[header_size..];

    let shared_secret = HybridDecryptor::new(recipient).decapsulate(
        &header.kem_ciphertext,
        &header.ecdh_pub[..header.ecdh_pub_len as usize],
    )?;

    let plaintext = aead::decrypt(
        shared_secret.as_bytes(),
        ciphertext,
        &header.iv[..header.iv_len as usize],
    )?;

    if plaintext.len() as u64 != header.file_size {
        return Err(PqfError::Integrity(format!(
            "plaintext is {} bytes but header declares {}",
            plaintext.len(),
            header.file_size
        )));
    }
    let digest = sha256(&plaintext);
    if digest != header.sha256_hash {
        return Err(PqfError::Integrity(
            "plaintext digest does not match header".into(),
        ));
    }

    match (verifier, header.sig_len) {
        (Some(key), sig_len) if sig_len > 0 => {
            if !verify_digest(&digest, &header.signature, key)? {
                return Err(PqfError::Authentication(
                    "signature verification failed".into(),
                ));
            }
        }
        (Some(_), _) => {
            warn!(
                filename = %header.filename,
                "container is unsigned, skipping signature verification"
            );
        }
        (None, sig_len) if sig_len > 0 => {
            warn!(
                filename = %header.filename,
                "no verifying key supplied, skipping signature verification"
            );
        }
        (None, _) => {}
    }

    Ok(DecryptedFile {
        filename: header.filename,
        plaintext,
    })
}

/// Parse and validate a container header without any key material.
pub fn inspect(container: &[u8]) -> PqfResult<FileHeader> {
    let header = parse_header_bytes(container)?;
    header.validate()?;
    Ok(header)
}

/// [`inspect`] for a file on disk; reads only the header bytes.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> PqfResult<FileHeader> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = parse_header(&mut reader)?;
    header.validate()?;
    Ok(header)
}

/// Check a plaintext file on disk against the digest a container header
/// declares. Streams the file through SHA-256 in chunks, so it never loads
/// the plaintext into memory; needs no key material.
pub fn verify_file_digest<P: AsRef<Path>>(plaintext: P, header: &FileHeader) -> PqfResult<bool> {
    let mut reader = BufReader::new(File::open(plaintext)?);
    let digest = sha256_reader(&mut reader)?;
    Ok(digest == header.sha256_hash)
}

/// File encryptor that reuses pooled read buffers across calls.
pub struct StreamingEncryptor<'a> {
    recipient: &'a HybridPublicKey,
    signer: Option<&'a SignatureSecretKey>,
    pool: BufferPool,
}

impl<'a> StreamingEncryptor<'a> {
    /// `buffer_size` is clamped to the pool's supported range.
    pub fn new(
        recipient: &'a HybridPublicKey,
        signer: Option<&'a SignatureSecretKey>,
        buffer_size: usize,
    ) -> Self {
        Self {
            recipient,
            signer,
            pool: BufferPool::new(buffer_size),
        }
    }

    /// Encrypt `input` into the container file `output`. Returns the
    /// container size in bytes.
    pub fn encrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> PqfResult<u64> {
        let input = input.as_ref();
        let filename = file_name_of(input)?;
        let plaintext = read_all_pooled(File::open(input)?, &self.pool)?;

        let container = encrypt_bytes(&plaintext, filename, self.recipient, self.signer)?;
        let bytes = container.to_bytes();
        File::create(output)?.write_all(&bytes)?;
        info!(
            filename,
            plaintext_len = plaintext.len(),
            container_len = bytes.len(),
            "encrypted file"
        );
        Ok(bytes.len() as u64)
    }
}

/// File decryptor that reuses pooled read buffers across calls.
pub struct StreamingDecryptor<'a> {
    recipient: &'a HybridPrivateKey,
    verifier: Option<&'a SignaturePublicKey>,
    pool: BufferPool,
}

impl<'a> StreamingDecryptor<'a> {
    /// `buffer_size` is clamped to the pool's supported range.
    pub fn new(
        recipient: &'a HybridPrivateKey,
        verifier: Option<&'a SignaturePublicKey>,
        buffer_size: usize,
    ) -> Self {
        Self {
            recipient,
            verifier,
            pool: BufferPool::new(buffer_size),
        }
    }

    /// Decrypt the container file `input` into `output`. Returns the
    /// original filename embedded in the header.
    pub fn decrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> PqfResult<String> {
        let container = read_all_pooled(File::open(input)?, &self.pool)?;
        let decrypted = decrypt_bytes(&container, self.recipient, self.verifier)?;
        File::create(output)?.write_all(&decrypted.plaintext)?;
        info!(
            filename = %decrypted.filename,
            plaintext_len = decrypted.plaintext.len(),
            "decrypted file"
        );
        Ok(decrypted.filename)
    }
}

/// Encrypt a file, picking the buffer size from the input's length when the
/// caller does not supply one.
pub fn encrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    recipient: &HybridPublicKey,
    signer: Option<&SignatureSecretKey>,
    buffer_size: Option<usize>,
) -> PqfResult<u64> {
    let buffer_size = resolve_buffer_size(input.as_ref(), buffer_size)?;
    StreamingEncryptor::new(recipient, signer, buffer_size).encrypt_file(input, output)
}

/// Decrypt a container file; see [`StreamingDecryptor::decrypt_file`].
pub fn decrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    recipient: &HybridPrivateKey,
    verifier: Option<&SignaturePublicKey>,
    buffer_size: Option<usize>,
) -> PqfResult<String> {
    let buffer_size = resolve_buffer_size(input.as_ref(), buffer_size)?;
    StreamingDecryptor::new(recipient, verifier, buffer_size).decrypt_file(input, output)
}

fn resolve_buffer_size(input: &Path, requested: Option<usize>) -> PqfResult<usize> {
    match requested {
        Some(size) => Ok(size),
        None => Ok(optimal_buffer_size(std::fs::metadata(input)?.len())),
    }
}

fn file_name_of(path: &Path) -> PqfResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PqfError::Format(format!("input path has no UTF-8 filename: {path:?}")))
}

fn read_all_pooled(mut file: File, pool: &BufferPool) -> PqfResult<Vec<u8>> {
    let size_hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let mut out = Vec::with_capacity(size_hint);
    let mut buf = pool.checkout();
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypairs, generate_signature_keypair};

    #[test]
    fn encrypt_decrypt_roundtrip_signed() {
        let keys = generate_keypairs().unwrap();
        let container = encrypt_bytes(
            b"hello pqfile",
            "note.txt",
            &keys.public,
            Some(&keys.signing.secret),
        )
        .unwrap();

        let decrypted = decrypt_bytes(
            &container.to_bytes(),
            &keys.private,
            Some(&keys.signing.public),
        )
        .unwrap();
        assert_eq!(decrypted.filename, "note.txt");
        assert_eq!(decrypted.plaintext, b"hello pqfile");
    }

    #[test]
    fn unsigned_container_decrypts_with_warning() {
        let keys = generate_keypairs().unwrap();
        let container = encrypt_bytes(b"data", "a.bin", &keys.public, None).unwrap();
        assert_eq!(container.header.sig_len, 0);

        let decrypted = decrypt_bytes(
            &container.to_bytes(),
            &keys.private,
            Some(&keys.signing.public),
        )
        .unwrap();
        assert_eq!(decrypted.plaintext, b"data");
    }

    #[test]
    fn wrong_recipient_key_is_authentication_error() {
        let keys = generate_keypairs().unwrap();
        let other = generate_keypairs().unwrap();
        let container = encrypt_bytes(b"secret", "s.txt", &keys.public, None).unwrap();

        assert!(matches!(
            decrypt_bytes(&container.to_bytes(), &other.private, None),
            Err(PqfError::Authentication(_))
        ));
    }

    #[test]
    fn truncated_container_is_format_error() {
        let keys = generate_keypairs().unwrap();
        let container = encrypt_bytes(b"secret", "s.txt", &keys.public, None).unwrap();
        let bytes = container.to_bytes();

        // Header parses but no ciphertext follows.
        let header_only = &bytes[..container.header.header_size()];
        assert!(matches!(
            decrypt_bytes(header_only, &keys.private, None),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn signature_from_wrong_signer_is_authentication_error() {
        let keys = generate_keypairs().unwrap();
        let impostor = generate_signature_keypair();
        let container =
            encrypt_bytes(b"payload", "p.bin", &keys.public, Some(&impostor.secret)).unwrap();

        assert!(matches!(
            decrypt_bytes(
                &container.to_bytes(),
                &keys.private,
                Some(&keys.signing.public)
            ),
            Err(PqfError::Authentication(_))
        ));
    }

    #[test]
    fn inspect_reports_header_without_keys() {
        let keys = generate_keypairs().unwrap();
        let container =
            encrypt_bytes(b"x", "meta.txt", &keys.public, Some(&keys.signing.secret)).unwrap();
        let header = inspect(&container.to_bytes()).unwrap();
        assert_eq!(header.filename, "meta.txt");
        assert_eq!(header.file_size, 1);
        assert!(header.sig_len > 0);
    }

    #[test]
    fn container_total_size_matches_serialization() {
        let keys = generate_keypairs().unwrap();
        let container = encrypt_bytes(b"abc", "a", &keys.public, None).unwrap();
        assert_eq!(container.total_size(), container.to_bytes().len());
    }
}
