//! Container header: construction, serialization, and semantic validation.

use std::time::{SystemTime, UNIX_EPOCH};

use pqf_core::{
    PqfError, PqfResult, ALG_MLKEM768_X25519_AESGCM, DIGEST_SIZE, ECDH_PUBLIC_KEY_SIZE, MAGIC,
    NONCE_SIZE, VERSION_V1,
};

use crate::FIXED_PREFIX_SIZE;

/// Decoded container header.
///
/// Length fields are stored explicitly rather than derived from their
/// payloads so that [`FileHeader::validate`] can detect a header whose
/// declared lengths disagree with what was actually decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub algorithm: u8,
    pub flags: u8,
    pub filename_len: u8,
    /// Original filename, UTF-8, no path components.
    pub filename: String,
    /// Plaintext length in bytes.
    pub file_size: u64,
    /// Unix seconds at encryption time.
    pub timestamp: u32,
    pub kem_ciphertext_len: u16,
    /// ML-KEM-768 encapsulation output.
    pub kem_ciphertext: Vec<u8>,
    pub ecdh_pub_len: u8,
    /// Ephemeral X25519 public key.
    pub ecdh_pub: [u8; ECDH_PUBLIC_KEY_SIZE],
    pub iv_len: u8,
    /// AES-GCM nonce.
    pub iv: [u8; NONCE_SIZE],
    pub sig_len: u16,
    /// Dilithium3 signature over the plaintext digest (empty = unsigned).
    pub signature: Vec<u8>,
    /// SHA-256 digest of the plaintext.
    pub sha256_hash: [u8; DIGEST_SIZE],
}

impl FileHeader {
    /// Build a fully-populated v1 header for a fresh encryption.
    ///
    /// The timestamp is taken from the system clock. Fails if the filename
    /// exceeds 255 bytes or either variable field exceeds its u16 length
    /// prefix; the caller is expected to pass filenames without path
    /// components.
    pub fn new(
        filename: &str,
        file_size: u64,
        kem_ciphertext: Vec<u8>,
        ecdh_pub: [u8; ECDH_PUBLIC_KEY_SIZE],
        iv: [u8; NONCE_SIZE],
        signature: Vec<u8>,
        sha256_hash: [u8; DIGEST_SIZE],
    ) -> PqfResult<Self> {
        let filename_len = u8::try_from(filename.len())
            .map_err(|_| PqfError::Format(format!("filename too long: {} bytes", filename.len())))?;
        let kem_ciphertext_len = u16::try_from(kem_ciphertext.len()).map_err(|_| {
            PqfError::Format(format!(
                "KEM ciphertext too long: {} bytes",
                kem_ciphertext.len()
            ))
        })?;
        let sig_len = u16::try_from(signature.len())
            .map_err(|_| PqfError::Format(format!("signature too long: {} bytes", signature.len())))?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);

        Ok(Self {
            magic: MAGIC,
            version: VERSION_V1,
            algorithm: ALG_MLKEM768_X25519_AESGCM,
            flags: 0,
            filename_len,
            filename: filename.to_string(),
            file_size,
            timestamp,
            kem_ciphertext_len,
            kem_ciphertext,
            ecdh_pub_len: ECDH_PUBLIC_KEY_SIZE as u8,
            ecdh_pub,
            iv_len: NONCE_SIZE as u8,
            iv,
            sig_len,
            signature,
            sha256_hash,
        })
    }

    /// Serialized size in bytes, computed purely from the length fields.
    ///
    /// The orchestrator uses this to locate the start of the ciphertext
    /// without re-scanning the header bytes.
    pub fn header_size(&self) -> usize {
        FIXED_PREFIX_SIZE
            + self.filename_len as usize
            + 8 // file_size
            + 4 // timestamp
            + 2
            + self.kem_ciphertext_len as usize
            + 1
            + self.ecdh_pub_len as usize
            + 1
            + self.iv_len as usize
            + 2
            + self.sig_len as usize
            + DIGEST_SIZE
    }

    /// Serialize into a growing buffer.
    ///
    /// Reference serializer; [`FileHeader::to_bytes_preallocated`] produces
    /// byte-identical output without intermediate reallocation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_fields(&mut buf);
        buf
    }

    /// Serialize with a single exact-size allocation.
    pub fn to_bytes_preallocated(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_size());
        self.write_fields(&mut buf);
        buf
    }

    fn write_fields(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.magic);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.push(self.algorithm);
        buf.push(self.flags);
        buf.push(self.filename_len);
        if self.filename_len > 0 {
            buf.extend_from_slice(self.filename.as_bytes());
        }
        buf.extend_from_slice(&self.file_size.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.kem_ciphertext_len.to_be_bytes());
        if self.kem_ciphertext_len > 0 {
            buf.extend_from_slice(&self.kem_ciphertext);
        }
        buf.push(self.ecdh_pub_len);
        if self.ecdh_pub_len > 0 {
            buf.extend_from_slice(&self.ecdh_pub);
        }
        buf.push(self.iv_len);
        if self.iv_len > 0 {
            buf.extend_from_slice(&self.iv);
        }
        buf.extend_from_slice(&self.sig_len.to_be_bytes());
        if self.sig_len > 0 {
            buf.extend_from_slice(&self.signature);
        }
        buf.extend_from_slice(&self.sha256_hash);
    }

    /// Semantic validation pass.
    ///
    /// Re-checks magic, version, and algorithm, then requires every length
    /// field to equal the actual length of its payload. A header that parsed
    /// structurally but was hand-edited to be inconsistent fails here.
    pub fn validate(&self) -> PqfResult<()> {
        if !is_valid_magic(&self.magic) {
            return Err(PqfError::Format("invalid magic number".into()));
        }
        if !is_version_supported(self.version) {
            return Err(PqfError::Format(format!(
                "unsupported version: 0x{:04x}",
                self.version
            )));
        }
        if !is_algorithm_supported(self.algorithm) {
            return Err(PqfError::Format(format!(
                "unsupported algorithm: 0x{:02x}",
                self.algorithm
            )));
        }
        if self.filename_len as usize != self.filename.len() {
            return Err(PqfError::Format("filename length mismatch".into()));
        }
        if self.kem_ciphertext_len as usize != self.kem_ciphertext.len() {
            return Err(PqfError::Format("KEM ciphertext length mismatch".into()));
        }
        if self.ecdh_pub_len != ECDH_PUBLIC_KEY_SIZE as u8 && self.ecdh_pub_len != 0 {
            return Err(PqfError::Format(format!(
                "ECDH public key length must be {} or 0",
                ECDH_PUBLIC_KEY_SIZE
            )));
        }
        if self.iv_len != NONCE_SIZE as u8 && self.iv_len != 0 {
            return Err(PqfError::Format(format!(
                "IV length must be {} or 0",
                NONCE_SIZE
            )));
        }
        if self.sig_len as usize != self.signature.len() {
            return Err(PqfError::Format("signature length mismatch".into()));
        }
        Ok(())
    }
}

/// Magic check: three fixed tag bytes plus the format marker.
pub fn is_valid_magic(magic: &[u8]) -> bool {
    magic.len() >= 4 && magic[..4] == MAGIC
}

pub fn is_version_supported(version: u16) -> bool {
    version == VERSION_V1
}

pub fn is_algorithm_supported(algorithm: u8) -> bool {
    algorithm == ALG_MLKEM768_X25519_AESGCM
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_header() -> FileHeader {
        FileHeader::new(
            "report.pdf",
            4096,
            vec![0xAB; 1088],
            [0x11; 32],
            [0x22; 12],
            vec![0xCD; 3293],
            [0x33; 32],
        )
        .unwrap()
    }

    #[test]
    fn serializers_are_byte_identical() {
        let header = sample_header();
        assert_eq!(header.to_bytes(), header.to_bytes_preallocated());
    }

    #[test]
    fn serialized_size_matches_header_size() {
        let header = sample_header();
        assert_eq!(header.to_bytes().len(), header.header_size());
        assert_eq!(
            header.to_bytes_preallocated().capacity(),
            header.header_size(),
            "preallocated serializer must not reallocate"
        );
    }

    #[test]
    fn new_header_is_valid() {
        sample_header().validate().unwrap();
    }

    #[test]
    fn empty_filename_and_signature() {
        let header = FileHeader::new("", 0, vec![0u8; 1088], [0; 32], [0; 12], vec![], [0; 32])
            .unwrap();
        assert_eq!(header.filename_len, 0);
        assert_eq!(header.sig_len, 0);
        header.validate().unwrap();
        assert_eq!(header.to_bytes().len(), header.header_size());
    }

    #[test]
    fn filename_over_255_bytes_rejected() {
        let long = "x".repeat(256);
        let result = FileHeader::new(&long, 0, vec![], [0; 32], [0; 12], vec![], [0; 32]);
        assert!(matches!(result, Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_bad_magic() {
        let mut header = sample_header();
        header.magic = [b'X', b'Y', b'Z', 0x01];
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_unknown_version() {
        let mut header = sample_header();
        header.version = 0x0200;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_unknown_algorithm() {
        let mut header = sample_header();
        header.algorithm = 0x7F;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_filename_len_mismatch() {
        let mut header = sample_header();
        header.filename_len += 1;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_kem_len_mismatch() {
        let mut header = sample_header();
        header.kem_ciphertext_len -= 1;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_bad_ecdh_len() {
        let mut header = sample_header();
        header.ecdh_pub_len = 16;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_bad_iv_len() {
        let mut header = sample_header();
        header.iv_len = 8;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_rejects_sig_len_mismatch() {
        let mut header = sample_header();
        header.sig_len += 4;
        assert!(matches!(header.validate(), Err(PqfError::Format(_))));
    }

    #[test]
    fn validate_accepts_zero_ecdh_and_iv_lens() {
        let mut header = sample_header();
        header.ecdh_pub_len = 0;
        header.iv_len = 0;
        header.validate().unwrap();
    }
}
