//! Field-ordered header parser.
//!
//! Reads directly from any [`io::Read`], so file decryption can pull the
//! header off the front of a stream without buffering the ciphertext first.
//! Magic, version, and algorithm are checked as soon as they are read; no
//! variable-length field is touched until the fixed prefix has been
//! accepted, and no partial header is ever returned.

use std::io::Read;

use pqf_core::{PqfError, PqfResult, DIGEST_SIZE, ECDH_PUBLIC_KEY_SIZE, NONCE_SIZE};

use crate::header::{is_algorithm_supported, is_valid_magic, is_version_supported, FileHeader};

/// Parse a header from a byte buffer (e.g. a whole container read into
/// memory). Trailing bytes are left untouched; use
/// [`FileHeader::header_size`] to find where the ciphertext begins.
pub fn parse_header_bytes(data: &[u8]) -> PqfResult<FileHeader> {
    let mut cursor = data;
    parse_header(&mut cursor)
}

/// Parse a header from a reader, consuming exactly the header bytes.
pub fn parse_header<R: Read>(r: &mut R) -> PqfResult<FileHeader> {
    let mut magic = [0u8; 4];
    read_field(r, &mut magic, "magic")?;
    if !is_valid_magic(&magic) {
        return Err(PqfError::Format("invalid magic number".into()));
    }

    let version = read_u16(r, "version")?;
    if !is_version_supported(version) {
        return Err(PqfError::Format(format!(
            "unsupported version: 0x{version:04x}"
        )));
    }

    let algorithm = read_u8(r, "algorithm")?;
    if !is_algorithm_supported(algorithm) {
        return Err(PqfError::Format(format!(
            "unsupported algorithm: 0x{algorithm:02x}"
        )));
    }

    let flags = read_u8(r, "flags")?;

    let filename_len = read_u8(r, "filename length")?;
    let filename = if filename_len > 0 {
        let mut bytes = vec![0u8; filename_len as usize];
        read_field(r, &mut bytes, "filename")?;
        String::from_utf8(bytes)
            .map_err(|_| PqfError::Format("filename is not valid UTF-8".into()))?
    } else {
        String::new()
    };

    let file_size = read_u64(r, "file size")?;
    let timestamp = read_u32(r, "timestamp")?;

    let kem_ciphertext_len = read_u16(r, "KEM ciphertext length")?;
    let mut kem_ciphertext = vec![0u8; kem_ciphertext_len as usize];
    if kem_ciphertext_len > 0 {
        read_field(r, &mut kem_ciphertext, "KEM ciphertext")?;
    }

    let ecdh_pub_len = read_u8(r, "ECDH public key length")?;
    let mut ecdh_pub = [0u8; ECDH_PUBLIC_KEY_SIZE];
    if ecdh_pub_len > 0 {
        if ecdh_pub_len as usize != ECDH_PUBLIC_KEY_SIZE {
            return Err(PqfError::Format(format!(
                "ECDH public key length must be {ECDH_PUBLIC_KEY_SIZE} or 0"
            )));
        }
        read_field(r, &mut ecdh_pub, "ECDH public key")?;
    }

    let iv_len = read_u8(r, "IV length")?;
    let mut iv = [0u8; NONCE_SIZE];
    if iv_len > 0 {
        if iv_len as usize != NONCE_SIZE {
            return Err(PqfError::Format(format!(
                "IV length must be {NONCE_SIZE} or 0"
            )));
        }
        read_field(r, &mut iv, "IV")?;
    }

    let sig_len = read_u16(r, "signature length")?;
    let mut signature = vec![0u8; sig_len as usize];
    if sig_len > 0 {
        read_field(r, &mut signature, "signature")?;
    }

    let mut sha256_hash = [0u8; DIGEST_SIZE];
    read_field(r, &mut sha256_hash, "SHA-256 hash")?;

    Ok(FileHeader {
        magic,
        version,
        algorithm,
        flags,
        filename_len,
        filename,
        file_size,
        timestamp,
        kem_ciphertext_len,
        kem_ciphertext,
        ecdh_pub_len,
        ecdh_pub,
        iv_len,
        iv,
        sig_len,
        signature,
        sha256_hash,
    })
}

fn read_field<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> PqfResult<()> {
    r.read_exact(buf)
        .map_err(|_| PqfError::Format(format!("truncated input: failed to read {what}")))
}

fn read_u8<R: Read>(r: &mut R, what: &str) -> PqfResult<u8> {
    let mut buf = [0u8; 1];
    read_field(r, &mut buf, what)?;
    Ok(buf[0])
}

fn read_u16<R: Read>(r: &mut R, what: &str) -> PqfResult<u16> {
    let mut buf = [0u8; 2];
    read_field(r, &mut buf, what)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R, what: &str) -> PqfResult<u32> {
    let mut buf = [0u8; 4];
    read_field(r, &mut buf, what)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R, what: &str) -> PqfResult<u64> {
    let mut buf = [0u8; 8];
    read_field(r, &mut buf, what)?;
    Ok(u64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqf_core::{ALG_MLKEM768_X25519_AESGCM, MAGIC, VERSION_V1};

    fn sample_header() -> FileHeader {
        FileHeader::new(
            "photo.jpg",
            123_456,
            vec![0x5A; 1088],
            [0x42; 32],
            [0x17; 12],
            vec![0x99; 3293],
            [0x88; 32],
        )
        .unwrap()
    }

    #[test]
    fn roundtrip_field_for_field() {
        let header = sample_header();
        let parsed = parse_header_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        parsed.validate().unwrap();
    }

    #[test]
    fn roundtrip_unsigned_header() {
        let header =
            FileHeader::new("a.bin", 1, vec![0x5A; 1088], [1; 32], [2; 12], vec![], [3; 32])
                .unwrap();
        let parsed = parse_header_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed.sig_len, 0);
        assert!(parsed.signature.is_empty());
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            parse_header_bytes(&[]),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn rejects_bad_magic_before_reading_more() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = b'Z';
        assert!(matches!(
            parse_header_bytes(&bytes),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut header = sample_header();
        header.version = 0x0300;
        // Serialize manually since validate() would refuse this header.
        let bytes = header.to_bytes();
        assert_eq!(bytes[4..6], 0x0300u16.to_be_bytes());
        assert!(matches!(
            parse_header_bytes(&bytes),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let mut bytes = sample_header().to_bytes();
        bytes[6] = 0x7F;
        assert!(matches!(
            parse_header_bytes(&bytes),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn rejects_truncation_at_every_boundary() {
        let bytes = sample_header().to_bytes();
        // Every strict prefix must fail: a declared length may never read
        // past the end of the input.
        for cut in [0, 3, 8, 9, 15, 20, 25, bytes.len() / 2, bytes.len() - 1] {
            let result = parse_header_bytes(&bytes[..cut]);
            assert!(
                matches!(result, Err(PqfError::Format(_))),
                "prefix of {cut} bytes must be rejected"
            );
        }
    }

    #[test]
    fn rejects_invalid_utf8_filename() {
        let header = sample_header();
        let mut bytes = header.to_bytes();
        // Corrupt the first filename byte (offset 9) with an invalid UTF-8
        // lead byte.
        bytes[9] = 0xFF;
        assert!(matches!(
            parse_header_bytes(&bytes),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn rejects_nonstandard_ecdh_len_on_the_wire() {
        let header = sample_header();
        let mut bytes = header.to_bytes();
        let ecdh_len_offset =
            crate::FIXED_PREFIX_SIZE + header.filename_len as usize + 8 + 4 + 2
                + header.kem_ciphertext_len as usize;
        bytes[ecdh_len_offset] = 16;
        assert!(matches!(
            parse_header_bytes(&bytes),
            Err(PqfError::Format(_))
        ));
    }

    #[test]
    fn consumes_exactly_header_size_bytes() {
        let header = sample_header();
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(b"CIPHERTEXT");
        let mut cursor: &[u8] = &bytes;
        let parsed = parse_header(&mut cursor).unwrap();
        assert_eq!(cursor, b"CIPHERTEXT");
        assert_eq!(parsed.header_size(), bytes.len() - b"CIPHERTEXT".len());
    }

    #[test]
    fn magic_constants_line_up() {
        let header = sample_header();
        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.version, VERSION_V1);
        assert_eq!(header.algorithm, ALG_MLKEM768_X25519_AESGCM);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_header() -> impl Strategy<Value = FileHeader> {
            (
                "[a-zA-Z0-9._-]{0,40}",
                any::<u64>(),
                proptest::collection::vec(any::<u8>(), 0..2048),
                any::<[u8; 32]>(),
                any::<[u8; 12]>(),
                proptest::collection::vec(any::<u8>(), 0..4096),
                any::<[u8; 32]>(),
            )
                .prop_map(|(name, size, kem, ecdh, iv, sig, hash)| {
                    FileHeader::new(&name, size, kem, ecdh, iv, sig, hash).unwrap()
                })
        }

        proptest! {
            #[test]
            fn parse_serialize_roundtrip(header in arb_header()) {
                let parsed = parse_header_bytes(&header.to_bytes()).unwrap();
                prop_assert_eq!(&parsed, &header);
                prop_assert!(parsed.validate().is_ok());
            }

            #[test]
            fn serializers_agree(header in arb_header()) {
                prop_assert_eq!(header.to_bytes(), header.to_bytes_preallocated());
            }

            #[test]
            fn truncated_headers_rejected(header in arb_header(), frac in 0.0f64..1.0) {
                let bytes = header.to_bytes();
                let cut = ((bytes.len() - 1) as f64 * frac) as usize;
                prop_assert!(parse_header_bytes(&bytes[..cut]).is_err());
            }
        }
    }
}
