//! File-level entry points against real temp files.

use anyhow::Result;
use tempfile::tempdir;

use pqf_core::PqfError;
use pqf_crypto::{decrypt_file, encrypt_file, generate_keypairs, inspect_file, verify_file_digest};

#[test]
fn encrypt_decrypt_file_roundtrip() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("report.pdf");
    let encrypted = dir.path().join("report.pdf.pqf");
    let restored = dir.path().join("restored.pdf");

    let body: Vec<u8> = (0..300_000u32).flat_map(|i| i.to_le_bytes()).collect();
    std::fs::write(&input, &body)?;

    let container_len = encrypt_file(
        &input,
        &encrypted,
        &keys.public,
        Some(&keys.signing.secret),
        None,
    )?;
    assert_eq!(container_len, std::fs::metadata(&encrypted)?.len());

    let filename = decrypt_file(
        &encrypted,
        &restored,
        &keys.private,
        Some(&keys.signing.public),
        None,
    )?;
    assert_eq!(filename, "report.pdf");
    assert_eq!(std::fs::read(&restored)?, body);
    Ok(())
}

#[test]
fn empty_file_roundtrip_on_disk() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("empty.txt");
    let encrypted = dir.path().join("empty.pqf");
    let restored = dir.path().join("empty.out");
    std::fs::write(&input, b"")?;

    encrypt_file(&input, &encrypted, &keys.public, None, None)?;
    let filename = decrypt_file(&encrypted, &restored, &keys.private, None, None)?;
    assert_eq!(filename, "empty.txt");
    assert_eq!(std::fs::metadata(&restored)?.len(), 0);
    Ok(())
}

#[test]
fn explicit_buffer_size_is_clamped_not_rejected() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("tiny.bin");
    let encrypted = dir.path().join("tiny.pqf");
    let restored = dir.path().join("tiny.out");
    std::fs::write(&input, b"tiny")?;

    // Far below the pool minimum; clamped internally.
    encrypt_file(&input, &encrypted, &keys.public, None, Some(1))?;
    decrypt_file(&encrypted, &restored, &keys.private, None, Some(usize::MAX))?;
    assert_eq!(std::fs::read(&restored)?, b"tiny");
    Ok(())
}

#[test]
fn inspect_file_reads_header_only() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("doc.txt");
    let encrypted = dir.path().join("doc.pqf");
    std::fs::write(&input, b"document body")?;

    encrypt_file(
        &input,
        &encrypted,
        &keys.public,
        Some(&keys.signing.secret),
        None,
    )?;

    let header = inspect_file(&encrypted)?;
    assert_eq!(header.filename, "doc.txt");
    assert_eq!(header.file_size, 13);
    assert!(header.sig_len > 0);
    Ok(())
}

#[test]
fn verify_file_digest_checks_restored_output() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("archive.tar");
    let encrypted = dir.path().join("archive.pqf");
    let restored = dir.path().join("archive.out");
    std::fs::write(&input, vec![0xC3; 200_000])?;

    encrypt_file(&input, &encrypted, &keys.public, None, None)?;
    decrypt_file(&encrypted, &restored, &keys.private, None, None)?;

    let header = inspect_file(&encrypted)?;
    assert!(verify_file_digest(&restored, &header)?);

    // A corrupted restore no longer matches the header digest.
    let mut bytes = std::fs::read(&restored)?;
    bytes[0] ^= 0x01;
    std::fs::write(&restored, &bytes)?;
    assert!(!verify_file_digest(&restored, &header)?);
    Ok(())
}

#[test]
fn decrypting_a_plain_file_is_format_error() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let not_container = dir.path().join("plain.txt");
    std::fs::write(&not_container, b"just some text, no magic")?;

    let result = decrypt_file(
        &not_container,
        dir.path().join("out"),
        &keys.private,
        None,
        None,
    );
    assert!(matches!(result, Err(PqfError::Format(_))));
    Ok(())
}

#[test]
fn missing_input_is_io_error() {
    let keys = generate_keypairs().unwrap();
    let dir = tempdir().unwrap();
    let result = encrypt_file(
        dir.path().join("does-not-exist"),
        dir.path().join("out.pqf"),
        &keys.public,
        None,
        None,
    );
    assert!(matches!(result, Err(PqfError::Io(_))));
}

#[test]
fn truncated_container_file_rejected() -> Result<()> {
    let keys = generate_keypairs()?;
    let dir = tempdir()?;
    let input = dir.path().join("data.bin");
    let encrypted = dir.path().join("data.pqf");
    std::fs::write(&input, vec![0xAB; 4096])?;

    encrypt_file(&input, &encrypted, &keys.public, None, None)?;
    let mut bytes = std::fs::read(&encrypted)?;
    bytes.truncate(bytes.len() / 2);
    std::fs::write(&encrypted, &bytes)?;

    let result = decrypt_file(&encrypted, dir.path().join("out"), &keys.private, None, None);
    assert!(matches!(result, Err(PqfError::Authentication(_))));
    Ok(())
}
