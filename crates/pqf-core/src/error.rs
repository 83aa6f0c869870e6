use thiserror::Error;

pub type PqfResult<T> = Result<T, PqfError>;

/// Closed error taxonomy for the pqfile engine.
///
/// Callers are expected to match on the variant, not the message: the
/// variant is the security signal, the message is log context. Everything
/// that fails during decapsulation, AEAD open, or signature verification is
/// reported as [`PqfError::Authentication`] so a probing caller cannot tell
/// which sub-step rejected the input. Messages never contain key material.
#[derive(Debug, Error)]
pub enum PqfError {
    /// Bad magic, unsupported version/algorithm, truncated input, or a
    /// length field that disagrees with its payload. Detected before any
    /// key material is touched.
    #[error("invalid container format: {0}")]
    Format(String),

    /// Malformed key bytes or a key of the wrong type/length.
    #[error("invalid key: {0}")]
    Key(String),

    /// KEM/ECDH decapsulation failure, AEAD tag failure, or signature
    /// rejection. One category on purpose.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Plaintext digest mismatch after a successful AEAD open. Valid tag,
    /// wrong content; flagged separately for logs, equally fatal.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// Key generation or memory failure; fatal for the current call only.
    #[error("resource failure: {0}")]
    Resource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PqfError {
    /// True for errors a caller may safely report as "not a valid container".
    pub fn is_format(&self) -> bool {
        matches!(self, PqfError::Format(_))
    }

    /// True for errors that indicate the input failed a cryptographic check.
    pub fn is_security(&self) -> bool {
        matches!(
            self,
            PqfError::Key(_) | PqfError::Authentication(_) | PqfError::Integrity(_)
        )
    }
}
