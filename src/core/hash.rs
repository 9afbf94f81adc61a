use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Width of a content hash in bytes (SHA-1)
pub const HASH_LENGTH: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashError {
    #[error("Invalid hash length: expected {HASH_LENGTH} bytes, found {0}")]
    InvalidLength(usize),

    #[error("Invalid hex digest: '{0}'")]
    InvalidHex(String),
}

/// A 160-bit content hash standing in for an exact-match test on a signature.
///
/// Ordering is big-endian unsigned byte comparison, which is exactly the
/// derived lexicographic order on `[u8; 20]`. The original signature string is
/// never retained; equal strings always produce equal hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; HASH_LENGTH]);

impl ContentHash {
    /// Digest an arbitrary signature string.
    #[must_use]
    pub fn of(signature: &str) -> Self {
        let digest = Sha1::digest(signature.as_bytes());
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Wrap an existing 20-byte digest (e.g. read from storage, or a file hash).
    ///
    /// # Errors
    ///
    /// Returns `HashError::InvalidLength` if `bytes` is not exactly 20 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        let array: [u8; HASH_LENGTH] = bytes
            .try_into()
            .map_err(|_| HashError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Parse a 40-character hex digest (either case).
    ///
    /// # Errors
    ///
    /// Returns `HashError::InvalidHex` if the string is not 40 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if !crate::utils::validation::is_valid_sha1(hex) {
            return Err(HashError::InvalidHex(hex.to_string()));
        }
        let mut bytes = [0u8; HASH_LENGTH];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| HashError::InvalidHex(hex.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
