//! Streaming SHA-256 file hasher.
//!
//! Files are read in fixed-size chunks so memory use stays flat regardless of
//! file size. A cancel flag is polled between chunks; a cancelled hash
//! returns [`HashError::Interrupted`] instead of a partial digest.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::HashError;
use crate::signal::CancelFlag;

/// Default read size for hashing (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A SHA-256 digest.
pub type Hash = [u8; 32];

/// Lowercase hex encoding of a digest.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().fold(String::with_capacity(64), |mut out, byte| {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Parse a 64-character hex string back into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

/// Content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    cancel: Option<CancelFlag>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }

    /// Set the read size. Zero falls back to the default.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    /// Poll `flag` between chunks.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Configured read size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Hash the full contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] when the file cannot be opened or read, or
    /// [`HashError::Interrupted`] when cancellation is observed.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        if self.is_cancelled() {
            return Err(HashError::Interrupted(path.to_path_buf()));
        }

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_cancelled() {
                log::trace!("Hashing of {} interrupted", path.display());
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize().into())
    }

    /// Hex digest of `path`.
    ///
    /// # Errors
    ///
    /// Same as [`full_hash`](Self::full_hash).
    pub fn full_hash_hex(&self, path: &Path) -> Result<String, HashError> {
        self.full_hash(path).map(|h| hash_to_hex(&h))
    }
}
