//! Per-process key material
//!
//! A random 256-bit key and 128-bit IV are generated once at process start
//! and shared read-only across all operations for the lifetime of the
//! session. They are never persisted and never derived from anything, so
//! ciphertext produced in one run cannot be decrypted in a later run. Both
//! values are wiped from memory on drop.

use crate::cipher::{IV_LEN, KEY_LEN};
use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use rand::TryRngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret key and IV for one process lifetime.
///
/// Immutable after construction; every cipher operation borrows it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl KeyMaterial {
    /// Generate fresh key material from the operating system's secure
    /// random source.
    ///
    /// There is no fallback to a non-cryptographic generator: if the source
    /// is unavailable this fails, and the caller is expected to treat that
    /// as fatal.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        fill_secure(&mut key)?;
        fill_secure(&mut iv)?;
        Ok(Self { key, iv })
    }

    /// Construct key material from fixed values.
    ///
    /// Intended for tests that need deterministic ciphertext. Production
    /// code should always use [`KeyMaterial::generate`].
    pub fn from_parts(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

fn fill_secure(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        TextcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::RandomSource,
            "secure random source unavailable",
            e,
        )
    })
}
