//! AES-256-CBC encryption/decryption engine
//!
//! Wraps the RustCrypto CBC implementation behind an explicit
//! init/update/finalize context so callers can stream input in chunks:
//!
//! - `update` buffers any partial block and returns the bytes that are fully
//!   transformed so far
//! - `finalize` applies PKCS#7 padding (encrypt) or validates and strips it
//!   (decrypt)
//!
//! Padding is always added, so ciphertext is always 1..=16 bytes longer than
//! the plaintext and a multiple of the block size. Padding validity is the
//! only integrity signal: there is no authentication tag, and a wrong key or
//! IV surfaces as a padding failure.

use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use crate::keymat::KeyMaterial;
use aes::cipher::block_padding::{Padding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes256, Block};

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// IV length in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// Cipher block length in bytes.
pub const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Which transform a [`CipherContext`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Transient per-operation cipher state.
///
/// Single-use: create, call [`update`](Self::update) any number of times,
/// then exactly one [`finalize`](Self::finalize), which consumes the
/// context. Never shared across operations.
pub struct CipherContext {
    inner: Inner,
    pending: Vec<u8>,
}

enum Inner {
    Encrypt(Aes256CbcEnc),
    Decrypt(Aes256CbcDec),
}

impl CipherContext {
    /// Initialize a cipher context for the given direction.
    ///
    /// Fails when the key is not exactly 32 bytes or the IV is not exactly
    /// 16 bytes.
    pub fn new(direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(TextcryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Init,
                format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
            ));
        }
        if iv.len() != IV_LEN {
            return Err(TextcryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Init,
                format!("IV must be {} bytes, got {}", IV_LEN, iv.len()),
            ));
        }

        let inner = match direction {
            Direction::Encrypt => {
                Inner::Encrypt(Aes256CbcEnc::new_from_slices(key, iv).map_err(|e| {
                    TextcryptError::with_kind(
                        ErrorCategory::Internal,
                        ErrorKind::Init,
                        format!("cipher initialization failed: {}", e),
                    )
                })?)
            }
            Direction::Decrypt => {
                Inner::Decrypt(Aes256CbcDec::new_from_slices(key, iv).map_err(|e| {
                    TextcryptError::with_kind(
                        ErrorCategory::Internal,
                        ErrorKind::Init,
                        format!("cipher initialization failed: {}", e),
                    )
                })?)
            }
        };

        Ok(Self {
            inner,
            pending: Vec::new(),
        })
    }

    /// Feed a chunk of input, returning the bytes transformed so far.
    ///
    /// Up to one block of input is buffered internally until enough bytes
    /// arrive to complete it. In decrypt direction the final full block is
    /// additionally held back, since it carries the padding and cannot be
    /// emitted before [`finalize`](Self::finalize) validates it.
    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(input);

        let ready = match self.inner {
            Inner::Encrypt(_) => self.pending.len() - self.pending.len() % BLOCK_LEN,
            Inner::Decrypt(_) => self.pending.len().saturating_sub(1) / BLOCK_LEN * BLOCK_LEN,
        };

        let mut out = Vec::with_capacity(ready);
        for chunk in self.pending[..ready].chunks_exact(BLOCK_LEN) {
            let mut block = Block::clone_from_slice(chunk);
            match &mut self.inner {
                Inner::Encrypt(enc) => enc.encrypt_block_mut(&mut block),
                Inner::Decrypt(dec) => dec.decrypt_block_mut(&mut block),
            }
            out.extend_from_slice(block.as_slice());
        }
        self.pending.drain(..ready);
        out
    }

    /// Flush the transform, consuming the context.
    ///
    /// Encrypting pads the buffered partial block (possibly empty) to a full
    /// block, so this always returns exactly one block. Decrypting validates
    /// and strips the padding of the held-back final block; inconsistent
    /// padding bytes fail with [`ErrorKind::Padding`], and ciphertext whose
    /// total length was empty or not block-aligned fails with
    /// [`ErrorKind::Cipher`].
    pub fn finalize(self) -> Result<Vec<u8>> {
        let Self { inner, pending } = self;
        match inner {
            Inner::Encrypt(mut enc) => {
                debug_assert!(pending.len() < BLOCK_LEN);
                let mut block = Block::default();
                block.as_mut_slice()[..pending.len()].copy_from_slice(&pending);
                Pkcs7::pad(&mut block, pending.len());
                enc.encrypt_block_mut(&mut block);
                Ok(block.as_slice().to_vec())
            }
            Inner::Decrypt(mut dec) => {
                if pending.is_empty() {
                    return Err(TextcryptError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::Cipher,
                        "ciphertext is empty; expected at least one cipher block",
                    ));
                }
                if pending.len() != BLOCK_LEN {
                    return Err(TextcryptError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::Cipher,
                        "ciphertext length is not a multiple of the cipher block size",
                    ));
                }
                let mut block = Block::clone_from_slice(&pending);
                dec.decrypt_block_mut(&mut block);
                let stripped = Pkcs7::unpad(&block).map_err(|_| {
                    TextcryptError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::Padding,
                        "invalid padding in final block; wrong key/IV, tampering, or corruption",
                    )
                })?;
                Ok(stripped.to_vec())
            }
        }
    }
}

/// Encrypt a byte sequence in one call.
pub fn encrypt(keys: &KeyMaterial, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut ctx = CipherContext::new(Direction::Encrypt, keys.key(), keys.iv())?;
    let mut out = ctx.update(plaintext);
    out.extend(ctx.finalize()?);
    Ok(out)
}

/// Decrypt a byte sequence in one call.
pub fn decrypt(keys: &KeyMaterial, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut ctx = CipherContext::new(Direction::Decrypt, keys.key(), keys.iv())?;
    let mut out = ctx.update(ciphertext);
    out.extend(ctx.finalize()?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> KeyMaterial {
        KeyMaterial::from_parts([0x11u8; KEY_LEN], [0x22u8; IV_LEN])
    }

    #[test]
    fn test_empty_plaintext() {
        let keys = test_keys();
        let plaintext = b"";

        let ciphertext = encrypt(&keys, plaintext).unwrap();
        // Padding always adds a full block for aligned input.
        assert_eq!(ciphertext.len(), BLOCK_LEN);

        let decrypted = decrypt(&keys, &ciphertext).unwrap();
        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_small_plaintext() {
        let keys = test_keys();
        let plaintext = b"hello world";

        let ciphertext = encrypt(&keys, plaintext).unwrap();
        assert_eq!(ciphertext.len(), BLOCK_LEN);

        let decrypted = decrypt(&keys, &ciphertext).unwrap();
        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_all_byte_values() {
        let keys = test_keys();
        let plaintext: Vec<u8> = (0..=255).collect();

        let ciphertext = encrypt(&keys, &plaintext).unwrap();
        let decrypted = decrypt(&keys, &ciphertext).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_large_plaintext() {
        let keys = test_keys();
        let plaintext = vec![0x42u8; 128 * 1024]; // 128KB

        let ciphertext = encrypt(&keys, &plaintext).unwrap();
        let decrypted = decrypt(&keys, &ciphertext).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_ciphertext_length_law() {
        let keys = test_keys();
        for n in 0..66 {
            let plaintext = vec![0x5au8; n];
            let ciphertext = encrypt(&keys, &plaintext).unwrap();

            let expected = n + BLOCK_LEN - n % BLOCK_LEN;
            assert_eq!(ciphertext.len(), expected, "plaintext length {}", n);
            assert_eq!(ciphertext.len() % BLOCK_LEN, 0);
            assert!(ciphertext.len() > n, "padding must always be added");
        }
    }

    #[test]
    fn test_update_buffers_partial_blocks() {
        let keys = test_keys();
        let plaintext: Vec<u8> = (0..100).collect();

        // Feed the input one byte at a time; output must match the one-shot
        // result exactly.
        let mut ctx = CipherContext::new(Direction::Encrypt, keys.key(), keys.iv()).unwrap();
        let mut streamed = Vec::new();
        for byte in &plaintext {
            streamed.extend(ctx.update(std::slice::from_ref(byte)));
        }
        streamed.extend(ctx.finalize().unwrap());

        assert_eq!(streamed, encrypt(&keys, &plaintext).unwrap());
    }

    #[test]
    fn test_streamed_decrypt_matches_one_shot() {
        let keys = test_keys();
        let plaintext = b"streaming decryption, three blocks of data total!";
        let ciphertext = encrypt(&keys, plaintext).unwrap();

        let mut ctx = CipherContext::new(Direction::Decrypt, keys.key(), keys.iv()).unwrap();
        let mut streamed = Vec::new();
        for chunk in ciphertext.chunks(7) {
            streamed.extend(ctx.update(chunk));
        }
        streamed.extend(ctx.finalize().unwrap());

        assert_eq!(streamed, plaintext);
    }

    /// NIST SP 800-38A F.2.5 (CBC-AES256.Encrypt), first block.
    #[test]
    fn test_known_answer_vector() {
        let key = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let iv = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ];
        let plaintext = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected_first_block = [
            0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b,
            0xfb, 0xd6,
        ];

        let mut ctx = CipherContext::new(Direction::Encrypt, &key, &iv).unwrap();
        let first_block = ctx.update(&plaintext);
        assert_eq!(first_block, expected_first_block);

        // The padding block still round-trips.
        let keys = KeyMaterial::from_parts(key, iv);
        let ciphertext = encrypt(&keys, &plaintext).unwrap();
        assert_eq!(ciphertext.len(), 2 * BLOCK_LEN);
        assert_eq!(&ciphertext[..BLOCK_LEN], &expected_first_block);
        assert_eq!(decrypt(&keys, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_bad_key_length() {
        let result = CipherContext::new(Direction::Encrypt, &[0u8; 16], &[0u8; IV_LEN]);
        assert!(
            matches!(result, Err(ref e) if e.kind == Some(ErrorKind::Init)),
            "expected init failure"
        );
    }

    #[test]
    fn test_bad_iv_length() {
        let result = CipherContext::new(Direction::Decrypt, &[0u8; KEY_LEN], &[0u8; 12]);
        assert!(
            matches!(result, Err(ref e) if e.kind == Some(ErrorKind::Init)),
            "expected init failure"
        );
    }

    #[test]
    fn test_wrong_key_fails_with_padding_error() {
        let keys = test_keys();
        let plaintext = b"secret data across two cipher blocks here";
        let ciphertext = encrypt(&keys, plaintext).unwrap();

        let wrong = KeyMaterial::from_parts([0x12u8; KEY_LEN], *keys.iv());
        let err = decrypt(&wrong, &ciphertext).expect_err("wrong key must not decrypt");
        assert_eq!(err.kind, Some(ErrorKind::Padding));
    }

    #[test]
    fn test_wrong_iv_fails_with_padding_error() {
        let keys = test_keys();
        // Single-block plaintext: the IV feeds directly into the final
        // block's decryption, so the XOR difference between the real and
        // wrong IV lands byte-for-byte in the padding. The 0x87 difference
        // turns the 0x0b pad byte into 0x8c, never a valid pad length.
        let plaintext = b"short";
        let ciphertext = encrypt(&keys, plaintext).unwrap();

        let wrong = KeyMaterial::from_parts(*keys.key(), [0xa5u8; IV_LEN]);
        let err = decrypt(&wrong, &ciphertext).expect_err("wrong IV must not decrypt");
        assert_eq!(err.kind, Some(ErrorKind::Padding));
    }

    /// CBC propagates a bit flipped in ciphertext block N directly into
    /// plaintext block N+1, so flipping bytes of the next-to-last block
    /// corrupts the padding deterministically.
    #[test]
    fn test_padding_tamper_detection() {
        let keys = test_keys();
        let plaintext = b"twenty bytes of text"; // 2 blocks, 12 pad bytes
        let ciphertext = encrypt(&keys, plaintext).unwrap();
        assert_eq!(ciphertext.len(), 2 * BLOCK_LEN);

        for pos in 4..BLOCK_LEN {
            let mut tampered = ciphertext.clone();
            tampered[pos] ^= 0xff;
            let err = decrypt(&keys, &tampered).expect_err("tampered padding must not decrypt");
            assert_eq!(err.kind, Some(ErrorKind::Padding), "tampered byte {}", pos);
        }
    }

    #[test]
    fn test_truncated_ciphertext() {
        let keys = test_keys();
        let ciphertext = encrypt(&keys, b"hello world").unwrap();

        let err = decrypt(&keys, &ciphertext[..ciphertext.len() - 1])
            .expect_err("unaligned ciphertext must fail");
        assert_eq!(err.kind, Some(ErrorKind::Cipher));
    }

    #[test]
    fn test_empty_ciphertext() {
        let keys = test_keys();
        let err = decrypt(&keys, b"").expect_err("empty ciphertext must fail");
        assert_eq!(err.kind, Some(ErrorKind::Cipher));
    }
}
