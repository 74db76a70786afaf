//! In-place file encryption/decryption
//!
//! Each transform follows a rename-read-transform-write-cleanup sequence:
//! the target is first renamed to `<name>.tmp` in the same directory, the
//! temporary file is read, the content is transformed in memory, the result
//! is written back under the original name, and only then is the temporary
//! file deleted. Rename is atomic on the same filesystem, so at any
//! inspectable moment the file under the original name is either fully the
//! old content or fully the new content.
//!
//! If any step between rename and write fails, the temporary file is left in
//! place: it holds the only copy of the original content and the caller can
//! recover it manually. A cleanup failure after a successful write is
//! reported but does not undo the transform.

use crate::cipher;
use crate::codec;
use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use crate::keymat::KeyMaterial;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the original name to form the temporary name.
const TEMP_SUFFIX: &str = "tmp";

/// Encrypt a file in place.
///
/// Reads the file's bytes, encrypts them with AES-256-CBC, and replaces the
/// file content with the base64-armored ciphertext.
pub fn encrypt_file(path: &Path, keys: &KeyMaterial) -> Result<()> {
    let temp_path = temp_path_for(path);
    rename_to_temp(path, &temp_path)?;
    let plaintext = read_fully(&temp_path)?;
    let ciphertext = cipher::encrypt(keys, &plaintext)
        .map_err(|e| e.with_context(format!("failed to encrypt {}", path.display())))?;
    let armored = codec::encode(&ciphertext);
    write_output(path, armored.as_bytes())?;
    remove_temp(&temp_path)?;
    Ok(())
}

/// Decrypt a file in place.
///
/// Reads the base64-armored ciphertext, decodes and decrypts it with the
/// same key material used at encryption time, and replaces the file content
/// with the plaintext.
pub fn decrypt_file(path: &Path, keys: &KeyMaterial) -> Result<()> {
    let temp_path = temp_path_for(path);
    rename_to_temp(path, &temp_path)?;
    let armored_bytes = read_fully(&temp_path)?;
    let armored = String::from_utf8(armored_bytes).map_err(|e| {
        TextcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Decode,
            format!("{} is not valid UTF-8 text", path.display()),
            e,
        )
    })?;
    let ciphertext = codec::decode(&armored)
        .map_err(|e| e.with_context(format!("failed to decode {}", path.display())))?;
    let plaintext = cipher::decrypt(keys, &ciphertext)
        .map_err(|e| e.with_context(format!("failed to decrypt {}", path.display())))?;
    write_output(path, &plaintext)?;
    remove_temp(&temp_path)?;
    Ok(())
}

/// Read a file's full content without any temp-file choreography.
///
/// Used for plain display of a file.
pub fn read_file_contents(path: &Path) -> Result<Vec<u8>> {
    read_fully(path)
}

/// The temporary name used while transforming `path`: `<name>.tmp` in the
/// same directory.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

fn rename_to_temp(path: &Path, temp_path: &Path) -> Result<()> {
    // fs::rename would silently replace an existing temp file, losing
    // whatever it held. Refuse instead; the original stays untouched.
    if temp_path.exists() {
        return Err(TextcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Rename,
            format!(
                "temporary file {} already exists; remove it before retrying",
                temp_path.display()
            ),
        ));
    }
    fs::rename(path, temp_path).map_err(|e| {
        TextcryptError::with_kind_and_source(
            category_for(&e),
            ErrorKind::Rename,
            format!(
                "failed to rename {} to {}",
                path.display(),
                temp_path.display()
            ),
            e,
        )
    })
}

fn read_fully(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        TextcryptError::with_kind_and_source(
            category_for(&e),
            ErrorKind::Read,
            format!("failed to read from {}", path.display()),
            e,
        )
    })
}

fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| {
        TextcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            format!("failed to write {}", path.display()),
            e,
        )
    })
}

fn remove_temp(temp_path: &Path) -> Result<()> {
    fs::remove_file(temp_path).map_err(|e| {
        TextcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Cleanup,
            format!(
                "transform succeeded but the temporary file {} could not be deleted",
                temp_path.display()
            ),
            e,
        )
    })
}

fn category_for(err: &io::Error) -> ErrorCategory {
    if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    }
}
