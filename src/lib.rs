//! Textcrypt - interactive in-place file encryption using AES-256-CBC
//!
//! Ciphertext is stored as base64 text so encrypted files stay printable,
//! and files are replaced in place through a rename-based scheme that keeps
//! the original content recoverable if any step fails. The key and IV are
//! random per process run and never persisted.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod codec;
pub mod error;
pub mod file_ops;
pub mod keymat;
pub mod listing;
pub mod menu;
