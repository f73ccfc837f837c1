//! Core abstractions for OpenPGP decryption: the keyring source contract and
//! the immutable configuration handed to a decryption engine.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod config;
pub mod passphrase;
pub mod source;

pub use config::DecryptionConfig;
pub use passphrase::Passphrase;
pub use source::{FnSource, KeyringKind, KeyringSource, KeyringSourceError, KeyringStream};
