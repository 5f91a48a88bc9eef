//! Dropcraft Keystore
//!
//! Operator signing-key management. The key is stored as a hex-encoded
//! secp256k1 private key; nothing here custodies funds beyond the gas
//! wallet the operator chooses to load.

mod paths;
mod signer;

pub use paths::expand_path;
pub use signer::load_or_generate_signer;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Failed to read keyfile: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write keyfile: {0}")]
    WriteError(std::io::Error),

    #[error("Invalid keyfile format: {0}")]
    InvalidFormat(String),

    #[error("Failed to create directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, KeystoreError>;
