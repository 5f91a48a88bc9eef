//! Signer key loading and generation.

use std::path::Path;

use alloy_signer_local::PrivateKeySigner;
use tracing::info;

use crate::paths::expand_path;
use crate::{KeystoreError, Result};

/// Load an existing operator signing key from disk, or generate a new one.
///
/// The keyfile holds the hex-encoded 32-byte private key, with or without
/// a `0x` prefix. `~` in the path is expanded.
pub fn load_or_generate_signer(keyfile: &Path) -> Result<PrivateKeySigner> {
    let path = expand_path(keyfile);

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(KeystoreError::CreateDirError)?;
        }
    }

    if path.exists() {
        let raw = std::fs::read_to_string(&path).map_err(KeystoreError::ReadError)?;
        let trimmed = raw.trim().trim_start_matches("0x");
        let signer: PrivateKeySigner = trimmed
            .parse()
            .map_err(|e| KeystoreError::InvalidFormat(format!("{}", e)))?;
        info!("Loaded signer {} from {:?}", signer.address(), path);
        return Ok(signer);
    }

    let signer = PrivateKeySigner::random();
    std::fs::write(&path, hex::encode(signer.to_bytes()))
        .map_err(KeystoreError::WriteError)?;
    info!("Generated new signer {} at {:?}", signer.address(), path);
    Ok(signer)
}
