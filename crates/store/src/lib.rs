//! Dropcraft Store
//!
//! Content-addressed blob store adapter. Uploads and downloads distribution
//! blobs by CID through an IPFS-style gateway, with an in-memory mock mode
//! for development and tests.
//!
//! The store is never trusted to authenticate content: CID checks here are
//! syntactic only, and the engine re-hashes every downloaded tree against
//! the on-chain root.

mod cid;
mod client;

pub use cid::validate_cid;
pub use client::{StoreClient, StoreConfig, StoreMode};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid CID: {0}")]
    InvalidCid(String),

    #[error("Blob upload failed: {0}")]
    UploadFailed(String),

    #[error("Blob download failed: {0}")]
    DownloadFailed(String),

    #[error("Blob parse failed: {0}")]
    ParseFailed(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
