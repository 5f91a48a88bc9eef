//! Dropcraft Core
//!
//! Shared types for the distribution pipeline: cumulative claims, the
//! published distribution blob, and hex helpers used across crates.

mod types;

pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid address in blob: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount in blob: {0}")]
    InvalidAmount(String),

    #[error("Invalid node hash in blob: {0}")]
    InvalidNode(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
