//! Gateway client for blob upload/download.
//!
//! Live mode talks to an IPFS gateway: `POST /api/v0/add` for uploads and
//! `GET /ipfs/<cid>` for downloads. Mock mode keeps blobs in memory and
//! derives a deterministic CID from the content hash, so pipeline tests
//! run without a gateway.
//!
//! Failures surface immediately; the round engine treats the store as
//! unreliable and never retries locally.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use alloy_primitives::keccak256;
use serde::Deserialize;
use tracing::{debug, info};

use dropcraft_core::DistributionBlob;

use crate::{validate_cid, Result, StoreError};

/// Store mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// In-memory blobs, deterministic CIDs
    Mock,
    /// HTTP gateway
    Live,
}

/// Store client configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store mode (Mock or Live)
    pub mode: StoreMode,
    /// Gateway base URL, e.g. `http://127.0.0.1:8080`
    pub gateway_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::Mock,
            gateway_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl StoreConfig {
    /// Mock configuration for development and tests.
    pub fn mock() -> Self {
        Self::default()
    }

    /// Live configuration against a gateway URL.
    pub fn live(gateway_url: impl Into<String>) -> Self {
        Self {
            mode: StoreMode::Live,
            gateway_url: gateway_url.into(),
        }
    }
}

/// Gateway `add` response (only the hash matters here).
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Blob store client.
pub struct StoreClient {
    config: StoreConfig,
    http: reqwest::Client,
    /// cid -> canonical JSON (mock mode only)
    mock_blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            mock_blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.config.mode == StoreMode::Mock
    }

    /// Upload a distribution blob, returning its CID.
    pub async fn upload(&self, blob: &DistributionBlob) -> Result<String> {
        let json = blob.to_canonical_json();

        if self.is_mock() {
            let cid = mock_cid(&json);
            self.mock_blobs
                .write()
                .expect("store lock poisoned")
                .insert(cid.clone(), json);
            debug!("[MOCK] Stored blob as {}", cid);
            return Ok(cid);
        }

        let url = format!("{}/api/v0/add?pin=true", self.config.gateway_url);
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(json.into_bytes()).file_name("distribution.json"),
        );

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::UploadFailed(format!("gateway HTTP {}", status)));
        }

        let parsed: AddResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::UploadFailed(format!("add response: {}", e)))?;

        if !validate_cid(&parsed.hash) {
            return Err(StoreError::InvalidCid(parsed.hash));
        }

        info!("Uploaded distribution blob: {}", parsed.hash);
        Ok(parsed.hash)
    }

    /// Download and decode a distribution blob by CID.
    pub async fn download(&self, cid: &str) -> Result<DistributionBlob> {
        if !validate_cid(cid) {
            return Err(StoreError::InvalidCid(cid.to_string()));
        }

        if self.is_mock() {
            let blobs = self.mock_blobs.read().expect("store lock poisoned");
            let json = blobs
                .get(cid)
                .ok_or_else(|| StoreError::DownloadFailed(format!("unknown CID {}", cid)))?;
            return serde_json::from_str(json)
                .map_err(|e| StoreError::ParseFailed(e.to_string()));
        }

        let url = format!("{}/ipfs/{}", self.config.gateway_url, cid);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::DownloadFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::DownloadFailed(format!(
                "gateway HTTP {} for {}",
                status, cid
            )));
        }

        resp.json::<DistributionBlob>()
            .await
            .map_err(|e| StoreError::ParseFailed(e.to_string()))
    }
}

/// Deterministic mock CID: base58 of a sha2-style multihash frame around
/// the content's keccak digest. Shape-compatible with `validate_cid`.
fn mock_cid(json: &str) -> String {
    let digest = keccak256(json.as_bytes());
    let mut framed = Vec::with_capacity(34);
    framed.push(0x12);
    framed.push(0x20);
    framed.extend_from_slice(digest.as_slice());
    bs58::encode(framed).into_string()
}
