//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Operator settings.
///
/// Addresses stay as strings here; the CLI parses and validates them when
/// it wires up the chain client, so a config file with placeholders can
/// still be loaded and inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// EVM RPC endpoint (archive-class for historical balance reads)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Wrapper (vault) contract address
    #[serde(default)]
    pub wrapper_addr: String,

    /// Distributor contract address
    #[serde(default)]
    pub distributor_addr: String,

    /// Operator fee in percent, e.g. `10.0`
    #[serde(default)]
    pub operator_fee: f64,

    /// Where `proof` writes its bundle
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Content-addressed store gateway
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    /// Informational only; the distributor's getTokens() is authoritative
    #[serde(default)]
    pub token_addr: String,

    /// Signer private-key file (`~` expansion supported)
    #[serde(default)]
    pub keyfile: Option<PathBuf>,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_output_file() -> String {
    "proof.json".to_string()
}

fn default_ipfs_gateway() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            wrapper_addr: String::new(),
            distributor_addr: String::new(),
            operator_fee: 0.0,
            output_file: default_output_file(),
            ipfs_gateway: default_ipfs_gateway(),
            token_addr: String::new(),
            keyfile: None,
            config_path: None,
        }
    }
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.clone());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.clone());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
