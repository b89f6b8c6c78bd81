// Process configuration, read once from the environment at startup.
//
// Required: STORAGE_ACCOUNT, SOURCE_CONTAINER_NAME, TARGET_CONTAINER_NAME.
// Everything else has a default. Empty values count as absent.
//
// Storage credential, first match wins:
// - STORAGE_SAS_TOKEN or STORAGE_ACCESS_TOKEN (not both).
// - STORAGE_CREDENTIAL=anonymous, for Azurite or public containers.
// - Managed identity (IDENTITY_ENDPOINT/IDENTITY_HEADER, else instance
//   metadata; AZURE_CLIENT_ID selects a user-assigned identity).

use chrono::NaiveDate;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::modules::checkpoints::adapters::outbound::checkpoint_store::{
    CheckpointLocation, DEFAULT_CHECKPOINT_BLOB, DEFAULT_CHECKPOINT_CONTAINER,
};
use crate::shared::infrastructure::blob_store::azure::{AzureBlobConfig, StorageCredential};
use crate::shared::infrastructure::blob_store::managed_identity::ManagedIdentity;

pub const DEFAULT_FILTER_DATE: &str = "2025-01-01";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7071";
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("STORAGE_SAS_TOKEN and STORAGE_ACCESS_TOKEN are mutually exclusive")]
    ConflictingCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Azure,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_account: String,
    pub source_container: String,
    pub target_container: String,
    /// Parsed from FILTER_DATE. The processing window is bounded by the stored
    /// watermark instead; this value is carried but not consulted.
    pub filter_date: NaiveDate,
    pub checkpoint: CheckpointLocation,
    pub storage_backend: StorageBackend,
    pub storage: AzureBlobConfig,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let storage_account = require("STORAGE_ACCOUNT")?;
        let source_container = require("SOURCE_CONTAINER_NAME")?;
        let target_container = require("TARGET_CONTAINER_NAME")?;

        let filter_date_raw = get("FILTER_DATE").unwrap_or_else(|| DEFAULT_FILTER_DATE.into());
        let filter_date = NaiveDate::parse_from_str(&filter_date_raw, "%Y-%m-%d").map_err(|e| {
            ConfigError::Invalid {
                key: "FILTER_DATE",
                value: filter_date_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let checkpoint = CheckpointLocation {
            container: get("CHECKPOINT_CONTAINER")
                .unwrap_or_else(|| DEFAULT_CHECKPOINT_CONTAINER.into()),
            blob: get("CHECKPOINT_BLOB").unwrap_or_else(|| DEFAULT_CHECKPOINT_BLOB.into()),
        };

        let storage_backend = match get("STORAGE_BACKEND").as_deref() {
            None | Some("azure") => StorageBackend::Azure,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                    reason: "expected \"azure\" or \"memory\"".into(),
                });
            }
        };

        let credential = match (get("STORAGE_SAS_TOKEN"), get("STORAGE_ACCESS_TOKEN")) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCredentials),
            (Some(sas), None) => StorageCredential::SasToken(sas),
            (None, Some(token)) => StorageCredential::BearerToken(token),
            (None, None) => match get("STORAGE_CREDENTIAL").as_deref() {
                None | Some("managed_identity") => {
                    StorageCredential::ManagedIdentity(ManagedIdentity::from_lookup(&get))
                }
                Some("anonymous") => StorageCredential::Anonymous,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        key: "STORAGE_CREDENTIAL",
                        value: other.to_string(),
                        reason: "expected \"managed_identity\" or \"anonymous\"".into(),
                    });
                }
            },
        };

        let timeout_ms = match get("STORAGE_TIMEOUT_MS") {
            None => DEFAULT_STORAGE_TIMEOUT_MS,
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "STORAGE_TIMEOUT_MS",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };

        let storage = AzureBlobConfig {
            endpoint: get("STORAGE_ENDPOINT")
                .unwrap_or_else(|| AzureBlobConfig::account_endpoint(&storage_account)),
            credential,
            timeout: Duration::from_millis(timeout_ms),
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            storage_account,
            source_container,
            target_container,
            filter_date,
            checkpoint,
            storage_backend,
            storage,
            bind_addr,
        })
    }
}
