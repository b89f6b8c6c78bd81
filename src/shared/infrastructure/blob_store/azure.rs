// Azure Blob Storage implementation of the BlobStore port, over the REST API.
//
// Responsibilities
// - Address objects as {endpoint}/{container}/{blob}.
// - Attach the configured credential: SAS token as query string, or a bearer
//   token. Managed identity tokens are fetched each time a store is opened.
// - Map HTTP status codes onto BlobStoreError.

use crate::shared::infrastructure::blob_store::managed_identity::ManagedIdentity;
use crate::shared::infrastructure::blob_store::{BlobStore, BlobStoreError, BlobStoreProvider};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "2023-11-03";

#[derive(Clone, PartialEq, Eq)]
pub enum StorageCredential {
    Anonymous,
    SasToken(String),
    BearerToken(String),
    ManagedIdentity(ManagedIdentity),
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::SasToken(_) => f.write_str("SasToken(<redacted>)"),
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
            Self::ManagedIdentity(identity) => f.debug_tuple("ManagedIdentity").field(identity).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AzureBlobConfig {
    pub endpoint: String,
    pub credential: StorageCredential,
    pub timeout: Duration,
}

impl AzureBlobConfig {
    pub fn account_endpoint(account: &str) -> String {
        format!("https://{account}.blob.core.windows.net")
    }
}

/// Opens one `AzureBlobStore` per run, each with its own HTTP client.
pub struct AzureBlobProvider {
    config: AzureBlobConfig,
}

impl AzureBlobProvider {
    pub fn new(config: AzureBlobConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BlobStoreProvider for AzureBlobProvider {
    async fn open(&self) -> Result<Box<dyn BlobStore>, BlobStoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .timeout(self.config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BlobStoreError::Backend(format!("failed to build HTTP client: {e}")))?;

        let (sas_token, bearer_token) = match &self.config.credential {
            StorageCredential::Anonymous => (None, None),
            StorageCredential::SasToken(token) => (Some(token.clone()), None),
            StorageCredential::BearerToken(token) => (None, Some(token.clone())),
            StorageCredential::ManagedIdentity(identity) => {
                (None, Some(identity.acquire_token(&client).await?))
            }
        };

        debug!(endpoint = %self.config.endpoint, "opened blob storage client");
        Ok(Box::new(AzureBlobStore {
            client,
            endpoint: self.config.endpoint.clone(),
            sas_token,
            bearer_token,
        }))
    }
}

pub struct AzureBlobStore {
    client: Client,
    endpoint: String,
    sas_token: Option<String>,
    bearer_token: Option<String>,
}

impl AzureBlobStore {
    fn blob_url(&self, container: &str, blob: &str) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            container,
            blob
        );
        if let Some(sas) = &self.sas_token {
            url.push('?');
            url.push_str(sas.trim_start_matches('?'));
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// `create_only` marks a put sent with `If-None-Match: *`. Only then does a
/// conflict mean the blob already exists.
async fn status_error(
    response: Response,
    container: &str,
    blob: &str,
    create_only: bool,
) -> BlobStoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    map_status(status, body, container, blob, create_only)
}

fn map_status(
    status: StatusCode,
    body: String,
    container: &str,
    blob: &str,
    create_only: bool,
) -> BlobStoreError {
    match status {
        StatusCode::NOT_FOUND => BlobStoreError::NotFound {
            container: container.to_string(),
            blob: blob.to_string(),
        },
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED if create_only => {
            BlobStoreError::AlreadyExists {
                container: container.to_string(),
                blob: blob.to_string(),
            }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BlobStoreError::Unauthorized(format!("{status}: {body}"))
        }
        _ => BlobStoreError::Backend(format!("{status}: {body}")),
    }
}

fn transport_error(err: reqwest::Error) -> BlobStoreError {
    BlobStoreError::Backend(err.to_string())
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn get(&self, container: &str, blob: &str) -> Result<Vec<u8>, BlobStoreError> {
        let response = self
            .authorize(self.client.get(self.blob_url(container, blob)))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, container, blob, false).await);
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    async fn put(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError> {
        let mut request = self
            .authorize(self.client.put(self.blob_url(container, blob)))
            .header("x-ms-blob-type", "BlockBlob")
            .body(body);
        if !overwrite {
            request = request.header(IF_NONE_MATCH, "*");
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response, container, blob, !overwrite).await);
        }
        Ok(())
    }
}
