// Managed identity token source for Azure Storage.
//
// Responsibilities
// - Locate the identity endpoint: App Service and Functions publish
//   IDENTITY_ENDPOINT and IDENTITY_HEADER, every other Azure host answers on
//   the instance metadata address.
// - Fetch an access token for the storage resource. Nothing is cached; each
//   call asks the endpoint again.

use crate::shared::infrastructure::blob_store::BlobStoreError;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

pub const STORAGE_RESOURCE: &str = "https://storage.azure.com/";
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

#[derive(Clone, PartialEq, Eq)]
pub struct ManagedIdentity {
    pub endpoint: String,
    /// Secret sent as `X-IDENTITY-HEADER` on App Service. `None` selects the
    /// instance metadata protocol.
    pub identity_header: Option<String>,
    /// User-assigned identity. `None` uses the system-assigned one.
    pub client_id: Option<String>,
}

impl fmt::Debug for ManagedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedIdentity")
            .field("endpoint", &self.endpoint)
            .field(
                "identity_header",
                &self.identity_header.as_ref().map(|_| "<redacted>"),
            )
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ManagedIdentity {
    pub fn instance_metadata() -> Self {
        Self {
            endpoint: IMDS_ENDPOINT.to_string(),
            identity_header: None,
            client_id: None,
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let client_id = lookup("AZURE_CLIENT_ID");
        match (lookup("IDENTITY_ENDPOINT"), lookup("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => Self {
                endpoint,
                identity_header: Some(header),
                client_id,
            },
            _ => Self {
                client_id,
                ..Self::instance_metadata()
            },
        }
    }

    pub async fn acquire_token(&self, client: &Client) -> Result<String, BlobStoreError> {
        let api_version = match self.identity_header {
            Some(_) => APP_SERVICE_API_VERSION,
            None => IMDS_API_VERSION,
        };
        let mut query = vec![("resource", STORAGE_RESOURCE), ("api-version", api_version)];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        let mut request = client.get(&self.endpoint).query(&query);
        request = match &self.identity_header {
            Some(secret) => request.header("X-IDENTITY-HEADER", secret.as_str()),
            None => request.header("Metadata", "true"),
        };

        debug!(endpoint = %self.endpoint, "requesting managed identity token");
        let response = request.send().await.map_err(|e| {
            BlobStoreError::Unauthorized(format!("managed identity endpoint unreachable: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = %self.endpoint, status = %status, "managed identity token refused");
            return Err(BlobStoreError::Unauthorized(format!(
                "managed identity endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            BlobStoreError::Unauthorized(format!("unreadable managed identity token: {e}"))
        })?;
        Ok(token.access_token)
    }
}

#[cfg(test)]
pub(crate) mod managed_identity_tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::get,
    };
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const TEST_SECRET: &str = "identity-secret";
    pub(crate) const TEST_TOKEN: &str = "storage-token";

    #[derive(Clone, Default)]
    pub(crate) struct TokenEndpoint {
        pub(crate) requests: Arc<AtomicUsize>,
    }

    impl TokenEndpoint {
        pub(crate) fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    async fn issue_token(
        State(endpoint): State<TokenEndpoint>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        endpoint.requests.fetch_add(1, Ordering::SeqCst);
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let authorised = match params.get("api-version").map(String::as_str) {
            Some(APP_SERVICE_API_VERSION) => header("x-identity-header") == Some(TEST_SECRET),
            Some(IMDS_API_VERSION) => header("metadata") == Some("true"),
            _ => false,
        };
        if !authorised || params.get("resource").map(String::as_str) != Some(STORAGE_RESOURCE) {
            return (StatusCode::BAD_REQUEST, "identity not found").into_response();
        }
        let token = match params.get("client_id") {
            Some(client_id) => format!("{TEST_TOKEN}-{client_id}"),
            None => TEST_TOKEN.to_string(),
        };
        Json(serde_json::json!({
            "access_token": token,
            "expires_on": "1767225600",
            "resource": STORAGE_RESOURCE,
            "token_type": "Bearer"
        }))
        .into_response()
    }

    /// Serves a token endpoint on a loopback port and returns its URL.
    pub(crate) async fn serve_token_endpoint(endpoint: TokenEndpoint) -> String {
        let router = Router::new()
            .route("/msi/token", get(issue_token))
            .with_state(endpoint);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/msi/token")
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_acquire_a_token_from_the_app_service_endpoint() {
        let endpoint = TokenEndpoint::default();
        let identity = ManagedIdentity {
            endpoint: serve_token_endpoint(endpoint.clone()).await,
            identity_header: Some(TEST_SECRET.into()),
            client_id: None,
        };
        let token = identity.acquire_token(&Client::new()).await.unwrap();
        assert_eq!(token, TEST_TOKEN);
        assert_eq!(endpoint.requests(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_acquire_a_token_for_a_user_assigned_identity_over_imds() {
        let identity = ManagedIdentity {
            endpoint: serve_token_endpoint(TokenEndpoint::default()).await,
            identity_header: None,
            client_id: Some("client-1".into()),
        };
        let token = identity.acquire_token(&Client::new()).await.unwrap();
        assert_eq!(token, format!("{TEST_TOKEN}-client-1"));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_refused_token_as_unauthorized() {
        let identity = ManagedIdentity {
            endpoint: serve_token_endpoint(TokenEndpoint::default()).await,
            identity_header: Some("wrong-secret".into()),
            client_id: None,
        };
        let result = identity.acquire_token(&Client::new()).await;
        match result {
            Err(BlobStoreError::Unauthorized(message)) => {
                assert!(message.contains("400"), "unexpected message {message}")
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[rstest]
    fn it_should_pick_the_app_service_endpoint_when_published() {
        let env = HashMap::from([
            ("IDENTITY_ENDPOINT", "http://127.0.0.1:41741/msi/token"),
            ("IDENTITY_HEADER", "secret"),
            ("AZURE_CLIENT_ID", "client-1"),
        ]);
        let identity = ManagedIdentity::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(
            identity,
            ManagedIdentity {
                endpoint: "http://127.0.0.1:41741/msi/token".into(),
                identity_header: Some("secret".into()),
                client_id: Some("client-1".into()),
            }
        );
    }

    #[rstest]
    #[case(HashMap::new())]
    #[case(HashMap::from([("IDENTITY_ENDPOINT", "http://127.0.0.1:41741/msi/token")]))]
    fn it_should_default_to_instance_metadata(#[case] env: HashMap<&'static str, &'static str>) {
        let identity = ManagedIdentity::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(identity, ManagedIdentity::instance_metadata());
    }

    #[rstest]
    fn it_should_not_leak_the_identity_header_through_debug() {
        let identity = ManagedIdentity {
            endpoint: IMDS_ENDPOINT.into(),
            identity_header: Some("secret".into()),
            client_id: None,
        };
        assert!(!format!("{identity:?}").contains("secret"));
    }
}
