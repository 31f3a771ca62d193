use async_trait::async_trait;
use pronord_core::config::ApiConfig;
use pronord_core::{Credentials, Error, Result, UserRecord};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CSRF_HEADER: &str = "x-csrf-token";

/// One user object as the lookup endpoint returns it.
#[derive(Debug, Deserialize)]
struct RemoteUser {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    screen_name: String,
    #[serde(default)]
    id_str: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl From<RemoteUser> for UserRecord {
    fn from(remote: RemoteUser) -> Self {
        UserRecord {
            handle: remote.screen_name,
            id: remote.id_str,
            name: remote.name,
            bio: remote.description,
            location: remote.location,
        }
    }
}

/// Seam between the retry pipeline and the wire. Tests substitute a
/// recording mock here.
#[async_trait]
pub trait BioLookup: Send + Sync {
    async fn lookup(&self, handles: &[String], creds: &Credentials) -> Result<Vec<UserRecord>>;
}

/// Production lookup client: one batched POST per handle set, bearer
/// and CSRF tokens on the headers, empty body.
pub struct BioApiClient {
    client: Client,
    endpoint: String,
}

impl BioApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: config.lookup_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn lookup_url(&self, handles: &[String]) -> String {
        format!(
            "{}?skip_status=1&screen_name={}",
            self.endpoint,
            handles.join(",")
        )
    }
}

#[async_trait]
impl BioLookup for BioApiClient {
    async fn lookup(&self, handles: &[String], creds: &Credentials) -> Result<Vec<UserRecord>> {
        let url = self.lookup_url(handles);
        debug!(batch = handles.len(), "requesting bios");

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                creds.bearer.as_deref().unwrap_or_default(),
            )
            .header(CSRF_HEADER, creds.csrf.as_deref().unwrap_or_default())
            .send()
            .await
            .map_err(|e| Error::Transport(format!("bio lookup request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("bio lookup got HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("bio lookup body read failed: {}", e)))?;

        let users: Vec<RemoteUser> = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("unexpected lookup response: {}", e)))?;

        Ok(users.into_iter().map(UserRecord::from).collect())
    }
}
