//! Nexus repository manager client for artifetch.
//!
//! Talks to the Nexus 2 REST API:
//! - `service/local/artifact/maven/resolve` for version and checksum metadata
//! - `service/local/artifact/maven/redirect` to download the artifact file
//! - `service/local/global_settings/current` to detect anonymous access
//!
//! Credentials from the repository record are sent as HTTP basic auth.

mod wire;

use artifetch_engine::config::RepositoryConfig;
use artifetch_engine::http::{ResponseBody, USER_AGENT};
use artifetch_engine::location::Coordinate;
use artifetch_engine::repository::{
    ArtifactEndpoint, ArtifactMetadata, PulledArtifact, RepositoryClient, RepositoryConnector,
    artifact_url,
};
use artifetch_engine::stream::write_to_file;
use artifetch_engine::{Error, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::wire::{ResolveResponse, SettingsResponse};

const GLOBAL_SETTINGS_PATH: [&str; 4] = ["service", "local", "global_settings", "current"];

/// Connects [`NexusClient`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct NexusConnector;

impl NexusConnector {
    /// Create a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RepositoryConnector for NexusConnector {
    async fn connect(
        &self,
        config: &RepositoryConfig,
        ssl_verify: bool,
    ) -> Result<Arc<dyn RepositoryClient>> {
        Ok(Arc::new(NexusClient::new(config, ssl_verify)?))
    }
}

/// A client bound to one Nexus instance and repository.
pub struct NexusClient {
    http: Client,
    base: Url,
    repository: String,
    credentials: Option<(String, SecretString)>,
}

impl std::fmt::Debug for NexusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NexusClient")
            .field("base", &self.base.as_str())
            .field("repository", &self.repository)
            .field("authenticated", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl NexusClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transfer`] if the HTTP client cannot be initialised.
    pub fn new(config: &RepositoryConfig, ssl_verify: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!ssl_verify)
            .build()
            .map_err(|e| Error::transfer(config.url.as_str(), e))?;

        Ok(Self {
            http,
            base: config.url.clone(),
            repository: config.repository.clone(),
            credentials: config
                .credentials()
                .map(|(user, password)| (user.to_string(), SecretString::from(password.to_string()))),
        })
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.http.get(url);
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password.expose_secret())),
            None => request,
        }
    }

    async fn send(&self, url: Url, context: &str) -> Result<Response> {
        self.get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| Error::transfer(context, e))
    }

    fn settings_url(&self) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| Error::config_decode("nexus", "url", format!("{}: cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(GLOBAL_SETTINGS_PATH);
        Ok(url)
    }

    /// Host the client talks to, for error context.
    fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }
}

#[async_trait]
impl RepositoryClient for NexusClient {
    async fn metadata(&self, coordinate: &Coordinate) -> Result<ArtifactMetadata> {
        let context = coordinate.to_string();
        let url = artifact_url(&self.base, ArtifactEndpoint::Resolve, &self.repository, coordinate)?;
        debug!(%coordinate, repository = %self.repository, "Resolving artifact metadata");

        let body = self
            .send(url, &context)
            .await?
            .text()
            .await
            .map_err(|e| Error::transfer(context.as_str(), e))?;

        let resolved: ResolveResponse = serde_json::from_str(&body)
            .map_err(|e| Error::metadata_parse(context.as_str(), e.to_string()))?;

        Ok(ArtifactMetadata {
            version: resolved.data.version,
            sha1: resolved.data.sha1,
        })
    }

    async fn pull(&self, coordinate: &Coordinate, dest_dir: &Path) -> Result<PulledArtifact> {
        let context = coordinate.to_string();
        let url = artifact_url(&self.base, ArtifactEndpoint::Redirect, &self.repository, coordinate)?;
        let path = dest_dir.join(coordinate.file_name());
        debug!(%coordinate, path = %path.display(), "Pulling artifact");

        let response = self
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| Error::transfer(context.as_str(), e))?;

        let size = write_to_file(Box::new(ResponseBody::new(context, response)), &path).await?;
        info!(%coordinate, size, "Pulled artifact");

        Ok(PulledArtifact { path, size })
    }

    async fn anonymous_access(&self) -> Result<bool> {
        let context = format!("{}/global_settings", self.host());
        let response = self
            .get(self.settings_url()?)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::transfer(context.as_str(), e))?;

        // Reading settings needs admin rights; without them, assume credentials are required.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!(status = %response.status(), "Global settings not readable");
            return Ok(false);
        }

        let settings: SettingsResponse = response
            .error_for_status()
            .map_err(|e| Error::transfer(context.as_str(), e))?
            .json()
            .await
            .map_err(|e| Error::transfer(context.as_str(), e))?;

        Ok(settings.data.security_anonymous_access_enabled)
    }
}
