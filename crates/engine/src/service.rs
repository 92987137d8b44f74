//! The public face of the engine: one service, four operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::Result;
use crate::config::{ConfigStore, RepositoryConfig, Scope};
use crate::deployed;
use crate::dispatch::{
    Backends, ConfigSession, RetrievalDispatcher, RetrievalOptions, RetrievalRequest,
    RetrievalResult,
};
use crate::location::Coordinate;
use crate::repository::redirect_url;
use crate::version::{VersionResolver, query_latest};

/// The machine an operation runs for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    /// Node name, used for logging.
    pub name: String,
    /// Environment whose credential records apply.
    pub environment: String,
}

impl Node {
    /// Create a node.
    #[must_use]
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
        }
    }
}

/// Artifact retrieval, version resolution and deployment inspection.
///
/// Configuration is cached per environment for the service's lifetime, so a
/// long-running caller that needs to see store edits should build a new
/// service.
pub struct ArtifactService {
    store: Arc<dyn ConfigStore>,
    backends: Backends,
    dispatcher: RetrievalDispatcher,
    versions: VersionResolver,
    sessions: Mutex<HashMap<String, Arc<ConfigSession>>>,
}

impl ArtifactService {
    /// Create a service reading credentials from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, backends: Backends) -> Self {
        Self {
            store,
            dispatcher: RetrievalDispatcher::new(backends.clone()),
            versions: VersionResolver::new(backends.repository.clone()),
            backends,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn session(&self, environment: &str) -> Arc<ConfigSession> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(environment.to_string())
            .or_insert_with(|| {
                debug!(environment, "Starting config session");
                Arc::new(ConfigSession::new(self.store.clone(), environment))
            })
            .clone()
    }

    /// Fetch `location` into `destination`.
    ///
    /// # Errors
    ///
    /// See [`RetrievalDispatcher::retrieve`].
    #[instrument(skip(self, node, destination, options), fields(node = %node.name))]
    pub async fn retrieve_artifact(
        &self,
        node: &Node,
        location: &str,
        destination: impl Into<PathBuf>,
        options: RetrievalOptions,
    ) -> Result<RetrievalResult> {
        let session = self.session(&node.environment).await;
        let request = RetrievalRequest::new(location, destination).with_options(options);
        self.dispatcher.retrieve(&session, &request).await
    }

    /// Concrete version for a coordinate string.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidLocation`] for a malformed coordinate, otherwise
    /// see [`VersionResolver::resolve`].
    #[instrument(skip(self, node), fields(node = %node.name))]
    pub async fn resolve_actual_version(
        &self,
        node: &Node,
        coordinate: &str,
        ssl_verify: bool,
    ) -> Result<String> {
        let coordinate = Coordinate::parse(coordinate)?;
        if !coordinate.is_latest() {
            return Ok(coordinate.version);
        }

        let session = self.session(&node.environment).await;
        let config = session.resolve(&Scope::REPOSITORY).await?;
        self.versions.resolve(&coordinate, &config, ssl_verify).await
    }

    /// Version the `current` link in `deploy_dir` points at.
    ///
    /// # Errors
    ///
    /// [`crate::Error::BrokenSymlink`] when the link exists but cannot be
    /// followed.
    pub async fn current_deployed_version(&self, deploy_dir: &Path) -> Result<Option<String>> {
        deployed::current_version(deploy_dir).await
    }

    /// Direct download URL for a coordinate, with `latest` resolved.
    ///
    /// Credentials are embedded unless the repository allows anonymous reads.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ConfigNotFound`] when no repository record exists,
    /// plus metadata and transfer errors from the repository.
    #[instrument(skip(self, node), fields(node = %node.name))]
    pub async fn build_download_url(
        &self,
        node: &Node,
        coordinate: &str,
        ssl_verify: bool,
    ) -> Result<Url> {
        let coordinate = Coordinate::parse(coordinate)?;
        let session = self.session(&node.environment).await;
        let config = RepositoryConfig::from_source(&*session.resolve(&Scope::REPOSITORY).await?)?;
        let client = self.backends.repository.connect(&config, ssl_verify).await?;

        let coordinate = if coordinate.is_latest() {
            let resolved = query_latest(client.as_ref(), &coordinate).await?;
            coordinate.with_version(resolved.version)
        } else {
            coordinate
        };

        let anonymous = client.anonymous_access().await?;
        debug!(anonymous, "Checked repository access mode");
        redirect_url(&config, &coordinate, anonymous)
    }
}

impl std::fmt::Debug for ArtifactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactService").finish_non_exhaustive()
    }
}
