//! Resolution of the symbolic `latest` version.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::{RepositoryConfig, SourceConfig};
use crate::location::Coordinate;
use crate::repository::{ArtifactMetadata, RepositoryClient, RepositoryConnector};
use crate::{Error, Result};

/// A version the repository reported for a `latest` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Concrete version.
    pub version: String,
    /// SHA-1 reported alongside it, if any.
    pub sha1: Option<String>,
}

/// Turns `latest` into a concrete version; leaves everything else alone.
#[derive(Clone)]
pub struct VersionResolver {
    connector: Arc<dyn RepositoryConnector>,
}

impl VersionResolver {
    /// Create a resolver that connects through `connector` when it has to ask.
    #[must_use]
    pub fn new(connector: Arc<dyn RepositoryConnector>) -> Self {
        Self { connector }
    }

    /// Concrete version for `coordinate`.
    ///
    /// Non-`latest` tokens are returned as-is without touching `config` or
    /// the network.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigNotFound`] when a query is needed and `config` is
    /// empty, [`Error::MetadataParse`] when the response lacks a version, and
    /// any transfer error from the repository client.
    #[instrument(skip(self, coordinate, config), fields(coordinate = %coordinate))]
    pub async fn resolve(
        &self,
        coordinate: &Coordinate,
        config: &SourceConfig,
        ssl_verify: bool,
    ) -> Result<String> {
        if !coordinate.is_latest() {
            return Ok(coordinate.version.clone());
        }

        let repository = RepositoryConfig::from_source(config)?;
        let client = self.connector.connect(&repository, ssl_verify).await?;
        Ok(query_latest(client.as_ref(), coordinate).await?.version)
    }
}

impl std::fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver").finish_non_exhaustive()
    }
}

/// Ask an already-connected client what `coordinate` resolves to.
pub(crate) async fn query_latest(
    client: &dyn RepositoryClient,
    coordinate: &Coordinate,
) -> Result<ResolvedVersion> {
    debug!(%coordinate, "Querying repository metadata");
    let ArtifactMetadata { version, sha1 } = client.metadata(coordinate).await?;

    let version = version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::metadata_parse(coordinate.to_string(), "response has no version"))?;

    if version.eq_ignore_ascii_case("latest") {
        return Err(Error::metadata_parse(
            coordinate.to_string(),
            "response echoed the symbolic version",
        ));
    }

    info!(%coordinate, %version, "Resolved latest version");
    Ok(ResolvedVersion { version, sha1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::repository::PulledArtifact;

    struct FakeRepository {
        reported: ArtifactMetadata,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl RepositoryClient for FakeRepository {
        async fn metadata(&self, _coordinate: &Coordinate) -> Result<ArtifactMetadata> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.reported.clone())
        }

        async fn pull(&self, coordinate: &Coordinate, _dest_dir: &Path) -> Result<PulledArtifact> {
            Err(Error::transfer(coordinate.to_string(), "pull not expected"))
        }

        async fn anonymous_access(&self) -> Result<bool> {
            Ok(false)
        }
    }

    struct FakeConnector {
        client: Arc<FakeRepository>,
        connects: AtomicUsize,
    }

    #[async_trait]
    impl RepositoryConnector for FakeConnector {
        async fn connect(
            &self,
            _config: &RepositoryConfig,
            _ssl_verify: bool,
        ) -> Result<Arc<dyn RepositoryClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(self.client.clone())
        }
    }

    fn setup(version: Option<&str>) -> (Arc<FakeConnector>, VersionResolver) {
        let connector = Arc::new(FakeConnector {
            client: Arc::new(FakeRepository {
                reported: ArtifactMetadata {
                    version: version.map(str::to_string),
                    sha1: Some("da39a3ee".to_string()),
                },
                queries: AtomicUsize::new(0),
            }),
            connects: AtomicUsize::new(0),
        });
        let resolver = VersionResolver::new(connector.clone());
        (connector, resolver)
    }

    fn nexus_config() -> SourceConfig {
        SourceConfig::from_record(
            "nexus",
            "prod",
            json!({"url": "http://nexus", "repository": "releases"}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_latest_is_resolved() {
        let (connector, resolver) = setup(Some("2.0.5"));
        let coordinate = Coordinate::parse("com.acme:widget:latest:tgz").unwrap();

        let version = resolver
            .resolve(&coordinate, &nexus_config(), true)
            .await
            .unwrap();
        assert_eq!(version, "2.0.5");
        assert_eq!(connector.client.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_latest_any_case() {
        for token in ["latest", "Latest", "LATEST"] {
            let (connector, resolver) = setup(Some("3.1.0"));
            let coordinate = Coordinate::parse(&format!("com.acme:widget:{token}:tgz")).unwrap();

            let version = resolver
                .resolve(&coordinate, &nexus_config(), true)
                .await
                .unwrap();
            assert_eq!(version, "3.1.0");
            assert_eq!(connector.client.queries.load(Ordering::SeqCst), 1, "{token}");
        }
    }

    #[tokio::test]
    async fn test_concrete_version_untouched() {
        let (connector, resolver) = setup(Some("9.9.9"));
        let coordinate = Coordinate::parse("com.acme:widget:1.0.1:tgz").unwrap();

        let version = resolver
            .resolve(&coordinate, &SourceConfig::empty(), true)
            .await
            .unwrap();
        assert_eq!(version, "1.0.1");
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
        assert_eq!(connector.client.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_latest_without_config() {
        let (connector, resolver) = setup(Some("2.0.5"));
        let coordinate = Coordinate::parse("com.acme:widget:latest:tgz").unwrap();

        let err = resolver
            .resolve(&coordinate, &SourceConfig::empty(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { ref scope } if scope == "nexus"));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_version_is_parse_error() {
        for reported in [None, Some(""), Some("  "), Some("LATEST")] {
            let (_, resolver) = setup(reported);
            let coordinate = Coordinate::parse("com.acme:widget:latest:tgz").unwrap();

            let err = resolver
                .resolve(&coordinate, &nexus_config(), true)
                .await
                .unwrap_err();
            assert!(
                matches!(err, Error::MetadataParse { ref coordinate, .. } if coordinate == "com.acme:widget:latest:tgz"),
                "{reported:?}: {err:?}"
            );
        }
    }
}
