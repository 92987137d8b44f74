//! Typed per-source configuration decoded from a [`SourceConfig`].

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{Scope, SourceConfig};
use crate::{Error, Result};

fn decode_error(config: &SourceConfig, scope: &Scope, message: impl Into<String>) -> Error {
    let (scope, item) = config.origin().unwrap_or((scope.name(), "<inline>"));
    Error::config_decode(scope, item, message)
}

fn non_empty(config: &SourceConfig, key: &str) -> Option<String> {
    config
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Connection settings for a Nexus-style repository.
#[derive(Debug)]
pub struct RepositoryConfig {
    /// Base URL of the repository manager, including any context path.
    pub url: Url,
    /// Repository id artifacts are resolved from.
    pub repository: String,
    /// Username for basic auth, if any.
    pub username: Option<String>,
    /// Password for basic auth, if any.
    pub password: Option<SecretString>,
}

impl RepositoryConfig {
    /// Decode from a resolved mapping.
    ///
    /// An empty mapping is reported as [`Error::ConfigNotFound`]: there is no
    /// endpoint to talk to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] for an empty mapping and
    /// [`Error::ConfigDecode`] when `url` or `repository` is missing or `url`
    /// does not parse.
    pub fn from_source(config: &SourceConfig) -> Result<Self> {
        let scope = Scope::REPOSITORY;
        if config.is_empty() {
            return Err(Error::config_not_found(scope.name()));
        }

        let raw_url = non_empty(config, "url")
            .ok_or_else(|| decode_error(config, &scope, "missing 'url'"))?;
        let url = Url::parse(&raw_url)
            .map_err(|e| decode_error(config, &scope, format!("invalid 'url' {raw_url}: {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(decode_error(
                config,
                &scope,
                format!("'url' {raw_url} has no host"),
            ));
        }

        let repository = non_empty(config, "repository")
            .ok_or_else(|| decode_error(config, &scope, "missing 'repository'"))?;

        Ok(Self {
            url,
            repository,
            username: non_empty(config, "username"),
            password: non_empty(config, "password").map(SecretString::from),
        })
    }

    /// Username and password when both are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.expose_secret())),
            _ => None,
        }
    }
}

/// Credentials and overrides for object storage.
///
/// Both keys absent means "use ambient credentials" (instance profile,
/// environment, shared config).
#[derive(Debug, Default)]
pub struct StorageConfig {
    /// Access key id.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<SecretString>,
    /// Region override; wins over the endpoint table.
    pub region: Option<String>,
    /// Service endpoint for S3-compatible stores; path-style addressing is
    /// used when set.
    pub endpoint_url: Option<Url>,
}

impl StorageConfig {
    /// Decode from a resolved mapping. An empty mapping is valid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigDecode`] when only one of the two keys is set.
    pub fn from_source(config: &SourceConfig) -> Result<Self> {
        let scope = Scope::OBJECT_STORAGE;
        let access_key_id = non_empty(config, "access_key_id");
        let secret_access_key = non_empty(config, "secret_access_key");

        if access_key_id.is_some() != secret_access_key.is_some() {
            return Err(decode_error(
                config,
                &scope,
                "'access_key_id' and 'secret_access_key' must be set together",
            ));
        }

        let endpoint_url = non_empty(config, "endpoint_url")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    decode_error(config, &scope, format!("'endpoint_url' is not a URL: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            access_key_id,
            secret_access_key: secret_access_key.map(SecretString::from),
            region: non_empty(config, "region"),
            endpoint_url,
        })
    }

    /// Static key pair when configured.
    #[must_use]
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.expose_secret())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(record: serde_json::Value) -> SourceConfig {
        SourceConfig::from_record("nexus", "prod", record).unwrap()
    }

    #[test]
    fn test_repository_config_full() {
        let config = RepositoryConfig::from_source(&source(json!({
            "url": "https://nexus.example.com:8443/nexus",
            "repository": "releases",
            "username": "deploy",
            "password": "s3cret"
        })))
        .unwrap();

        assert_eq!(config.url.host_str(), Some("nexus.example.com"));
        assert_eq!(config.url.port(), Some(8443));
        assert_eq!(config.repository, "releases");
        assert_eq!(config.credentials(), Some(("deploy", "s3cret")));
    }

    #[test]
    fn test_repository_config_password_is_redacted() {
        let config = RepositoryConfig::from_source(&source(json!({
            "url": "http://n",
            "repository": "r",
            "username": "u",
            "password": "hunter2"
        })))
        .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_repository_config_empty_is_not_found() {
        let err = RepositoryConfig::from_source(&SourceConfig::empty()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { ref scope } if scope == "nexus"));
    }

    #[test]
    fn test_repository_config_missing_url() {
        let err = RepositoryConfig::from_source(&source(json!({"repository": "r"}))).unwrap_err();
        assert!(
            matches!(err, Error::ConfigDecode { ref item, ref message, .. } if item == "prod" && message.contains("url"))
        );
    }

    #[test]
    fn test_repository_config_bad_url() {
        let err = RepositoryConfig::from_source(&source(json!({
            "url": "not a url",
            "repository": "r"
        })))
        .unwrap_err();
        assert!(matches!(err, Error::ConfigDecode { .. }));
    }

    #[test]
    fn test_repository_config_anonymous() {
        let config = RepositoryConfig::from_source(&source(json!({
            "url": "http://n",
            "repository": "r",
            "username": "only-user"
        })))
        .unwrap();
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_storage_config_empty_is_ambient() {
        let config = StorageConfig::from_source(&SourceConfig::empty()).unwrap();
        assert!(config.static_credentials().is_none());
        assert!(config.region.is_none());
    }

    #[test]
    fn test_storage_config_keys() {
        let config = StorageConfig::from_source(
            &[
                ("access_key_id", "AKIA123"),
                ("secret_access_key", "abc"),
                ("region", "eu-west-1"),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        assert_eq!(config.static_credentials(), Some(("AKIA123", "abc")));
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_storage_config_endpoint_url() {
        let config =
            StorageConfig::from_source(&[("endpoint_url", "http://minio:9000")].into_iter().collect())
                .unwrap();
        assert_eq!(config.endpoint_url.map(String::from).as_deref(), Some("http://minio:9000/"));

        let err = StorageConfig::from_source(&[("endpoint_url", "minio")].into_iter().collect())
            .unwrap_err();
        assert!(matches!(err, Error::ConfigDecode { .. }));
    }

    #[test]
    fn test_storage_config_half_keys() {
        let err = StorageConfig::from_source(&[("access_key_id", "AKIA123")].into_iter().collect())
            .unwrap_err();
        assert!(matches!(err, Error::ConfigDecode { ref scope, .. } if scope == "aws"));
    }
}
