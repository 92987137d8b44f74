//! Artifact location classification.
//!
//! A location is an opaque string. Its source type is derived on demand and
//! never stored alongside it:
//!
//! - `s3://endpoint/bucket/key` addresses object storage
//! - `http://` and `https://` URLs are fetched directly
//! - anything with more than two `:`-separated segments is a repository
//!   coordinate (`group:artifact:version:extension[:classifier]`)

mod coordinate;
mod object;

pub use coordinate::Coordinate;
pub use object::{DEFAULT_REGION, ObjectLocation, region_for_endpoint};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// URI schemes that address object storage.
const OBJECT_STORAGE_SCHEMES: &[&str] = &["s3"];

/// URI schemes fetched with a direct HTTP transfer.
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// The kind of source system a location addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Maven-style repository coordinate.
    Repository,
    /// Object-storage URI.
    ObjectStorage,
    /// Generic HTTP(S) URL.
    Http,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repository => write!(f, "repository"),
            Self::ObjectStorage => write!(f, "object_storage"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Decide which source type `location` addresses.
///
/// Object-storage schemes win over HTTP schemes, which win over the
/// coordinate form.
///
/// # Errors
///
/// Returns [`Error::UnrecognizedLocation`] when none of the forms match.
pub fn classify(location: &str) -> Result<SourceKind> {
    if let Some(scheme) = scheme_of(location) {
        if OBJECT_STORAGE_SCHEMES.contains(&scheme.as_str()) {
            return Ok(SourceKind::ObjectStorage);
        }
        if HTTP_SCHEMES.contains(&scheme.as_str()) {
            return Ok(SourceKind::Http);
        }
    }

    if location.split(':').count() > 2 {
        return Ok(SourceKind::Repository);
    }

    Err(Error::unrecognized_location(location))
}

/// Lowercased scheme of `scheme://...`, if the prefix is a valid URI scheme.
fn scheme_of(location: &str) -> Option<String> {
    let (scheme, _) = location.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_storage() {
        assert_eq!(
            classify("s3://s3.amazonaws.com/my-bucket/path/to/file.txt").unwrap(),
            SourceKind::ObjectStorage
        );
        assert_eq!(
            classify("S3://s3-eu-west-1.amazonaws.com/b/k").unwrap(),
            SourceKind::ObjectStorage
        );
    }

    #[test]
    fn test_http() {
        assert_eq!(
            classify("http://example.com/a.tgz").unwrap(),
            SourceKind::Http
        );
        assert_eq!(
            classify("HTTPS://example.com/a.tgz").unwrap(),
            SourceKind::Http
        );
    }

    #[test]
    fn test_http_with_port_is_not_a_coordinate() {
        // three colon segments, but the scheme check comes first
        assert_eq!(
            classify("https://nexus.local:8443/content/a.tgz").unwrap(),
            SourceKind::Http
        );
    }

    #[test]
    fn test_repository() {
        assert_eq!(
            classify("com.acme:widget:latest:tgz").unwrap(),
            SourceKind::Repository
        );
        assert_eq!(
            classify("com.acme:widget:1.0.1").unwrap(),
            SourceKind::Repository
        );
        assert_eq!(
            classify("com.acme:widget:1.0.1:tgz:linux").unwrap(),
            SourceKind::Repository
        );
    }

    #[test]
    fn test_unrecognized() {
        for location in ["", "widget", "com.acme:widget", "ftp://host/file", "/tmp/file"] {
            let err = classify(location).unwrap_err();
            assert!(
                matches!(err, Error::UnrecognizedLocation { location: ref l } if l == location),
                "unexpected result for {location:?}: {err:?}"
            );
        }
    }

    #[test]
    fn test_unknown_scheme_with_many_colons_is_repository() {
        assert_eq!(
            classify("ftp://host:21:extra").unwrap(),
            SourceKind::Repository
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let location = "s3://s3.amazonaws.com/b/k";
        assert_eq!(classify(location).unwrap(), classify(location).unwrap());
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Repository.to_string(), "repository");
        assert_eq!(SourceKind::ObjectStorage.to_string(), "object_storage");
        assert_eq!(SourceKind::Http.to_string(), "http");
    }
}
