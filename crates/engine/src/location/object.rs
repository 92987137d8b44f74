//! Object-storage locations: `s3://endpoint/bucket/key...`.

use crate::{Error, Result};

/// Region used when the endpoint matches nothing in [`ENDPOINT_REGIONS`].
pub const DEFAULT_REGION: &str = "us-east-1";

/// Known S3 endpoints and the region each one serves.
///
/// Covers the legacy dash-style hostnames as well as the dotted
/// `s3.<region>.amazonaws.com` form.
const ENDPOINT_REGIONS: &[(&str, &str)] = &[
    ("s3.amazonaws.com", "us-east-1"),
    ("s3-external-1.amazonaws.com", "us-east-1"),
    ("s3.us-east-1.amazonaws.com", "us-east-1"),
    ("s3.us-east-2.amazonaws.com", "us-east-2"),
    ("s3-us-east-2.amazonaws.com", "us-east-2"),
    ("s3-us-west-1.amazonaws.com", "us-west-1"),
    ("s3.us-west-1.amazonaws.com", "us-west-1"),
    ("s3-us-west-2.amazonaws.com", "us-west-2"),
    ("s3.us-west-2.amazonaws.com", "us-west-2"),
    ("s3.ca-central-1.amazonaws.com", "ca-central-1"),
    ("s3-eu-west-1.amazonaws.com", "eu-west-1"),
    ("s3.eu-west-1.amazonaws.com", "eu-west-1"),
    ("s3.eu-west-2.amazonaws.com", "eu-west-2"),
    ("s3.eu-west-3.amazonaws.com", "eu-west-3"),
    ("s3.eu-central-1.amazonaws.com", "eu-central-1"),
    ("s3.eu-north-1.amazonaws.com", "eu-north-1"),
    ("s3-ap-southeast-1.amazonaws.com", "ap-southeast-1"),
    ("s3.ap-southeast-1.amazonaws.com", "ap-southeast-1"),
    ("s3-ap-southeast-2.amazonaws.com", "ap-southeast-2"),
    ("s3.ap-southeast-2.amazonaws.com", "ap-southeast-2"),
    ("s3-ap-northeast-1.amazonaws.com", "ap-northeast-1"),
    ("s3.ap-northeast-1.amazonaws.com", "ap-northeast-1"),
    ("s3.ap-northeast-2.amazonaws.com", "ap-northeast-2"),
    ("s3.ap-south-1.amazonaws.com", "ap-south-1"),
    ("s3-sa-east-1.amazonaws.com", "sa-east-1"),
    ("s3.sa-east-1.amazonaws.com", "sa-east-1"),
];

/// Map an endpoint host to its region, falling back to [`DEFAULT_REGION`].
#[must_use]
pub fn region_for_endpoint(endpoint: &str) -> &'static str {
    let host = endpoint
        .rsplit('@')
        .next()
        .unwrap_or(endpoint)
        .split(':')
        .next()
        .unwrap_or_default();

    ENDPOINT_REGIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(host))
        .map_or(DEFAULT_REGION, |(_, region)| region)
}

/// A parsed object-storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// Endpoint authority as written in the location.
    pub endpoint: String,
    /// Region derived from the endpoint.
    pub region: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
}

impl ObjectLocation {
    /// Decompose `scheme://endpoint/bucket/key...`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocation`] if the endpoint, bucket or key is
    /// missing.
    pub fn parse(location: &str) -> Result<Self> {
        let (_, rest) = location
            .split_once("://")
            .ok_or_else(|| Error::invalid_location(location, "missing scheme"))?;

        let (endpoint, path) = rest
            .split_once('/')
            .ok_or_else(|| Error::invalid_location(location, "missing bucket and key"))?;
        if endpoint.is_empty() {
            return Err(Error::invalid_location(location, "missing endpoint"));
        }

        let (bucket, key) = path
            .split_once('/')
            .ok_or_else(|| Error::invalid_location(location, "missing object key"))?;
        if bucket.is_empty() {
            return Err(Error::invalid_location(location, "missing bucket"));
        }
        if key.is_empty() {
            return Err(Error::invalid_location(location, "missing object key"));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            region: region_for_endpoint(endpoint).to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}
