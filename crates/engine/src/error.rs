//! Error types for artifact resolution and retrieval

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Boxed error from a delegated client (repository, object storage, HTTP).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for artifetch operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No usable configuration for a scope that requires one
    #[error("No configuration found for scope '{scope}'")]
    #[diagnostic(
        code(artifetch::config::not_found),
        help("Add a record for the node's environment or a '_wildcard' record to the scope")
    )]
    ConfigNotFound {
        /// Scope that was searched
        scope: String,
    },

    /// Configuration record exists but cannot be turned into a mapping
    #[error("Configuration record '{scope}/{item}' could not be decoded: {message}")]
    #[diagnostic(code(artifetch::config::decode))]
    ConfigDecode {
        /// Scope of the record
        scope: String,
        /// Item name within the scope
        item: String,
        /// Decoder message
        message: String,
    },

    /// The configuration backend failed for a reason other than "not found"
    #[error("Configuration store failed loading '{scope}/{item}': {message}")]
    #[diagnostic(code(artifetch::config::store))]
    Store {
        /// Scope of the record
        scope: String,
        /// Item name within the scope
        item: String,
        /// Backend message
        message: String,
    },

    /// Location does not address any known source type
    #[error("Unrecognized artifact location '{location}'")]
    #[diagnostic(
        code(artifetch::location::unrecognized),
        help("Use group:artifact:version:extension[:classifier], s3://endpoint/bucket/key or an http(s) URL")
    )]
    UnrecognizedLocation {
        /// The location as given
        location: String,
    },

    /// Location was classified but cannot be parsed
    #[error("Invalid artifact location '{location}': {message}")]
    #[diagnostic(code(artifetch::location::invalid))]
    InvalidLocation {
        /// The location as given
        location: String,
        /// What is wrong with it
        message: String,
    },

    /// Repository metadata response lacks an expected field
    #[error("Could not read repository metadata for '{coordinate}': {message}")]
    #[diagnostic(code(artifetch::repository::metadata))]
    MetadataParse {
        /// Coordinate that was queried
        coordinate: String,
        /// What was missing or malformed
        message: String,
    },

    /// Object-storage bucket does not exist
    #[error("Bucket '{bucket}' not found")]
    #[diagnostic(
        code(artifetch::storage::bucket_not_found),
        help("Check the bucket name and that the credentials can see it")
    )]
    BucketNotFound {
        /// Bucket name
        bucket: String,
    },

    /// Object does not exist within an existing bucket
    #[error("Object '{key}' not found in bucket '{bucket}'")]
    #[diagnostic(code(artifetch::storage::object_not_found))]
    ObjectNotFound {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// A `current` entry exists but does not resolve to a target
    #[error("Deployment link '{}' is broken", path.display())]
    #[diagnostic(
        code(artifetch::deploy::broken_symlink),
        help("Point the link at an existing release directory or remove it")
    )]
    BrokenSymlink {
        /// Path of the link
        path: Box<Path>,
        /// Why it could not be resolved
        #[source]
        source: std::io::Error,
    },

    /// A delegated client failed during transfer
    #[error("Transfer failed for '{context}'")]
    #[diagnostic(code(artifetch::transfer))]
    Transfer {
        /// Identifying parameter (coordinate, bucket/key, URL)
        context: String,
        /// The client's error, unchanged
        #[source]
        source: BoxError,
    },

    /// I/O error on the local filesystem
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(
        code(artifetch::io),
        help("Check file permissions and ensure the parent directory exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error
        path: Box<Path>,
        /// Operation that failed (e.g., "create", "write", "rename")
        operation: String,
    },
}

impl Error {
    /// Create a config-not-found error
    #[must_use]
    pub fn config_not_found(scope: impl Into<String>) -> Self {
        Self::ConfigNotFound {
            scope: scope.into(),
        }
    }

    /// Create a config decode error
    #[must_use]
    pub fn config_decode(
        scope: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConfigDecode {
            scope: scope.into(),
            item: item.into(),
            message: message.into(),
        }
    }

    /// Create a store backend error
    #[must_use]
    pub fn store(
        scope: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Store {
            scope: scope.into(),
            item: item.into(),
            message: message.into(),
        }
    }

    /// Create an unrecognized-location error
    #[must_use]
    pub fn unrecognized_location(location: impl Into<String>) -> Self {
        Self::UnrecognizedLocation {
            location: location.into(),
        }
    }

    /// Create an invalid-location error
    #[must_use]
    pub fn invalid_location(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a metadata parse error
    #[must_use]
    pub fn metadata_parse(coordinate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MetadataParse {
            coordinate: coordinate.into(),
            message: message.into(),
        }
    }

    /// Create a bucket-not-found error
    #[must_use]
    pub fn bucket_not_found(bucket: impl Into<String>) -> Self {
        Self::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    /// Create an object-not-found error
    #[must_use]
    pub fn object_not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create a broken-symlink error
    #[must_use]
    pub fn broken_symlink(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::BrokenSymlink {
            path: path.as_ref().into(),
            source,
        }
    }

    /// Wrap a delegated client error with identifying context
    #[must_use]
    pub fn transfer(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transfer {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: path.as_ref().into(),
            operation: operation.into(),
        }
    }
}

/// Result type for artifetch operations
pub type Result<T> = std::result::Result<T, Error>;
