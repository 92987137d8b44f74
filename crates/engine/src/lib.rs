//! Artifact resolution and retrieval for artifetch
//!
//! This crate decides where an artifact comes from and fetches it:
//! - Location classification (repository coordinate, object storage, HTTP)
//! - Scoped credential lookup with environment, wildcard and legacy fallbacks
//! - Resolution of the symbolic `latest` version
//! - Retrieval through pluggable repository, object-storage and HTTP clients
//! - Inspection of the `current` deployment link
//!
//! # Overview
//!
//! [`ArtifactService`] is the entry point. It is built from a
//! [`ConfigStore`] holding credential records and a set of [`Backends`]
//! implementing the client ports in [`repository`], [`storage`] and [`http`].
//! Concrete repository and object-storage clients live in their own crates.

mod deployed;
mod dispatch;
mod error;
mod service;
mod version;

pub mod config;
pub mod http;
pub mod location;
pub mod repository;
pub mod storage;
pub mod stream;

// Re-export error types at crate root
pub use error::{BoxError, Error, Result};

// Re-export main types
pub use config::{ConfigResolver, ConfigStore, FileConfigStore, Scope, SourceConfig};
pub use deployed::{CURRENT_LINK, current_version};
pub use dispatch::{
    Backends, ConfigSession, HEADER_OPTION_PREFIX, RetrievalDispatcher, RetrievalOptions,
    RetrievalRequest, RetrievalResult,
};
pub use location::{Coordinate, ObjectLocation, SourceKind, classify};
pub use service::{ArtifactService, Node};
pub use version::{ResolvedVersion, VersionResolver};
