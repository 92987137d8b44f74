//! Credential record stores.
//!
//! A store answers `load(scope, item)` with one of three outcomes so the
//! fallback chain in [`ConfigResolver`](super::ConfigResolver) can branch on
//! them explicitly. Backend failures (permissions, network) are a fourth,
//! separate outcome carried in the `Err` arm.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::trace;

use crate::{Error, Result};

/// Outcome of a single record lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The record exists and was read.
    Found(Value),
    /// The store cleanly reports there is no such record.
    NotFound,
    /// The record exists but could not be decrypted or parsed.
    Undecodable(String),
}

/// Source of scoped credential records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the record `item` within `scope`.
    async fn load(&self, scope: &str, item: &str) -> Result<Lookup>;
}

/// Reads records from `<root>/<scope>/<item>.json`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `None` when a name cannot map to a single file under the root.
    fn record_path(&self, scope: &str, item: &str) -> Option<PathBuf> {
        let valid = |part: &str| {
            !(part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']))
        };
        (valid(scope) && valid(item)).then(|| self.root.join(scope).join(format!("{item}.json")))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self, scope: &str, item: &str) -> Result<Lookup> {
        let Some(path) = self.record_path(scope, item) else {
            trace!(scope, item, "Record name has no file in the store");
            return Ok(Lookup::NotFound);
        };
        trace!(path = %path.display(), "Reading config record");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Lookup::NotFound),
            Err(e) => {
                return Err(Error::store(
                    scope,
                    item,
                    format!("{}: {e}", path.display()),
                ));
            }
        };

        Ok(match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Lookup::Found(value),
            Err(e) => Lookup::Undecodable(e.to_string()),
        })
    }
}

/// In-process store, useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<HashMap<(String, String), Lookup>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, scope: impl Into<String>, item: impl Into<String>, value: Value) {
        self.set(scope, item, Lookup::Found(value));
    }

    /// Mark a record as present but unreadable.
    pub fn insert_undecodable(
        &self,
        scope: impl Into<String>,
        item: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.set(scope, item, Lookup::Undecodable(detail.into()));
    }

    fn set(&self, scope: impl Into<String>, item: impl Into<String>, lookup: Lookup) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert((scope.into(), item.into()), lookup);
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self, scope: &str, item: &str) -> Result<Lookup> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records
            .get(&(scope.to_string(), item.to_string()))
            .cloned()
            .unwrap_or(Lookup::NotFound))
    }
}
