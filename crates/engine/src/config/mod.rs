//! Scoped credential lookup with a three-tier fallback and a per-session cache.
//!
//! For a scope such as `nexus`, records are tried in this order:
//!
//! 1. `<scope>/<environment>`
//! 2. `<scope>/_wildcard`
//! 3. `artifact/<scope>` (legacy layout, only for the built-in scopes)
//!
//! The first present record wins. When none exists the result is an empty
//! [`SourceConfig`], which is a success: callers decide whether empty means
//! "use ambient defaults" or "fail fast".

mod store;
mod typed;

pub use store::{ConfigStore, FileConfigStore, Lookup, MemoryConfigStore};
pub use typed::{RepositoryConfig, StorageConfig};

use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{Error, Result};

/// Item name tried after the environment-specific record.
pub const WILDCARD_ITEM: &str = "_wildcard";

/// Scope holding the pre-scoped record layout (`artifact/nexus`, `artifact/aws`).
pub const LEGACY_SCOPE: &str = "artifact";

/// A named group of credential records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    name: Cow<'static, str>,
    legacy_item: Option<&'static str>,
}

impl Scope {
    /// Repository (Nexus) credentials.
    pub const REPOSITORY: Self = Self {
        name: Cow::Borrowed("nexus"),
        legacy_item: Some("nexus"),
    };

    /// Object-storage (AWS) credentials.
    pub const OBJECT_STORAGE: Self = Self {
        name: Cow::Borrowed("aws"),
        legacy_item: Some("aws"),
    };

    /// A scope without a legacy record.
    ///
    /// The legacy tier is residue from the single-bag layout the built-in
    /// scopes migrated from; new scopes do not get one.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            legacy_item: None,
        }
    }

    /// Scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(scope, item)` pairs to try, in order.
    fn tiers<'a>(&'a self, environment: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut tiers = vec![(self.name(), environment), (self.name(), WILDCARD_ITEM)];
        if let Some(item) = self.legacy_item {
            tiers.push((LEGACY_SCOPE, item));
        }
        tiers
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// String-to-string configuration for one source type. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    values: BTreeMap<String, String>,
    origin: Option<(String, String)>,
}

impl SourceConfig {
    /// Empty configuration.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert a store record into a mapping.
    ///
    /// Scalars are stringified; nested objects and arrays are rejected, as is
    /// anything that is not an object at the top level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigDecode`] naming the record.
    pub fn from_record(scope: &str, item: &str, record: Value) -> Result<Self> {
        let Value::Object(map) = record else {
            return Err(Error::config_decode(scope, item, "record is not an object"));
        };

        let mut values = BTreeMap::new();
        for (key, value) in map {
            let value = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::config_decode(
                        scope,
                        item,
                        format!("key '{key}' holds a nested value"),
                    ));
                }
            };
            values.insert(key, value);
        }
        Ok(Self {
            values,
            origin: Some((scope.to_string(), item.to_string())),
        })
    }

    /// Value for `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(scope, item)` of the record this mapping came from.
    #[must_use]
    pub fn origin(&self) -> Option<(&str, &str)> {
        self.origin
            .as_ref()
            .map(|(scope, item)| (scope.as_str(), item.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SourceConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            origin: None,
        }
    }
}

/// Resolves scoped configuration, caching every result for the resolver's lifetime.
///
/// One resolver belongs to one resolution session (a node's run). The cache
/// is keyed by scope name only and is never invalidated; create a new
/// resolver to observe store changes.
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
    cache: Mutex<HashMap<String, Arc<SourceConfig>>>,
}

impl ConfigResolver {
    /// Create a resolver with an empty cache.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the configuration for `scope` as seen from `environment`.
    ///
    /// The cache lock is held across the store walk so concurrent callers
    /// still trigger at most one walk per scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigDecode`] for a record that exists but cannot be
    /// read, and [`Error::Store`] when the backend itself fails. Missing
    /// records are not errors.
    #[instrument(skip(self, scope), fields(scope = %scope))]
    pub async fn resolve(&self, scope: &Scope, environment: &str) -> Result<Arc<SourceConfig>> {
        let mut cache = self.cache.lock().await;
        if let Some(config) = cache.get(scope.name()) {
            debug!("Config served from cache");
            return Ok(Arc::clone(config));
        }

        let config = Arc::new(self.load_first(scope, environment).await?);
        cache.insert(scope.name().to_string(), Arc::clone(&config));
        Ok(config)
    }

    async fn load_first(&self, scope: &Scope, environment: &str) -> Result<SourceConfig> {
        for (bag, item) in scope.tiers(environment) {
            match self.store.load(bag, item).await? {
                Lookup::Found(record) => {
                    debug!(bag, item, "Config record found");
                    return SourceConfig::from_record(bag, item, record);
                }
                Lookup::NotFound => {
                    debug!(bag, item, "Config record not found, trying next tier");
                }
                Lookup::Undecodable(detail) => {
                    return Err(Error::config_decode(bag, item, detail));
                }
            }
        }

        debug!("No config record in any tier, using empty config");
        Ok(SourceConfig::empty())
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every lookup passed through to the wrapped store.
    struct CountingStore {
        inner: MemoryConfigStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: MemoryConfigStore) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfigStore for CountingStore {
        async fn load(&self, scope: &str, item: &str) -> Result<Lookup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load(scope, item).await
        }
    }

    fn resolver_with(store: MemoryConfigStore) -> (Arc<CountingStore>, ConfigResolver) {
        let counting = Arc::new(CountingStore::new(store));
        let resolver = ConfigResolver::new(counting.clone());
        (counting, resolver)
    }

    #[tokio::test]
    async fn test_environment_record_wins() {
        let store = MemoryConfigStore::new();
        store.insert("nexus", "prod", json!({"url": "http://prod"}));
        store.insert("nexus", WILDCARD_ITEM, json!({"url": "http://any"}));
        let (_, resolver) = resolver_with(store);

        let config = resolver.resolve(&Scope::REPOSITORY, "prod").await.unwrap();
        assert_eq!(config.get("url"), Some("http://prod"));
    }

    #[tokio::test]
    async fn test_wildcard_fallback() {
        let store = MemoryConfigStore::new();
        store.insert("nexus", WILDCARD_ITEM, json!({"url": "http://any"}));
        let (_, resolver) = resolver_with(store);

        let config = resolver.resolve(&Scope::REPOSITORY, "prod").await.unwrap();
        assert_eq!(config.get("url"), Some("http://any"));
    }

    #[tokio::test]
    async fn test_legacy_fallback() {
        let store = MemoryConfigStore::new();
        store.insert(LEGACY_SCOPE, "nexus", json!({"url": "http://legacy"}));
        let (counting, resolver) = resolver_with(store);

        let config = resolver.resolve(&Scope::REPOSITORY, "prod").await.unwrap();
        assert_eq!(config.get("url"), Some("http://legacy"));
        assert_eq!(config.origin(), Some((LEGACY_SCOPE, "nexus")));
        assert_eq!(counting.calls(), 3);
    }

    #[tokio::test]
    async fn test_nothing_found_is_empty() {
        let (counting, resolver) = resolver_with(MemoryConfigStore::new());

        let config = resolver
            .resolve(&Scope::OBJECT_STORAGE, "prod")
            .await
            .unwrap();
        assert!(config.is_empty());
        assert_eq!(counting.calls(), 3);
    }

    #[tokio::test]
    async fn test_file_store_environment_without_record_file_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nexus")).unwrap();
        std::fs::write(
            dir.path().join("nexus/_wildcard.json"),
            r#"{"url": "http://any", "repository": "releases"}"#,
        )
        .unwrap();
        let resolver = ConfigResolver::new(Arc::new(FileConfigStore::new(dir.path())));

        let config = resolver.resolve(&Scope::REPOSITORY, "prod/eu").await.unwrap();
        assert_eq!(config.get("url"), Some("http://any"));
        assert_eq!(config.origin(), Some(("nexus", WILDCARD_ITEM)));

        let ambient = resolver.resolve(&Scope::OBJECT_STORAGE, "").await.unwrap();
        assert!(ambient.is_empty());
    }

    #[tokio::test]
    async fn test_custom_scope_skips_legacy_tier() {
        let store = MemoryConfigStore::new();
        store.insert(LEGACY_SCOPE, "mirror", json!({"url": "http://legacy"}));
        let (counting, resolver) = resolver_with(store);

        let config = resolver
            .resolve(&Scope::new("mirror"), "prod")
            .await
            .unwrap();
        assert!(config.is_empty());
        assert_eq!(counting.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_lookups() {
        for scope in [Scope::REPOSITORY, Scope::OBJECT_STORAGE, Scope::new("mirror")] {
            let store = MemoryConfigStore::new();
            store.insert(scope.name(), "prod", json!({"url": "http://prod"}));
            let (counting, resolver) = resolver_with(store);

            let first = resolver.resolve(&scope, "prod").await.unwrap();
            let after_first = counting.calls();
            let second = resolver.resolve(&scope, "prod").await.unwrap();

            assert_eq!(after_first, 1, "{scope}");
            assert_eq!(counting.calls(), after_first, "{scope}");
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_cache_holds_empty_results() {
        let (counting, resolver) = resolver_with(MemoryConfigStore::new());

        resolver.resolve(&Scope::REPOSITORY, "prod").await.unwrap();
        resolver.resolve(&Scope::REPOSITORY, "prod").await.unwrap();
        assert_eq!(counting.calls(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_record_is_hard_failure() {
        let store = MemoryConfigStore::new();
        store.insert_undecodable("nexus", "prod", "bad secret");
        store.insert("nexus", WILDCARD_ITEM, json!({"url": "http://any"}));
        let (_, resolver) = resolver_with(store);

        let err = resolver
            .resolve(&Scope::REPOSITORY, "prod")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigDecode { ref scope, ref item, .. } if scope == "nexus" && item == "prod"
        ));
    }

    #[tokio::test]
    async fn test_non_object_record_is_decode_error() {
        let store = MemoryConfigStore::new();
        store.insert("aws", "prod", json!(["not", "a", "map"]));
        let (_, resolver) = resolver_with(store);

        let err = resolver
            .resolve(&Scope::OBJECT_STORAGE, "prod")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigDecode { .. }));
    }

    #[test]
    fn test_from_record_stringifies_scalars() {
        let config = SourceConfig::from_record(
            "nexus",
            "prod",
            json!({"url": "http://n", "port": 8081, "anonymous": true, "unused": null}),
        )
        .unwrap();
        assert_eq!(config.get("port"), Some("8081"));
        assert_eq!(config.get("anonymous"), Some("true"));
        assert_eq!(config.get("unused"), None);
    }

    #[test]
    fn test_from_record_rejects_nested() {
        let err =
            SourceConfig::from_record("nexus", "prod", json!({"creds": {"user": "u"}})).unwrap_err();
        assert!(err.to_string().contains("creds"));
    }
}
