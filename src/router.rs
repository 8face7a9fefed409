//! Router module.
//!
//! Resolves request paths against a compiled route tree, caching results.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::compile::{compile, PrefixMap};
use crate::error::Result;
use crate::matcher::PrefixMatcher;
use crate::types::MatchResult;

/// Default LRU cache size
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Cache value type: `None` records a path known not to match
type CacheValue<T> = Option<MatchResult<T>>;

/// Router builder options.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// LRU cache size for resolved paths
    pub cache_size: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl RouterOptions {
    /// Create new router options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

/// Router resolves paths to payloads through a compiled prefix tree.
///
/// The tree is immutable; the LRU cache is the only shared mutable state.
/// To reload routes, build a new `Router` and swap whatever handle
/// (e.g. `Arc<Router<T>>`) callers read from.
pub struct Router<T: Clone> {
    matcher: PrefixMatcher<T>,
    cache: Mutex<LruCache<String, CacheValue<T>>>,
}

impl<T: Clone> Router<T> {
    /// Create a new router from (pattern, payload) pairs.
    pub fn new<I, S>(routes: I, options: RouterOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        Self::from_prefix_map(compile(routes)?, options)
    }

    /// Create a new router from a pattern -> payload map.
    pub fn from_flat_map(routes: HashMap<String, T>, options: RouterOptions) -> Result<Self> {
        Self::new(routes, options)
    }

    /// Create a new router over an already compiled tree.
    pub fn from_prefix_map(map: PrefixMap<T>, options: RouterOptions) -> Result<Self> {
        let matcher = PrefixMatcher::new(map)?;
        let cache_size = NonZeroUsize::new(options.cache_size).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!(
            routes = matcher.prefix_map().route_count(),
            cache_size = cache_size.get(),
            "router ready"
        );
        Ok(Self {
            matcher,
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Match a path against the routes
    pub fn match_path(&self, path: &str) -> Option<MatchResult<T>> {
        let mut cache = self.cache.lock();

        if let Some(cached) = cache.get(path) {
            return cached.clone();
        }

        // Resolution is CPU-only, so computing under the lock is acceptable
        // and keeps concurrent misses on the same path from racing.
        let result = self.matcher.resolve(path).map(MatchResult::from);
        cache.put(path.to_string(), result.clone());
        result
    }

    /// Get the number of routes
    pub fn route_count(&self) -> usize {
        self.matcher.prefix_map().route_count()
    }

    /// The compiled route tree
    pub fn prefix_map(&self) -> &PrefixMap<T> {
        self.matcher.prefix_map()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_literal_and_param() {
        let router = Router::new(
            [("/health", "HEALTH"), ("/items/{id}", "ITEM")],
            RouterOptions::default(),
        )
        .unwrap();
        assert_eq!(router.route_count(), 2);

        let result = router.match_path("/health").unwrap();
        assert_eq!(result.payload, "HEALTH");
        assert!(result.params.is_empty());

        let result = router.match_path("/items/9").unwrap();
        assert_eq!(result.payload, "ITEM");
        assert_eq!(result.params["id"], "9");
    }

    #[test]
    fn test_cache() {
        let router = Router::new([("/a/{x}", 1)], RouterOptions::new()).unwrap();

        // First call - populates cache
        let result1 = router.match_path("/a/b");
        // Second call - should hit cache
        let result2 = router.match_path("/a/b");
        assert_eq!(result1, result2);
        assert_eq!(result1.unwrap().params["x"], "b");
    }

    #[test]
    fn test_cache_none_result() {
        let router = Router::new([("/a", 1)], RouterOptions::default()).unwrap();
        assert!(router.match_path("/b").is_none());
        assert!(router.match_path("/b").is_none());
    }

    #[test]
    fn test_cache_clear() {
        let router = Router::new([("/a", 1)], RouterOptions::new().with_cache_size(2)).unwrap();
        router.match_path("/a");
        router.clear_cache();
        assert_eq!(router.match_path("/a").unwrap().payload, 1);
    }

    #[test]
    fn test_zero_cache_size_is_clamped() {
        let router = Router::new(
            [("/a", 1), ("/b", 2)],
            RouterOptions::new().with_cache_size(0),
        )
        .unwrap();
        assert_eq!(router.match_path("/a").unwrap().payload, 1);
        assert_eq!(router.match_path("/b").unwrap().payload, 2);
        assert_eq!(router.match_path("/a").unwrap().payload, 1);
    }

    #[test]
    fn test_from_flat_map() {
        let mut routes = HashMap::new();
        routes.insert("/x".to_string(), "X".to_string());
        let router = Router::from_flat_map(routes, RouterOptions::default()).unwrap();
        assert_eq!(router.match_path("/x").unwrap().payload, "X");
    }

    #[test]
    fn test_compile_error_propagates() {
        let result = Router::new([("/a", 1), ("/a", 2)], RouterOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_router_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Router<String>>();
    }
}
