//! Memoization Module
//!
//! Wraps an async function so its results are served through
//! [`CacheManager::get_or_set_with`].

use std::fmt;
use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};

use super::manager::CacheManager;
use super::options::OpOptions;

// == Memoized ==
/// A function paired with a cache and a key derivation.
///
/// Inherits the `get_or_set` semantics: failures return `None` and are not
/// cached, and concurrent misses each call the wrapped function.
pub struct Memoized<K, F> {
    cache: CacheManager,
    key_fn: K,
    func: F,
    opts: OpOptions,
}

/// Wraps `func` so each call first looks up `key_fn(&args)` in `cache`.
pub fn with_cache<A, T, E, K, F, Fut>(cache: CacheManager, key_fn: K, func: F) -> Memoized<K, F>
where
    K: Fn(&A) -> String,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    Memoized {
        cache,
        key_fn,
        func,
        opts: OpOptions::default(),
    }
}

impl<K, F> Memoized<K, F> {
    /// Applies per-call overrides (TTL, namespace) to every lookup.
    pub fn with_options(mut self, opts: OpOptions) -> Self {
        self.opts = opts;
        self
    }

    pub async fn call<A, T, E, Fut>(&self, args: A) -> Option<T>
    where
        K: Fn(&A) -> String,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
    {
        let key = (self.key_fn)(&args);
        self.cache
            .get_or_set_with(&key, || (self.func)(args), &self.opts)
            .await
    }
}
