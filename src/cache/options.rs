//! Cache Options Module
//!
//! Per-instance defaults and per-call overrides.

/// Default TTL in seconds for a facade instance.
pub const DEFAULT_TTL: u64 = 600;

/// Default namespace for a facade instance.
pub const DEFAULT_NAMESPACE: &str = "app";

// == Cache Options ==
/// Defaults applied by one facade instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// TTL in seconds applied when a call gives none
    pub ttl: u64,
    /// Namespace applied when a call gives none
    pub namespace: String,
    /// JSON-encode on write and decode on read
    pub serialize: bool,
}

impl CacheOptions {
    pub fn new(namespace: impl Into<String>, ttl: u64) -> Self {
        Self {
            ttl,
            namespace: namespace.into(),
            serialize: true,
        }
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_TTL)
    }
}

// == Operation Options ==
/// Overrides for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpOptions {
    /// TTL in seconds for this write
    pub ttl: Option<u64>,
    /// Namespace for this call
    pub namespace: Option<String>,
}

impl OpOptions {
    /// No overrides.
    pub const NONE: OpOptions = OpOptions {
        ttl: None,
        namespace: None,
    };

    pub fn ttl(ttl: u64) -> Self {
        Self {
            ttl: Some(ttl),
            namespace: None,
        }
    }

    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            ttl: None,
            namespace: Some(namespace.into()),
        }
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_options_default() {
        let options = CacheOptions::default();
        assert_eq!(options.ttl, 600);
        assert_eq!(options.namespace, "app");
        assert!(options.serialize);
    }

    #[test]
    fn test_op_options_builders() {
        let opts = OpOptions::namespace("ns1").with_ttl(5);
        assert_eq!(opts.namespace.as_deref(), Some("ns1"));
        assert_eq!(opts.ttl, Some(5));
        assert_eq!(OpOptions::NONE, OpOptions::default());
    }
}
