//! Instance Registry Module
//!
//! The predefined facade instances. All of them are views over one shared
//! store handle created by the composition root.

use std::fmt;
use std::str::FromStr;

use super::manager::CacheManager;
use super::options::CacheOptions;
use crate::config::Config;
use crate::store::SharedStore;

// == Instance ==
/// The named facade instances and their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instance {
    App,
    Session,
    Db,
    Api,
    User,
    Product,
    Search,
    RateLimit,
}

impl Instance {
    pub const ALL: [Instance; 8] = [
        Instance::App,
        Instance::Session,
        Instance::Db,
        Instance::Api,
        Instance::User,
        Instance::Product,
        Instance::Search,
        Instance::RateLimit,
    ];

    /// Name used in logs and admin routes.
    pub fn name(self) -> &'static str {
        match self {
            Instance::App => "app",
            Instance::Session => "session",
            Instance::Db => "db",
            Instance::Api => "api",
            Instance::User => "user",
            Instance::Product => "product",
            Instance::Search => "search",
            Instance::RateLimit => "rate_limit",
        }
    }

    pub fn namespace(self) -> &'static str {
        self.name()
    }

    /// Default TTL in seconds.
    pub fn default_ttl(self) -> u64 {
        match self {
            Instance::App => 600,
            Instance::Session => 1800,
            Instance::Db => 300,
            Instance::Api => 120,
            Instance::User => 900,
            Instance::Product => 1800,
            Instance::Search => 60,
            Instance::RateLimit => 3600,
        }
    }

    pub fn options(self) -> CacheOptions {
        CacheOptions::new(self.namespace(), self.default_ttl())
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rateLimit" | "rate-limit" => Ok(Instance::RateLimit),
            other => Instance::ALL
                .into_iter()
                .find(|instance| instance.name() == other)
                .ok_or_else(|| format!("Unknown cache instance: {}", other)),
        }
    }
}

// == Cache Registry ==
/// One manager per [`Instance`], all sharing the same store.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    /// Indexed by `Instance as usize`, in `Instance::ALL` order
    managers: Vec<CacheManager>,
}

impl CacheRegistry {
    /// Builds every instance with its built-in defaults.
    pub fn new(store: SharedStore) -> Self {
        Self::with_app_options(store, Instance::App.options())
    }

    /// Builds the registry with the `app` defaults taken from configuration.
    pub fn from_config(store: SharedStore, config: &Config) -> Self {
        let app = CacheOptions::new(config.default_namespace.clone(), config.default_ttl);
        Self::with_app_options(store, app)
    }

    fn with_app_options(store: SharedStore, app: CacheOptions) -> Self {
        let managers = Instance::ALL
            .into_iter()
            .map(|instance| {
                let options = match instance {
                    Instance::App => app.clone(),
                    other => other.options(),
                };
                CacheManager::new(store.clone(), options)
            })
            .collect();

        Self { managers }
    }

    pub fn get(&self, instance: Instance) -> &CacheManager {
        &self.managers[instance as usize]
    }

    /// Looks up an instance by its route name.
    pub fn by_name(&self, name: &str) -> Option<&CacheManager> {
        name.parse::<Instance>().ok().map(|instance| self.get(instance))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Instance, &CacheManager)> {
        Instance::ALL.into_iter().zip(self.managers.iter())
    }

    pub fn backend_name(&self) -> &'static str {
        self.app().backend_name()
    }

    pub fn app(&self) -> &CacheManager {
        self.get(Instance::App)
    }

    pub fn session(&self) -> &CacheManager {
        self.get(Instance::Session)
    }

    pub fn db(&self) -> &CacheManager {
        self.get(Instance::Db)
    }

    pub fn api(&self) -> &CacheManager {
        self.get(Instance::Api)
    }

    pub fn user(&self) -> &CacheManager {
        self.get(Instance::User)
    }

    pub fn product(&self) -> &CacheManager {
        self.get(Instance::Product)
    }

    pub fn search(&self) -> &CacheManager {
        self.get(Instance::Search)
    }

    pub fn rate_limit(&self) -> &CacheManager {
        self.get(Instance::RateLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_instance_defaults() {
        let expected = [
            ("app", 600),
            ("session", 1800),
            ("db", 300),
            ("api", 120),
            ("user", 900),
            ("product", 1800),
            ("search", 60),
            ("rate_limit", 3600),
        ];
        for (instance, (namespace, ttl)) in Instance::ALL.into_iter().zip(expected) {
            assert_eq!(instance.namespace(), namespace);
            assert_eq!(instance.default_ttl(), ttl);
        }
    }

    #[test]
    fn test_instance_from_str() {
        assert_eq!("product".parse::<Instance>(), Ok(Instance::Product));
        assert_eq!("rateLimit".parse::<Instance>(), Ok(Instance::RateLimit));
        assert!("users".parse::<Instance>().is_err());
    }

    #[tokio::test]
    async fn test_instances_are_views_over_one_store() {
        let registry = CacheRegistry::new(Arc::new(MemoryStore::new()));

        registry.product().set("42", &"widget").await.unwrap();

        let via_app: Option<String> = registry
            .app()
            .get_with("42", &crate::cache::OpOptions::namespace("product"))
            .await;
        assert_eq!(via_app.as_deref(), Some("widget"));
        assert_eq!(registry.search().get::<String>("42").await, None);
    }

    #[test]
    fn test_from_config_overrides_app_only() {
        let config = Config {
            default_ttl: 30,
            default_namespace: "shop".to_string(),
            ..Config::default()
        };
        let registry = CacheRegistry::from_config(Arc::new(MemoryStore::new()), &config);

        assert_eq!(registry.app().namespace(), "shop");
        assert_eq!(registry.app().default_ttl(), 30);
        assert_eq!(registry.session().default_ttl(), 1800);
        assert_eq!(registry.by_name("rate_limit").map(|c| c.namespace()), Some("rate_limit"));
    }
}
