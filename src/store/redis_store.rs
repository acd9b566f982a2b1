//! Redis Store Module
//!
//! Backing store over a single `ConnectionManager`, which multiplexes commands
//! and reconnects on its own. Retry and timeout policy belong to that client.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::CacheBackend;
use crate::error::Result;

/// Keys fetched per SCAN round trip during a prefix clear.
const SCAN_BATCH: usize = 500;

// == Redis Store ==
/// Redis-backed store shared by every facade instance.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis backing store");
        Ok(Self { conn })
    }

    fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

/// Escapes glob metacharacters so a namespace is matched literally by SCAN.
pub(crate) fn glob_escape(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 4);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl CacheBackend for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        let mut conn = self.connection();
        match ttl {
            // SET EX rejects zero; an already-expired write is a delete.
            Some(0) => conn.del::<_, ()>(key).await?,
            Some(secs) => conn.set_ex::<_, _, ()>(key, value, secs).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        Ok(conn.exists(key).await?)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        let mut conn = self.connection();
        let pattern = format!("{}*", glob_escape(prefix));
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: i64 = conn.del(&keys).await?;
                removed += deleted.max(0) as usize;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(prefix = %prefix, removed, "redis prefix cleared");
        Ok(removed)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.get(key);
        }
        let values: Vec<Option<String>> = pipe.query_async(&mut conn).await?;
        Ok(values)
    }

    async fn mset(&self, entries: Vec<(String, String)>, ttl: Option<u64>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &entries {
            match ttl {
                Some(0) => pipe.del(key).ignore(),
                Some(secs) => pipe.set_ex(key, value, secs).ignore(),
                None => pipe.set(key, value).ignore(),
            };
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, by: i64) -> Result<i64> {
        let mut conn = self.connection();
        Ok(conn.incr(key, by).await?)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        let mut conn = self.connection();
        let seconds = i64::try_from(ttl).unwrap_or(i64::MAX);
        Ok(conn.expire(key, seconds).await?)
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection();
        Ok(conn.ttl(key).await?)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_escape_plain_namespace() {
        assert_eq!(glob_escape("product:"), "product:");
    }

    #[test]
    fn test_glob_escape_metacharacters() {
        assert_eq!(glob_escape("a*b?:"), "a\\*b\\?:");
        assert_eq!(glob_escape("[x]\\"), "\\[x\\]\\\\");
    }

    async fn live_store() -> RedisStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        RedisStore::connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_live_clear_prefix_respects_delimiter() {
        let store = live_store().await;
        store.set("mc_test_user:1", "a".into(), Some(60)).await.unwrap();
        store.set("mc_test_user:2", "b".into(), Some(60)).await.unwrap();
        store.set("mc_test_users:1", "c".into(), Some(60)).await.unwrap();

        assert_eq!(store.clear_prefix("mc_test_user:").await.unwrap(), 2);
        assert!(!store.exists("mc_test_user:1").await.unwrap());
        assert!(store.exists("mc_test_users:1").await.unwrap());

        store.del("mc_test_users:1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_live_zero_ttl_deletes() {
        let store = live_store().await;
        store.set("mc_test_zero", "v".into(), None).await.unwrap();
        assert_eq!(store.ttl("mc_test_zero").await.unwrap(), -1);

        store.set("mc_test_zero", "v".into(), Some(0)).await.unwrap();
        assert_eq!(store.get("mc_test_zero").await.unwrap(), None);
        assert_eq!(store.ttl("mc_test_zero").await.unwrap(), -2);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn test_live_batch_round_trip() {
        let store = live_store().await;
        let entries = vec![
            ("mc_test_batch:a".to_string(), "1".to_string()),
            ("mc_test_batch:b".to_string(), "2".to_string()),
        ];
        store.mset(entries, Some(60)).await.unwrap();

        let keys = vec![
            "mc_test_batch:a".to_string(),
            "mc_test_batch:missing".to_string(),
            "mc_test_batch:b".to_string(),
        ];
        let values = store.mget(&keys).await.unwrap();
        assert_eq!(values, vec![Some("1".into()), None, Some("2".into())]);
        assert_eq!(store.incr_by("mc_test_batch:a", 4).await.unwrap(), 5);

        store.clear_prefix("mc_test_batch:").await.unwrap();
    }
}
