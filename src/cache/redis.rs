//! Redis cache implementation
//!
//! Provides a distributed cache using Redis for multi-instance
//! deployments. With several Pariksha instances behind a load balancer,
//! an admin write on one instance must invalidate the homepage payload
//! for all of them.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Default TTL for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Redis cache implementation
///
/// Values are stored as JSON strings to support generic types.
pub struct RedisCache {
    /// Multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Default TTL for entries when not specified
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Create a new Redis cache with the given connection URL
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_ttl(redis_url, DEFAULT_TTL).await
    }

    /// Create a new Redis cache with custom default TTL
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL
    /// * `default_ttl` - Default time-to-live for cache entries
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn with_ttl(redis_url: &str, default_ttl: Duration) -> Result<Self> {
        let client = Client::open(redis_url)
            .context("Failed to create Redis client")?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            connection,
            default_ttl,
        })
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheLayer for RedisCache {
    /// Get a value from Redis cache
    ///
    /// Returns `Ok(Some(value))` if the key exists,
    /// `Ok(None)` if the key doesn't exist.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(key)
            .await
            .context("Failed to get value from Redis")?;

        match result {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .context("Failed to deserialize cached value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in Redis cache with TTL
    ///
    /// Uses SETEX to atomically set the value with expiration.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();

        let json = serde_json::to_string(value)
            .context("Failed to serialize cache value")?;

        // TTL is in seconds for Redis, minimum 1 second
        let ttl_secs = ttl.as_secs().max(1) as u64;

        let _: () = conn.set_ex(key, json, ttl_secs)
            .await
            .context("Failed to set value in Redis")?;

        Ok(())
    }

    /// Delete a value from Redis cache
    ///
    /// If the key doesn't exist, this is a no-op.
    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .del(key)
            .await
            .context("Failed to delete key from Redis")?;

        Ok(())
    }

    /// Clear all cache entries
    ///
    /// Uses FLUSHDB to clear the current database.
    /// Note: This clears ALL keys in the current Redis database.
    async fn clear(&self) -> Result<()> {
        let mut conn = self.connection.clone();

        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .context("Failed to flush Redis database")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to get Redis URL from environment or use default
    fn get_redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    /// Tests are marked with #[ignore] because they require a running Redis server.
    /// Run with: cargo test --features redis-cache -- --ignored

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_set_and_get() {
        let cache = RedisCache::new(&get_redis_url()).await.unwrap();

        // Clean up first
        cache.delete("test:home:payload").await.unwrap();

        cache.set("test:home:payload", &"banner".to_string(), Duration::from_secs(60)).await.unwrap();

        let result: Option<String> = cache.get("test:home:payload").await.unwrap();
        assert_eq!(result, Some("banner".to_string()));

        // Clean up
        cache.delete("test:home:payload").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_get_nonexistent() {
        let cache = RedisCache::new(&get_redis_url()).await.unwrap();

        let result: Option<String> = cache.get("test:nonexistent:key").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_delete() {
        let cache = RedisCache::new(&get_redis_url()).await.unwrap();

        cache.set("test:delete:key", &"value".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.delete("test:delete:key").await.unwrap();

        let result: Option<String> = cache.get("test:delete:key").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    #[ignore = "requires running Redis server"]
    async fn test_ttl_expiration() {
        let cache = RedisCache::new(&get_redis_url()).await.unwrap();

        cache.set("test:ttl:key", &"value".to_string(), Duration::from_secs(1)).await.unwrap();

        let present: Option<String> = cache.get("test:ttl:key").await.unwrap();
        assert_eq!(present, Some("value".to_string()));

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let expired: Option<String> = cache.get("test:ttl:key").await.unwrap();
        assert_eq!(expired, None);
    }
}
