//! Session-scoped state kept in Redis

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Per-session counters. Sessions are identified by the `sid` claim of the
/// caller's token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Counts one more visit in `session` and returns how many came before it
    async fn record_visit(&self, session: Uuid) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: i64,
}

impl RedisSessionStore {
    /// Create a new Redis-backed store whose keys outlive a session by `ttl_seconds`
    pub async fn new(url: &str, ttl_seconds: i64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    fn visits_key(session: Uuid) -> String {
        format!("session:{}:num_visits", session)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn record_visit(&self, session: Uuid) -> AppResult<i64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let key = Self::visits_key(session);
        let visits: i64 = conn
            .incr(&key, 1)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count visit in Redis: {}", e)))?;
        conn.expire::<_, ()>(&key, self.ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to set session expiry in Redis: {}", e)))?;

        Ok(visits - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_key_is_per_session() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(RedisSessionStore::visits_key(a), RedisSessionStore::visits_key(b));
        assert!(RedisSessionStore::visits_key(a).ends_with(":num_visits"));
    }
}
