use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

/// Listing detail entries live this long unless a write evicts them first.
pub const LISTING_TTL_SECS: u64 = 120;

pub fn listing_key(id: i32) -> String {
    format!("listing:{id}")
}

/// JSON-over-redis read-through cache. Every operation is best effort: a
/// redis failure degrades to a miss, never to a request error.
#[derive(Clone)]
pub struct CacheService {
    redis: ConnectionManager,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.clone();
        let result: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("cache get {key} failed: {e}");
                return None;
            }
        };
        result.and_then(|s| serde_json::from_str(&s).ok())
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let mut conn = self.redis.clone();
        if let Ok(json) = serde_json::to_string(value) {
            let _: Result<(), _> = conn.set_ex(key, json, ttl_secs).await;
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let mut conn = self.redis.clone();
        let _: Result<(), _> = conn.del(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_key_format() {
        assert_eq!(listing_key(42), "listing:42");
    }
}
