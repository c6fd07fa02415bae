/// Rendered-page cache backed by Redis
///
/// The site-wide listing is cached as a fully rendered HTML body keyed by
/// request path and query, with TTL expiry as the only invalidation beyond
/// an explicit clear. Cache failures degrade to uncached rendering; they
/// never surface to the client.
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PageCache {
    redis: ConnectionManager,
    ttl: Duration,
}

impl PageCache {
    /// Connect to Redis; the caller decides what to do when this fails.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self::with_manager(redis, ttl_secs))
    }

    pub fn with_manager(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            redis,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    fn page_key(path_query: &str) -> String {
        format!("page:{}", path_query)
    }

    /// Cached body for a URL, if present.
    pub async fn get(&self, path_query: &str) -> Option<String> {
        let mut conn = self.redis.clone();
        match conn
            .get::<_, Option<String>>(Self::page_key(path_query))
            .await
        {
            Ok(Some(body)) => {
                debug!(%path_query, "page cache HIT");
                Some(body)
            }
            Ok(None) => {
                debug!(%path_query, "page cache MISS");
                None
            }
            Err(e) => {
                warn!("page cache read failed: {}", e);
                None
            }
        }
    }

    /// Store a rendered body for a URL.
    pub async fn put(&self, path_query: &str, body: &str) {
        let mut conn = self.redis.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::page_key(path_query), body, self.ttl.as_secs())
            .await
        {
            warn!("page cache write failed: {}", e);
        }
    }

    /// Drop every cached page; returns the number of entries removed.
    pub async fn clear(&self) -> Result<u64, redis::RedisError> {
        let mut scan_conn = self.redis.clone();
        let mut keys = Vec::new();
        {
            let mut iter = scan_conn.scan_match::<_, String>("page:*").await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.redis.clone();
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }
}
