//! Redis connection management

use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Client, RedisError};

/// Create a Redis connection manager.
/// The manager reconnects automatically, so a transient outage surfaces as
/// failed commands rather than a dead handle.
pub async fn create_connection(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let client = Client::open(redis_url)?;
    ConnectionManager::new(client).await
}

/// Verify a connection with a bounded PING.
/// Used at startup and by readiness probes.
pub async fn verify_connection(conn: &ConnectionManager, timeout: Duration) -> bool {
    let mut conn = conn.clone();
    let cmd = ::redis::cmd("PING");
    let ping = cmd.query_async::<String>(&mut conn);
    matches!(tokio::time::timeout(timeout, ping).await, Ok(Ok(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running Redis
    async fn test_create_connection() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let conn = create_connection(&url).await.expect("connect failed");
        assert!(verify_connection(&conn, Duration::from_secs(5)).await);
    }
}
