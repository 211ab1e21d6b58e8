//! Redis-backed [`AuditSink`]: appends each batch to a Redis list via
//! `RPUSH`, matching the spec's key/list store sink interface directly.

use async_trait::async_trait;
use iam_audit::{AuditSink, SinkError};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Append-only Redis-list sink. Uses a [`ConnectionManager`] so transient
/// connection drops are retried transparently by the `redis` crate rather
/// than failing every batch until a reconnect.
pub struct RedisListSink {
    connection: ConnectionManager,
}

impl RedisListSink {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl AuditSink for RedisListSink {
    async fn append_batch(&self, key: &str, records: Vec<Vec<u8>>) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut connection = self.connection.clone();
        connection
            .rpush::<_, _, ()>(key, records)
            .await
            .map_err(|err| SinkError::Unavailable(err.to_string()))
    }
}
