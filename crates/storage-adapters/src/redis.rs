//! # Redis store adapter
//!
//! The production implementation of the store port over a pooled Redis
//! connection. Command mapping is one-to-one: the port was cut to fit
//! these primitives. Subscribe-if-absent is `ZADD NX`, a single atomic
//! server-side operation; the creation batch goes out as one pipeline.

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use domains::ports::{AlertSink, KvStore, StoreWrite};
use domains::{keys, AppError, RenderedAlert, Result, UserId};
use std::collections::HashMap;

/// Delivered alerts are kept per recipient as a capped list; old alerts
/// simply fall off.
const ALERT_LIST_MAX: i64 = 50;

fn io(err: impl std::fmt::Display) -> AppError {
    AppError::Store(err.to_string())
}

#[derive(Clone)]
pub struct RedisKvStore {
    pool: Pool,
}

impl RedisKvStore {
    pub fn connect(settings: &configs::StoreSettings) -> Result<Self> {
        let pool = PoolConfig::from_url(settings.url())
            .builder()
            .map_err(|e| AppError::Config(e.to_string()))?
            .max_size(settings.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(RedisKvStore { pool })
    }

    async fn conn(&self) -> Result<Connection> {
        self.pool.get().await.map_err(io)
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.incr(key, 1i64).await.map_err(io)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.exists(key).await.map_err(io)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.del(key).await.map_err(io)?;
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.hget(key, field).await.map_err(io)
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        conn.hgetall(key).await.map_err(io)
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.hset_multiple(key, fields).await.map_err(io)?;
        Ok(())
    }

    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.hincr(key, field, delta).await.map_err(io)
    }

    async fn list_prepend(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.lpush(key, value).await.map_err(io)?;
        Ok(())
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.ltrim(key, start as isize, stop as isize).await.map_err(io)?;
        Ok(())
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.lrange(key, start as isize, stop as isize).await.map_err(io)
    }

    async fn list_remove(&self, key: &str, value: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        // Count 0 removes every occurrence.
        let removed: i64 = conn.lrem(key, 0, value).await.map_err(io)?;
        Ok(removed.unsigned_abs())
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.llen(key).await.map_err(io)
    }

    async fn sorted_add_nx(&self, key: &str, member: &str, score: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        let added: i64 = redis::cmd("ZADD")
            .arg(key)
            .arg("NX")
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(io)?;
        Ok(added == 1)
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn.zrem(key, member).await.map_err(io)?;
        Ok(removed > 0)
    }

    async fn sorted_range(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.zrange(key, 0, -1).await.map_err(io)
    }

    async fn sorted_rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let mut conn = self.conn().await?;
        let rank: Option<i64> = conn.zrank(key, member).await.map_err(io)?;
        Ok(rank.map(|r| r.unsigned_abs()))
    }

    async fn sorted_score(&self, key: &str, member: &str) -> Result<Option<i64>> {
        let mut conn = self.conn().await?;
        conn.zscore(key, member).await.map_err(io)
    }

    async fn run_batch(&self, writes: Vec<StoreWrite>) -> Result<()> {
        let mut pipe = redis::pipe();
        for write in &writes {
            match write {
                StoreWrite::HashSet { key, fields } => {
                    pipe.hset_multiple(key, fields).ignore();
                }
                StoreWrite::ListPrepend { key, value } => {
                    pipe.lpush(key, value).ignore();
                }
                StoreWrite::ListTrim { key, start, stop } => {
                    pipe.ltrim(key, *start as isize, *stop as isize).ignore();
                }
            }
        }
        let mut conn = self.conn().await?;
        pipe.query_async::<()>(&mut conn).await.map_err(io)
    }
}

/// Persists delivered alerts as a capped per-recipient list the (polled)
/// alert view reads back.
#[derive(Clone)]
pub struct RedisAlertSink {
    pool: Pool,
}

impl RedisAlertSink {
    pub fn new(store: &RedisKvStore) -> Self {
        RedisAlertSink {
            pool: store.pool.clone(),
        }
    }
}

#[async_trait]
impl AlertSink for RedisAlertSink {
    async fn deliver(&self, recipient: UserId, alert: RenderedAlert) -> Result<()> {
        let payload = serde_json::to_string(&alert).map_err(io)?;
        let key = keys::user_alerts(recipient);
        let mut conn = self.pool.get().await.map_err(io)?;
        let _: i64 = conn.lpush(&key, payload).await.map_err(io)?;
        let _: () = conn
            .ltrim(&key, 0, (ALERT_LIST_MAX - 1) as isize)
            .await
            .map_err(io)?;
        Ok(())
    }
}
