//! Attendee record storage

use async_trait::async_trait;
use pass_common::models::{normalize_email, normalize_phone};
use pass_common::{AttendeeRecord, Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Filter for listing attendees; both fields empty lists everyone.
#[derive(Debug, Clone, Default)]
pub struct AttendeeFilter {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl AttendeeFilter {
    fn matches(&self, record: &AttendeeRecord) -> bool {
        let email_ok = self
            .email
            .as_deref()
            .map_or(true, |e| normalize_email(e) == normalize_email(&record.email));
        let phone_ok = self.phone.as_deref().map_or(true, |p| {
            record
                .phone
                .as_deref()
                .is_some_and(|rp| normalize_phone(rp) == normalize_phone(p))
        });
        email_ok && phone_ok
    }
}

/// Storage backend for attendee records
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    /// Insert a record unless its pass id is taken.
    /// Returns Ok(true) if created, Ok(false) if the id already exists
    async fn create(&self, record: &AttendeeRecord) -> Result<bool>;

    async fn get(&self, pass_id: &str) -> Result<Option<AttendeeRecord>>;

    /// Matching records, newest first
    async fn list(&self, filter: &AttendeeFilter) -> Result<Vec<AttendeeRecord>>;

    async fn health_check(&self) -> Result<()>;
}

fn sort_newest_first(records: &mut [AttendeeRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.pass_id.cmp(&b.pass_id))
    });
}

/// Redis-backed store.
///
/// Keys: `attendee:<id>` holds the JSON record, `attendees:all` indexes every
/// id, `attendees:email:<email>` and `attendees:phone:<digits>` index lookups.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    async fn load_many(&self, ids: Vec<String>) -> Result<Vec<AttendeeRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(&id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn record_key(pass_id: &str) -> String {
    format!("attendee:{}", pass_id)
}

fn email_key(email: &str) -> String {
    format!("attendees:email:{}", normalize_email(email))
}

fn phone_key(phone: &str) -> String {
    format!("attendees:phone:{}", normalize_phone(phone))
}

const ALL_KEY: &str = "attendees:all";

/// MULTI/EXEC transaction adding a record to every index it belongs in.
fn index_pipeline(record: &AttendeeRecord) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .sadd(ALL_KEY, &record.pass_id)
        .ignore()
        .sadd(email_key(&record.email), &record.pass_id)
        .ignore();
    if let Some(phone) = record.phone.as_deref().filter(|p| !normalize_phone(p).is_empty()) {
        pipe.sadd(phone_key(phone), &record.pass_id).ignore();
    }
    pipe
}

fn redis_err(err: redis::RedisError) -> Error {
    Error::Redis(err.to_string())
}

#[async_trait]
impl AttendeeStore for RedisStore {
    async fn create(&self, record: &AttendeeRecord) -> Result<bool> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(record)?;

        // SET NX keeps identifiers unique under concurrent registrations
        let created: bool = conn
            .set_nx(record_key(&record.pass_id), json)
            .await
            .map_err(redis_err)?;
        if !created {
            debug!("Pass id already taken: {}", record.pass_id);
            return Ok(false);
        }

        // Indexes land together or not at all; without them the record is
        // unreachable, so it is removed again
        let indexed: redis::RedisResult<()> = index_pipeline(record).query_async(&mut conn).await;
        if let Err(e) = indexed {
            warn!("Indexing {} failed, removing record: {}", record.pass_id, e);
            let _: redis::RedisResult<()> = conn.del(record_key(&record.pass_id)).await;
            return Err(redis_err(e));
        }

        info!("Registered attendee: {}", record.pass_id);
        Ok(true)
    }

    async fn get(&self, pass_id: &str) -> Result<Option<AttendeeRecord>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(record_key(pass_id)).await.map_err(redis_err)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &AttendeeFilter) -> Result<Vec<AttendeeRecord>> {
        let mut conn = self.conn.clone();

        // Narrow with the most selective index, then apply the full filter
        let ids: Vec<String> = match (&filter.email, &filter.phone) {
            (Some(email), _) => conn.smembers(email_key(email)).await,
            (None, Some(phone)) => conn.smembers(phone_key(phone)).await,
            (None, None) => conn.smembers(ALL_KEY).await,
        }
        .map_err(redis_err)?;

        let mut records: Vec<AttendeeRecord> = self
            .load_many(ids)
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, AttendeeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendeeStore for MemoryStore {
    async fn create(&self, record: &AttendeeRecord) -> Result<bool> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.pass_id) {
            return Ok(false);
        }
        records.insert(record.pass_id.clone(), record.clone());
        Ok(true)
    }

    async fn get(&self, pass_id: &str) -> Result<Option<AttendeeRecord>> {
        Ok(self.records.read().await.get(pass_id).cloned())
    }

    async fn list(&self, filter: &AttendeeFilter) -> Result<Vec<AttendeeRecord>> {
        let mut records: Vec<AttendeeRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
