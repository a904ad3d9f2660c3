//! Cookie-identified sessions backed by a pluggable store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Session payload: a JSON object of named values
pub type SessionData = Map<String, Value>;

/// Persistence for session payloads, keyed by session id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session, or None if it never existed or has expired
    async fn load(&self, session_id: &str) -> AppResult<Option<SessionData>>;

    /// Store a session, replacing any previous payload and resetting its expiry
    async fn save(&self, session_id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<()>;
}

/// Process-local store for tests and single-instance development
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, session_id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<()> {
        let now = Instant::now();
        let expires_at = now + Duration::from_secs(ttl_seconds);
        let mut sessions = self.sessions.write().await;
        // Abandoned sessions are dropped here; nothing else evicts them
        sessions.retain(|_, (_, expires)| *expires > now);
        sessions.insert(session_id.to_string(), (data.clone(), expires_at));
        Ok(())
    }
}

/// One client's session for the duration of a request
pub struct Session {
    id: String,
    is_new: bool,
    data: SessionData,
    store: Arc<dyn SessionStore>,
    ttl_seconds: u64,
}

impl Session {
    /// Resume the session named by the client cookie, or start a new one
    /// when the cookie is absent or its session has expired.
    pub async fn load(
        store: Arc<dyn SessionStore>,
        ttl_seconds: u64,
        session_id: Option<&str>,
    ) -> AppResult<Self> {
        if let Some(id) = session_id {
            if let Some(data) = store.load(id).await? {
                return Ok(Self {
                    id: id.to_string(),
                    is_new: false,
                    data,
                    store,
                    ttl_seconds,
                });
            }
        }

        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            is_new: true,
            data: SessionData::new(),
            store,
            ttl_seconds,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the client does not hold a cookie for this session yet
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        self.data
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt session value {}: {}", key, e)))
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> AppResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session value: {}", e)))?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Persist the payload and refresh the expiry
    pub async fn save(&self) -> AppResult<()> {
        self.store.save(&self.id, &self.data, self.ttl_seconds).await
    }
}
