use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::analysis::ChartSpec;
use crate::config::SessionConfig;
use crate::ingest::LoadedData;
use crate::types::{AppError, AppResult};

/// Per-session state handed to each handler: the loaded file and the current chart selection.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub file_name: Option<String>,
    pub data: Option<Arc<LoadedData>>,
    pub chart: Option<ChartSpec>,
}

impl SessionContext {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_access: now,
            file_name: None,
            data: None,
            chart: None,
        }
    }
}

/// In-memory session map. Nothing is persisted.
///
/// Every insert first drops sessions idle for longer than the timeout, then the
/// least recently used ones until the map is under `max_sessions`.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionContext>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl SessionStore {
    pub fn new(limits: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: limits.max_sessions.max(1),
            idle_timeout: limits.idle_timeout(),
        }
    }

    pub async fn create(&self) -> SessionContext {
        let session = SessionContext::new();
        let mut guard = self.inner.write().await;
        self.evict(&mut guard);
        guard.insert(session.id, session.clone());
        session
    }

    /// Looks up a session and marks it as used
    pub async fn get(&self, id: Uuid) -> AppResult<SessionContext> {
        self.update(id, |_| {}).await
    }

    /// Existing session for `id`, or a fresh one when `id` is `None`
    pub async fn get_or_create(&self, id: Option<Uuid>) -> AppResult<SessionContext> {
        match id {
            Some(id) => self.get(id).await,
            None => Ok(self.create().await),
        }
    }

    /// Replace the session's file. A new file resets the chart selection.
    pub async fn set_data(&self, id: Uuid, file_name: String, data: LoadedData) -> AppResult<SessionContext> {
        self.update(id, |session| {
            session.file_name = Some(file_name);
            session.data = Some(Arc::new(data));
            session.chart = None;
        })
        .await
    }

    /// Drop any previously loaded file, used when an upload fails
    pub async fn clear_data(&self, id: Uuid) -> AppResult<SessionContext> {
        self.update(id, |session| {
            session.file_name = None;
            session.data = None;
            session.chart = None;
        })
        .await
    }

    pub async fn set_chart(&self, id: Uuid, spec: ChartSpec) -> AppResult<SessionContext> {
        self.update(id, |session| session.chart = Some(spec)).await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> AppResult<SessionContext>
    where
        F: FnOnce(&mut SessionContext),
    {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        apply(session);
        session.last_access = Utc::now();
        Ok(session.clone())
    }

    fn evict(&self, sessions: &mut HashMap<Uuid, SessionContext>) {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| {
            (now - s.last_access).to_std().unwrap_or_default() <= self.idle_timeout
        });

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.last_access)
                .map(|s| s.id);
            match oldest {
                Some(id) => sessions.remove(&id),
                None => break,
            };
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, remaining = sessions.len(), "Evicted sessions");
        }
    }
}
