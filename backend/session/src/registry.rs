//! Live sessions, keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use esprobe_core::{EsprobeError, Result};

use crate::session::{Session, SessionSummary};

pub type SessionHandle = Arc<RwLock<Session>>;

/// Holds every open session. Each session has its own lock, so work in one
/// session never blocks another.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new empty session.
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(RwLock::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        info!(session = %id, "Session opened");
        (id, handle)
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: &Uuid) -> Result<SessionHandle> {
        let handle = self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EsprobeError::SessionNotFound(id.to_string()))?;
        handle.read().await.touch();
        Ok(handle)
    }

    /// End a session; its document and table are dropped with it.
    pub async fn remove(&self, id: &Uuid) -> Result<()> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                info!(session = %id, "Session closed");
                Ok(())
            }
            None => Err(EsprobeError::SessionNotFound(id.to_string())),
        }
    }

    /// End every session unused for at least `idle`. Sessions with a
    /// generation in flight are kept. Returns how many were removed.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let candidates: Vec<(Uuid, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (*id, Arc::clone(handle)))
            .collect();

        let mut expired = Vec::new();
        for (id, handle) in candidates {
            let session = handle.read().await;
            if !session.is_generating() && session.idle_for() >= idle {
                expired.push(id);
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &expired {
            if sessions.remove(id).is_some() {
                info!(session = %id, idle_secs = idle.as_secs(), "Idle session expired");
            }
        }
        expired.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `every` until the task is aborted.
    pub fn spawn_idle_sweeper(&self, idle: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = registry.evict_idle(idle).await;
                if removed > 0 {
                    let remaining = registry.len().await;
                    debug!(removed, remaining, "Idle sweep finished");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.read().await.summary());
        }
        out.sort_by_key(|s| s.created_at);
        out
    }
}
