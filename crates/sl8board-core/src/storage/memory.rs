//! In-memory session store.

use super::{BoxFuture, SessionRecord, SessionStore, StorageError, StorageResult, sort_summaries};
use crate::session::{MAX_SESSIONS, SerializedCanvasState, SessionId, SessionSummary};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStorage {
    fn save(
        &self,
        title: &str,
        state: &SerializedCanvasState,
    ) -> BoxFuture<'_, StorageResult<SessionId>> {
        let record = SessionRecord::new(title, state);
        Box::pin(async move {
            let record = record?;
            let mut sessions = self.sessions.write().map_err(lock_error)?;
            if sessions.len() >= MAX_SESSIONS {
                return Err(StorageError::SessionLimit(MAX_SESSIONS));
            }
            let id = record.summary.id.clone();
            log::info!("Saved session {} ({})", id, record.summary.title);
            sessions.insert(id.clone(), record);
            Ok(id)
        })
    }

    fn update(
        &self,
        id: &str,
        title: Option<&str>,
        state: Option<&SerializedCanvasState>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let title = title.map(str::to_string);
        let state = state.cloned();
        Box::pin(async move {
            let mut sessions = self.sessions.write().map_err(lock_error)?;
            let record = sessions
                .get_mut(&id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            record.update(title.as_deref(), state.as_ref())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SerializedCanvasState>> {
        let id = id.to_string();
        Box::pin(async move {
            let sessions = self.sessions.read().map_err(lock_error)?;
            let record = sessions.get(&id).ok_or(StorageError::NotFound(id))?;
            record.state()
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<SessionSummary>>> {
        Box::pin(async move {
            let sessions = self.sessions.read().map_err(lock_error)?;
            let mut summaries: Vec<_> = sessions.values().map(|r| r.summary.clone()).collect();
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut sessions = self.sessions.write().map_err(lock_error)?;
            if sessions.remove(&id).is_some() {
                log::info!("Deleted session {}", id);
            }
            Ok(())
        })
    }
}
