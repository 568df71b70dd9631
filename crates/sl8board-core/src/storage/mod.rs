//! Session persistence.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::elements::now_millis;
use crate::session::{SerializedCanvasState, SessionId, SessionSummary, unique_title};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session limit reached ({0} sessions)")]
    SessionLimit(usize),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stored session. The canvas travels as a JSON string so a damaged
/// payload is only discovered when it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub canvas_data: String,
}

impl SessionRecord {
    pub fn new(title: &str, state: &SerializedCanvasState) -> StorageResult<Self> {
        let now = now_millis();
        Ok(Self {
            summary: SessionSummary {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                created_at: now,
                updated_at: now,
            },
            canvas_data: state.to_json()?,
        })
    }

    pub fn state(&self) -> StorageResult<SerializedCanvasState> {
        SerializedCanvasState::from_json(&self.canvas_data).map_err(|e| {
            log::warn!("Session {} has a malformed payload: {}", self.summary.id, e);
            StorageError::Serialization(e)
        })
    }

    /// Apply an update and bump `updated_at`.
    pub fn update(
        &mut self,
        title: Option<&str>,
        state: Option<&SerializedCanvasState>,
    ) -> StorageResult<()> {
        if let Some(state) = state {
            self.canvas_data = state.to_json()?;
        }
        if let Some(title) = title {
            self.summary.title = title.to_string();
        }
        self.summary.updated_at = now_millis().max(self.summary.updated_at);
        Ok(())
    }
}

/// Most recently updated first.
pub(crate) fn sort_summaries(summaries: &mut [SessionSummary]) {
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Backend for saved sessions.
///
/// At most [`MAX_SESSIONS`](crate::session::MAX_SESSIONS) sessions are kept;
/// saving beyond that fails with [`StorageError::SessionLimit`].
pub trait SessionStore: Send + Sync {
    /// Save a new session and return its id.
    fn save(&self, title: &str, state: &SerializedCanvasState)
    -> BoxFuture<'_, StorageResult<SessionId>>;

    /// Rewrite the title and/or canvas of an existing session.
    fn update(
        &self,
        id: &str,
        title: Option<&str>,
        state: Option<&SerializedCanvasState>,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a session's canvas.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SerializedCanvasState>>;

    /// Saved sessions, most recently updated first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<SessionSummary>>>;

    /// Delete a session. Unknown ids are ignored.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// First `"<base> <n>"` not used by a saved session.
    fn unique_title<'a>(&'a self, base: &'a str) -> BoxFuture<'a, StorageResult<String>> {
        Box::pin(async move {
            let sessions = self.list().await?;
            Ok(unique_title(base, sessions.iter().map(|s| s.title.as_str())))
        })
    }
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
