//! Subcommand implementations.

use crate::error::AppResult;
use crate::script::{GestureScript, ReplaySummary, Replayer};
use sl8board_core::session::SessionSummary;
use sl8board_core::storage::{FileStorage, SessionStore};
use sl8board_core::{BoardConfig, SessionId, Whiteboard};
use std::path::Path;

/// Open the session store named by the config, or the platform default.
pub fn open_storage(config: &BoardConfig) -> AppResult<FileStorage> {
    let storage = match &config.storage_dir {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Session directory: {}", storage.base_path().display());
    Ok(storage)
}

/// Outcome of a replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub summary: ReplaySummary,
    pub saved_as: Option<SessionId>,
}

/// Replay a script against a fresh board, optionally saving the result.
pub async fn replay(
    config: &BoardConfig,
    script_path: &Path,
    save_as: Option<&str>,
    storage: &dyn SessionStore,
) -> AppResult<ReplayOutcome> {
    let script = GestureScript::from_file(script_path)?;
    let base_dir = script_path.parent().unwrap_or(Path::new("."));

    let mut board = Whiteboard::from_config(config);
    let summary = Replayer::new(&mut board, config.viewport, base_dir).run(&script)?;
    log::info!(
        "Replayed {} steps from {}",
        script.steps.len(),
        script_path.display()
    );

    let saved_as = match save_as {
        Some(title) => Some(storage.save(title, &board.snapshot()).await?),
        None => None,
    };
    Ok(ReplayOutcome { summary, saved_as })
}

pub async fn list(storage: &dyn SessionStore) -> AppResult<Vec<SessionSummary>> {
    Ok(storage.list().await?)
}

/// Load a session into a board and summarise it.
pub async fn load(
    config: &BoardConfig,
    storage: &dyn SessionStore,
    id: &str,
) -> AppResult<ReplaySummary> {
    let state = storage.load(id).await?;
    let mut board = Whiteboard::from_config(config);
    board.load_state(state);
    Ok(ReplaySummary::of(&board))
}

pub async fn delete(storage: &dyn SessionStore, id: &str) -> AppResult<()> {
    Ok(storage.delete(id).await?)
}
