//! File-based session store.

use super::{BoxFuture, SessionRecord, SessionStore, StorageError, StorageResult, sort_summaries};
use crate::session::{MAX_SESSIONS, SerializedCanvasState, SessionId, SessionSummary};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each session as `<id>.json` in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory
    /// if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self { base_path })
    }

    /// `<data_local_dir>/sl8board/sessions`, falling back to the home directory.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Other("Could not determine home directory".to_string()))?;
        Self::new(base.join("sl8board").join("sessions"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn session_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    fn read_record(&self, id: &str) -> StorageResult<SessionRecord> {
        let path = self.session_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_record(&self, record: &SessionRecord) -> StorageResult<()> {
        let json = serde_json::to_string(record)?;
        fs::write(self.session_path(&record.summary.id), json)?;
        Ok(())
    }

    /// Every readable record. Unreadable files are skipped.
    fn records(&self) -> StorageResult<Vec<SessionRecord>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(StorageError::from)
                .and_then(|json| Ok(serde_json::from_str::<SessionRecord>(&json)?));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable session {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }
}

impl SessionStore for FileStorage {
    fn save(
        &self,
        title: &str,
        state: &SerializedCanvasState,
    ) -> BoxFuture<'_, StorageResult<SessionId>> {
        let record = SessionRecord::new(title, state);
        Box::pin(async move {
            let record = record?;
            if self.records()?.len() >= MAX_SESSIONS {
                return Err(StorageError::SessionLimit(MAX_SESSIONS));
            }
            self.write_record(&record)?;
            log::info!(
                "Saved session {} ({}) to {}",
                record.summary.id,
                record.summary.title,
                self.base_path.display()
            );
            Ok(record.summary.id)
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
            let mut record = self.read_record(&id)?;
            record.update(title.as_deref(), state.as_ref())?;
            self.write_record(&record)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SerializedCanvasState>> {
        let id = id.to_string();
        Box::pin(async move {
            let state = self.read_record(&id)?.state()?;
            log::info!("Loaded session {}", id);
            Ok(state)
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<SessionSummary>>> {
        Box::pin(async move {
            let mut summaries: Vec<_> = self.records()?.into_iter().map(|r| r.summary).collect();
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.session_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)?;
                log::info!("Deleted {}", path.display());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Whiteboard;
    use crate::storage::block_on;
    use crate::tools::ToolKind;
    use kurbo::Point;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let mut board = Whiteboard::new();
        board.tools.set_tool(ToolKind::Highlighter);
        board.import_image_uri("file:///photo.jpg", Point::new(1.0, 2.0), None);
        let state = board.snapshot();

        let id = block_on(storage.save("Canvas 1", &state)).unwrap();
        assert!(dir.path().join(format!("{id}.json")).exists());
        let loaded = block_on(storage.load(&id)).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_skips_garbage() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let state = SerializedCanvasState::default();

        block_on(storage.save("Canvas 1", &state)).unwrap();
        block_on(storage.save("Canvas 2", &state)).unwrap();
        fs::write(dir.path().join("broken.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|s| s.title == "Canvas 1"));
    }

    #[test]
    fn test_file_storage_malformed_payload() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let id = block_on(storage.save("Canvas 1", &SerializedCanvasState::default())).unwrap();

        let path = dir.path().join(format!("{id}.json"));
        let mut record: SessionRecord =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        record.canvas_data = "[1, 2, 3]".to_string();
        fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

        let result = block_on(storage.load(&id));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_file_storage_limit_update_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested")).unwrap();
        let state = SerializedCanvasState::default();

        let ids: Vec<_> = (1..=MAX_SESSIONS)
            .map(|n| block_on(storage.save(&format!("Canvas {n}"), &state)).unwrap())
            .collect();
        assert!(matches!(
            block_on(storage.save("Canvas 6", &state)),
            Err(StorageError::SessionLimit(_))
        ));

        block_on(storage.update(&ids[0], Some("Renamed"), None)).unwrap();
        let list = block_on(storage.list()).unwrap();
        assert!(list.iter().any(|s| s.id == ids[0] && s.title == "Renamed"));

        block_on(storage.delete(&ids[0])).unwrap();
        block_on(storage.delete(&ids[0])).unwrap();
        block_on(storage.save("Canvas 6", &state)).unwrap();
        assert_eq!(block_on(storage.list()).unwrap().len(), MAX_SESSIONS);
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let path = storage.session_path("../escape/attempt");
        assert_eq!(path.parent(), Some(dir.path()));
    }
}
