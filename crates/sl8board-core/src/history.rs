//! Linear undo/redo history.
//!
//! Each entry carries the full element payload so it can be applied forward
//! or inverted against the [`CanvasStore`]. Entries after the cursor are
//! discarded whenever a new entry is recorded.

use crate::canvas::CanvasStore;
use crate::elements::{ImageElement, Stroke, TextElement, generate_id, now_millis};
use serde::{Deserialize, Serialize};

/// Default maximum number of history entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// A recorded canvas mutation.
///
/// Removals remember the element's z position so undoing one puts it back
/// where it was drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum HistoryAction {
    AddStroke {
        stroke: Stroke,
    },
    RemoveStroke {
        stroke: Stroke,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z_index: Option<usize>,
    },
    AddText {
        text_element: TextElement,
    },
    RemoveText {
        text_element: TextElement,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z_index: Option<usize>,
    },
    AddImage {
        image_element: ImageElement,
    },
    RemoveImage {
        image_element: ImageElement,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z_index: Option<usize>,
    },
}

impl HistoryAction {
    /// Apply this action to the store.
    pub fn apply(&self, store: &mut CanvasStore) {
        match self {
            HistoryAction::AddStroke { stroke } => store.add_stroke(stroke.clone()),
            HistoryAction::RemoveStroke { stroke, .. } => {
                store.remove_stroke(&stroke.id);
            }
            HistoryAction::AddText { text_element } => store.add_text(text_element.clone()),
            HistoryAction::RemoveText { text_element, .. } => {
                store.remove_text(&text_element.id);
            }
            HistoryAction::AddImage { image_element } => store.add_image(image_element.clone()),
            HistoryAction::RemoveImage { image_element, .. } => {
                store.remove_image(&image_element.id);
            }
        }
    }

    /// Undo this action against the store.
    pub fn revert(&self, store: &mut CanvasStore) {
        match self {
            HistoryAction::AddStroke { stroke } => {
                store.remove_stroke(&stroke.id);
            }
            HistoryAction::RemoveStroke { stroke, z_index } => match z_index {
                Some(index) => store.add_stroke_at(stroke.clone(), *index),
                None => store.add_stroke(stroke.clone()),
            },
            HistoryAction::AddText { text_element } => {
                store.remove_text(&text_element.id);
            }
            HistoryAction::RemoveText {
                text_element,
                z_index,
            } => match z_index {
                Some(index) => store.add_text_at(text_element.clone(), *index),
                None => store.add_text(text_element.clone()),
            },
            HistoryAction::AddImage { image_element } => {
                store.remove_image(&image_element.id);
            }
            HistoryAction::RemoveImage {
                image_element,
                z_index,
            } => match z_index {
                Some(index) => store.add_image_at(image_element.clone(), *index),
                None => store.add_image(image_element.clone()),
            },
        }
    }

    /// Id of the element the action touches.
    pub fn element_id(&self) -> &str {
        match self {
            HistoryAction::AddStroke { stroke } | HistoryAction::RemoveStroke { stroke, .. } => {
                &stroke.id
            }
            HistoryAction::AddText { text_element }
            | HistoryAction::RemoveText { text_element, .. } => &text_element.id,
            HistoryAction::AddImage { image_element }
            | HistoryAction::RemoveImage { image_element, .. } => &image_element.id,
        }
    }
}

/// A history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: u64,
    #[serde(flatten)]
    pub action: HistoryAction,
}

impl HistoryEntry {
    pub fn new(action: HistoryAction) -> Self {
        Self {
            id: generate_id("history"),
            timestamp: now_millis(),
            action,
        }
    }
}

/// Bounded linear history with a cursor.
///
/// `cursor` is the index of the last applied entry; `None` means before the
/// first entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |cursor| cursor + 1)
    }

    /// Append an already-applied action, discarding the redo branch.
    pub fn record(&mut self, action: HistoryAction) {
        let keep = self.next_index();
        if keep < self.entries.len() {
            log::debug!("Discarding {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }
        self.entries.push(HistoryEntry::new(action));
        self.cursor = Some(self.entries.len() - 1);
        self.trim();
    }

    /// Undo the entry at the cursor. Returns false when there is nothing to undo.
    pub fn undo(&mut self, store: &mut CanvasStore) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };
        let entry = &self.entries[cursor];
        entry.action.revert(store);
        log::debug!("Undo {} ({})", entry.id, entry.action.element_id());
        self.cursor = cursor.checked_sub(1);
        true
    }

    /// Redo the entry after the cursor. Returns false when there is nothing to redo.
    pub fn redo(&mut self, store: &mut CanvasStore) -> bool {
        let next = self.next_index();
        let Some(entry) = self.entries.get(next) else {
            return false;
        };
        entry.action.apply(store);
        log::debug!("Redo {} ({})", entry.id, entry.action.element_id());
        self.cursor = Some(next);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Change the bound (at least 1) and trim immediately.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        self.trim();
    }

    /// Drop the oldest entries beyond the bound and shift the cursor with them.
    fn trim(&mut self) {
        if self.entries.len() <= self.max_entries {
            return;
        }
        let excess = self.entries.len() - self.max_entries;
        self.entries.drain(..excess);
        self.cursor = self
            .cursor
            .and_then(|cursor| cursor.checked_sub(excess));
    }

    /// Apply entries `0..=cursor` forward onto `store`.
    pub fn replay_into(&self, store: &mut CanvasStore) {
        let applied = self.next_index().min(self.entries.len());
        for entry in &self.entries[..applied] {
            entry.action.apply(store);
        }
    }
}
