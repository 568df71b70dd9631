//! The whiteboard: canvas store, history and tools behind one command surface.
//!
//! Every user-visible mutation goes through [`Whiteboard::execute`], which
//! applies it to the store and records it in history in the same call, so the
//! two can never drift apart.

use crate::canvas::CanvasStore;
use crate::config::BoardConfig;
use crate::elements::{ElementId, ImageElement, ImageFormat, ImageSize, Stroke, TextElement};
use crate::history::{History, HistoryAction};
use crate::layers::LayerStack;
use crate::session::SerializedCanvasState;
use crate::splitter;
use crate::tools::ToolManager;
use kurbo::{Point, Vec2};
use std::collections::HashSet;

/// A history-recorded canvas mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddStroke(Stroke),
    RemoveStroke(ElementId),
    AddText(TextElement),
    RemoveText(ElementId),
    AddImage(ImageElement),
    RemoveImage(ElementId),
}

/// Whiteboard state.
#[derive(Debug, Clone, Default)]
pub struct Whiteboard {
    store: CanvasStore,
    history: History,
    /// Tool selection and the gesture in progress.
    pub tools: ToolManager,
}

impl Whiteboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            history: History::new(config.max_history_entries),
            ..Self::default()
        }
    }

    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Apply a command and record it. Removing an unknown id does nothing
    /// and records nothing.
    pub fn execute(&mut self, command: Command) -> bool {
        let action = match command {
            Command::AddStroke(stroke) => HistoryAction::AddStroke { stroke },
            Command::AddText(text_element) => HistoryAction::AddText { text_element },
            Command::AddImage(image_element) => HistoryAction::AddImage { image_element },
            Command::RemoveStroke(id) => match self.store.stroke(&id) {
                Some(stroke) => HistoryAction::RemoveStroke {
                    stroke: stroke.clone(),
                    z_index: self.store.strokes().position(&id),
                },
                None => return false,
            },
            Command::RemoveText(id) => match self.store.text(&id) {
                Some(text) => HistoryAction::RemoveText {
                    text_element: text.clone(),
                    z_index: self.store.texts().position(&id),
                },
                None => return false,
            },
            Command::RemoveImage(id) => match self.store.image(&id) {
                Some(image) => HistoryAction::RemoveImage {
                    image_element: image.clone(),
                    z_index: self.store.images().position(&id),
                },
                None => return false,
            },
        };
        action.apply(&mut self.store);
        self.history.record(action);
        true
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.store)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Commit a finished stroke on behalf of a tool.
    pub fn commit_stroke(&mut self, stroke: Stroke) -> ElementId {
        let id = stroke.id.clone();
        self.execute(Command::AddStroke(stroke));
        id
    }

    /// One eraser collision pass.
    ///
    /// Each stroke touched by the disc is removed and replaced by its
    /// surviving fragments, every step recorded separately. Strokes already
    /// in `processed` are skipped; touched strokes and the fragments they
    /// produced are added to it. Returns how many strokes were split.
    pub fn erase_at(
        &mut self,
        center: Point,
        radius: f64,
        processed: &mut HashSet<ElementId>,
    ) -> usize {
        let hits: Vec<ElementId> = self
            .store
            .strokes_hit_by(center, radius)
            .into_iter()
            .filter(|id| !processed.contains(id))
            .collect();

        for id in &hits {
            processed.insert(id.clone());
            let Some(original) = self.store.stroke(id).cloned() else {
                continue;
            };
            let fragments = splitter::split_stroke(&original, center, radius);
            log::debug!("Erasing {} into {} fragments", id, fragments.len());

            self.execute(Command::RemoveStroke(id.clone()));
            for fragment in fragments {
                processed.insert(fragment.id.clone());
                self.execute(Command::AddStroke(fragment));
            }
        }
        hits.len()
    }

    // --- Text ---

    /// Place clipboard text. Empty text is ignored.
    pub fn paste_text(&mut self, content: &str, position: Point) -> Option<ElementId> {
        if content.is_empty() {
            return None;
        }
        let text = TextElement::pasted(self.store.active_layer_id(), content, position);
        let id = text.id.clone();
        self.execute(Command::AddText(text));
        Some(id)
    }

    /// Commit typed text. Whitespace-only content commits nothing.
    pub fn commit_typed_text(&mut self, content: &str, position: Point) -> Option<ElementId> {
        if content.trim().is_empty() {
            return None;
        }
        let color = self.tools.settings().color.clone();
        let text = TextElement::typed(self.store.active_layer_id(), content, position, &color);
        let id = text.id.clone();
        self.execute(Command::AddText(text));
        Some(id)
    }

    /// Replace the content of an existing text element. Not recorded.
    pub fn edit_text(&mut self, id: &str, content: &str) -> bool {
        let Some(mut text) = self.store.text(id).cloned() else {
            return false;
        };
        text.set_content(content);
        self.store.update_text(text)
    }

    /// Replace a text element wholesale. Not recorded.
    pub fn update_text(&mut self, text: TextElement) -> bool {
        self.store.update_text(text)
    }

    // --- Images ---

    /// Place raw image bytes as a data URI.
    pub fn import_image_bytes(
        &mut self,
        bytes: &[u8],
        position: Point,
        size: Option<ImageSize>,
    ) -> ElementId {
        self.import_image_uri(ImageFormat::data_uri(bytes), position, size)
    }

    /// Place an externally stored image. Defaults to 200x150 without a size.
    pub fn import_image_uri(
        &mut self,
        uri: impl Into<String>,
        position: Point,
        size: Option<ImageSize>,
    ) -> ElementId {
        let image = ImageElement::new(self.store.active_layer_id(), uri, position, size);
        self.commit_image(image)
    }

    /// Commit an image produced elsewhere, once.
    pub fn commit_image(&mut self, image: ImageElement) -> ElementId {
        let id = image.id.clone();
        self.execute(Command::AddImage(image));
        id
    }

    /// Move an image. Drags bypass history.
    pub fn move_image(&mut self, id: &str, position: Point) -> bool {
        self.store.move_image(id, position)
    }

    /// Replace an image wholesale. Not recorded.
    pub fn update_image(&mut self, image: ImageElement) -> bool {
        self.store.update_image(image)
    }

    pub fn image_at(&self, point: Point) -> Option<&ImageElement> {
        self.store.image_at(point)
    }

    pub fn select_image(&mut self, id: &str) {
        self.store.select_image(id);
    }

    pub fn deselect_images(&mut self) {
        self.store.deselect_images();
    }

    // --- Layers ---

    pub fn layers(&self) -> &LayerStack {
        self.store.layers()
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        self.store.layers_mut()
    }

    pub fn delete_layer(&mut self, id: &str) -> bool {
        self.store.delete_layer(id)
    }

    pub fn active_layer_id(&self) -> &str {
        self.store.active_layer_id()
    }

    // --- View ---

    pub fn set_zoom(&mut self, zoom: f64) {
        self.store.set_zoom(zoom);
    }

    pub fn set_pan_offset(&mut self, offset: Vec2) {
        self.store.set_pan_offset(offset);
    }

    pub fn reset_view(&mut self) {
        self.store.reset_view();
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.store.screen_to_canvas(screen_point)
    }

    // --- Whole canvas ---

    /// Wipe the canvas. History goes with it, since its entries would refer
    /// to elements that no longer exist.
    pub fn clear_canvas(&mut self) {
        log::info!("Clearing canvas");
        self.tools.cancel();
        self.store.clear();
        self.history.clear();
    }

    /// Current canvas in its saved shape.
    pub fn snapshot(&self) -> SerializedCanvasState {
        SerializedCanvasState {
            strokes: self.store.strokes().iter().cloned().collect(),
            layers: self.store.layers().layers().to_vec(),
            current_tool: self.tools.tool().clone(),
            tool_settings: self.tools.settings().clone(),
            images: self.store.images().iter().cloned().collect(),
            text_elements: self.store.texts().iter().cloned().collect(),
        }
    }

    /// Replace the canvas with a saved state. History and selection are
    /// cleared; the view is kept.
    pub fn load_state(&mut self, state: SerializedCanvasState) {
        let layers = LayerStack::from_layers(state.layers);
        log::info!(
            "Loading canvas: {} strokes, {} texts, {} images, {} layers",
            state.strokes.len(),
            state.text_elements.len(),
            state.images.len(),
            layers.len()
        );
        self.store
            .replace_contents(layers, state.strokes, state.text_elements, state.images);
        self.tools.restore(state.current_tool);
        self.history.clear();
    }

    /// Parse and load a saved state. A malformed payload leaves the canvas untouched.
    pub fn load_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let state = SerializedCanvasState::from_json(json).inspect_err(|e| {
            log::warn!("Rejecting malformed canvas payload: {}", e);
        })?;
        self.load_state(state);
        Ok(())
    }
}
