//! Recorded gesture scripts.
//!
//! A script is a JSON list of steps fed through the gesture coordinator the
//! same way touch input would be.

use crate::error::AppResult;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use sl8board_core::gesture::{ClipboardContent, GestureCoordinator, TouchEvent};
use sl8board_core::tools::{SettingsUpdate, ToolKind};
use sl8board_core::Whiteboard;
use std::fmt;
use std::path::Path;

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    Tool { tool: ToolKind },
    Color { color: String },
    Width { width: f64 },
    Opacity { opacity: f64 },
    /// One finger down, in screen coordinates.
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Two-finger gesture from one finger pair to another.
    Pinch { from: [[f64; 2]; 2], to: [[f64; 2]; 2] },
    Cancel,
    Undo,
    Redo,
    Type { text: String },
    Backspace,
    Commit,
    PasteText { text: String },
    /// Paste an image file, resolved relative to the script.
    PasteImage { path: String },
    Layer { id: String, name: String },
    ResetView,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureScript {
    #[serde(default)]
    pub viewport: Option<Size>,
    pub steps: Vec<Step>,
}

impl GestureScript {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

/// Counts describing the board after a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub strokes: usize,
    pub texts: usize,
    pub images: usize,
    pub layers: usize,
    pub history_entries: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub zoom: f64,
}

impl ReplaySummary {
    pub fn of(board: &Whiteboard) -> Self {
        let store = board.store();
        Self {
            strokes: store.strokes().len(),
            texts: store.texts().len(),
            images: store.images().len(),
            layers: store.layers().len(),
            history_entries: board.history().len(),
            can_undo: board.can_undo(),
            can_redo: board.can_redo(),
            zoom: store.view().zoom(),
        }
    }
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "strokes: {}  texts: {}  images: {}  layers: {}",
            self.strokes, self.texts, self.images, self.layers
        )?;
        write!(
            f,
            "history: {} entries (undo: {}, redo: {})  zoom: {:.2}",
            self.history_entries, self.can_undo, self.can_redo, self.zoom
        )
    }
}

fn point([x, y]: [f64; 2]) -> Point {
    Point::new(x, y)
}

/// Drives a board from script steps.
pub struct Replayer<'a> {
    board: &'a mut Whiteboard,
    gestures: GestureCoordinator,
    base_dir: &'a Path,
}

impl<'a> Replayer<'a> {
    pub fn new(board: &'a mut Whiteboard, viewport: Size, base_dir: &'a Path) -> Self {
        Self {
            board,
            gestures: GestureCoordinator::new(viewport),
            base_dir,
        }
    }

    pub fn run(&mut self, script: &GestureScript) -> AppResult<ReplaySummary> {
        if let Some(viewport) = script.viewport {
            self.gestures.set_viewport(viewport);
        }
        for (index, step) in script.steps.iter().enumerate() {
            log::debug!("Step {}: {:?}", index, step);
            self.apply(step)?;
        }
        Ok(ReplaySummary::of(self.board))
    }

    pub fn apply(&mut self, step: &Step) -> AppResult<()> {
        let board = &mut *self.board;
        match step {
            Step::Tool { tool } => board.tools.set_tool(*tool),
            Step::Color { color } => board.tools.update_settings(SettingsUpdate {
                color: Some(color.clone()),
                ..Default::default()
            }),
            Step::Width { width } => board.tools.set_width(*width),
            Step::Opacity { opacity } => board.tools.set_opacity(*opacity),
            Step::Down { x, y } => self.gestures.handle(
                board,
                TouchEvent::Start {
                    touches: vec![Point::new(*x, *y)],
                },
            ),
            Step::Move { x, y } => self.gestures.handle(
                board,
                TouchEvent::Move {
                    touches: vec![Point::new(*x, *y)],
                },
            ),
            Step::Up { x, y } => self.gestures.handle(
                board,
                TouchEvent::End {
                    touches: vec![],
                    changed: vec![Point::new(*x, *y)],
                },
            ),
            Step::Pinch { from, to } => {
                let start = from.map(point).to_vec();
                let end = to.map(point).to_vec();
                self.gestures
                    .handle(board, TouchEvent::Start { touches: start });
                self.gestures.handle(
                    board,
                    TouchEvent::Move {
                        touches: end.clone(),
                    },
                );
                self.gestures.handle(
                    board,
                    TouchEvent::End {
                        touches: vec![],
                        changed: end,
                    },
                );
            }
            Step::Cancel => self.gestures.cancel(board),
            Step::Undo => {
                board.undo();
            }
            Step::Redo => {
                board.redo();
            }
            Step::Type { text } => self.gestures.type_text(text),
            Step::Backspace => self.gestures.backspace(),
            Step::Commit => {
                self.gestures.commit_text(board);
            }
            Step::PasteText { text } => {
                self.gestures
                    .paste(board, ClipboardContent::Text(text.clone()));
            }
            Step::PasteImage { path } => {
                let bytes = std::fs::read(self.base_dir.join(path))?;
                self.gestures.paste(
                    board,
                    ClipboardContent::Image {
                        bytes,
                        natural_size: None,
                    },
                );
            }
            Step::Layer { id, name } => {
                if !board.layers_mut().create(id, name) {
                    log::warn!("Layer {} already exists", id);
                }
            }
            Step::ResetView => board.reset_view(),
            Step::Clear => board.clear_canvas(),
        }
        Ok(())
    }
}
