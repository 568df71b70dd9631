//! SL8 Board Core Library
//!
//! Stroke capture, editing and undo/redo engine for the SL8 whiteboard:
//! drawing tools, the eraser's stroke splitter, the canvas store, bounded
//! history, the touch gesture coordinator and session persistence.

pub mod board;
pub mod canvas;
pub mod config;
pub mod elements;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod layers;
pub mod session;
pub mod splitter;
pub mod storage;
pub mod tools;
pub mod view;

pub use board::{Command, Whiteboard};
pub use canvas::{CanvasStore, ElementMap};
pub use config::{BoardConfig, ConfigError};
pub use elements::{
    ElementId, ImageElement, ImageSize, Stroke, StrokePoint, StrokeStyle, TextElement, TextStyle,
};
pub use geometry::BoundingBox;
pub use gesture::{ClipboardContent, GestureCoordinator, GesturePhase, TextInput, TouchEvent};
pub use history::{History, HistoryAction, HistoryEntry};
pub use layers::{Layer, LayerStack};
pub use session::{SerializedCanvasState, SessionId, SessionSummary, MAX_SESSIONS};
pub use splitter::split_stroke;
pub use storage::{FileStorage, MemoryStorage, SessionStore, StorageError, StorageResult};
pub use tools::{Tool, ToolKind, ToolManager, ToolSettings};
pub use view::ViewState;
