//! Touch gesture coordinator.
//!
//! Routes single-finger input to the active tool, the eraser or image
//! dragging, and two-finger input to pan/zoom. Touch positions arrive in
//! screen space and are mapped to canvas space through the current view.

use crate::board::Whiteboard;
use crate::elements::{ElementId, ImageSize, StrokePoint};
use crate::splitter::eraser_radius;
use crate::tools::ToolKind;
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;

/// A touch event. `touches` lists the fingers still down after the event,
/// in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    Start { touches: Vec<Point> },
    Move { touches: Vec<Point> },
    End {
        touches: Vec<Point>,
        /// Fingers that lifted.
        changed: Vec<Point>,
    },
    /// The platform took the gesture away.
    Cancel,
}

/// Clipboard or import payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardContent {
    Text(String),
    /// Raw image bytes, stored as a data URI.
    Image {
        bytes: Vec<u8>,
        natural_size: Option<ImageSize>,
    },
    /// An image already stored elsewhere.
    ImageUri {
        uri: String,
        natural_size: Option<ImageSize>,
    },
}

/// Text being typed at a placement point, or an existing element being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub position: Point,
    pub buffer: String,
    pub editing: Option<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Mode {
    #[default]
    Idle,
    Drawing,
    /// Text tool finger is down.
    Placing,
    Erasing {
        processed: HashSet<ElementId>,
    },
    DraggingImage {
        id: ElementId,
        grab_offset: Vec2,
    },
    Pinching {
        anchor_distance: f64,
        anchor_zoom: f64,
        anchor_pan: Vec2,
        anchor_centroid: Point,
    },
    /// Fingers left over after a pinch; ignored until all lift.
    Suppressed,
}

/// What the coordinator is doing, for rendering and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Drawing,
    Placing,
    Erasing,
    DraggingImage,
    Pinching,
    Suppressed,
}

fn erase(board: &mut Whiteboard, point: Point, processed: &mut HashSet<ElementId>) {
    let radius = eraser_radius(board.tools.effective_settings().width);
    board.erase_at(point, radius, processed);
}

/// Interprets touch streams against a [`Whiteboard`].
#[derive(Debug, Clone)]
pub struct GestureCoordinator {
    mode: Mode,
    text_input: Option<TextInput>,
    last_canvas_point: Option<Point>,
    viewport: Size,
}

impl Default for GestureCoordinator {
    fn default() -> Self {
        Self::new(Size::new(1024.0, 768.0))
    }
}

impl GestureCoordinator {
    pub fn new(viewport: Size) -> Self {
        Self {
            mode: Mode::Idle,
            text_input: None,
            last_canvas_point: None,
            viewport,
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn phase(&self) -> GesturePhase {
        match self.mode {
            Mode::Idle => GesturePhase::Idle,
            Mode::Drawing => GesturePhase::Drawing,
            Mode::Placing => GesturePhase::Placing,
            Mode::Erasing { .. } => GesturePhase::Erasing,
            Mode::DraggingImage { .. } => GesturePhase::DraggingImage,
            Mode::Pinching { .. } => GesturePhase::Pinching,
            Mode::Suppressed => GesturePhase::Suppressed,
        }
    }

    pub fn handle(&mut self, board: &mut Whiteboard, event: TouchEvent) {
        match event {
            TouchEvent::Start { touches } => self.on_start(board, &touches),
            TouchEvent::Move { touches } => self.on_move(board, &touches),
            TouchEvent::End { touches, changed } => self.on_end(board, &touches, &changed),
            TouchEvent::Cancel => self.cancel(board),
        }
    }

    fn on_start(&mut self, board: &mut Whiteboard, touches: &[Point]) {
        match touches {
            [] => {}
            [screen] => {
                // A lone finger going down means the previous gesture's end
                // was lost. Drop it rather than extend it.
                if !matches!(self.mode, Mode::Idle) {
                    log::warn!("Touch start during {:?}; restarting", self.phase());
                    self.cancel(board);
                }
                self.begin_single(board, *screen);
            }
            [a, b, ..] => self.begin_pinch(board, *a, *b),
        }
    }

    fn begin_single(&mut self, board: &mut Whiteboard, screen: Point) {
        let point = board.screen_to_canvas(screen);
        self.last_canvas_point = Some(point);

        if let Some(image) = board.image_at(point) {
            let id = image.id.clone();
            let grab_offset = point - image.position;
            board.select_image(&id);
            log::debug!("Dragging image {}", id);
            self.mode = Mode::DraggingImage { id, grab_offset };
            return;
        }
        board.deselect_images();

        if self.text_input.take().is_some() {
            log::debug!("Discarding uncommitted text");
        }

        let layer_id = board.active_layer_id().to_string();
        let kind = board.tools.current_tool();
        board.tools.begin(StrokePoint::at(point), &layer_id);

        self.mode = match kind {
            ToolKind::Eraser => {
                let mut processed = HashSet::new();
                erase(board, point, &mut processed);
                Mode::Erasing { processed }
            }
            ToolKind::Text => {
                self.text_input = board.tools.placement().map(|position| TextInput {
                    position,
                    buffer: String::new(),
                    editing: None,
                });
                Mode::Placing
            }
            ToolKind::Pen | ToolKind::Pencil | ToolKind::Highlighter => Mode::Drawing,
        };
    }

    fn begin_pinch(&mut self, board: &mut Whiteboard, a: Point, b: Point) {
        // A second finger ends whatever one finger was doing.
        if matches!(
            self.mode,
            Mode::Drawing | Mode::Placing | Mode::Erasing { .. }
        ) {
            board.tools.cancel();
        }

        let view = *board.store().view();
        self.mode = Mode::Pinching {
            anchor_distance: a.distance(b),
            anchor_zoom: view.zoom(),
            anchor_pan: view.pan_offset(),
            anchor_centroid: a.midpoint(b),
        };
        log::debug!("Pinch started at zoom {}", view.zoom());
    }

    fn on_move(&mut self, board: &mut Whiteboard, touches: &[Point]) {
        match touches {
            [] => {}
            [a, b, ..] => {
                if !matches!(self.mode, Mode::Pinching { .. }) {
                    self.begin_pinch(board, *a, *b);
                    return;
                }
                self.update_pinch(board, *a, *b);
            }
            [screen] => {
                let point = board.screen_to_canvas(*screen);
                match &mut self.mode {
                    Mode::Drawing => {
                        board.tools.update(StrokePoint::at(point));
                    }
                    Mode::Erasing { processed } => {
                        board.tools.update(StrokePoint::at(point));
                        let mut processed = std::mem::take(processed);
                        erase(board, point, &mut processed);
                        self.mode = Mode::Erasing { processed };
                    }
                    Mode::DraggingImage { id, grab_offset } => {
                        board.move_image(id, point - *grab_offset);
                    }
                    Mode::Placing | Mode::Pinching { .. } | Mode::Suppressed => {}
                    Mode::Idle => {
                        log::warn!("Touch move without a start; ignored");
                        return;
                    }
                }
                self.last_canvas_point = Some(point);
            }
        }
    }

    fn update_pinch(&mut self, board: &mut Whiteboard, a: Point, b: Point) {
        let Mode::Pinching {
            anchor_distance,
            anchor_zoom,
            anchor_pan,
            anchor_centroid,
        } = self.mode
        else {
            return;
        };
        if anchor_distance > 0.0 {
            board.set_zoom(anchor_zoom * (a.distance(b) / anchor_distance));
        }
        board.set_pan_offset(anchor_pan + (a.midpoint(b) - anchor_centroid));
    }

    fn on_end(&mut self, board: &mut Whiteboard, touches: &[Point], changed: &[Point]) {
        if !touches.is_empty() {
            // Dropping from a pinch to one finger must not start drawing.
            if touches.len() < 2 && matches!(self.mode, Mode::Pinching { .. }) {
                self.mode = Mode::Suppressed;
            }
            return;
        }

        let lifted = changed
            .first()
            .map(|screen| board.screen_to_canvas(*screen))
            .or(self.last_canvas_point);

        match std::mem::take(&mut self.mode) {
            Mode::Drawing => {
                let Some(point) = lifted else {
                    board.tools.cancel();
                    return;
                };
                if let Some(stroke) = board.tools.end(StrokePoint::at(point)) {
                    log::debug!("Committing stroke {} ({} points)", stroke.id, stroke.len());
                    board.commit_stroke(stroke);
                }
            }
            Mode::Placing => board.tools.cancel(),
            Mode::Erasing { .. } => {
                // The eraser trail is feedback only.
                board.tools.cancel();
            }
            Mode::DraggingImage { id, .. } => {
                log::debug!("Finished dragging image {}", id);
            }
            Mode::Idle => log::warn!("Touch end without a start; ignored"),
            Mode::Pinching { .. } | Mode::Suppressed => {}
        }
        self.last_canvas_point = None;
    }

    /// Abandon the gesture in progress without touching the canvas.
    pub fn cancel(&mut self, board: &mut Whiteboard) {
        board.tools.cancel();
        self.mode = Mode::Idle;
        self.last_canvas_point = None;
    }

    // --- Text channel ---

    pub fn text_input(&self) -> Option<&TextInput> {
        self.text_input.as_ref()
    }

    pub fn is_typing(&self) -> bool {
        self.text_input.is_some()
    }

    /// Append typed characters. Ignored when not typing.
    pub fn type_text(&mut self, text: &str) {
        match self.text_input.as_mut() {
            Some(input) => input.buffer.push_str(text),
            None => log::debug!("Typing without a text placement; ignored"),
        }
    }

    pub fn backspace(&mut self) {
        if let Some(input) = self.text_input.as_mut() {
            input.buffer.pop();
        }
    }

    /// Open an existing text element for editing.
    pub fn begin_text_edit(&mut self, board: &Whiteboard, id: &str) -> bool {
        let Some(text) = board.store().text(id) else {
            return false;
        };
        self.text_input = Some(TextInput {
            position: text.position,
            buffer: text.content.clone(),
            editing: Some(text.id.clone()),
        });
        true
    }

    /// Commit the buffer. New text is recorded; edits update in place.
    pub fn commit_text(&mut self, board: &mut Whiteboard) -> Option<ElementId> {
        let input = self.text_input.take()?;
        if input.buffer.trim().is_empty() {
            return None;
        }
        match input.editing {
            Some(id) => board.edit_text(&id, &input.buffer).then_some(id),
            None => board.commit_typed_text(&input.buffer, input.position),
        }
    }

    pub fn cancel_text(&mut self) {
        self.text_input = None;
    }

    // --- Paste ---

    /// Canvas point at the centre of the viewport.
    pub fn paste_position(&self, board: &Whiteboard) -> Point {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        board.screen_to_canvas(center)
    }

    pub fn paste(&mut self, board: &mut Whiteboard, content: ClipboardContent) -> Option<ElementId> {
        let position = self.paste_position(board);
        match content {
            ClipboardContent::Text(text) => board.paste_text(&text, position),
            ClipboardContent::Image {
                bytes,
                natural_size,
            } => Some(board.import_image_bytes(&bytes, position, natural_size)),
            ClipboardContent::ImageUri { uri, natural_size } => {
                Some(board.import_image_uri(uri, position, natural_size))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::DEFAULT_IMAGE_SIZE;

    fn start(x: f64, y: f64) -> TouchEvent {
        TouchEvent::Start {
            touches: vec![Point::new(x, y)],
        }
    }

    fn moved(x: f64, y: f64) -> TouchEvent {
        TouchEvent::Move {
            touches: vec![Point::new(x, y)],
        }
    }

    fn end(x: f64, y: f64) -> TouchEvent {
        TouchEvent::End {
            touches: vec![],
            changed: vec![Point::new(x, y)],
        }
    }

    fn pinch(a: (f64, f64), b: (f64, f64)) -> Vec<Point> {
        vec![Point::new(a.0, a.1), Point::new(b.0, b.1)]
    }

    fn draw(gestures: &mut GestureCoordinator, board: &mut Whiteboard, points: &[(f64, f64)]) {
        let (first, rest) = points.split_first().unwrap();
        gestures.handle(board, start(first.0, first.1));
        for &(x, y) in &rest[..rest.len() - 1] {
            gestures.handle(board, moved(x, y));
        }
        let last = rest[rest.len() - 1];
        gestures.handle(board, end(last.0, last.1));
    }

    #[test]
    fn test_draw_commits_stroke() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        draw(&mut gestures, &mut board, &[(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)]);

        assert_eq!(board.store().strokes().len(), 1);
        let stroke = board.store().strokes().iter().next().unwrap();
        assert_eq!(stroke.len(), 3);
        assert_eq!(board.history().len(), 1);
        assert_eq!(gestures.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_drawing_uses_canvas_coordinates() {
        let mut board = Whiteboard::new();
        board.set_zoom(2.0);
        board.set_pan_offset(Vec2::new(20.0, 0.0));
        let mut gestures = GestureCoordinator::default();
        draw(&mut gestures, &mut board, &[(20.0, 0.0), (40.0, 10.0)]);

        let stroke = board.store().strokes().iter().next().unwrap();
        assert_eq!(stroke.points[0].pos(), Point::new(0.0, 0.0));
        assert_eq!(stroke.points[1].pos(), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_stray_move_and_end_are_ignored() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        gestures.handle(&mut board, moved(1.0, 1.0));
        gestures.handle(&mut board, end(1.0, 1.0));
        assert!(board.store().is_empty());
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_lost_end_does_not_merge_strokes() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        gestures.handle(&mut board, start(0.0, 0.0));
        gestures.handle(&mut board, moved(10.0, 0.0));
        // No end for the first stroke.
        draw(&mut gestures, &mut board, &[(500.0, 500.0), (510.0, 500.0), (520.0, 500.0)]);

        assert_eq!(board.store().strokes().len(), 1);
        assert_eq!(board.history().len(), 1);
        let stroke = board.store().strokes().iter().next().unwrap();
        let points: Vec<Point> = stroke.points.iter().map(|p| p.pos()).collect();
        assert_eq!(
            points,
            [
                Point::new(500.0, 500.0),
                Point::new(510.0, 500.0),
                Point::new(520.0, 500.0)
            ]
        );
        assert_eq!(gestures.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_lost_end_while_erasing_restarts_guard() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        let points: Vec<(f64, f64)> = (0..=40).map(|x| (x as f64, 0.0)).collect();
        draw(&mut gestures, &mut board, &points);
        board.tools.set_tool(ToolKind::Eraser);

        gestures.handle(&mut board, start(20.0, 0.0));
        let after_first_pass = board.history().len();
        // No end: the next start is a fresh erase gesture.
        gestures.handle(&mut board, start(30.0, 0.0));
        assert_eq!(gestures.phase(), GesturePhase::Erasing);
        assert!(board.history().len() > after_first_pass);
        gestures.handle(&mut board, end(30.0, 0.0));

        let hit = board
            .store()
            .strokes()
            .iter()
            .flat_map(|s| s.points.iter())
            .any(|p| p.pos().distance(Point::new(30.0, 0.0)) <= 6.0);
        assert!(!hit);
    }

    #[test]
    fn test_cancel_discards_stroke() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        gestures.handle(&mut board, start(0.0, 0.0));
        gestures.handle(&mut board, moved(4.0, 4.0));
        gestures.handle(&mut board, TouchEvent::Cancel);
        gestures.handle(&mut board, end(8.0, 8.0));

        assert!(board.store().is_empty());
        assert!(board.history().is_empty());
        assert!(!board.tools.is_active());
    }

    #[test]
    fn test_pinch_zooms_and_pans_without_history() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        gestures.handle(
            &mut board,
            TouchEvent::Start {
                touches: pinch((0.0, 0.0), (100.0, 0.0)),
            },
        );
        gestures.handle(
            &mut board,
            TouchEvent::Move {
                touches: pinch((10.0, 10.0), (210.0, 10.0)),
            },
        );

        let view = board.store().view();
        assert!((view.zoom() - 2.0).abs() < 1e-9);
        assert_eq!(view.pan_offset(), Vec2::new(60.0, 10.0));
        assert!(board.history().is_empty());

        gestures.handle(
            &mut board,
            TouchEvent::Move {
                touches: pinch((0.0, 0.0), (10_000.0, 0.0)),
            },
        );
        assert_eq!(board.store().view().zoom(), 4.0);
    }

    #[test]
    fn test_second_finger_cancels_provisional_stroke() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        gestures.handle(&mut board, start(0.0, 0.0));
        gestures.handle(&mut board, moved(5.0, 5.0));
        gestures.handle(
            &mut board,
            TouchEvent::Start {
                touches: pinch((5.0, 5.0), (50.0, 50.0)),
            },
        );
        assert_eq!(gestures.phase(), GesturePhase::Pinching);

        // One finger lifts, the other keeps moving: no drawing.
        gestures.handle(
            &mut board,
            TouchEvent::End {
                touches: vec![Point::new(5.0, 5.0)],
                changed: vec![Point::new(50.0, 50.0)],
            },
        );
        gestures.handle(&mut board, moved(30.0, 30.0));
        gestures.handle(&mut board, end(30.0, 30.0));

        assert!(board.store().is_empty());
        assert_eq!(gestures.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_eraser_gesture_splits_once_per_stroke() {
        let mut board = Whiteboard::new();
        let mut gestures = GestureCoordinator::default();
        let points: Vec<(f64, f64)> = (0..=40).map(|x| (x as f64, 0.0)).collect();
        draw(&mut gestures, &mut board, &points);

        board.tools.set_tool(ToolKind::Eraser);
        gestures.handle(&mut board, start(20.0, 0.0));
        assert_eq!(gestures.phase(), GesturePhase::Erasing);
        // Width 12 => radius 6: points 14..=26 are erased.
        assert_eq!(board.store().strokes().len(), 2);
        let after_first_pass = board.history().len();

        gestures.handle(&mut board, moved(30.0, 0.0));
        assert_eq!(board.history().len(), after_first_pass);
        gestures.handle(&mut board, end(30.0, 0.0));

        // The guard resets with the next gesture.
        gestures.handle(&mut board, start(30.0, 0.0));
        gestures.handle(&mut board, end(30.0, 0.0));
        assert!(board.history().len() > after_first_pass);
        assert!(board.store().strokes().iter().all(|s| s.tool == ToolKind::Pen));
    }

    #[test]
    fn test_image_drag_moves_without_history() {
        let mut board = Whiteboard::new();
        let id = board.import_image_uri("file:///a.png", Point::new(100.0, 100.0), None);
        let mut gestures = GestureCoordinator::default();

        gestures.handle(&mut board, start(110.0, 120.0));
        assert_eq!(gestures.phase(), GesturePhase::DraggingImage);
        assert_eq!(board.store().selected_image(), Some(id.as_str()));

        gestures.handle(&mut board, moved(210.0, 220.0));
        gestures.handle(&mut board, end(210.0, 220.0));

        let image = board.store().image(&id).unwrap();
        assert_eq!(image.position, Point::new(200.0, 200.0));
        assert_eq!(board.history().len(), 1);
        assert_eq!(board.store().selected_image(), Some(id.as_str()));
        assert!(board.store().strokes().is_empty());

        // Tapping empty canvas deselects.
        gestures.handle(&mut board, start(900.0, 900.0));
        gestures.handle(&mut board, end(900.0, 900.0));
        assert_eq!(board.store().selected_image(), None);
    }

    #[test]
    fn test_text_tool_typing_flow() {
        let mut board = Whiteboard::new();
        board.tools.set_tool(ToolKind::Text);
        let mut gestures = GestureCoordinator::default();

        gestures.handle(&mut board, start(40.0, 50.0));
        gestures.handle(&mut board, end(40.0, 50.0));
        assert!(gestures.is_typing());
        assert!(board.store().is_empty());

        gestures.type_text("Hellp");
        gestures.backspace();
        gestures.type_text("o");
        let id = gestures.commit_text(&mut board).unwrap();

        let text = board.store().text(&id).unwrap();
        assert_eq!(text.content, "Hello");
        assert_eq!(text.position, Point::new(40.0, 50.0));
        assert!(!gestures.is_typing());
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_blank_text_and_cancel_commit_nothing() {
        let mut board = Whiteboard::new();
        board.tools.set_tool(ToolKind::Text);
        let mut gestures = GestureCoordinator::default();

        gestures.handle(&mut board, start(0.0, 0.0));
        gestures.handle(&mut board, end(0.0, 0.0));
        gestures.type_text("   ");
        assert!(gestures.commit_text(&mut board).is_none());

        gestures.handle(&mut board, start(0.0, 0.0));
        gestures.handle(&mut board, end(0.0, 0.0));
        gestures.type_text("draft");
        gestures.cancel_text();
        assert!(gestures.commit_text(&mut board).is_none());
        assert!(board.store().is_empty());
    }

    #[test]
    fn test_edit_existing_text() {
        let mut board = Whiteboard::new();
        let id = board.paste_text("old", Point::ZERO).unwrap();
        let mut gestures = GestureCoordinator::default();

        assert!(gestures.begin_text_edit(&board, &id));
        gestures.type_text("er");
        assert_eq!(gestures.commit_text(&mut board), Some(id.clone()));
        assert_eq!(board.store().text(&id).unwrap().content, "older");
        assert_eq!(board.history().len(), 1);
        assert!(!gestures.begin_text_edit(&board, "ghost"));
    }

    #[test]
    fn test_paste_lands_at_viewport_centre() {
        let mut board = Whiteboard::new();
        board.set_zoom(2.0);
        board.set_pan_offset(Vec2::new(100.0, 100.0));
        let mut gestures = GestureCoordinator::new(Size::new(800.0, 600.0));

        let text_id = gestures
            .paste(&mut board, ClipboardContent::Text("hi".to_string()))
            .unwrap();
        assert_eq!(board.store().text(&text_id).unwrap().position, Point::new(150.0, 100.0));

        let image_id = gestures
            .paste(
                &mut board,
                ClipboardContent::Image {
                    bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
                    natural_size: None,
                },
            )
            .unwrap();
        let image = board.store().image(&image_id).unwrap();
        assert_eq!(image.size, DEFAULT_IMAGE_SIZE);
        assert!(image.uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(board.history().len(), 2);

        assert!(gestures
            .paste(&mut board, ClipboardContent::Text(String::new()))
            .is_none());
    }
}
