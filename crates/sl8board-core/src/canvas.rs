//! Canvas state store.
//!
//! The authoritative set of live strokes, text, images, layers and view.
//! Every mutation here is synchronous and leaves no partial state behind.
//! History is not recorded here; see [`crate::board::Whiteboard`].

use crate::elements::{ElementId, ImageElement, Stroke, TextElement};
use crate::layers::{ElementKind, LayerStack};
use crate::splitter;
use crate::view::ViewState;
use kurbo::{Point, Vec2};
use std::collections::HashMap;

/// Elements keyed by id, remembering insertion (z) order.
#[derive(Debug, Clone)]
pub struct ElementMap<T> {
    items: HashMap<ElementId, T>,
    /// Back to front.
    z_order: Vec<ElementId>,
}

impl<T> Default for ElementMap<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            z_order: Vec::new(),
        }
    }
}

impl<T> ElementMap<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.z_order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.z_order
    }

    /// Z position of an element, 0 being the back.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.z_order.iter().position(|existing| existing == id)
    }

    /// Insert or replace. A replaced element keeps its z position; a new one
    /// goes to `z_index` (clamped) or on top.
    fn insert(&mut self, id: ElementId, item: T, z_index: Option<usize>) -> Option<T> {
        let previous = self.items.insert(id.clone(), item);
        if previous.is_none() {
            match z_index {
                Some(index) => self.z_order.insert(index.min(self.z_order.len()), id),
                None => self.z_order.push(id),
            }
        }
        previous
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.items.remove(id)?;
        self.z_order.retain(|existing| existing != id);
        Some(removed)
    }

    fn clear(&mut self) {
        self.items.clear();
        self.z_order.clear();
    }
}

impl<T: PartialEq> PartialEq for ElementMap<T> {
    /// Content equality; z order included. Undoing a removal puts the element
    /// back at its old z position, so a store equals its history replayed.
    fn eq(&self, other: &Self) -> bool {
        self.z_order == other.z_order && self.items == other.items
    }
}

/// The canvas store.
#[derive(Debug, Clone, Default)]
pub struct CanvasStore {
    strokes: ElementMap<Stroke>,
    texts: ElementMap<TextElement>,
    images: ElementMap<ImageElement>,
    layers: LayerStack,
    view: ViewState,
    selected_image: Option<ElementId>,
}

impl CanvasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &ElementMap<Stroke> {
        &self.strokes
    }

    pub fn texts(&self) -> &ElementMap<TextElement> {
        &self.texts
    }

    pub fn images(&self) -> &ElementMap<ImageElement> {
        &self.images
    }

    pub fn stroke(&self, id: &str) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&TextElement> {
        self.texts.get(id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageElement> {
        self.images.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.texts.is_empty() && self.images.is_empty()
    }

    /// Layer a new element should land on: its own if it exists, else the active one.
    fn resolve_layer(&self, layer_id: &str) -> Option<String> {
        if self.layers.contains(layer_id) {
            None
        } else {
            log::warn!(
                "Layer {} does not exist; using active layer {}",
                layer_id,
                self.layers.active_id()
            );
            Some(self.layers.active_id().to_string())
        }
    }

    // --- Strokes ---

    /// Add a stroke, replacing any stroke with the same id.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.place_stroke(stroke, None);
    }

    /// Add at a z position, as when a removal is undone.
    pub fn add_stroke_at(&mut self, stroke: Stroke, z_index: usize) {
        self.place_stroke(stroke, Some(z_index));
    }

    fn place_stroke(&mut self, mut stroke: Stroke, z_index: Option<usize>) {
        if let Some(layer_id) = self.resolve_layer(&stroke.layer_id) {
            stroke.layer_id = layer_id;
        }
        if let Some(previous) = self.strokes.get(&stroke.id) {
            let previous_layer = previous.layer_id.clone();
            self.layers
                .detach(ElementKind::Stroke, &previous_layer, &stroke.id);
        }
        self.layers
            .attach(ElementKind::Stroke, &stroke.layer_id, &stroke.id);
        self.strokes.insert(stroke.id.clone(), stroke, z_index);
    }

    /// Replace an existing stroke. Unknown ids are ignored.
    pub fn update_stroke(&mut self, stroke: Stroke) -> bool {
        if !self.strokes.contains(&stroke.id) {
            log::debug!("Ignoring update of unknown stroke {}", stroke.id);
            return false;
        }
        self.add_stroke(stroke);
        true
    }

    pub fn remove_stroke(&mut self, id: &str) -> Option<Stroke> {
        let stroke = self.strokes.remove(id)?;
        self.layers
            .detach(ElementKind::Stroke, &stroke.layer_id, id);
        Some(stroke)
    }

    /// Ids of strokes touched by an eraser disc, back to front.
    pub fn strokes_hit_by(&self, center: Point, radius: f64) -> Vec<ElementId> {
        self.strokes
            .iter()
            .filter(|stroke| splitter::collides(stroke, center, radius))
            .map(|stroke| stroke.id.clone())
            .collect()
    }

    // --- Text ---

    pub fn add_text(&mut self, text: TextElement) {
        self.place_text(text, None);
    }

    /// Add at a z position, as when a removal is undone.
    pub fn add_text_at(&mut self, text: TextElement, z_index: usize) {
        self.place_text(text, Some(z_index));
    }

    fn place_text(&mut self, mut text: TextElement, z_index: Option<usize>) {
        if let Some(layer_id) = self.resolve_layer(&text.layer_id) {
            text.layer_id = layer_id;
        }
        if let Some(previous) = self.texts.get(&text.id) {
            let previous_layer = previous.layer_id.clone();
            self.layers
                .detach(ElementKind::Text, &previous_layer, &text.id);
        }
        self.layers
            .attach(ElementKind::Text, &text.layer_id, &text.id);
        self.texts.insert(text.id.clone(), text, z_index);
    }

    pub fn update_text(&mut self, text: TextElement) -> bool {
        if !self.texts.contains(&text.id) {
            log::debug!("Ignoring update of unknown text {}", text.id);
            return false;
        }
        self.add_text(text);
        true
    }

    pub fn remove_text(&mut self, id: &str) -> Option<TextElement> {
        let text = self.texts.remove(id)?;
        self.layers.detach(ElementKind::Text, &text.layer_id, id);
        Some(text)
    }

    // --- Images ---

    pub fn add_image(&mut self, image: ImageElement) {
        self.place_image(image, None);
    }

    /// Add at a z position, as when a removal is undone.
    pub fn add_image_at(&mut self, image: ImageElement, z_index: usize) {
        self.place_image(image, Some(z_index));
    }

    fn place_image(&mut self, mut image: ImageElement, z_index: Option<usize>) {
        if let Some(layer_id) = self.resolve_layer(&image.layer_id) {
            image.layer_id = layer_id;
        }
        if let Some(previous) = self.images.get(&image.id) {
            let previous_layer = previous.layer_id.clone();
            self.layers
                .detach(ElementKind::Image, &previous_layer, &image.id);
        }
        self.layers
            .attach(ElementKind::Image, &image.layer_id, &image.id);
        self.images.insert(image.id.clone(), image, z_index);
    }

    pub fn update_image(&mut self, image: ImageElement) -> bool {
        if !self.images.contains(&image.id) {
            log::debug!("Ignoring update of unknown image {}", image.id);
            return false;
        }
        self.add_image(image);
        true
    }

    /// Move an existing image. Unknown ids are ignored.
    pub fn move_image(&mut self, id: &str, position: Point) -> bool {
        match self.images.get_mut(id) {
            Some(image) => {
                image.set_position(position);
                true
            }
            None => false,
        }
    }

    pub fn remove_image(&mut self, id: &str) -> Option<ImageElement> {
        let image = self.images.remove(id)?;
        self.layers
            .detach(ElementKind::Image, &image.layer_id, id);
        if self.selected_image.as_deref() == Some(id) {
            self.selected_image = None;
        }
        Some(image)
    }

    /// Topmost image under the point, on a visible layer.
    pub fn image_at(&self, point: Point) -> Option<&ImageElement> {
        self.images.iter().rev().find(|image| {
            image.hit_test(point)
                && self
                    .layers
                    .get(&image.layer_id)
                    .is_none_or(|layer| layer.visible)
        })
    }

    // --- Selection ---

    pub fn selected_image(&self) -> Option<&str> {
        self.selected_image.as_deref()
    }

    pub fn select_image(&mut self, id: &str) {
        if self.images.contains(id) {
            self.selected_image = Some(id.to_string());
        }
    }

    pub fn deselect_images(&mut self) {
        self.selected_image = None;
    }

    // --- Layers ---

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Layer operations that do not move elements.
    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn active_layer_id(&self) -> &str {
        self.layers.active_id()
    }

    /// Delete a layer, moving its elements onto the new active layer.
    /// The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: &str) -> bool {
        let Some(removed) = self.layers.delete(id) else {
            return false;
        };
        let target = self.layers.active_id().to_string();
        for stroke_id in &removed.strokes {
            if let Some(stroke) = self.strokes.get_mut(stroke_id) {
                stroke.layer_id = target.clone();
                self.layers.attach(ElementKind::Stroke, &target, stroke_id);
            }
        }
        for text_id in &removed.text_elements {
            if let Some(text) = self.texts.get_mut(text_id) {
                text.layer_id = target.clone();
                self.layers.attach(ElementKind::Text, &target, text_id);
            }
        }
        for image_id in &removed.image_elements {
            if let Some(image) = self.images.get_mut(image_id) {
                image.layer_id = target.clone();
                self.layers.attach(ElementKind::Image, &target, image_id);
            }
        }
        true
    }

    // --- View ---

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.view.set_zoom(zoom);
    }

    pub fn set_pan_offset(&mut self, offset: Vec2) {
        self.view.set_pan_offset(offset);
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.view.screen_to_canvas(screen_point)
    }

    // --- Bulk ---

    /// Wipe every element, the layer contents and the selection.
    /// Layers and view are kept.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.texts.clear();
        self.images.clear();
        self.layers.clear_contents();
        self.selected_image = None;
    }

    /// Replace all content at once. Layer membership is rebuilt from the
    /// elements themselves.
    pub fn replace_contents(
        &mut self,
        layers: LayerStack,
        strokes: Vec<Stroke>,
        texts: Vec<TextElement>,
        images: Vec<ImageElement>,
    ) {
        self.layers = layers;
        self.clear();
        for stroke in strokes {
            self.add_stroke(stroke);
        }
        for text in texts {
            self.add_text(text);
        }
        for image in images {
            self.add_image(image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{StrokePoint, StrokeStyle};
    use crate::layers::DEFAULT_LAYER_ID;
    use crate::tools::ToolKind;

    fn stroke(id: &str, points: &[(f64, f64)]) -> Stroke {
        Stroke::from_points(
            id.to_string(),
            ToolKind::Pen,
            DEFAULT_LAYER_ID,
            StrokeStyle::default(),
            points
                .iter()
                .map(|&(x, y)| StrokePoint::new(x, y, 0))
                .collect(),
        )
    }

    fn image(id: &str, x: f64, y: f64) -> ImageElement {
        let mut image = ImageElement::new(DEFAULT_LAYER_ID, "file:///a.png", Point::new(x, y), None);
        image.id = id.to_string();
        image
    }

    #[test]
    fn test_add_and_remove_stroke_links_layer() {
        let mut store = CanvasStore::new();
        store.add_stroke(stroke("a", &[(0.0, 0.0), (1.0, 1.0)]));

        assert!(store.stroke("a").is_some());
        let layer = store.layers().get(DEFAULT_LAYER_ID).unwrap();
        assert_eq!(layer.strokes, vec!["a".to_string()]);

        let removed = store.remove_stroke("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(store.layers().get(DEFAULT_LAYER_ID).unwrap().strokes.is_empty());
        assert!(store.remove_stroke("a").is_none());
    }

    #[test]
    fn test_update_unknown_is_ignored() {
        let mut store = CanvasStore::new();
        assert!(!store.update_stroke(stroke("ghost", &[(0.0, 0.0)])));
        assert!(store.stroke("ghost").is_none());

        let text = TextElement::pasted(DEFAULT_LAYER_ID, "hi", Point::ZERO);
        assert!(!store.update_text(text));
        assert!(!store.update_image(image("i", 0.0, 0.0)));
        assert!(!store.move_image("i", Point::ZERO));
    }

    #[test]
    fn test_update_keeps_z_order() {
        let mut store = CanvasStore::new();
        store.add_stroke(stroke("a", &[(0.0, 0.0), (1.0, 1.0)]));
        store.add_stroke(stroke("b", &[(0.0, 0.0), (1.0, 1.0)]));
        assert!(store.update_stroke(stroke("a", &[(5.0, 5.0), (6.0, 6.0)])));

        assert_eq!(store.strokes().ids(), ["a".to_string(), "b".to_string()]);
        assert_eq!(store.stroke("a").unwrap().points[0].x, 5.0);
    }

    #[test]
    fn test_unknown_layer_falls_back_to_active() {
        let mut store = CanvasStore::new();
        let mut s = stroke("a", &[(0.0, 0.0), (1.0, 1.0)]);
        s.layer_id = "missing".to_string();
        store.add_stroke(s);
        assert_eq!(store.stroke("a").unwrap().layer_id, DEFAULT_LAYER_ID);
    }

    #[test]
    fn test_image_hit_test_topmost_first() {
        let mut store = CanvasStore::new();
        store.add_image(image("bottom", 0.0, 0.0));
        store.add_image(image("top", 50.0, 50.0));

        assert_eq!(store.image_at(Point::new(100.0, 100.0)).unwrap().id, "top");
        assert_eq!(store.image_at(Point::new(10.0, 10.0)).unwrap().id, "bottom");
        assert!(store.image_at(Point::new(500.0, 500.0)).is_none());
    }

    #[test]
    fn test_hidden_layer_images_are_not_hit() {
        let mut store = CanvasStore::new();
        store.add_image(image("i", 0.0, 0.0));
        store.layers_mut().toggle_visibility(DEFAULT_LAYER_ID);
        assert!(store.image_at(Point::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_remove_selected_image_clears_selection() {
        let mut store = CanvasStore::new();
        store.add_image(image("i", 0.0, 0.0));
        store.select_image("i");
        assert_eq!(store.selected_image(), Some("i"));

        store.remove_image("i");
        assert_eq!(store.selected_image(), None);

        store.select_image("nope");
        assert_eq!(store.selected_image(), None);
    }

    #[test]
    fn test_clear_wipes_everything_but_layers() {
        let mut store = CanvasStore::new();
        store.add_stroke(stroke("a", &[(0.0, 0.0), (1.0, 1.0)]));
        store.add_text(TextElement::pasted(DEFAULT_LAYER_ID, "hi", Point::ZERO));
        store.add_image(image("i", 0.0, 0.0));
        store.select_image("i");
        store.set_zoom(2.0);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.selected_image(), None);
        assert_eq!(store.layers().len(), 1);
        assert!(store.layers().get(DEFAULT_LAYER_ID).unwrap().is_empty());
        assert_eq!(store.view().zoom(), 2.0);
    }

    #[test]
    fn test_delete_layer_rehomes_elements() {
        let mut store = CanvasStore::new();
        store.layers_mut().create("l2", "Layer 2");
        let mut s = stroke("a", &[(0.0, 0.0), (1.0, 1.0)]);
        s.layer_id = "l2".to_string();
        store.add_stroke(s);

        assert!(store.delete_layer("l2"));
        assert_eq!(store.stroke("a").unwrap().layer_id, DEFAULT_LAYER_ID);
        assert_eq!(
            store.layers().get(DEFAULT_LAYER_ID).unwrap().strokes,
            vec!["a".to_string()]
        );
        assert!(!store.delete_layer(DEFAULT_LAYER_ID));
    }

    #[test]
    fn test_view_operations() {
        let mut store = CanvasStore::new();
        store.set_zoom(10.0);
        assert_eq!(store.view().zoom(), 4.0);
        store.set_pan_offset(Vec2::new(8.0, 8.0));
        assert_eq!(store.screen_to_canvas(Point::new(16.0, 16.0)), Point::new(2.0, 2.0));
        store.reset_view();
        assert_eq!(*store.view(), ViewState::default());
    }

    #[test]
    fn test_strokes_hit_by() {
        let mut store = CanvasStore::new();
        store.add_stroke(stroke("near", &[(0.0, 0.0), (10.0, 0.0)]));
        store.add_stroke(stroke("far", &[(0.0, 50.0), (10.0, 50.0)]));
        assert_eq!(store.strokes_hit_by(Point::new(10.0, 1.0), 2.0), vec!["near".to_string()]);
    }
}
