//! Layers and the ordered layer stack.

use crate::elements::ElementId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LAYER_ID: &str = "default-layer";
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// Which id set of a layer an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Stroke,
    Text,
    Image,
}

/// A drawing layer. Holds element ids only; the elements live in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f64,
    pub order: usize,
    #[serde(default)]
    pub strokes: Vec<ElementId>,
    #[serde(default)]
    pub text_elements: Vec<ElementId>,
    #[serde(default)]
    pub image_elements: Vec<ElementId>,
}

impl Layer {
    pub fn new(id: &str, name: &str, order: usize) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            visible: true,
            locked: false,
            opacity: 1.0,
            order,
            strokes: Vec::new(),
            text_elements: Vec::new(),
            image_elements: Vec::new(),
        }
    }

    fn ids_mut(&mut self, kind: ElementKind) -> &mut Vec<ElementId> {
        match kind {
            ElementKind::Stroke => &mut self.strokes,
            ElementKind::Text => &mut self.text_elements,
            ElementKind::Image => &mut self.image_elements,
        }
    }

    pub fn ids(&self, kind: ElementKind) -> &[ElementId] {
        match kind {
            ElementKind::Stroke => &self.strokes,
            ElementKind::Text => &self.text_elements,
            ElementKind::Image => &self.image_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.text_elements.is_empty() && self.image_elements.is_empty()
    }

    fn clear_contents(&mut self) {
        self.strokes.clear();
        self.text_elements.clear();
        self.image_elements.clear();
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER_ID, DEFAULT_LAYER_NAME, 0)
    }
}

/// Ordered layers (bottom first) plus the active layer.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active: String,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self {
            layers: vec![Layer::default()],
            active: DEFAULT_LAYER_ID.to_string(),
        }
    }
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stack from persisted layers, ordered by their `order` field.
    /// An empty list yields the default layer.
    pub fn from_layers(mut layers: Vec<Layer>) -> Self {
        if layers.is_empty() {
            return Self::default();
        }
        layers.sort_by_key(|layer| layer.order);
        let active = layers[0].id.clone();
        let mut stack = Self { layers, active };
        stack.reindex();
        stack
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_id(&self) -> &str {
        &self.active
    }

    /// Add a layer on top and make it active. Existing ids are ignored.
    pub fn create(&mut self, id: &str, name: &str) -> bool {
        if self.contains(id) {
            log::warn!("Layer {} already exists", id);
            return false;
        }
        self.layers.push(Layer::new(id, name, self.layers.len()));
        self.active = id.to_string();
        true
    }

    /// Remove a layer. The last remaining layer cannot be removed.
    pub(crate) fn delete(&mut self, id: &str) -> Option<Layer> {
        if self.layers.len() <= 1 {
            log::debug!("Refusing to delete the last layer");
            return None;
        }
        let index = self.layers.iter().position(|layer| layer.id == id)?;
        let removed = self.layers.remove(index);
        if self.active == id {
            self.active = self.layers[0].id.clone();
        }
        self.reindex();
        Some(removed)
    }

    pub fn set_active(&mut self, id: &str) {
        if self.contains(id) {
            self.active = id.to_string();
        }
    }

    pub fn toggle_visibility(&mut self, id: &str) {
        if let Some(layer) = self.get_mut(id) {
            layer.visible = !layer.visible;
        }
    }

    pub fn toggle_lock(&mut self, id: &str) {
        if let Some(layer) = self.get_mut(id) {
            layer.locked = !layer.locked;
        }
    }

    pub fn set_opacity(&mut self, id: &str, opacity: f64) {
        if opacity.is_nan() {
            return;
        }
        if let Some(layer) = self.get_mut(id) {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn rename(&mut self, id: &str, name: &str) {
        if let Some(layer) = self.get_mut(id) {
            layer.name = name.to_string();
        }
    }

    /// Move the layer at `from` to `to`. Out-of-range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.layers.len() || to >= self.layers.len() {
            return;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.reindex();
    }

    /// Register an element id with a layer, once.
    pub(crate) fn attach(&mut self, kind: ElementKind, layer_id: &str, element_id: &str) {
        if let Some(layer) = self.get_mut(layer_id) {
            let ids = layer.ids_mut(kind);
            if !ids.iter().any(|id| id == element_id) {
                ids.push(element_id.to_string());
            }
        }
    }

    pub(crate) fn detach(&mut self, kind: ElementKind, layer_id: &str, element_id: &str) {
        if let Some(layer) = self.get_mut(layer_id) {
            layer.ids_mut(kind).retain(|id| id != element_id);
        }
    }

    /// Empty every layer's id sets, keeping the layers.
    pub(crate) fn clear_contents(&mut self) {
        for layer in &mut self.layers {
            layer.clear_contents();
        }
    }

    fn reindex(&mut self) {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.order = index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(stack: &LayerStack) -> Vec<&str> {
        stack.layers().iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_default_stack() {
        let stack = LayerStack::new();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active_id(), DEFAULT_LAYER_ID);
        assert_eq!(stack.layers()[0].name, "Layer 1");
    }

    #[test]
    fn test_create_makes_active() {
        let mut stack = LayerStack::new();
        assert!(stack.create("l2", "Layer 2"));
        assert_eq!(stack.active_id(), "l2");
        assert_eq!(stack.get("l2").unwrap().order, 1);
        assert!(!stack.create("l2", "Again"));
    }

    #[test]
    fn test_cannot_delete_last_layer() {
        let mut stack = LayerStack::new();
        assert!(stack.delete(DEFAULT_LAYER_ID).is_none());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_delete_active_falls_back_and_reindexes() {
        let mut stack = LayerStack::new();
        stack.create("l2", "Layer 2");
        stack.create("l3", "Layer 3");
        stack.set_active("l2");

        let removed = stack.delete("l2").unwrap();
        assert_eq!(removed.id, "l2");
        assert_eq!(stack.active_id(), DEFAULT_LAYER_ID);
        assert_eq!(stack.get("l3").unwrap().order, 1);
        assert!(stack.delete("missing").is_none());
    }

    #[test]
    fn test_set_active_ignores_unknown() {
        let mut stack = LayerStack::new();
        stack.set_active("nope");
        assert_eq!(stack.active_id(), DEFAULT_LAYER_ID);
    }

    #[test]
    fn test_toggles_opacity_and_rename() {
        let mut stack = LayerStack::new();
        stack.toggle_visibility(DEFAULT_LAYER_ID);
        stack.toggle_lock(DEFAULT_LAYER_ID);
        stack.set_opacity(DEFAULT_LAYER_ID, 3.0);
        stack.rename(DEFAULT_LAYER_ID, "Background");

        let layer = stack.get(DEFAULT_LAYER_ID).unwrap();
        assert!(!layer.visible);
        assert!(layer.locked);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.name, "Background");
    }

    #[test]
    fn test_reorder() {
        let mut stack = LayerStack::new();
        stack.create("l2", "Layer 2");
        stack.create("l3", "Layer 3");

        stack.reorder(2, 0);
        assert_eq!(ids(&stack), vec!["l3", DEFAULT_LAYER_ID, "l2"]);
        assert_eq!(stack.get("l3").unwrap().order, 0);

        stack.reorder(0, 3);
        assert_eq!(ids(&stack), vec!["l3", DEFAULT_LAYER_ID, "l2"]);
    }

    #[test]
    fn test_attach_is_a_set() {
        let mut stack = LayerStack::new();
        stack.attach(ElementKind::Stroke, DEFAULT_LAYER_ID, "s1");
        stack.attach(ElementKind::Stroke, DEFAULT_LAYER_ID, "s1");
        stack.attach(ElementKind::Image, DEFAULT_LAYER_ID, "i1");
        let layer = stack.get(DEFAULT_LAYER_ID).unwrap();
        assert_eq!(layer.strokes, vec!["s1".to_string()]);
        assert_eq!(layer.ids(ElementKind::Image), ["i1".to_string()]);

        stack.detach(ElementKind::Stroke, DEFAULT_LAYER_ID, "s1");
        stack.clear_contents();
        assert!(stack.get(DEFAULT_LAYER_ID).unwrap().is_empty());
    }

    #[test]
    fn test_from_layers_sorts_by_order() {
        let stack = LayerStack::from_layers(vec![Layer::new("b", "B", 1), Layer::new("a", "A", 0)]);
        assert_eq!(ids(&stack), vec!["a", "b"]);
        assert_eq!(stack.active_id(), "a");
        assert_eq!(LayerStack::from_layers(Vec::new()), LayerStack::default());
    }
}
