//! Tool system for the whiteboard.
//!
//! Per-gesture tool logic lives in [`ToolState`] and is a pure function of
//! (state, event). [`ToolManager`] owns the selected tool, the shared
//! settings and the state of the gesture in progress.

use crate::elements::{LineCap, LineJoin, Stroke, StrokePoint, StrokeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Maximum pencil displacement per axis, in canvas units.
pub const PENCIL_JITTER: f64 = 0.25;
/// Highlighter opacity ceiling.
pub const HIGHLIGHTER_MAX_OPACITY: f64 = 0.4;
/// Highlighter width floor.
pub const HIGHLIGHTER_MIN_WIDTH: f64 = 8.0;
/// Eraser width floor applied to its effective settings.
pub const ERASER_MIN_WIDTH: f64 = 10.0;
/// Switching to the eraser below this width bumps it to [`ERASER_SWITCH_WIDTH`].
pub const ERASER_SWITCH_THRESHOLD: f64 = 8.0;
pub const ERASER_SWITCH_WIDTH: f64 = 12.0;
pub const ERASER_COLOR: &str = "#ffffff";
pub const ERASER_OPACITY: f64 = 0.5;
pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 20.0;
pub const MAX_ERASER_WIDTH: f64 = 100.0;

const MAX_RECENT_TOOLS: usize = 5;
const MAX_CUSTOM_COLORS: usize = 10;

/// Fixed colour palette offered by the toolbar.
pub const PALETTE: [&str; 10] = [
    "#000000", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF", "#FFA500",
    "#800080", "#A52A2A",
];

/// Generate a random seed for new tool interactions.
/// Uses a simple counter + hash approach so it needs no RNG dependency.
fn generate_tool_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    mix32(counter.wrapping_mul(0x9E3779B9))
}

fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Pencil,
    Highlighter,
    Eraser,
    Text,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Pen,
        ToolKind::Pencil,
        ToolKind::Highlighter,
        ToolKind::Eraser,
        ToolKind::Text,
    ];

    /// Upper width bound for this tool.
    pub fn max_width(self) -> f64 {
        match self {
            ToolKind::Eraser => MAX_ERASER_WIDTH,
            _ => MAX_WIDTH,
        }
    }

    /// Settings this tool actually draws with.
    ///
    /// The floors and ceilings are reapplied on every call, so no sequence of
    /// settings updates can get around them.
    pub fn constrain(self, settings: &ToolSettings) -> ToolSettings {
        let mut settings = settings.clone();
        match self {
            ToolKind::Pencil => settings.texture = Some(Texture::Textured),
            ToolKind::Highlighter => {
                settings.opacity = settings.opacity.min(HIGHLIGHTER_MAX_OPACITY);
                settings.width = settings.width.max(HIGHLIGHTER_MIN_WIDTH);
            }
            ToolKind::Eraser => {
                settings.color = ERASER_COLOR.to_string();
                settings.opacity = ERASER_OPACITY;
                settings.width = settings.width.max(ERASER_MIN_WIDTH);
            }
            ToolKind::Pen | ToolKind::Text => {}
        }
        settings
    }

    /// Begin a gesture with this tool.
    pub fn on_start(self, settings: &ToolSettings, point: StrokePoint, layer_id: &str) -> ToolState {
        self.on_start_seeded(settings, point, layer_id, generate_tool_seed())
    }

    /// Begin a gesture with an explicit jitter seed.
    pub fn on_start_seeded(
        self,
        settings: &ToolSettings,
        point: StrokePoint,
        layer_id: &str,
        seed: u32,
    ) -> ToolState {
        if self == ToolKind::Text {
            return ToolState::Placing {
                position: point.pos(),
            };
        }

        let style = self.constrain(settings).stroke_style();
        ToolState::Drawing {
            stroke: Stroke::begin(self, layer_id, style, point),
            jitter: (self == ToolKind::Pencil).then(|| Jitter::new(seed)),
        }
    }
}

/// Surface texture hint carried by pencil settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Texture {
    Smooth,
    Rough,
    Textured,
}

/// Settings shared by all tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<Texture>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
            opacity: 1.0,
            texture: None,
        }
    }
}

impl ToolSettings {
    fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color.clone(),
            width: self.width,
            opacity: self.opacity,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
        }
    }
}

/// A partial settings update. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// A selected tool with the settings it was used with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub settings: ToolSettings,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            kind: ToolKind::Pen,
            settings: ToolSettings::default(),
        }
    }
}

/// Deterministic pencil jitter source (splitmix32).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    state: u32,
}

impl Jitter {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E3779B9);
        mix32(self.state) as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Next offset in `[-PENCIL_JITTER, PENCIL_JITTER)`.
    pub fn offset(&mut self) -> f64 {
        (self.next_unit() - 0.5) * 2.0 * PENCIL_JITTER
    }

    fn perturb(&mut self, point: StrokePoint) -> StrokePoint {
        let dx = self.offset();
        let dy = self.offset();
        point.offset(dx, dy)
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    /// Tool is idle, waiting for interaction.
    #[default]
    Idle,
    /// A stroke-emitting tool is collecting points.
    Drawing {
        stroke: Stroke,
        /// Present for the pencil only.
        jitter: Option<Jitter>,
    },
    /// The text tool recorded where typed text will go.
    Placing { position: Point },
}

impl ToolState {
    pub fn is_active(&self) -> bool {
        !matches!(self, ToolState::Idle)
    }

    /// Feed a move sample. Moves while idle are ignored.
    pub fn on_move(self, point: StrokePoint) -> ToolState {
        match self {
            ToolState::Drawing {
                mut stroke,
                mut jitter,
            } => {
                let point = match jitter.as_mut() {
                    Some(jitter) => jitter.perturb(point),
                    None => point,
                };
                stroke.push_point(point);
                ToolState::Drawing { stroke, jitter }
            }
            other => other,
        }
    }

    /// Finish the gesture, yielding the finished stroke if one was being drawn.
    pub fn on_end(self, point: StrokePoint) -> (ToolState, Option<Stroke>) {
        match self {
            ToolState::Drawing {
                mut stroke,
                mut jitter,
            } => {
                let point = match jitter.as_mut() {
                    Some(jitter) => jitter.perturb(point),
                    None => point,
                };
                stroke.push_point(point);
                (ToolState::Idle, Some(stroke))
            }
            ToolState::Placing { .. } | ToolState::Idle => (ToolState::Idle, None),
        }
    }

    /// Provisional stroke for live feedback.
    pub fn stroke(&self) -> Option<&Stroke> {
        match self {
            ToolState::Drawing { stroke, .. } => Some(stroke),
            _ => None,
        }
    }
}

/// Three-point moving average, keeping both endpoints.
pub fn smooth_points(points: &[StrokePoint]) -> Vec<StrokePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut smoothed = Vec::with_capacity(points.len());
    smoothed.push(points[0]);
    for window in points.windows(3) {
        let (prev, current, next) = (window[0], window[1], window[2]);
        smoothed.push(StrokePoint {
            x: (prev.x + current.x + next.x) / 3.0,
            y: (prev.y + current.y + next.y) / 3.0,
            ..current
        });
    }
    smoothed.push(points[points.len() - 1]);
    smoothed
}

/// Manages the current tool and its state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    current: Tool,
    /// Previously selected tools, most recent first.
    recent: Vec<Tool>,
    custom_colors: Vec<String>,
    state: ToolState,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a tool manager from a persisted tool selection.
    pub fn with_tool(tool: Tool) -> Self {
        Self {
            current: tool,
            ..Self::default()
        }
    }

    /// Replace the current tool and settings without touching the recent list.
    pub fn restore(&mut self, tool: Tool) {
        self.current = tool;
        self.state = ToolState::Idle;
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current.kind
    }

    /// Current tool and raw settings, as persisted.
    pub fn tool(&self) -> &Tool {
        &self.current
    }

    /// Shared settings as set by the user.
    pub fn settings(&self) -> &ToolSettings {
        &self.current.settings
    }

    /// Settings the current tool draws with.
    pub fn effective_settings(&self) -> ToolSettings {
        self.current.kind.constrain(&self.current.settings)
    }

    pub fn recent_tools(&self) -> &[Tool] {
        &self.recent
    }

    /// Set the current tool. Any gesture in progress is abandoned.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.current.kind != kind {
            self.recent.insert(0, self.current.clone());
            self.recent.truncate(MAX_RECENT_TOOLS);
        }

        let mut settings = self.current.settings.clone();
        if kind == ToolKind::Eraser && settings.width < ERASER_SWITCH_THRESHOLD {
            settings.width = ERASER_SWITCH_WIDTH;
        }

        log::debug!("Tool switched: {:?} -> {:?}", self.current.kind, kind);
        self.current = Tool { kind, settings };
        self.state = ToolState::Idle;
    }

    /// Swap the current tool with the most recent one.
    pub fn switch_to_previous_tool(&mut self) {
        if self.recent.is_empty() {
            return;
        }
        let previous = self.recent.remove(0);
        let current = std::mem::replace(&mut self.current, previous);
        self.recent.insert(0, current);
        self.state = ToolState::Idle;
    }

    /// Apply a partial update, clamping every field.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if let Some(color) = update.color {
            self.set_color(&color);
        }
        if let Some(width) = update.width {
            self.set_width(width);
        }
        if let Some(opacity) = update.opacity {
            self.set_opacity(opacity);
        }
    }

    pub fn set_color(&mut self, color: &str) {
        self.current.settings.color = color.to_string();
    }

    /// Width is clamped to `[1, 20]`, or `[1, 100]` for the eraser.
    pub fn set_width(&mut self, width: f64) {
        if width.is_nan() {
            log::warn!("Ignoring NaN tool width");
            return;
        }
        self.current.settings.width = width.clamp(MIN_WIDTH, self.current.kind.max_width());
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_nan() {
            log::warn!("Ignoring NaN tool opacity");
            return;
        }
        self.current.settings.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn reset_settings(&mut self) {
        self.current.settings = ToolSettings::default();
    }

    pub fn palette(&self) -> &'static [&'static str] {
        &PALETTE
    }

    pub fn custom_colors(&self) -> &[String] {
        &self.custom_colors
    }

    /// Remember a custom colour, most recent first. Duplicates are ignored.
    pub fn add_custom_color(&mut self, color: &str) {
        if self.custom_colors.iter().any(|c| c == color) {
            return;
        }
        self.custom_colors.insert(0, color.to_string());
        self.custom_colors.truncate(MAX_CUSTOM_COLORS);
    }

    pub fn remove_custom_color(&mut self, color: &str) {
        self.custom_colors.retain(|c| c != color);
    }

    /// Begin a tool interaction.
    pub fn begin(&mut self, point: StrokePoint, layer_id: &str) {
        self.state = self
            .current
            .kind
            .on_start(&self.current.settings, point, layer_id);
    }

    /// Update the current interaction.
    pub fn update(&mut self, point: StrokePoint) {
        if !self.is_active() {
            log::warn!("Tool move without a preceding start; ignored");
            return;
        }
        let state = std::mem::take(&mut self.state);
        self.state = state.on_move(point);
    }

    /// End the current interaction and return any created stroke.
    pub fn end(&mut self, point: StrokePoint) -> Option<Stroke> {
        let state = std::mem::take(&mut self.state);
        let (state, stroke) = state.on_end(point);
        self.state = state;
        stroke
    }

    /// Cancel the current interaction.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    /// Check if a tool interaction is active.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Get the provisional stroke for the current interaction.
    pub fn preview_stroke(&self) -> Option<&Stroke> {
        self.state.stroke()
    }

    /// Smoothed copy of the pen's provisional points.
    pub fn smoothed_preview(&self) -> Option<Vec<StrokePoint>> {
        match (&self.state, self.current.kind) {
            (ToolState::Drawing { stroke, .. }, ToolKind::Pen) => Some(smooth_points(&stroke.points)),
            _ => None,
        }
    }

    /// Placement point recorded by the text tool.
    pub fn placement(&self) -> Option<Point> {
        match self.state {
            ToolState::Placing { position } => Some(position),
            _ => None,
        }
    }
}
