//! Persisted canvas state and session records.

use crate::elements::{ImageElement, Stroke, TextElement};
use crate::layers::Layer;
use crate::tools::{Tool, ToolSettings};
use serde::{Deserialize, Serialize};

/// Maximum number of saved sessions per account.
pub const MAX_SESSIONS: usize = 5;

/// Session identifier.
pub type SessionId = String;

/// The saved shape of a canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedCanvasState {
    pub strokes: Vec<Stroke>,
    pub layers: Vec<Layer>,
    pub current_tool: Tool,
    pub tool_settings: ToolSettings,
    pub images: Vec<ImageElement>,
    /// Absent in older saves.
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
}

impl SerializedCanvasState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn element_count(&self) -> usize {
        self.strokes.len() + self.text_elements.len() + self.images.len()
    }
}

/// Metadata of a saved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    /// Unix millis.
    pub created_at: u64,
    pub updated_at: u64,
}

/// First `"<base> <n>"` (n from 1) not already taken.
pub fn unique_title<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = existing.into_iter().collect();
    (1..)
        .map(|n| format!("{base} {n}"))
        .find(|title| !taken.contains(&title.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_elements_default_when_absent() {
        let json = r##"{
            "strokes": [],
            "layers": [],
            "currentTool": {"type": "pen", "settings": {"color": "#000000", "width": 2, "opacity": 1}},
            "toolSettings": {"color": "#000000", "width": 2, "opacity": 1},
            "images": []
        }"##;
        let state = SerializedCanvasState::from_json(json).unwrap();
        assert!(state.text_elements.is_empty());
        assert_eq!(state.current_tool.settings.width, 2.0);
    }

    #[test]
    fn test_malformed_state_is_an_error() {
        assert!(SerializedCanvasState::from_json("{\"strokes\": 3}").is_err());
        assert!(SerializedCanvasState::from_json("not json").is_err());
    }

    #[test]
    fn test_unique_title() {
        assert_eq!(unique_title("Canvas", []), "Canvas 1");
        assert_eq!(
            unique_title("Canvas", ["Canvas 1", "Canvas 2", "Canvas 4"]),
            "Canvas 3"
        );
    }

    #[test]
    fn test_summary_json() {
        let summary = SessionSummary {
            id: "abc".to_string(),
            title: "Canvas 1".to_string(),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["createdAt"], 1);
        assert_eq!(json["updatedAt"], 2);
    }
}
