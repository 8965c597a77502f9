//! Session tuning knobs. Defaults match the shipped product.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum entries on each of the undo and redo stacks.
    pub history_limit: usize,
    /// Quiet period before a burst of edits becomes one history entry.
    pub history_debounce_ms: u64,
    /// Quiet period before changes are persisted.
    pub autosave_debounce_ms: u64,
    /// Subtracted from the container before fitting the canvas.
    pub container_padding: f64,
    /// Crop overlay margin, as a fraction of the target's bounds.
    pub crop_inset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            history_debounce_ms: 300,
            autosave_debounce_ms: 2_000,
            container_padding: px_core::viewport::CONTAINER_PADDING,
            crop_inset: 0.1,
        }
    }
}

impl EditorConfig {
    /// Parse a host-supplied JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EditorError::validation(format!("invalid editor config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        if self.history_limit == 0 {
            return Err(EditorError::validation("history_limit must be at least 1"));
        }
        if !(0.0..0.5).contains(&self.crop_inset) {
            return Err(EditorError::validation("crop_inset must be in [0, 0.5)"));
        }
        Ok(())
    }
}
