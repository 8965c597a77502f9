//! Resize tool: change the logical canvas size.
//!
//! Resizing reframes the canvas; objects keep their geometry and may end up
//! partly outside.

use crate::canvas::Canvas;
use crate::error::{EditorError, EditorResult};
use px_core::presets::{ResizePreset, locked_height, locked_width};

pub const MIN_CANVAS_SIZE: u32 = 100;
pub const MAX_CANVAS_SIZE: u32 = 5_000;

/// Pending dimensions being edited in the resize panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDraft {
    pub width: u32,
    pub height: u32,
    pub lock_aspect: bool,
    pub preset: Option<&'static str>,
    current: (u32, u32),
}

impl ResizeDraft {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            lock_aspect: true,
            preset: None,
            current: (width, height),
        }
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        if self.lock_aspect {
            self.height = locked_height(width, self.current);
        }
        self.preset = None;
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        if self.lock_aspect {
            self.width = locked_width(height, self.current);
        }
        self.preset = None;
    }

    /// Fill in dimensions from a named preset, keeping the pixel area.
    pub fn apply_preset(&mut self, name: &str) -> EditorResult<()> {
        let preset = ResizePreset::find(name)
            .ok_or_else(|| EditorError::validation(format!("unknown resize preset `{name}`")))?;
        let (w, h) = preset.dimensions_for(self.current.0, self.current.1);
        self.width = w;
        self.height = h;
        self.preset = Some(preset.name);
        Ok(())
    }

    pub fn is_changed(&self) -> bool {
        (self.width, self.height) != self.current
    }
}

pub fn validate(width: u32, height: u32) -> EditorResult<()> {
    let range = MIN_CANVAS_SIZE..=MAX_CANVAS_SIZE;
    if !range.contains(&width) || !range.contains(&height) {
        return Err(EditorError::validation(format!(
            "canvas size {width}x{height} must be within {MIN_CANVAS_SIZE}..={MAX_CANVAS_SIZE}"
        )));
    }
    Ok(())
}

/// Set the canvas's logical size. Returns whether anything changed.
pub fn resize(canvas: &mut Canvas, width: u32, height: u32) -> EditorResult<bool> {
    validate(width, height)?;
    canvas.set_logical_dimensions(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn locked_draft_follows_ratio() {
        let mut draft = ResizeDraft::new(800, 600);
        draft.set_width(1200);
        assert_eq!((draft.width, draft.height), (1200, 900));
        draft.set_height(300);
        assert_eq!((draft.width, draft.height), (400, 300));
    }

    #[test]
    fn unlocked_draft_is_free() {
        let mut draft = ResizeDraft::new(800, 600);
        draft.lock_aspect = false;
        draft.set_width(1200);
        assert_eq!((draft.width, draft.height), (1200, 600));
        assert!(draft.is_changed());
    }

    #[test]
    fn presets_fill_dimensions() {
        let mut draft = ResizeDraft::new(800, 600);
        draft.apply_preset("Instagram Post").unwrap();
        assert_eq!((draft.width, draft.height), (693, 693));
        assert_eq!(draft.preset, Some("Instagram Post"));
        assert!(draft.apply_preset("Billboard").is_err());
    }

    #[test]
    fn out_of_range_sizes_are_rejected() {
        let mut canvas = Canvas::new(800, 600);
        assert!(resize(&mut canvas, 50, 600).is_err());
        assert!(resize(&mut canvas, 800, 9_000).is_err());
        assert!(!canvas.has_events());
        assert!(resize(&mut canvas, 1200, 600).unwrap());
    }
}
