//! Text tool: add text blocks and edit their formatting.

use crate::canvas::{Canvas, SceneMutation, TextEdit};
use crate::error::{EditorError, EditorResult};
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::presets::{FONT_SIZE_DEFAULT, FONT_SIZE_MAX, FONT_SIZE_MIN};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_TEXT: &str = "Edit this text";

/// Formatting flags that toggle on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextToggle {
    Bold,
    Italic,
    Underline,
}

/// Add a text block at the canvas centre with default styling.
pub fn add_text(canvas: &mut Canvas, content: &str) -> EditorResult<ObjectId> {
    let scene = canvas.scene();
    let center = Geometry::centered(f64::from(scene.width) / 2.0, f64::from(scene.height) / 2.0);
    let content = if content.is_empty() { DEFAULT_TEXT } else { content };
    let text = TextObject {
        content: content.to_string(),
        font_family: DEFAULT_FONT_FAMILY.to_string(),
        font_size: FONT_SIZE_DEFAULT,
        font_weight: FontWeight::Normal,
        font_style: FontStyle::Normal,
        underline: false,
        fill: Color::BLACK,
        text_align: TextAlign::Left,
    };
    let id = canvas.add_object(SceneObject::new(
        ObjectId::with_prefix("text"),
        ObjectKind::Text(text),
        center,
    ))?;
    canvas.set_active(Some(id));
    Ok(id)
}

fn text_of(canvas: &Canvas, id: ObjectId) -> EditorResult<&TextObject> {
    canvas
        .get(id)
        .and_then(SceneObject::as_text)
        .ok_or_else(|| EditorError::validation(format!("{id} is not a text object")))
}

/// Apply one attribute edit. Font sizes are clamped to the supported range.
pub fn edit(canvas: &mut Canvas, id: ObjectId, edit: TextEdit) -> EditorResult<bool> {
    text_of(canvas, id)?;
    let edit = match edit {
        TextEdit::FontSize(size) if !size.is_finite() => {
            return Err(EditorError::validation("font size must be a number"));
        }
        TextEdit::FontSize(size) => TextEdit::FontSize(size.round().clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)),
        TextEdit::FontFamily(family) if family.trim().is_empty() => {
            return Err(EditorError::validation("font family must not be empty"));
        }
        other => other,
    };
    canvas.apply(SceneMutation::EditText { id, edit })
}

/// Flip bold, italic or underline.
pub fn toggle(canvas: &mut Canvas, id: ObjectId, flag: TextToggle) -> EditorResult<bool> {
    let text = text_of(canvas, id)?;
    let edit = match flag {
        TextToggle::Bold => TextEdit::Weight(match text.font_weight {
            FontWeight::Bold => FontWeight::Normal,
            FontWeight::Normal => FontWeight::Bold,
        }),
        TextToggle::Italic => TextEdit::Style(match text.font_style {
            FontStyle::Italic => FontStyle::Normal,
            FontStyle::Normal => FontStyle::Italic,
        }),
        TextToggle::Underline => TextEdit::Underline(!text.underline),
    };
    canvas.apply(SceneMutation::EditText { id, edit })
}

/// Delete a text object.
pub fn delete(canvas: &mut Canvas, id: ObjectId) -> EditorResult<bool> {
    text_of(canvas, id)?;
    Ok(canvas.remove_object(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_text_is_centred_with_defaults() {
        let mut canvas = Canvas::new(800, 600);
        let id = add_text(&mut canvas, "").unwrap();
        let obj = canvas.get(id).unwrap();
        let text = obj.as_text().unwrap();
        assert_eq!(text.content, DEFAULT_TEXT);
        assert_eq!(text.font_family, "Arial");
        assert_eq!(text.font_size, 20.0);
        assert_eq!(text.fill, Color::BLACK);
        assert_eq!(obj.geometry, Geometry::centered(400.0, 300.0));
        assert_eq!(canvas.active_object(), Some(id));
    }

    #[test]
    fn font_size_is_clamped() {
        let mut canvas = Canvas::new(800, 600);
        let id = add_text(&mut canvas, "Hi").unwrap();
        edit(&mut canvas, id, TextEdit::FontSize(500.0)).unwrap();
        assert_eq!(canvas.get(id).unwrap().as_text().unwrap().font_size, 120.0);
        edit(&mut canvas, id, TextEdit::FontSize(2.0)).unwrap();
        assert_eq!(canvas.get(id).unwrap().as_text().unwrap().font_size, 8.0);
        assert!(edit(&mut canvas, id, TextEdit::FontSize(f64::NAN)).is_err());
    }

    #[test]
    fn toggles_flip() {
        let mut canvas = Canvas::new(800, 600);
        let id = add_text(&mut canvas, "Hi").unwrap();
        toggle(&mut canvas, id, TextToggle::Bold).unwrap();
        toggle(&mut canvas, id, TextToggle::Underline).unwrap();
        let text = canvas.get(id).unwrap().as_text().unwrap();
        assert_eq!(text.font_weight, FontWeight::Bold);
        assert!(text.underline);
        toggle(&mut canvas, id, TextToggle::Bold).unwrap();
        assert_eq!(canvas.get(id).unwrap().as_text().unwrap().font_weight, FontWeight::Normal);
    }

    #[test]
    fn non_text_targets_are_rejected() {
        let mut canvas = Canvas::new(800, 600);
        let ghost = ObjectId::intern("ghost_text");
        assert!(toggle(&mut canvas, ghost, TextToggle::Italic).is_err());
        assert!(delete(&mut canvas, ghost).is_err());
        assert!(!canvas.has_events());
    }
}
