//! Background tool: solid color, photo backdrop, or none.

use crate::canvas::{Canvas, SceneMutation};
use crate::error::{EditorError, EditorResult};
use crate::services::AssetInfo;
use kurbo::Size;
use px_core::model::{Background, BackgroundImage, Color};

pub fn set_color(canvas: &mut Canvas, color: Color) -> EditorResult<bool> {
    canvas.apply(SceneMutation::SetBackground(Background::Color { color }))
}

pub fn clear(canvas: &mut Canvas) -> EditorResult<bool> {
    canvas.apply(SceneMutation::SetBackground(Background::None))
}

/// Use a loaded photo as the backdrop, scaled to cover the canvas.
pub fn set_image(canvas: &mut Canvas, asset: &AssetInfo) -> EditorResult<bool> {
    if asset.width == 0 || asset.height == 0 {
        return Err(EditorError::validation(format!(
            "background image {} has no pixels",
            asset.url
        )));
    }
    let scene = canvas.scene();
    let image = BackgroundImage::cover(
        asset.url.clone(),
        Size::new(f64::from(asset.width), f64::from(asset.height)),
        scene.width,
        scene.height,
    );
    canvas.apply(SceneMutation::SetBackground(Background::Image(image)))
}
