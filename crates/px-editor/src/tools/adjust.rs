//! Adjust tool: slider-driven filters on an image.

use crate::canvas::{Canvas, SceneMutation};
use crate::error::{EditorError, EditorResult};
use px_core::filters::AdjustValues;
use px_core::id::ObjectId;
use px_core::model::ImageObject;
use smallvec::SmallVec;

fn image_of(canvas: &Canvas, id: ObjectId) -> EditorResult<&ImageObject> {
    canvas
        .get(id)
        .and_then(|o| o.as_image())
        .ok_or_else(|| EditorError::validation(format!("{id} is not an image")))
}

/// Slider values currently applied to `id`.
pub fn read(canvas: &Canvas, id: ObjectId) -> EditorResult<AdjustValues> {
    Ok(AdjustValues::from_filters(&image_of(canvas, id)?.filters))
}

/// Replace the image's filters with those described by `values`.
pub fn apply(canvas: &mut Canvas, id: ObjectId, values: &AdjustValues) -> EditorResult<bool> {
    image_of(canvas, id)?;
    canvas.apply(SceneMutation::SetFilters {
        id,
        filters: values.to_filters(),
    })
}

/// Drop every adjustment.
pub fn reset(canvas: &mut Canvas, id: ObjectId) -> EditorResult<bool> {
    image_of(canvas, id)?;
    canvas.apply(SceneMutation::SetFilters {
        id,
        filters: SmallVec::new(),
    })
}
