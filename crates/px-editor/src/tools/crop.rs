//! Crop tool: an exclusive mode driven by a transient overlay rectangle.
//!
//! Entering crop freezes the target image and drops a dashed overlay on it.
//! Applying replaces the image with a cropped copy on the same asset;
//! cancelling puts the target back exactly as it was.

use crate::canvas::{Canvas, SceneMutation};
use crate::error::{EditorError, EditorResult};
use kurbo::{Rect, Size};
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::presets::CropRatio;
use smallvec::smallvec;

/// Overlay border color.
pub const OVERLAY_STROKE: Color = Color::rgb(0x00, 0xBC, 0xD4);

/// Allowed drift between the overlay's ratio and the selected one.
pub const RATIO_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OriginalProps {
    selectable: bool,
    evented: bool,
    geometry: Geometry,
}

/// State held for the duration of one crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    pub target: ObjectId,
    pub overlay: ObjectId,
    pub ratio: CropRatio,
    original: OriginalProps,
}

/// Pick the crop target: explicit, else the active image, else the first image.
pub fn resolve_target(canvas: &Canvas, explicit: Option<ObjectId>) -> EditorResult<ObjectId> {
    let candidate = explicit
        .or_else(|| canvas.active_image())
        .or_else(|| canvas.scene().first_image().map(|o| o.id));
    match candidate.and_then(|id| canvas.get(id)) {
        Some(obj) if obj.is_image() => Ok(obj.id),
        Some(obj) => Err(EditorError::validation(format!("{} is not an image", obj.id))),
        None => Err(EditorError::validation("no image to crop")),
    }
}

/// Freeze `target` and place an overlay inset by `inset` on each side.
pub fn enter(canvas: &mut Canvas, target: ObjectId, inset: f64) -> EditorResult<CropSession> {
    let obj = canvas
        .get(target)
        .filter(|o| o.is_image())
        .ok_or_else(|| EditorError::validation(format!("no image {target} to crop")))?;
    let original = OriginalProps {
        selectable: obj.selectable,
        evented: obj.evented,
        geometry: obj.geometry,
    };
    let bounds = obj.bounding_rect();

    for stray in canvas.scene().crop_overlays() {
        canvas.remove_object(stray);
    }
    canvas.apply(SceneMutation::SetInteractivity {
        id: target,
        selectable: false,
        evented: false,
    })?;
    let overlay = canvas.add_object(overlay_for(bounds, inset))?;
    canvas.set_active(Some(overlay));

    log::debug!("crop: entered on {target}");
    Ok(CropSession {
        target,
        overlay,
        ratio: CropRatio::Freeform,
        original,
    })
}

fn overlay_for(bounds: Rect, inset: f64) -> SceneObject {
    let width = bounds.width() * (1.0 - 2.0 * inset);
    let height = bounds.height() * (1.0 - 2.0 * inset);
    SceneObject::new(
        ObjectId::with_prefix("crop_rect"),
        ObjectKind::Shape(ShapeObject {
            width,
            height,
            fill: None,
            stroke: Some(Stroke {
                color: OVERLAY_STROKE,
                width: 2.0,
                dash: smallvec![5.0, 5.0],
            }),
            role: ShapeRole::CropOverlay,
        }),
        Geometry::at(
            bounds.x0 + bounds.width() * inset,
            bounds.y0 + bounds.height() * inset,
        ),
    )
}

/// Select an aspect ratio and conform the overlay to it.
pub fn set_ratio(canvas: &mut Canvas, session: &mut CropSession, ratio: CropRatio) -> EditorResult<()> {
    session.ratio = ratio;
    constrain(canvas, session)
}

/// Live scale step on the overlay; the ratio constraint runs every time.
pub fn scale_overlay(
    canvas: &mut Canvas,
    session: &CropSession,
    scale_x: f64,
    scale_y: f64,
) -> EditorResult<()> {
    let mut geometry = overlay(canvas, session)?.geometry;
    geometry.scale_x = scale_x;
    geometry.scale_y = scale_y;
    canvas.apply(SceneMutation::SetGeometry {
        id: session.overlay,
        geometry,
    })?;
    constrain(canvas, session)
}

/// Recompute the overlay height from its displayed width.
fn constrain(canvas: &mut Canvas, session: &CropSession) -> EditorResult<()> {
    let Some(ratio) = session.ratio.value() else {
        return Ok(());
    };
    let obj = overlay(canvas, session)?;
    let Some(shape) = obj.as_shape() else {
        return Err(EditorError::validation("crop overlay is not a shape"));
    };
    let (sx, sy) = (obj.geometry.scale_x, obj.geometry.scale_y);
    let width = shape.width * sx;
    let height = shape.height * sy;
    if height > 0.0 && sy != 0.0 && (width / height - ratio).abs() <= RATIO_TOLERANCE {
        return Ok(());
    }
    let shape_width = shape.width;
    canvas.apply(SceneMutation::ResizeShape {
        id: session.overlay,
        width: shape_width,
        height: width / ratio / sy,
    })?;
    Ok(())
}

fn overlay<'a>(canvas: &'a Canvas, session: &CropSession) -> EditorResult<&'a SceneObject> {
    canvas
        .get(session.overlay)
        .ok_or_else(|| EditorError::validation("crop overlay is gone"))
}

/// Compute the source-pixel crop the overlay selects on `image`.
///
/// Returns the new crop and the canvas-space region it covers.
pub fn crop_region(image: &SceneObject, overlay_bounds: Rect) -> EditorResult<(CropRegion, Rect)> {
    let Some(img) = image.as_image() else {
        return Err(EditorError::validation(format!("{} is not an image", image.id)));
    };
    let image_bounds = image.bounding_rect();
    let region = overlay_bounds.intersect(image_bounds);
    if region.width() <= 0.0 || region.height() <= 0.0 {
        return Err(EditorError::validation("crop region is empty"));
    }

    let sx = image.geometry.scale_x.abs();
    let sy = image.geometry.scale_y.abs();
    if sx == 0.0 || sy == 0.0 {
        return Err(EditorError::validation("image has zero scale"));
    }

    let local_x = ((region.x0 - image_bounds.x0) / sx).max(0.0);
    let local_y = ((region.y0 - image_bounds.y0) / sy).max(0.0);
    let local_w = (region.width() / sx).min(img.crop.width - local_x);
    let local_h = (region.height() / sy).min(img.crop.height - local_y);

    let x = (img.crop.x + local_x).clamp(0.0, img.natural_width);
    let y = (img.crop.y + local_y).clamp(0.0, img.natural_height);
    let width = local_w.min(img.natural_width - x);
    let height = local_h.min(img.natural_height - y);
    if width <= 0.0 || height <= 0.0 {
        return Err(EditorError::validation("crop region is empty"));
    }

    Ok((
        CropRegion {
            x,
            y,
            width,
            height,
        },
        region,
    ))
}

/// Replace the target with its cropped copy and leave crop mode.
///
/// On error nothing has changed and the session is still live.
pub fn apply(canvas: &mut Canvas, session: &CropSession) -> EditorResult<ObjectId> {
    let overlay_bounds = overlay(canvas, session)?.bounding_rect();
    let image = canvas
        .get(session.target)
        .ok_or_else(|| EditorError::validation("crop target is gone"))?;
    let (crop, region) = crop_region(image, overlay_bounds)?;

    let Some(source) = image.as_image() else {
        return Err(EditorError::validation("crop target is not an image"));
    };
    let mut cropped = source.clone();
    cropped.crop = crop;

    let mut geometry = image.geometry;
    geometry.place_center_at(region.center(), Size::new(crop.width, crop.height));
    let mut replacement = SceneObject::new(
        ObjectId::with_prefix("image"),
        ObjectKind::Image(cropped),
        geometry,
    );
    replacement.selectable = session.original.selectable;
    replacement.evented = session.original.evented;
    let new_id = replacement.id;

    canvas.replace_object(session.target, replacement, false)?;
    canvas.remove_object(session.overlay);
    canvas.set_active(Some(new_id));
    log::debug!("crop: applied {:?} -> {new_id}", crop);
    Ok(new_id)
}

/// Drop the overlay and restore the target bit-identically.
pub fn cancel(canvas: &mut Canvas, session: &CropSession) -> EditorResult<()> {
    canvas.remove_object(session.overlay);
    for stray in canvas.scene().crop_overlays() {
        canvas.remove_object(stray);
    }
    if canvas.get(session.target).is_some() {
        canvas.apply(SceneMutation::SetGeometry {
            id: session.target,
            geometry: session.original.geometry,
        })?;
        canvas.apply(SceneMutation::SetInteractivity {
            id: session.target,
            selectable: session.original.selectable,
            evented: session.original.evented,
        })?;
        canvas.set_active(Some(session.target));
    }
    log::debug!("crop: cancelled on {}", session.target);
    Ok(())
}

/// The scene as it should be stored mid-crop: the target keeps the
/// interaction flags it had before the crop started.
pub fn persisted_scene(canvas: &Canvas, session: &CropSession) -> Scene {
    let mut scene = canvas.scene().clone();
    if let Some(target) = scene.objects.iter_mut().find(|o| o.id == session.target) {
        target.selectable = session.original.selectable;
        target.evented = session.original.evented;
    }
    scene
}
