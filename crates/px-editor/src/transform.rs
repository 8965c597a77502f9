//! AI transform requests against the asset pipeline.
//!
//! [`build`] is pure: the same asset URL, operation and displayed size always
//! yield the same pipeline URL. [`splice`] installs a finished asset in the
//! scene and [`provenance`] describes what must be written back to the
//! project.

use crate::canvas::{Canvas, SceneMutation};
use crate::error::{EditorError, EditorResult};
use crate::services::{AssetInfo, ProjectPatch};
use crate::tools::{ToolId, background};
use kurbo::Size;
use px_core::asset::{AssetUrl, Transformation};
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::presets::RetouchPreset;

pub const EXTEND_MIN: u32 = 50;
pub const EXTEND_MAX: u32 = 500;
pub const EXTEND_STEP: u32 = 25;
pub const EXTEND_DEFAULT: u32 = 200;

// ─── Operations ──────────────────────────────────────────────────────────

/// Side of the image that grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendDirection {
    Left,
    Right,
    Top,
    Bottom,
}

impl ExtendDirection {
    /// The pipeline focus keeps the original pixels on the opposite side.
    pub fn focus(self) -> &'static str {
        match self {
            ExtendDirection::Left => "right",
            ExtendDirection::Right => "left",
            ExtendDirection::Top => "bottom",
            ExtendDirection::Bottom => "top",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, ExtendDirection::Left | ExtendDirection::Right)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "left" => Some(ExtendDirection::Left),
            "right" => Some(ExtendDirection::Right),
            "top" => Some(ExtendDirection::Top),
            "bottom" => Some(ExtendDirection::Bottom),
            _ => None,
        }
    }
}

/// Extension in logical pixels: 50 to 500 in steps of 25.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendAmount(u32);

impl ExtendAmount {
    pub fn new(px: u32) -> EditorResult<Self> {
        if !(EXTEND_MIN..=EXTEND_MAX).contains(&px) || (px - EXTEND_MIN) % EXTEND_STEP != 0 {
            return Err(EditorError::validation(format!(
                "extension of {px}px must be {EXTEND_MIN}..={EXTEND_MAX} in steps of {EXTEND_STEP}"
            )));
        }
        Ok(Self(px))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ExtendAmount {
    fn default() -> Self {
        Self(EXTEND_DEFAULT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Extend {
        direction: ExtendDirection,
        amount: ExtendAmount,
    },
    RemoveBackground,
    Retouch(RetouchPreset),
    /// Swap the canvas backdrop for a photo.
    BackgroundImage { url: String },
    /// Solid backdrop; applied locally without the pipeline.
    BackgroundColor(Color),
}

impl TransformOp {
    /// The tool whose entitlement gates this operation.
    pub fn tool(&self) -> ToolId {
        match self {
            TransformOp::Extend { .. } => ToolId::AiExtender,
            TransformOp::Retouch(_) => ToolId::AiEdit,
            TransformOp::RemoveBackground
            | TransformOp::BackgroundImage { .. }
            | TransformOp::BackgroundColor(_) => ToolId::Background,
        }
    }

    /// Whether the operation replaces the main image.
    pub fn targets_image(&self) -> bool {
        matches!(
            self,
            TransformOp::Extend { .. } | TransformOp::RemoveBackground | TransformOp::Retouch(_)
        )
    }

    /// Shown while the request is in flight.
    pub fn progress_message(&self) -> String {
        match self {
            TransformOp::Extend { .. } => "Extending image with AI...".to_string(),
            TransformOp::RemoveBackground => "Removing background with AI...".to_string(),
            TransformOp::Retouch(preset) => {
                format!("Enhancing image with {}...", preset.spec().label)
            }
            TransformOp::BackgroundImage { .. } => "Setting background image...".to_string(),
            TransformOp::BackgroundColor(_) => "Setting background color...".to_string(),
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            TransformOp::Extend { .. } => "Image extended successfully",
            TransformOp::RemoveBackground => "Background removed successfully",
            TransformOp::Retouch(_) => "Image enhanced successfully",
            TransformOp::BackgroundImage { .. } | TransformOp::BackgroundColor(_) => {
                "Background updated"
            }
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            TransformOp::Extend { .. } => "Failed to extend image. Please try again.",
            TransformOp::RemoveBackground => "Failed to remove background. Please try again.",
            TransformOp::Retouch(_) => "Failed to retouch image. Please try again.",
            TransformOp::BackgroundImage { .. } | TransformOp::BackgroundColor(_) => {
                "Failed to set background. Please try again."
            }
        }
    }
}

// ─── Request building ────────────────────────────────────────────────────

/// A pipeline call waiting to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub op: TransformOp,
    /// Image to replace on completion.
    pub target: Option<ObjectId>,
    /// Asset URL the request was derived from.
    pub source_url: Option<String>,
    /// What the pipeline must resolve; `None` for local operations.
    pub url: Option<String>,
}

/// Width and height an extension produces from the image's displayed size.
/// Only the axis matching `direction` grows.
pub fn extended_size(displayed: Size, direction: ExtendDirection, amount: ExtendAmount) -> (u32, u32) {
    let grow = f64::from(amount.get());
    let (dw, dh) = if direction.is_horizontal() {
        (grow, 0.0)
    } else {
        (0.0, grow)
    };
    (
        (displayed.width + dw).round().max(1.0) as u32,
        (displayed.height + dh).round().max(1.0) as u32,
    )
}

/// Build the pipeline URL for `op` applied to `current_url`.
///
/// `displayed` is the target image's on-canvas size in logical pixels.
/// Returns `None` for operations that never reach the pipeline.
pub fn build(current_url: &str, op: &TransformOp, displayed: Size) -> EditorResult<Option<String>> {
    let url = match op {
        TransformOp::Extend { direction, amount } => {
            let asset = parse(current_url)?;
            if asset.is_background_removed() {
                return Err(EditorError::validation(
                    "images with removed backgrounds cannot be extended",
                ));
            }
            let (w, h) = extended_size(displayed, *direction, *amount);
            asset
                .with_chain(vec![
                    Transformation::from_step("bg-genfill"),
                    Transformation::new("w", w.to_string()),
                    Transformation::new("h", h.to_string()),
                    Transformation::from_step("cm-pad_resize"),
                    Transformation::new("fo", direction.focus()),
                ])
                .to_string()
        }
        TransformOp::RemoveBackground => parse(current_url)?
            .with_chain(vec![Transformation::new("e", "removedotbg")])
            .to_string(),
        TransformOp::Retouch(preset) => parse(current_url)?
            .appended(preset.spec().steps.iter().map(|s| Transformation::from_step(s)))
            .to_string(),
        TransformOp::BackgroundImage { url } => {
            if url.trim().is_empty() {
                return Err(EditorError::validation("background image URL is empty"));
            }
            url.clone()
        }
        TransformOp::BackgroundColor(_) => return Ok(None),
    };
    Ok(Some(url))
}

fn parse(url: &str) -> EditorResult<AssetUrl> {
    AssetUrl::parse(url).map_err(EditorError::validation)
}

// ─── Completion ──────────────────────────────────────────────────────────

/// Install a finished asset. Returns the id of the new main image, if any.
///
/// Fails without touching the scene when the target is gone.
pub fn splice(
    canvas: &mut Canvas,
    request: &TransformRequest,
    asset: &AssetInfo,
) -> EditorResult<Option<ObjectId>> {
    if asset.width == 0 || asset.height == 0 {
        return Err(EditorError::validation(format!("asset {} has no pixels", asset.url)));
    }
    match &request.op {
        TransformOp::BackgroundImage { .. } => {
            background::set_image(canvas, asset)?;
            return Ok(None);
        }
        TransformOp::BackgroundColor(color) => {
            background::set_color(canvas, *color)?;
            return Ok(None);
        }
        _ => {}
    }

    let target = request
        .target
        .ok_or_else(|| EditorError::validation("transform has no target image"))?;
    let old = canvas
        .get(target)
        .ok_or_else(|| EditorError::validation(format!("transform target {target} is gone")))?;
    let Some(old_image) = old.as_image() else {
        return Err(EditorError::validation(format!("{target} is not an image")));
    };

    let (w, h) = (f64::from(asset.width), f64::from(asset.height));
    let mut replacement = match request.op {
        TransformOp::Extend { .. } => {
            let scene = canvas.scene();
            let (cw, ch) = (f64::from(scene.width), f64::from(scene.height));
            let scale = (cw / w).min(ch / h);
            SceneObject::new(
                ObjectId::with_prefix("image"),
                ObjectKind::Image(ImageObject::new(asset.url.clone(), w, h)),
                Geometry::centered(cw / 2.0, ch / 2.0).with_scale(scale, scale),
            )
        }
        _ => {
            // Keep the displayed size even when the pipeline changes resolution.
            let fx = w / old_image.natural_width;
            let fy = h / old_image.natural_height;
            let mut image = ImageObject::new(asset.url.clone(), w, h);
            image.crop = CropRegion {
                x: old_image.crop.x * fx,
                y: old_image.crop.y * fy,
                width: old_image.crop.width * fx,
                height: old_image.crop.height * fy,
            };
            image.filters = old_image.filters.clone();
            let mut geometry = old.geometry;
            geometry.scale_x /= fx;
            geometry.scale_y /= fy;
            SceneObject::new(ObjectId::with_prefix("image"), ObjectKind::Image(image), geometry)
        }
    };
    replacement.selectable = true;
    replacement.evented = true;
    let new_id = replacement.id;

    canvas.apply(SceneMutation::Replace {
        old: target,
        object: Box::new(replacement),
        preserve_geometry: false,
    })?;
    canvas.set_active(Some(new_id));
    log::debug!("transform: {target} -> {new_id} ({})", asset.url);
    Ok(Some(new_id))
}

/// Project fields to write immediately after a successful transform.
/// The caller adds the canvas document.
pub fn provenance(op: &TransformOp, asset: &AssetInfo) -> ProjectPatch {
    let mut patch = ProjectPatch::default();
    match op {
        TransformOp::Extend { .. } => {
            patch.current_image_url = Some(asset.url.clone());
        }
        TransformOp::RemoveBackground => {
            patch.current_image_url = Some(asset.url.clone());
            patch.background_removed = Some(true);
        }
        TransformOp::Retouch(preset) => {
            patch.current_image_url = Some(asset.url.clone());
            patch.active_transformations = Some(Some(preset.chain()));
        }
        TransformOp::BackgroundImage { .. } | TransformOp::BackgroundColor(_) => {}
    }
    patch
}
