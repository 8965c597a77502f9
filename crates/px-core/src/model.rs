//! Core scene data model for Pixora editing sessions.
//!
//! A scene is a flat, ordered list of drawable objects (z-order is the
//! sequence position) plus canvas-level properties: logical dimensions,
//! background and the user's view transform. All stored geometry lives in
//! logical design pixels; on-screen scaling is the viewport's business.

use crate::filters::AppliedFilter;
use crate::id::ObjectId;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color, 8 bits per channel. Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let r = hex_val(bytes[0])? * 17;
                let g = hex_val(bytes[1])? * 17;
                let b = hex_val(bytes[2])? * 17;
                let a = match bytes.get(3) {
                    Some(&c) => hex_val(c)? * 17,
                    None => 255,
                };
                Some(Self::rgba(r, g, b, a))
            }
            6 | 8 => {
                let pair = |i: usize| -> Option<u8> {
                    Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?)
                };
                let a = if bytes.len() == 8 { pair(6)? } else { 255 };
                Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, a))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Placement of an object's origin point along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Left / top edge.
    #[default]
    Start,
    Center,
    /// Right / bottom edge.
    End,
}

impl Anchor {
    /// Fraction of the object's extent where the origin sits.
    pub fn factor(self) -> f64 {
        match self {
            Anchor::Start => 0.0,
            Anchor::Center => 0.5,
            Anchor::End => 1.0,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// Position, scale, rotation and origin anchor of an object.
///
/// `left`/`top` locate the origin point in logical canvas space. The
/// object's intrinsic rectangle is scaled, then rotated about that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub origin_x: Anchor,
    #[serde(default)]
    pub origin_y: Anchor,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

impl Geometry {
    /// Unscaled, unrotated geometry with a top-left origin.
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: Anchor::Start,
            origin_y: Anchor::Start,
        }
    }

    /// Geometry anchored at its center, placed at `(x, y)`.
    pub fn centered(x: f64, y: f64) -> Self {
        Self {
            origin_x: Anchor::Center,
            origin_y: Anchor::Center,
            ..Self::at(x, y)
        }
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Affine mapping the object's local space (`0..w`, `0..h`) to canvas space.
    pub fn transform(&self, size: Size) -> Affine {
        let origin = Vec2::new(
            self.origin_x.factor() * size.width,
            self.origin_y.factor() * size.height,
        );
        Affine::translate((self.left, self.top))
            * Affine::rotate(self.angle.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(-origin)
    }

    /// Axis-aligned bounding box on the canvas.
    pub fn bounds(&self, size: Size) -> Rect {
        self.transform(size).transform_rect_bbox(size.to_rect())
    }

    /// Canvas-space center of the object.
    pub fn center(&self, size: Size) -> Point {
        self.transform(size) * Point::new(size.width / 2.0, size.height / 2.0)
    }

    /// Move the object so its center lands on `center`, keeping scale,
    /// rotation and origin anchors.
    pub fn place_center_at(&mut self, center: Point, size: Size) {
        let current = self.center(size);
        self.left += center.x - current.x;
        self.top += center.y - current.y;
    }

    /// Copy placement (position, scale, rotation, origin) from `other`.
    pub fn copy_placement(&mut self, other: &Geometry) {
        *self = *other;
    }
}

// ─── Object payloads ─────────────────────────────────────────────────────

/// Region of the source asset shown by an image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// A raster image backed by a hosted asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub src: String,
    pub natural_width: f64,
    pub natural_height: f64,
    pub crop: CropRegion,
    #[serde(default)]
    pub filters: SmallVec<[AppliedFilter; 4]>,
}

impl ImageObject {
    /// An uncropped, unfiltered image.
    pub fn new(src: impl Into<String>, natural_width: f64, natural_height: f64) -> Self {
        Self {
            src: src.into(),
            natural_width,
            natural_height,
            crop: CropRegion::full(natural_width, natural_height),
            filters: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Editable text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub underline: bool,
    pub fill: Color,
    #[serde(default)]
    pub text_align: TextAlign,
}

/// Line height multiplier used for text extents.
pub const TEXT_LINE_HEIGHT: f64 = 1.16;
/// Average glyph advance as a fraction of the font size.
const TEXT_ADVANCE: f64 = 0.6;

impl TextObject {
    /// Approximate layout size. Real glyph metrics belong to the renderer;
    /// this is only used for bounds and hit areas.
    pub fn approx_size(&self) -> Size {
        let lines = self.content.split('\n');
        let (count, longest) = lines.fold((0usize, 0usize), |(n, w), line| {
            (n + 1, w.max(line.chars().count()))
        });
        Size::new(
            longest as f64 * self.font_size * TEXT_ADVANCE,
            count.max(1) as f64 * self.font_size * TEXT_LINE_HEIGHT,
        )
    }
}

/// What a rectangle shape is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRole {
    #[default]
    Decoration,
    /// The transient crop-area overlay shown while cropping.
    CropOverlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub dash: SmallVec<[f64; 2]>,
}

/// Rectangle shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub stroke: Option<Stroke>,
    #[serde(default)]
    pub role: ShapeRole,
}

/// Kind-specific payload of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Image(ImageObject),
    Text(TextObject),
    Shape(ShapeObject),
}

impl ObjectKind {
    /// Unscaled size of the object's local rectangle.
    pub fn intrinsic_size(&self) -> Size {
        match self {
            ObjectKind::Image(img) => Size::new(img.crop.width, img.crop.height),
            ObjectKind::Text(text) => text.approx_size(),
            ObjectKind::Shape(shape) => Size::new(shape.width, shape.height),
        }
    }
}

fn yes() -> bool {
    true
}

/// A single drawable unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub geometry: Geometry,
    #[serde(default = "yes")]
    pub selectable: bool,
    #[serde(default = "yes")]
    pub evented: bool,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn new(id: ObjectId, kind: ObjectKind, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            selectable: true,
            evented: true,
            kind,
        }
    }

    pub fn size(&self) -> Size {
        self.kind.intrinsic_size()
    }

    /// Axis-aligned bounding box in logical canvas space.
    pub fn bounding_rect(&self) -> Rect {
        self.geometry.bounds(self.size())
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            ObjectKind::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeObject> {
        match &self.kind {
            ObjectKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ObjectKind::Image(_))
    }

    pub fn is_crop_overlay(&self) -> bool {
        matches!(
            &self.kind,
            ObjectKind::Shape(ShapeObject {
                role: ShapeRole::CropOverlay,
                ..
            })
        )
    }
}

// ─── Canvas-level properties ─────────────────────────────────────────────

/// A photo used as the canvas backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub src: String,
    pub natural_width: f64,
    pub natural_height: f64,
    pub geometry: Geometry,
}

impl BackgroundImage {
    /// Scale the photo to cover a `width` × `height` canvas, centered.
    pub fn cover(src: impl Into<String>, natural: Size, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let scale = if natural.width > 0.0 && natural.height > 0.0 {
            (w / natural.width).max(h / natural.height)
        } else {
            1.0
        };
        Self {
            src: src.into(),
            natural_width: natural.width,
            natural_height: natural.height,
            geometry: Geometry::centered(w / 2.0, h / 2.0).with_scale(scale, scale),
        }
    }
}

/// Canvas background: nothing, a solid fill, or a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    None,
    Color { color: Color },
    Image(BackgroundImage),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color {
            color: Color::WHITE,
        }
    }
}

/// The user's zoom and pan on top of the fit-to-container scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// The complete drawable state of one editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Logical canvas width in design pixels.
    pub width: u32,
    /// Logical canvas height in design pixels.
    pub height: u32,
    pub background: Background,
    /// Session-local; never part of a snapshot.
    pub view: ViewTransform,
    /// Back-to-front.
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            view: ViewTransform::default(),
            objects: Vec::new(),
        }
    }

    pub fn logical_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// The bottom-most image: the project's main photo.
    pub fn first_image(&self) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.is_image())
    }

    /// IDs of every crop overlay currently in the scene.
    pub fn crop_overlays(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.is_crop_overlay())
            .map(|o| o.id)
            .collect()
    }
}
