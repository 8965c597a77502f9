//! Fixed option tables: retouch presets, crop and resize ratios, export
//! formats, and text defaults.

use serde::{Deserialize, Serialize};

// ─── Retouch presets ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetouchPreset {
    AiRetouch,
    AiUpscale,
    EnhanceSharpen,
    PremiumQuality,
}

#[derive(Debug)]
pub struct RetouchSpec {
    pub preset: RetouchPreset,
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Transformation steps appended to the asset's chain.
    pub steps: &'static [&'static str],
    pub recommended: bool,
}

pub static RETOUCH_PRESETS: [RetouchSpec; 4] = [
    RetouchSpec {
        preset: RetouchPreset::AiRetouch,
        key: "ai_retouch",
        label: "AI Retouch",
        description: "Improve image quality with AI",
        steps: &["e-retouch"],
        recommended: true,
    },
    RetouchSpec {
        preset: RetouchPreset::AiUpscale,
        key: "ai_upscale",
        label: "AI Upscale",
        description: "Increase resolution to 16MP",
        steps: &["e-upscale"],
        recommended: false,
    },
    RetouchSpec {
        preset: RetouchPreset::EnhanceSharpen,
        key: "enhance_sharpen",
        label: "Enhance & Sharpen",
        description: "AI retouch + contrast + sharpening",
        steps: &["e-retouch", "e-contrast", "e-sharpen"],
        recommended: false,
    },
    RetouchSpec {
        preset: RetouchPreset::PremiumQuality,
        key: "premium_quality",
        label: "Premium Quality",
        description: "AI retouch + upscale + enhancements",
        steps: &["e-retouch", "e-upscale", "e-contrast", "e-sharpen"],
        recommended: false,
    },
];

impl RetouchPreset {
    pub fn spec(self) -> &'static RetouchSpec {
        &RETOUCH_PRESETS[self as usize]
    }

    pub fn from_key(key: &str) -> Option<Self> {
        RETOUCH_PRESETS.iter().find(|s| s.key == key).map(|s| s.preset)
    }

    /// The chain fragment recorded as provenance, e.g. `e-retouch,e-upscale`.
    pub fn chain(self) -> String {
        self.spec().steps.join(",")
    }
}

// ─── Crop aspect ratios ──────────────────────────────────────────────────

/// Crop overlay constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropRatio {
    #[default]
    Freeform,
    Square,
    Widescreen,
    Portrait,
    Story,
}

impl CropRatio {
    pub const ALL: [CropRatio; 5] = [
        CropRatio::Freeform,
        CropRatio::Square,
        CropRatio::Widescreen,
        CropRatio::Portrait,
        CropRatio::Story,
    ];

    /// Width / height, or `None` when unconstrained.
    pub fn value(self) -> Option<f64> {
        match self {
            CropRatio::Freeform => None,
            CropRatio::Square => Some(1.0),
            CropRatio::Widescreen => Some(16.0 / 9.0),
            CropRatio::Portrait => Some(4.0 / 5.0),
            CropRatio::Story => Some(9.0 / 16.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CropRatio::Freeform => "Freeform",
            CropRatio::Square => "Square",
            CropRatio::Widescreen => "Widescreen",
            CropRatio::Portrait => "Portrait",
            CropRatio::Story => "Story",
        }
    }
}

// ─── Resize presets ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ResizePreset {
    pub name: &'static str,
    pub ratio: (u32, u32),
    pub label: &'static str,
}

pub static RESIZE_PRESETS: [ResizePreset; 6] = [
    ResizePreset { name: "Instagram Story", ratio: (9, 16), label: "9:16" },
    ResizePreset { name: "Instagram Post", ratio: (1, 1), label: "1:1" },
    ResizePreset { name: "Youtube Thumbnail", ratio: (16, 9), label: "16:9" },
    ResizePreset { name: "Portrait", ratio: (2, 3), label: "2:3" },
    ResizePreset { name: "Facebook Cover", ratio: (851, 315), label: "2.7:1" },
    ResizePreset { name: "Twitter Header", ratio: (3, 1), label: "3:1" },
];

impl ResizePreset {
    pub fn find(name: &str) -> Option<&'static ResizePreset> {
        RESIZE_PRESETS.iter().find(|p| p.name == name)
    }

    /// Dimensions at this ratio with the same pixel area as `width` × `height`.
    pub fn dimensions_for(&self, width: u32, height: u32) -> (u32, u32) {
        let area = f64::from(width) * f64::from(height);
        let aspect = f64::from(self.ratio.0) / f64::from(self.ratio.1);
        let h = (area / aspect).sqrt();
        let w = h * aspect;
        (w.round() as u32, h.round() as u32)
    }
}

/// Height that keeps `width` at the current aspect ratio.
pub fn locked_height(width: u32, current: (u32, u32)) -> u32 {
    if current.0 == 0 {
        return current.1;
    }
    (f64::from(width) * f64::from(current.1) / f64::from(current.0)).round() as u32
}

/// Width that keeps `height` at the current aspect ratio.
pub fn locked_width(height: u32, current: (u32, u32)) -> u32 {
    if current.1 == 0 {
        return current.0;
    }
    (f64::from(height) * f64::from(current.0) / f64::from(current.1)).round() as u32
}

// ─── Export formats ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportFormat {
    pub format: ImageFormat,
    pub quality: f64,
    pub label: &'static str,
}

pub static EXPORT_FORMATS: [ExportFormat; 4] = [
    ExportFormat { format: ImageFormat::Png, quality: 1.0, label: "PNG (High Quality)" },
    ExportFormat { format: ImageFormat::Jpeg, quality: 0.9, label: "JPEG (90% Quality)" },
    ExportFormat { format: ImageFormat::Jpeg, quality: 0.8, label: "JPEG (80% Quality)" },
    ExportFormat { format: ImageFormat::Webp, quality: 0.9, label: "WebP (90% Quality)" },
];

// ─── Text defaults ───────────────────────────────────────────────────────

pub static FONT_FAMILIES: [&str; 16] = [
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Georgia",
    "Garamond",
    "Palatino",
    "Courier New",
    "Verdana",
    "Tahoma",
    "Trebuchet MS",
    "Arial Black",
    "Impact",
    "Comic Sans MS",
    "Segoe UI",
    "Futura",
    "Brush Script MT",
];

pub const FONT_SIZE_MIN: f64 = 8.0;
pub const FONT_SIZE_MAX: f64 = 120.0;
pub const FONT_SIZE_DEFAULT: f64 = 20.0;
