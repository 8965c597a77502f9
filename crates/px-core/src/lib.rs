pub mod asset;
pub mod filters;
pub mod id;
pub mod model;
pub mod presets;
pub mod snapshot;
pub mod viewport;

pub use asset::{AssetUrl, Transformation};
pub use filters::{AdjustKind, AdjustValues, AppliedFilter};
pub use id::ObjectId;
pub use model::*;
pub use presets::{CropRatio, ExportFormat, ImageFormat, ResizePreset, RetouchPreset};
pub use snapshot::{DocumentLoad, Snapshot, SnapshotError, from_document, to_document};
pub use viewport::{Viewport, ViewportLayout, compute_scale};

// Re-export kurbo geometry so downstream crates share one version.
pub use kurbo::{Point, Rect, Size};
