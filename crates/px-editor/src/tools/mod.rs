//! Tool system for canvas editing.
//!
//! Each tool validates its target against the [`Canvas`](crate::canvas::Canvas)
//! and expresses its work as scene mutations. Failures are reported before
//! anything is applied, so a rejected action never leaves a partial edit.
//!
//! | Tool | Mode | Plan |
//! |------|------|------|
//! | Resize, Adjust, Text | Normal | Free |
//! | Crop | Crop (exclusive) | Free |
//! | Background, AI Extender, AI Edit | Normal | Pro |

pub mod adjust;
pub mod background;
pub mod crop;
pub mod resize;
pub mod text;

pub use crop::CropSession;

use serde::{Deserialize, Serialize};

/// Sidebar tools, keyed the way entitlements name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    Resize,
    Crop,
    Adjust,
    Text,
    Background,
    AiExtender,
    AiEdit,
}

impl ToolId {
    pub const ALL: [ToolId; 7] = [
        ToolId::Resize,
        ToolId::Crop,
        ToolId::Adjust,
        ToolId::Text,
        ToolId::Background,
        ToolId::AiExtender,
        ToolId::AiEdit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ToolId::Resize => "resize",
            ToolId::Crop => "crop",
            ToolId::Adjust => "adjust",
            ToolId::Text => "text",
            ToolId::Background => "background",
            ToolId::AiExtender => "ai_extender",
            ToolId::AiEdit => "ai_edit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolId::Resize => "Resize",
            ToolId::Crop => "Crop",
            ToolId::Adjust => "Adjust",
            ToolId::Text => "Text",
            ToolId::Background => "AI Background",
            ToolId::AiExtender => "AI Image Extender",
            ToolId::AiEdit => "AI Editing",
        }
    }

    pub fn is_pro_only(self) -> bool {
        matches!(self, ToolId::Background | ToolId::AiExtender | ToolId::AiEdit)
    }
}

/// The interaction mode. Exactly one is active per session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolMode {
    #[default]
    Normal,
    /// Crop is exclusive: normal interaction is suspended until it ends.
    Crop(CropSession),
}

impl ToolMode {
    pub fn is_exclusive(&self) -> bool {
        matches!(self, ToolMode::Crop(_))
    }

    pub fn crop(&self) -> Option<&CropSession> {
        match self {
            ToolMode::Crop(session) => Some(session),
            ToolMode::Normal => None,
        }
    }
}
