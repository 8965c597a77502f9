//! External collaborators: project storage, the asset pipeline, and
//! plan entitlements.
//!
//! The session never talks to a network. Hosts implement these traits (or
//! drive the session's begin/complete API directly) and the editor only sees
//! plain data and [`ServiceError`]s.

use crate::tools::ToolId;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;

/// A failed collaborator call, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct ServiceError {
    pub reason: String,
}

impl ServiceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ─── Projects ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub current_image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub canvas_state: Option<serde_json::Value>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub active_transformations: Option<String>,
    #[serde(default)]
    pub background_removed: bool,
}

impl Project {
    /// The asset the canvas should show when there is no saved state.
    pub fn display_image_url(&self) -> Option<&str> {
        self.current_image_url
            .as_deref()
            .or(self.original_image_url.as_deref())
    }

    /// Apply a confirmed patch to this in-memory copy.
    pub fn apply_patch(&mut self, patch: &ProjectPatch) {
        if let Some(state) = &patch.canvas_state {
            self.canvas_state = Some(state.clone());
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(url) = &patch.current_image_url {
            self.current_image_url = Some(url.clone());
        }
        if let Some(url) = &patch.thumbnail_url {
            self.thumbnail_url = Some(url.clone());
        }
        if let Some(tr) = &patch.active_transformations {
            self.active_transformations = tr.clone();
        }
        if let Some(removed) = patch.background_removed {
            self.background_removed = removed;
        }
    }
}

/// Partial project update. `None` leaves a field untouched; for nullable
/// provenance fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_state: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub active_transformations: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_removed: Option<bool>,
}

impl ProjectPatch {
    pub fn canvas(state: serde_json::Value) -> Self {
        Self {
            canvas_state: Some(state),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ─── Assets ──────────────────────────────────────────────────────────────

/// A loaded asset and its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl AssetInfo {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub thumbnail_url: String,
}

// ─── Collaborator traits ─────────────────────────────────────────────────

pub trait ProjectStore {
    fn load(&self, project_id: &str) -> impl Future<Output = Result<Project, ServiceError>>;

    fn save(
        &self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> impl Future<Output = Result<(), ServiceError>>;
}

pub trait AssetPipeline {
    /// Fetch an asset and report its dimensions.
    fn load(&self, url: &str) -> impl Future<Output = Result<AssetInfo, ServiceError>>;

    /// Resolve a transformation URL into a finished asset.
    fn transform(&self, url: &str) -> impl Future<Output = Result<AssetInfo, ServiceError>>;

    fn upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<UploadedAsset, ServiceError>>;
}

/// Boolean capability checks for the signed-in user.
pub trait Entitlements {
    fn has_access(&self, tool: ToolId) -> bool;
    fn can_export(&self, exports_this_month: u32) -> bool;
    fn can_create_project(&self, project_count: u32) -> bool;
}

// ─── Plans ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

pub const FREE_PROJECT_LIMIT: u32 = 3;
pub const FREE_EXPORT_LIMIT: u32 = 20;

/// The product's plan policy: Free gets the core tools and quotas, Pro
/// gets everything without limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanEntitlements {
    pub tier: PlanTier,
}

impl PlanEntitlements {
    pub fn new(tier: PlanTier) -> Self {
        Self { tier }
    }

    pub fn is_pro(&self) -> bool {
        self.tier == PlanTier::Pro
    }
}

impl Entitlements for PlanEntitlements {
    fn has_access(&self, tool: ToolId) -> bool {
        self.is_pro() || !tool.is_pro_only()
    }

    fn can_export(&self, exports_this_month: u32) -> bool {
        self.is_pro() || exports_this_month < FREE_EXPORT_LIMIT
    }

    fn can_create_project(&self, project_count: u32) -> bool {
        self.is_pro() || project_count < FREE_PROJECT_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn free_plan_gates_pro_tools() {
        let free = PlanEntitlements::new(PlanTier::Free);
        assert!(free.has_access(ToolId::Crop));
        assert!(free.has_access(ToolId::Text));
        assert!(!free.has_access(ToolId::Background));
        assert!(!free.has_access(ToolId::AiExtender));
        assert!(!free.has_access(ToolId::AiEdit));
        assert!(free.can_export(19));
        assert!(!free.can_export(20));
        assert!(free.can_create_project(2));
        assert!(!free.can_create_project(3));
    }

    #[test]
    fn pro_plan_is_unlimited() {
        let pro = PlanEntitlements::new(PlanTier::Pro);
        assert!(pro.has_access(ToolId::AiEdit));
        assert!(pro.can_export(10_000));
        assert!(pro.can_create_project(500));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = ProjectPatch {
            current_image_url: Some("u".into()),
            active_transformations: Some(None),
            ..ProjectPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "currentImageUrl": "u", "activeTransformations": null })
        );
    }

    #[test]
    fn explicit_null_survives_deserialization() {
        let cleared: ProjectPatch =
            serde_json::from_str(r#"{ "activeTransformations": null }"#).unwrap();
        assert_eq!(cleared.active_transformations, Some(None));
        let absent: ProjectPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.active_transformations, None);
    }

    #[test]
    fn applying_patch_clears_provenance() {
        let mut project = Project {
            id: "p1".into(),
            title: "Beach".into(),
            width: 800,
            height: 600,
            original_image_url: Some("orig".into()),
            current_image_url: Some("cur".into()),
            thumbnail_url: None,
            canvas_state: None,
            folder_id: None,
            active_transformations: Some("e-retouch".into()),
            background_removed: true,
        };
        project.apply_patch(&ProjectPatch {
            current_image_url: Some("orig".into()),
            active_transformations: Some(None),
            background_removed: Some(false),
            ..ProjectPatch::default()
        });
        assert_eq!(project.active_transformations, None);
        assert!(!project.background_removed);
        assert_eq!(project.display_image_url(), Some("orig"));
    }
}
