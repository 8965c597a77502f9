//! Scene encodings: the persisted JSON document and compact history snapshots.
//!
//! Both encodings carry dimensions, background and objects. The view
//! transform is session-local and crop overlays are transient, so neither
//! is ever written.

use crate::model::{Background, Scene, SceneObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current persisted document version.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode scene: {0}")]
    Encode(String),
    #[error("failed to decode scene: {0}")]
    Decode(String),
    #[error("unsupported document version {0}")]
    Version(u32),
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    width: u32,
    height: u32,
    background: &'a Background,
    objects: Vec<&'a SceneObject>,
}

impl<'a> DocumentRef<'a> {
    fn of(scene: &'a Scene) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            width: scene.width,
            height: scene.height,
            background: &scene.background,
            objects: scene
                .objects
                .iter()
                .filter(|o| !o.is_crop_overlay())
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct DocumentOwned {
    version: u32,
    width: u32,
    height: u32,
    #[serde(default)]
    background: Background,
    objects: Vec<SceneObject>,
}

impl DocumentOwned {
    fn into_scene(self) -> Result<Scene, SnapshotError> {
        if self.version > DOCUMENT_VERSION {
            return Err(SnapshotError::Version(self.version));
        }
        let mut scene = Scene::new(self.width, self.height);
        scene.background = self.background;
        scene.objects = self.objects;
        Ok(scene)
    }
}

// ─── History snapshots ───────────────────────────────────────────────────

/// Opaque, compact copy of a scene. Equal bytes mean equal scenes.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn capture(scene: &Scene) -> Result<Self, SnapshotError> {
        rmp_serde::to_vec_named(&DocumentRef::of(scene))
            .map(Snapshot)
            .map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode into a fresh scene (default view transform).
    pub fn restore(&self) -> Result<Scene, SnapshotError> {
        let doc: DocumentOwned =
            rmp_serde::from_slice(&self.0).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        doc.into_scene()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

// ─── Persisted document ──────────────────────────────────────────────────

/// Encode the scene as the persisted JSON document.
pub fn to_document(scene: &Scene) -> Result<Value, SnapshotError> {
    serde_json::to_value(DocumentRef::of(scene)).map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Result of a tolerant document load.
#[derive(Debug)]
pub struct DocumentLoad {
    pub scene: Scene,
    /// Objects that could not be decoded and were dropped.
    pub skipped: usize,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default = "default_version")]
    version: u32,
    width: u32,
    height: u32,
    #[serde(default)]
    background: Option<Value>,
    #[serde(default)]
    objects: Vec<Value>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Decode a persisted document, skipping objects that fail to decode.
///
/// Fails only when the document envelope itself is unreadable.
pub fn from_document(value: &Value) -> Result<DocumentLoad, SnapshotError> {
    let raw = RawDocument::deserialize(value).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    if raw.version > DOCUMENT_VERSION {
        return Err(SnapshotError::Version(raw.version));
    }

    let mut scene = Scene::new(raw.width, raw.height);
    if let Some(bg) = raw.background {
        match Background::deserialize(&bg) {
            Ok(bg) => scene.background = bg,
            Err(e) => log::warn!("ignoring unreadable background: {e}"),
        }
    }

    let mut skipped = 0;
    for (index, raw_obj) in raw.objects.iter().enumerate() {
        match SceneObject::deserialize(raw_obj) {
            Ok(obj) if obj.is_crop_overlay() => {}
            Ok(obj) => scene.objects.push(obj),
            Err(e) => {
                log::warn!("skipping unreadable object #{index}: {e}");
                skipped += 1;
            }
        }
    }

    Ok(DocumentLoad { scene, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;
    use crate::model::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(800, 600);
        scene.objects.push(SceneObject::new(
            ObjectId::intern("photo"),
            ObjectKind::Image(ImageObject::new("https://cdn.test/p.png", 1600.0, 1200.0)),
            Geometry::centered(400.0, 300.0).with_scale(0.5, 0.5),
        ));
        scene
    }

    #[test]
    fn history_snapshot_roundtrip() {
        let scene = sample_scene();
        let snap = Snapshot::capture(&scene).unwrap();
        assert_eq!(snap.restore().unwrap(), scene);
        assert_eq!(Snapshot::capture(&scene).unwrap(), snap);
    }

    #[test]
    fn overlays_are_not_encoded() {
        let mut scene = sample_scene();
        let bare = Snapshot::capture(&scene).unwrap();
        scene.objects.push(SceneObject::new(
            ObjectId::intern("overlay"),
            ObjectKind::Shape(ShapeObject {
                width: 10.0,
                height: 10.0,
                fill: None,
                stroke: None,
                role: ShapeRole::CropOverlay,
            }),
            Geometry::default(),
        ));
        assert_eq!(Snapshot::capture(&scene).unwrap(), bare);
        let doc = to_document(&scene).unwrap();
        assert_eq!(doc["objects"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn view_transform_is_not_encoded() {
        let mut scene = sample_scene();
        let before = Snapshot::capture(&scene).unwrap();
        scene.view.zoom = 3.0;
        assert_eq!(Snapshot::capture(&scene).unwrap(), before);
    }

    #[test]
    fn tolerant_load_skips_broken_objects() {
        let mut doc = to_document(&sample_scene()).unwrap();
        if let Some(objects) = doc["objects"].as_array_mut() {
            objects.push(json!({ "id": "bad", "kind": { "type": "hologram" } }));
        }
        let load = from_document(&doc).unwrap();
        assert_eq!(load.skipped, 1);
        assert_eq!(load.scene, sample_scene());
    }

    #[test]
    fn future_versions_are_rejected() {
        let doc = json!({ "version": 99, "width": 1, "height": 1, "objects": [] });
        assert!(matches!(from_document(&doc), Err(SnapshotError::Version(99))));
    }

    #[test]
    fn unreadable_envelope_fails() {
        assert!(from_document(&json!("not a scene")).is_err());
    }
}
