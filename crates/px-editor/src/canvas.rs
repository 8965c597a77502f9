//! Canvas engine: the authoritative scene plus change notifications.
//!
//! Every scene edit goes through [`Canvas::apply`] as a [`SceneMutation`].
//! Each effective mutation bumps the revision and queues exactly one
//! [`ChangeEvent`]; mutations that change nothing stay silent. Selection and
//! view changes are not scene edits and never notify.

use crate::error::{EditorError, EditorResult};
use px_core::filters::AppliedFilter;
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::snapshot::{self, Snapshot};
use smallvec::SmallVec;

/// What changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Added(ObjectId),
    Removed(ObjectId),
    Replaced { old: ObjectId, new: ObjectId },
    Modified(ObjectId),
    Background,
    Resized { width: u32, height: u32 },
    Reloaded,
}

/// Who caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    /// Raised while history replays a snapshot.
    Replay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub origin: ChangeOrigin,
    pub revision: u64,
}

/// A single text attribute edit.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEdit {
    Content(String),
    FontFamily(String),
    FontSize(f64),
    Fill(Color),
    Align(TextAlign),
    Weight(FontWeight),
    Style(FontStyle),
    Underline(bool),
}

/// Every way the scene can be edited.
#[derive(Debug, Clone)]
pub enum SceneMutation {
    Add(Box<SceneObject>),
    Remove(ObjectId),
    Replace {
        old: ObjectId,
        object: Box<SceneObject>,
        /// Copy position, scale, rotation and origin from the old object.
        preserve_geometry: bool,
    },
    SetGeometry {
        id: ObjectId,
        geometry: Geometry,
    },
    Move {
        id: ObjectId,
        dx: f64,
        dy: f64,
    },
    SetInteractivity {
        id: ObjectId,
        selectable: bool,
        evented: bool,
    },
    ResizeShape {
        id: ObjectId,
        width: f64,
        height: f64,
    },
    EditText {
        id: ObjectId,
        edit: TextEdit,
    },
    SetFilters {
        id: ObjectId,
        filters: SmallVec<[AppliedFilter; 4]>,
    },
    SetBackground(Background),
    SetDimensions {
        width: u32,
        height: u32,
    },
}

pub struct Canvas {
    scene: Scene,
    revision: u64,
    active: Option<ObjectId>,
    events: Vec<ChangeEvent>,
    replaying: bool,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_scene(Scene::new(width, height))
    }

    pub fn from_scene(scene: Scene) -> Self {
        Self {
            scene,
            revision: 0,
            active: None,
            events: Vec::new(),
            replaying: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.scene.get(id)
    }

    // ─── Selection & view ────────────────────────────────────────────────

    pub fn active_object(&self) -> Option<ObjectId> {
        self.active
    }

    /// Select an object. Unknown ids clear the selection.
    pub fn set_active(&mut self, id: Option<ObjectId>) {
        self.active = id.filter(|id| self.scene.contains(*id));
    }

    /// The active object, when it is an image.
    pub fn active_image(&self) -> Option<ObjectId> {
        self.active
            .and_then(|id| self.scene.get(id))
            .filter(|o| o.is_image())
            .map(|o| o.id)
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.scene.view = view;
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a mutation. Returns whether the scene changed.
    pub fn apply(&mut self, mutation: SceneMutation) -> EditorResult<bool> {
        let kind = match mutation {
            SceneMutation::Add(object) => {
                if self.scene.contains(object.id) {
                    return Err(EditorError::validation(format!(
                        "object {} already exists",
                        object.id
                    )));
                }
                ensure_finite_geometry(object.id, &object.geometry)?;
                let id = object.id;
                self.scene.objects.push(*object);
                ChangeKind::Added(id)
            }
            SceneMutation::Remove(id) => {
                let Some(index) = self.scene.index_of(id) else {
                    return Ok(false);
                };
                self.scene.objects.remove(index);
                if self.active == Some(id) {
                    self.active = None;
                }
                ChangeKind::Removed(id)
            }
            SceneMutation::Replace {
                old,
                object,
                preserve_geometry,
            } => {
                let Some(index) = self.scene.index_of(old) else {
                    return Err(EditorError::validation(format!(
                        "cannot replace missing object {old}"
                    )));
                };
                if object.id != old && self.scene.contains(object.id) {
                    return Err(EditorError::validation(format!(
                        "object {} already exists",
                        object.id
                    )));
                }
                let mut object = *object;
                if preserve_geometry {
                    object
                        .geometry
                        .copy_placement(&self.scene.objects[index].geometry);
                }
                let new = object.id;
                self.scene.objects[index] = object;
                if self.active == Some(old) {
                    self.active = Some(new);
                }
                ChangeKind::Replaced { old, new }
            }
            SceneMutation::SetGeometry { id, geometry } => {
                ensure_finite_geometry(id, &geometry)?;
                let obj = self.object_mut(id)?;
                if obj.geometry == geometry {
                    return Ok(false);
                }
                obj.geometry = geometry;
                ChangeKind::Modified(id)
            }
            SceneMutation::Move { id, dx, dy } => {
                ensure_finite(id, "offset", &[dx, dy])?;
                if dx == 0.0 && dy == 0.0 {
                    return Ok(false);
                }
                let obj = self.object_mut(id)?;
                let (left, top) = (obj.geometry.left + dx, obj.geometry.top + dy);
                ensure_finite(id, "position", &[left, top])?;
                obj.geometry.left = left;
                obj.geometry.top = top;
                ChangeKind::Modified(id)
            }
            SceneMutation::SetInteractivity {
                id,
                selectable,
                evented,
            } => {
                let obj = self.object_mut(id)?;
                if obj.selectable == selectable && obj.evented == evented {
                    return Ok(false);
                }
                obj.selectable = selectable;
                obj.evented = evented;
                ChangeKind::Modified(id)
            }
            SceneMutation::ResizeShape { id, width, height } => {
                ensure_finite(id, "size", &[width, height])?;
                let obj = self.object_mut(id)?;
                let ObjectKind::Shape(shape) = &mut obj.kind else {
                    return Err(EditorError::validation(format!("{id} is not a shape")));
                };
                if shape.width == width && shape.height == height {
                    return Ok(false);
                }
                shape.width = width;
                shape.height = height;
                ChangeKind::Modified(id)
            }
            SceneMutation::EditText { id, edit } => {
                let obj = self.object_mut(id)?;
                let ObjectKind::Text(text) = &mut obj.kind else {
                    return Err(EditorError::validation(format!("{id} is not a text object")));
                };
                if !apply_text_edit(text, edit) {
                    return Ok(false);
                }
                ChangeKind::Modified(id)
            }
            SceneMutation::SetFilters { id, filters } => {
                let obj = self.object_mut(id)?;
                let ObjectKind::Image(img) = &mut obj.kind else {
                    return Err(EditorError::validation(format!("{id} is not an image")));
                };
                if img.filters == filters {
                    return Ok(false);
                }
                img.filters = filters;
                ChangeKind::Modified(id)
            }
            SceneMutation::SetBackground(background) => {
                if self.scene.background == background {
                    return Ok(false);
                }
                self.scene.background = background;
                ChangeKind::Background
            }
            SceneMutation::SetDimensions { width, height } => {
                if width == 0 || height == 0 {
                    return Err(EditorError::validation(format!(
                        "canvas dimensions must be positive, got {width}x{height}"
                    )));
                }
                if self.scene.width == width && self.scene.height == height {
                    return Ok(false);
                }
                self.scene.width = width;
                self.scene.height = height;
                ChangeKind::Resized { width, height }
            }
        };
        self.notify(kind);
        Ok(true)
    }

    pub fn add_object(&mut self, object: SceneObject) -> EditorResult<ObjectId> {
        let id = object.id;
        self.apply(SceneMutation::Add(Box::new(object)))?;
        Ok(id)
    }

    /// Remove an object; absent ids are a silent no-op.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        self.apply(SceneMutation::Remove(id)).unwrap_or(false)
    }

    pub fn replace_object(
        &mut self,
        old: ObjectId,
        object: SceneObject,
        preserve_geometry: bool,
    ) -> EditorResult<()> {
        self.apply(SceneMutation::Replace {
            old,
            object: Box::new(object),
            preserve_geometry,
        })
        .map(|_| ())
    }

    /// Change the logical canvas size. Object geometry is left alone.
    pub fn set_logical_dimensions(&mut self, width: u32, height: u32) -> EditorResult<bool> {
        self.apply(SceneMutation::SetDimensions { width, height })
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn serialize(&self) -> EditorResult<Snapshot> {
        Ok(Snapshot::capture(&self.scene)?)
    }

    /// Replace the scene content from a snapshot; emits one `Reloaded`.
    pub fn deserialize(&mut self, snapshot: &Snapshot) -> EditorResult<()> {
        let scene = snapshot.restore()?;
        self.load_scene(scene);
        Ok(())
    }

    /// Swap in new scene content, keeping the user's view transform.
    pub fn load_scene(&mut self, mut scene: Scene) {
        scene.view = self.scene.view;
        self.scene = scene;
        if let Some(id) = self.active {
            if !self.scene.contains(id) {
                self.active = None;
            }
        }
        self.notify(ChangeKind::Reloaded);
    }

    /// Apply a snapshot with the replay flag raised.
    pub fn replay(&mut self, snapshot: &Snapshot) -> EditorResult<()> {
        self.replaying = true;
        let result = self.deserialize(snapshot);
        self.replaying = false;
        result
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// The persisted JSON document for the current scene.
    pub fn to_document(&self) -> EditorResult<serde_json::Value> {
        Ok(snapshot::to_document(&self.scene)?)
    }

    // ─── Notifications ───────────────────────────────────────────────────

    /// Drain queued change events.
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn notify(&mut self, kind: ChangeKind) {
        self.revision += 1;
        let origin = if self.replaying {
            ChangeOrigin::Replay
        } else {
            ChangeOrigin::User
        };
        log::debug!("scene r{}: {:?} ({:?})", self.revision, kind, origin);
        self.events.push(ChangeEvent {
            kind,
            origin,
            revision: self.revision,
        });
    }

    fn object_mut(&mut self, id: ObjectId) -> EditorResult<&mut SceneObject> {
        self.scene
            .get_mut(id)
            .ok_or_else(|| EditorError::validation(format!("no object {id}")))
    }
}

/// NaN and infinities would be written out as `null` and the object
/// dropped on the next load.
fn ensure_finite(id: ObjectId, what: &str, values: &[f64]) -> EditorResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(EditorError::validation(format!("{id}: {what} must be finite")))
}

fn ensure_finite_geometry(id: ObjectId, g: &Geometry) -> EditorResult<()> {
    ensure_finite(id, "geometry", &[g.left, g.top, g.scale_x, g.scale_y, g.angle])
}

fn apply_text_edit(text: &mut TextObject, edit: TextEdit) -> bool {
    fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }
    match edit {
        TextEdit::Content(v) => set(&mut text.content, v),
        TextEdit::FontFamily(v) => set(&mut text.font_family, v),
        TextEdit::FontSize(v) => set(&mut text.font_size, v),
        TextEdit::Fill(v) => set(&mut text.fill, v),
        TextEdit::Align(v) => set(&mut text.text_align, v),
        TextEdit::Weight(v) => set(&mut text.font_weight, v),
        TextEdit::Style(v) => set(&mut text.font_style, v),
        TextEdit::Underline(v) => set(&mut text.underline, v),
    }
}
