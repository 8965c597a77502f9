//! WASM bridge for Pixora: exposes the editor session to the browser.
//!
//! Compiled via `wasm-pack build --target web`. The session stays sans-IO:
//! JS performs every fetch and store call and reports back through the
//! `complete_*`/`fail_*` methods, keyed by the ticket each `begin_*` returned.

mod console;
mod protocol;

use px_core::id::ObjectId;
use px_core::presets::EXPORT_FORMATS;
use px_editor::shortcuts::{ShortcutAction, ShortcutMap};
use px_editor::tools::resize::ResizeDraft;
use px_editor::{
    AssetInfo, EditorConfig, EditorSession, PlanEntitlements, PlanTier, Project, ServiceError,
    Ticket, ToolId,
};
use wasm_bindgen::prelude::*;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The browser-facing editor controller: one open project.
#[wasm_bindgen]
pub struct EditorCanvas {
    session: EditorSession,
    /// Open resize panel, if any.
    resize_draft: Option<ResizeDraft>,
}

#[wasm_bindgen]
impl EditorCanvas {
    /// Open a project. `project_json` is the stored project record,
    /// `config_json` may be empty for defaults, `tier` is `"free"` or `"pro"`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        project_json: &str,
        config_json: &str,
        tier: &str,
        log_level: &str,
    ) -> Result<EditorCanvas, JsValue> {
        console::install(console::parse_level(log_level));

        let project: Project = serde_json::from_str(project_json).map_err(js_err)?;
        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config_json).map_err(js_err)?
        };
        let tier = match tier {
            "pro" => PlanTier::Pro,
            _ => PlanTier::Free,
        };
        let session =
            EditorSession::open(project, config, PlanEntitlements::new(tier)).map_err(js_err)?;
        Ok(Self {
            session,
            resize_draft: None,
        })
    }

    /// The image JS must load before editing, if the project had no saved canvas.
    pub fn initial_asset_url(&self) -> Option<String> {
        self.session.initial_asset_url().map(str::to_string)
    }

    /// Hand over the loaded initial image. Returns the new object's id.
    pub fn place_initial_image(&mut self, url: &str, width: u32, height: u32) -> Result<String, JsValue> {
        let id = self
            .session
            .place_initial_image(&AssetInfo::new(url, width, height))
            .map_err(js_err)?;
        Ok(id.as_str().to_string())
    }

    /// Feed wall-clock time (`performance.now()` or `Date.now()`).
    pub fn tick(&mut self, now_ms: f64) -> Result<(), JsValue> {
        self.session.tick(now_ms.max(0.0) as u64).map_err(js_err)
    }

    /// The scene as a canvas document, for rendering.
    pub fn document_json(&self) -> Result<String, JsValue> {
        let document = self.session.canvas().to_document().map_err(js_err)?;
        Ok(document.to_string())
    }

    /// Mode flags the toolbar needs.
    pub fn context_json(&self) -> String {
        let ctx = self.session.context();
        serde_json::json!({
            "tool": ctx.active_tool.map(ToolId::key),
            "cropping": self.session.is_cropping(),
            "processing": self.session.processing_message(),
            "canUndo": self.session.can_undo(),
            "canRedo": self.session.can_redo(),
            "selected": self.session.selected().map(|id| id.as_str().to_string()),
        })
        .to_string()
    }

    // ─── Tools & selection ───────────────────────────────────────────────

    /// Switch tools. Returns `false` when the plan denies it (see notices).
    pub fn select_tool(&mut self, name: &str) -> Result<bool, JsValue> {
        let tool = ToolId::from_key(name).ok_or_else(|| js_err(format!("unknown tool '{name}'")))?;
        self.session.select_tool(tool).map_err(js_err)
    }

    /// Select an object by id; an empty id clears the selection.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        if id.is_empty() {
            self.session.select(None);
            return true;
        }
        let id = ObjectId::intern(id);
        if self.session.canvas().get(id).is_some() {
            self.session.select(Some(id));
            true
        } else {
            false
        }
    }

    pub fn move_object(&mut self, id: &str, dx: f64, dy: f64) -> Result<bool, JsValue> {
        self.session
            .move_object(ObjectId::intern(id), dx, dy)
            .map_err(js_err)
    }

    /// Commit a full transform from the host's drag handles.
    pub fn set_geometry(&mut self, id: &str, geometry_json: &str) -> Result<bool, JsValue> {
        let geometry = protocol::parse_geometry(geometry_json).map_err(js_err)?;
        self.session
            .set_geometry(ObjectId::intern(id), geometry)
            .map_err(js_err)
    }

    pub fn delete_selected(&mut self) -> Result<bool, JsValue> {
        match self.session.selected() {
            Some(id) => self.session.delete_object(id).map_err(js_err),
            None => Ok(false),
        }
    }

    // ─── Crop ────────────────────────────────────────────────────────────

    /// Enter crop on `target`, or on the selected/first image when empty.
    pub fn enter_crop(&mut self, target: &str) -> Result<bool, JsValue> {
        let target = (!target.is_empty()).then(|| ObjectId::intern(target));
        self.session.enter_crop(target).map_err(js_err)
    }

    /// The overlay to draw: ids, ratio, geometry and bounds, or `null`.
    pub fn crop_json(&self) -> String {
        protocol::crop_json(self.session.context().tool_mode.crop(), self.session.canvas())
    }

    pub fn set_crop_ratio(&mut self, name: &str) -> Result<(), JsValue> {
        let ratio = protocol::parse_crop_ratio(name)
            .ok_or_else(|| js_err(format!("unknown crop ratio '{name}'")))?;
        self.session.set_crop_ratio(ratio).map_err(js_err)
    }

    pub fn scale_crop_overlay(&mut self, scale_x: f64, scale_y: f64) -> Result<(), JsValue> {
        self.session
            .scale_crop_overlay(scale_x, scale_y)
            .map_err(js_err)
    }

    /// Apply the crop. Returns the replacement image id, or empty when not cropping.
    pub fn apply_crop(&mut self) -> Result<String, JsValue> {
        let id = self.session.apply_crop().map_err(js_err)?;
        Ok(id.map(|id| id.as_str().to_string()).unwrap_or_default())
    }

    pub fn cancel_crop(&mut self) -> Result<bool, JsValue> {
        self.session.cancel_crop().map_err(js_err)
    }

    // ─── Text ────────────────────────────────────────────────────────────

    pub fn add_text(&mut self, content: &str) -> Result<String, JsValue> {
        let id = self.session.add_text(content).map_err(js_err)?;
        Ok(id.as_str().to_string())
    }

    pub fn set_text_prop(&mut self, id: &str, key: &str, value: &str) -> Result<bool, JsValue> {
        let edit = protocol::parse_text_edit(key, value).map_err(js_err)?;
        self.session
            .edit_text(ObjectId::intern(id), edit)
            .map_err(js_err)
    }

    pub fn toggle_text(&mut self, id: &str, flag: &str) -> Result<bool, JsValue> {
        let flag = protocol::parse_toggle(flag)
            .ok_or_else(|| js_err(format!("unknown text toggle '{flag}'")))?;
        self.session
            .toggle_text(ObjectId::intern(id), flag)
            .map_err(js_err)
    }

    // ─── Adjust ──────────────────────────────────────────────────────────

    /// Slider state for an image as a JSON array.
    pub fn adjustments_json(&self, id: &str) -> Result<String, JsValue> {
        let values = self
            .session
            .adjustments(ObjectId::intern(id))
            .map_err(js_err)?;
        Ok(protocol::adjustments_json(&values))
    }

    /// `values_json` maps slider keys to values; missing sliders reset.
    pub fn apply_adjustments(&mut self, id: &str, values_json: &str) -> Result<bool, JsValue> {
        let values = protocol::parse_adjustments(values_json).map_err(js_err)?;
        self.session
            .apply_adjustments(ObjectId::intern(id), &values)
            .map_err(js_err)
    }

    pub fn reset_adjustments(&mut self, id: &str) -> Result<bool, JsValue> {
        self.session
            .reset_adjustments(ObjectId::intern(id))
            .map_err(js_err)
    }

    // ─── Resize panel ────────────────────────────────────────────────────

    /// Start editing dimensions from the current canvas size.
    pub fn open_resize_panel(&mut self) -> String {
        let scene = self.session.scene();
        let draft = ResizeDraft::new(scene.width, scene.height);
        let json = protocol::resize_draft_json(&draft);
        self.resize_draft = Some(draft);
        json
    }

    pub fn set_resize_width(&mut self, width: u32) -> Result<String, JsValue> {
        let draft = self.draft_mut()?;
        draft.set_width(width);
        Ok(protocol::resize_draft_json(draft))
    }

    pub fn set_resize_height(&mut self, height: u32) -> Result<String, JsValue> {
        let draft = self.draft_mut()?;
        draft.set_height(height);
        Ok(protocol::resize_draft_json(draft))
    }

    pub fn set_resize_lock(&mut self, locked: bool) -> Result<String, JsValue> {
        let draft = self.draft_mut()?;
        draft.lock_aspect = locked;
        Ok(protocol::resize_draft_json(draft))
    }

    pub fn apply_resize_preset(&mut self, name: &str) -> Result<String, JsValue> {
        let draft = self.draft_mut()?;
        draft.apply_preset(name).map_err(js_err)?;
        Ok(protocol::resize_draft_json(draft))
    }

    /// Resize to the drafted dimensions and close the panel. An invalid
    /// size leaves the panel open.
    pub fn commit_resize(&mut self) -> Result<bool, JsValue> {
        let (width, height) = {
            let draft = self.draft_mut()?;
            (draft.width, draft.height)
        };
        let changed = self.session.resize_canvas(width, height).map_err(js_err)?;
        self.resize_draft = None;
        Ok(changed)
    }

    pub fn close_resize_panel(&mut self) {
        self.resize_draft = None;
    }

    // ─── Canvas & background ─────────────────────────────────────────────

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<bool, JsValue> {
        self.session.resize_canvas(width, height).map_err(js_err)
    }

    pub fn set_background_color(&mut self, hex: &str) -> Result<bool, JsValue> {
        let color = protocol::parse_color(hex).map_err(js_err)?;
        self.session.set_background_color(color).map_err(js_err)
    }

    pub fn clear_background(&mut self) -> Result<bool, JsValue> {
        self.session.clear_background().map_err(js_err)
    }

    // ─── Transforms ──────────────────────────────────────────────────────

    /// Start a transform described by `op_json`. Returns
    /// `{"ticket":n,"url":"..."}` for JS to resolve, or `null` when nothing
    /// needs the network.
    pub fn begin_transform(&mut self, op_json: &str) -> Result<String, JsValue> {
        let op = protocol::parse_op(op_json).map_err(js_err)?;
        let pending = self.session.begin_transform(op).map_err(js_err)?;
        Ok(protocol::transform_json(pending.as_ref()))
    }

    /// Returns the replacement image id, or empty for background changes.
    pub fn complete_transform(
        &mut self,
        ticket: u32,
        url: &str,
        width: u32,
        height: u32,
    ) -> Result<String, JsValue> {
        let asset = AssetInfo::new(url, width, height);
        let id = self
            .session
            .complete_transform(Ticket::from(ticket), &asset)
            .map_err(js_err)?;
        Ok(id.map(|id| id.as_str().to_string()).unwrap_or_default())
    }

    pub fn fail_transform(&mut self, ticket: u32, reason: &str) -> Result<(), JsValue> {
        self.session
            .fail_transform(Ticket::from(ticket), &ServiceError::new(reason))
            .map_err(js_err)
    }

    // ─── Reset ───────────────────────────────────────────────────────────

    pub fn begin_reset(&mut self) -> Result<String, JsValue> {
        let pending = self.session.begin_reset().map_err(js_err)?;
        Ok(protocol::reset_json(pending.as_ref()))
    }

    pub fn complete_reset(
        &mut self,
        ticket: u32,
        url: &str,
        width: u32,
        height: u32,
    ) -> Result<String, JsValue> {
        let id = self
            .session
            .complete_reset(Ticket::from(ticket), &AssetInfo::new(url, width, height))
            .map_err(js_err)?;
        Ok(id.as_str().to_string())
    }

    pub fn fail_reset(&mut self, ticket: u32, reason: &str) -> Result<(), JsValue> {
        self.session
            .fail_reset(Ticket::from(ticket), &ServiceError::new(reason))
            .map_err(js_err)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_now(&mut self) -> Result<u32, JsValue> {
        let ticket = self.session.save_now().map_err(js_err)?;
        u32::try_from(ticket).map_err(js_err)
    }

    /// Drain queued store writes as a JSON array.
    pub fn take_save_requests(&mut self) -> String {
        protocol::saves_json(&self.session.take_save_requests())
    }

    pub fn save_completed(&mut self, ticket: u32) -> Result<(), JsValue> {
        self.session
            .save_completed(Ticket::from(ticket))
            .map_err(js_err)
    }

    pub fn save_failed(&mut self, ticket: u32, reason: &str) -> Result<(), JsValue> {
        self.session
            .save_failed(Ticket::from(ticket), &ServiceError::new(reason))
            .map_err(js_err)
    }

    /// Drain toast messages as a JSON array.
    pub fn take_notices(&mut self) -> String {
        protocol::notices_json(&self.session.take_notices())
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.session.undo().map_err(js_err)
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.session.redo().map_err(js_err)
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>", "tool":"<tool_key>"}`
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> Result<String, JsValue> {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return Ok(r#"{"changed":false,"action":"none","tool":""}"#.to_string());
        };
        let changed = self.session.handle_shortcut(action).map_err(js_err)?;
        let tool = match action {
            ShortcutAction::Tool(tool) => tool.key(),
            _ => "",
        };
        Ok(serde_json::json!({
            "changed": changed,
            "action": protocol::action_name(action),
            "tool": tool,
        })
        .to_string())
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// The container element was measured or resized.
    pub fn set_container(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        self.session
            .set_container(width, height, device_pixel_ratio);
    }

    pub fn layout_json(&self) -> String {
        protocol::layout_json(&self.session.layout())
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.session.set_zoom(zoom);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.session.pan_by(dx, dy);
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Plan an export with one of the offered formats, or `null` on denial.
    pub fn plan_export(&mut self, format_index: usize, exports_this_month: u32) -> Result<String, JsValue> {
        let format = EXPORT_FORMATS
            .get(format_index)
            .ok_or_else(|| js_err(format!("no export format #{format_index}")))?;
        let plan = self.session.plan_export(format, exports_this_month);
        Ok(protocol::export_json(plan.as_ref()))
    }

    /// End the session. Flush `take_save_requests` first.
    pub fn close(&mut self) -> Result<(), JsValue> {
        self.resize_draft = None;
        self.session.close().map_err(js_err)
    }
}

impl EditorCanvas {
    fn draft_mut(&mut self) -> Result<&mut ResizeDraft, JsValue> {
        self.resize_draft
            .as_mut()
            .ok_or_else(|| js_err("resize panel is not open"))
    }
}
