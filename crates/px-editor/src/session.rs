//! The editor session: one open project and everything that edits it.
//!
//! The session is sans-IO. Hosts feed it wall-clock time through
//! [`EditorSession::tick`], run network work themselves using the
//! `begin_*`/`complete_*`/`fail_*` ticket API, and drain two queues:
//!
//! - **save requests** ([`EditorSession::take_save_requests`]): partial
//!   project patches to write to the store, acknowledged with
//!   [`EditorSession::save_completed`] or [`EditorSession::save_failed`];
//! - **notices** ([`EditorSession::take_notices`]): user-visible messages.
//!
//! Every scene change is pumped through the history and autosave timers,
//! except while cropping, when both stay quiet until the crop ends.

use crate::autosave::{Autosave, SavePayload};
use crate::canvas::{Canvas, ChangeOrigin, SceneMutation, TextEdit};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::history::History;
use crate::services::{AssetInfo, Entitlements, Project, ProjectPatch, ServiceError};
use crate::shortcuts::ShortcutAction;
use crate::timer::Millis;
use crate::tools::text::TextToggle;
use crate::tools::{ToolId, ToolMode, adjust, background, crop, resize, text};
use crate::transform::{self, TransformOp, TransformRequest};
use kurbo::Size;
use px_core::filters::AdjustValues;
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::presets::{CropRatio, ExportFormat, ImageFormat};
use px_core::snapshot;
use px_core::viewport::{Viewport, ViewportLayout};

/// Handle tying a `begin_*` call to its completion.
pub type Ticket = u64;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 8.0;
const ZOOM_STEP: f64 = 1.25;

/// User-visible message queued by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
    /// The plan does not include the requested feature.
    Upsell(String),
}

/// The long-running operation currently blocking edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processing {
    pub ticket: Ticket,
    pub message: String,
}

/// Session-scoped mode state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub tool_mode: ToolMode,
    pub active_tool: Option<ToolId>,
    pub processing: Option<Processing>,
    pub autosave_suppressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    Autosave,
    Manual,
    Resize,
    Transform,
    Reset,
}

/// A patch the host must write to the project store.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub ticket: Ticket,
    pub project_id: String,
    pub patch: ProjectPatch,
    pub reason: SaveReason,
}

#[derive(Debug)]
struct InFlightSave {
    ticket: Ticket,
    reason: SaveReason,
    patch: ProjectPatch,
    /// Canonical document text, when the patch carries the canvas.
    encoded: Option<String>,
}

/// A transform the host must resolve through the asset pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransform {
    pub ticket: Ticket,
    pub request: TransformRequest,
}

/// A reset waiting for the original asset to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReset {
    pub ticket: Ticket,
    pub url: String,
}

#[derive(Debug)]
enum Job {
    Transform(TransformRequest),
    Reset,
}

/// What an export should render.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub format: ImageFormat,
    pub quality: f64,
    pub width: u32,
    pub height: u32,
    /// Exports always render with this view, regardless of the user's.
    pub view: ViewTransform,
    pub file_name: String,
}

pub struct EditorSession {
    project: Project,
    config: EditorConfig,
    entitlements: Box<dyn Entitlements>,
    canvas: Canvas,
    history: History,
    autosave: Autosave,
    context: SessionContext,
    viewport: Viewport,
    now: Millis,
    next_ticket: Ticket,
    job: Option<(Ticket, Job)>,
    outbox: Vec<SaveRequest>,
    in_flight: Vec<InFlightSave>,
    notices: Vec<Notice>,
    needs_image: bool,
    closed: bool,
}

impl EditorSession {
    /// Open `project`, restoring its saved canvas when it is readable.
    ///
    /// When there is nothing usable to restore, [`Self::initial_asset_url`]
    /// names the image the host must load and hand to
    /// [`Self::place_initial_image`].
    pub fn open(
        project: Project,
        config: EditorConfig,
        entitlements: impl Entitlements + 'static,
    ) -> EditorResult<Self> {
        config.validate()?;
        let mut canvas = Canvas::new(project.width, project.height);
        let mut baseline = None;
        let mut restored = false;

        if let Some(state) = &project.canvas_state {
            match snapshot::from_document(state) {
                Ok(load) => {
                    if load.skipped > 0 {
                        log::warn!(
                            "project {}: dropped {} unreadable objects",
                            project.id,
                            load.skipped
                        );
                    }
                    canvas.load_scene(load.scene);
                    baseline = Some(canvas.to_document()?.to_string());
                    restored = true;
                }
                Err(e) => {
                    log::warn!("project {}: saved canvas unreadable, falling back to image: {e}", project.id);
                }
            }
        }
        canvas.take_events();

        let mut history = History::new(config.history_limit, config.history_debounce_ms);
        history.reset(canvas.serialize()?);
        let mut autosave = Autosave::new(config.autosave_debounce_ms);
        autosave.set_baseline(baseline);

        let needs_image = !restored && project.display_image_url().is_some();
        let viewport = Viewport {
            padding: config.container_padding,
            ..Viewport::default()
        };
        log::debug!("session: opened project {} (restored: {restored})", project.id);

        Ok(Self {
            project,
            config,
            entitlements: Box::new(entitlements),
            canvas,
            history,
            autosave,
            context: SessionContext::default(),
            viewport,
            now: 0,
            next_ticket: 1,
            job: None,
            outbox: Vec::new(),
            in_flight: Vec::new(),
            notices: Vec::new(),
            needs_image,
            closed: false,
        })
    }

    /// The image to load when the project had no usable saved canvas.
    pub fn initial_asset_url(&self) -> Option<&str> {
        if self.needs_image {
            self.project.display_image_url()
        } else {
            None
        }
    }

    /// Place the project's image, fitted and centred. History restarts here.
    pub fn place_initial_image(&mut self, asset: &AssetInfo) -> EditorResult<ObjectId> {
        let object = fitted_image(asset, self.canvas.scene().logical_size())?;
        let id = self.canvas.add_object(object)?;
        self.canvas.set_active(Some(id));
        self.canvas.take_events();
        self.history.reset(self.canvas.serialize()?);
        self.needs_image = false;
        Ok(id)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn scene(&self) -> &Scene {
        self.canvas.scene()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn is_cropping(&self) -> bool {
        self.context.tool_mode.is_exclusive()
    }

    pub fn is_processing(&self) -> bool {
        self.context.processing.is_some()
    }

    pub fn processing_message(&self) -> Option<&str> {
        self.context.processing.as_ref().map(|p| p.message.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn take_save_requests(&mut self) -> Vec<SaveRequest> {
        std::mem::take(&mut self.outbox)
    }

    // ─── Time ────────────────────────────────────────────────────────────

    /// Advance the clock and fire whichever timers are due.
    pub fn tick(&mut self, now: Millis) -> EditorResult<()> {
        self.now = self.now.max(now);
        if self.closed {
            return Ok(());
        }
        self.history.poll(self.now, &self.canvas)?;
        let suppressed = self.context.autosave_suppressed;
        if let Some(payload) = self.autosave.poll(self.now, suppressed, self.canvas.scene())? {
            self.enqueue_save(
                SaveReason::Autosave,
                ProjectPatch::canvas(payload.document),
                Some(payload.encoded),
            );
        }
        Ok(())
    }

    /// Route queued change events to the history and autosave timers.
    fn pump(&mut self) {
        let events = self.canvas.take_events();
        if events.is_empty() || self.is_cropping() {
            return;
        }
        if events.iter().any(|e| e.origin == ChangeOrigin::User) {
            self.history.discard_redo();
            self.history.schedule(self.now);
        }
        self.autosave.schedule(self.now);
    }

    // ─── Guards ──────────────────────────────────────────────────────────

    fn ensure_idle(&self) -> EditorResult<()> {
        match &self.context.processing {
            Some(p) => Err(EditorError::busy(p.message.clone())),
            None => Ok(()),
        }
    }

    /// Scene edits outside crop mode.
    fn ensure_editable(&self) -> EditorResult<()> {
        self.ensure_idle()?;
        if self.is_cropping() {
            return Err(EditorError::validation("finish or cancel the crop first"));
        }
        Ok(())
    }

    fn next_ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    fn upsell(&mut self, feature: &str) {
        log::debug!("session: {feature} needs an upgrade");
        self.notices
            .push(Notice::Upsell(format!("Upgrade to Pro to use {feature}")));
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    /// Switch tools. Returns `false` when the plan does not allow `tool`,
    /// or when crop is picked but cannot start; the active tool is then kept.
    ///
    /// Leaving crop cancels it; selecting crop enters it.
    pub fn select_tool(&mut self, tool: ToolId) -> EditorResult<bool> {
        if !self.entitlements.has_access(tool) {
            self.upsell(tool.label());
            return Ok(false);
        }
        self.history.cancel_pending();
        if tool != ToolId::Crop && self.is_cropping() {
            self.cancel_crop()?;
        }
        if tool == ToolId::Crop && !self.is_cropping() && !self.enter_crop(None)? {
            return Ok(false);
        }
        self.context.active_tool = Some(tool);
        Ok(true)
    }

    pub fn select(&mut self, id: Option<ObjectId>) {
        self.canvas.set_active(id);
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.canvas.active_object()
    }

    // ─── Crop ────────────────────────────────────────────────────────────

    /// Enter crop mode. A no-op while cropping or processing.
    pub fn enter_crop(&mut self, target: Option<ObjectId>) -> EditorResult<bool> {
        if self.is_cropping() || self.is_processing() {
            return Ok(false);
        }
        let target = crop::resolve_target(&self.canvas, target)?;
        let session = crop::enter(&mut self.canvas, target, self.config.crop_inset)?;
        self.context.tool_mode = ToolMode::Crop(session);
        self.context.autosave_suppressed = true;
        self.history.cancel_pending();
        self.pump();
        Ok(true)
    }

    pub fn set_crop_ratio(&mut self, ratio: CropRatio) -> EditorResult<()> {
        let ToolMode::Crop(session) = &mut self.context.tool_mode else {
            return Err(EditorError::validation("not cropping"));
        };
        crop::set_ratio(&mut self.canvas, session, ratio)?;
        self.pump();
        Ok(())
    }

    /// Live scale step on the crop overlay.
    pub fn scale_crop_overlay(&mut self, scale_x: f64, scale_y: f64) -> EditorResult<()> {
        let Some(session) = self.context.tool_mode.crop() else {
            return Err(EditorError::validation("not cropping"));
        };
        crop::scale_overlay(&mut self.canvas, session, scale_x, scale_y)?;
        self.pump();
        Ok(())
    }

    /// Apply the crop. On error crop mode stays active and nothing changed.
    pub fn apply_crop(&mut self) -> EditorResult<Option<ObjectId>> {
        let Some(session) = self.context.tool_mode.crop() else {
            return Ok(None);
        };
        let new_id = crop::apply(&mut self.canvas, session)?;
        self.leave_crop();
        self.notices
            .push(Notice::Success("Image cropped successfully".to_string()));
        Ok(Some(new_id))
    }

    /// Leave crop mode, restoring the target exactly.
    pub fn cancel_crop(&mut self) -> EditorResult<bool> {
        let Some(session) = self.context.tool_mode.crop() else {
            return Ok(false);
        };
        crop::cancel(&mut self.canvas, session)?;
        self.leave_crop();
        Ok(true)
    }

    fn leave_crop(&mut self) {
        self.context.tool_mode = ToolMode::Normal;
        self.context.autosave_suppressed = false;
        self.autosave.resume(self.now);
        self.pump();
    }

    // ─── Object edits ────────────────────────────────────────────────────

    /// Move an object. While cropping only the overlay can move.
    pub fn move_object(&mut self, id: ObjectId, dx: f64, dy: f64) -> EditorResult<bool> {
        self.ensure_movable(id)?;
        let changed = self.canvas.apply(SceneMutation::Move { id, dx, dy })?;
        self.pump();
        Ok(changed)
    }

    pub fn set_geometry(&mut self, id: ObjectId, geometry: Geometry) -> EditorResult<bool> {
        self.ensure_movable(id)?;
        let changed = self.canvas.apply(SceneMutation::SetGeometry { id, geometry })?;
        self.pump();
        Ok(changed)
    }

    fn ensure_movable(&self, id: ObjectId) -> EditorResult<()> {
        self.ensure_idle()?;
        match self.context.tool_mode.crop() {
            Some(session) if session.overlay != id => {
                Err(EditorError::validation("only the crop area can move while cropping"))
            }
            _ => Ok(()),
        }
    }

    pub fn delete_object(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.ensure_editable()?;
        let removed = self.canvas.remove_object(id);
        self.pump();
        Ok(removed)
    }

    /// Add a loaded image, fitted and centred on the canvas.
    pub fn add_image(&mut self, asset: &AssetInfo) -> EditorResult<ObjectId> {
        self.ensure_editable()?;
        let object = fitted_image(asset, self.canvas.scene().logical_size())?;
        let id = self.canvas.add_object(object)?;
        self.canvas.set_active(Some(id));
        self.pump();
        Ok(id)
    }

    // ─── Text ────────────────────────────────────────────────────────────

    pub fn add_text(&mut self, content: &str) -> EditorResult<ObjectId> {
        self.ensure_editable()?;
        let id = text::add_text(&mut self.canvas, content)?;
        self.pump();
        Ok(id)
    }

    pub fn edit_text(&mut self, id: ObjectId, edit: TextEdit) -> EditorResult<bool> {
        self.ensure_editable()?;
        let changed = text::edit(&mut self.canvas, id, edit)?;
        self.pump();
        Ok(changed)
    }

    pub fn toggle_text(&mut self, id: ObjectId, flag: TextToggle) -> EditorResult<bool> {
        self.ensure_editable()?;
        let changed = text::toggle(&mut self.canvas, id, flag)?;
        self.pump();
        Ok(changed)
    }

    pub fn delete_text(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.ensure_editable()?;
        let removed = text::delete(&mut self.canvas, id)?;
        self.pump();
        Ok(removed)
    }

    // ─── Adjust ──────────────────────────────────────────────────────────

    pub fn adjustments(&self, id: ObjectId) -> EditorResult<AdjustValues> {
        adjust::read(&self.canvas, id)
    }

    pub fn apply_adjustments(&mut self, id: ObjectId, values: &AdjustValues) -> EditorResult<bool> {
        self.ensure_editable()?;
        let changed = adjust::apply(&mut self.canvas, id, values)?;
        self.pump();
        Ok(changed)
    }

    pub fn reset_adjustments(&mut self, id: ObjectId) -> EditorResult<bool> {
        self.ensure_editable()?;
        let changed = adjust::reset(&mut self.canvas, id)?;
        self.pump();
        Ok(changed)
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    /// Change the logical canvas size and persist it right away.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> EditorResult<bool> {
        self.ensure_editable()?;
        if !resize::resize(&mut self.canvas, width, height)? {
            return Ok(false);
        }
        self.pump();
        let SavePayload { document, encoded } = self.persisted_payload()?;
        let patch = ProjectPatch {
            width: Some(width),
            height: Some(height),
            ..ProjectPatch::canvas(document)
        };
        self.enqueue_save(SaveReason::Resize, patch, Some(encoded));
        Ok(true)
    }

    // ─── Background ──────────────────────────────────────────────────────

    pub fn set_background_color(&mut self, color: Color) -> EditorResult<bool> {
        let before = self.canvas.revision();
        self.begin_transform(TransformOp::BackgroundColor(color))?;
        Ok(self.canvas.revision() != before)
    }

    pub fn clear_background(&mut self) -> EditorResult<bool> {
        if !self.entitlements.has_access(ToolId::Background) {
            self.upsell(ToolId::Background.label());
            return Ok(false);
        }
        self.ensure_editable()?;
        let changed = background::clear(&mut self.canvas)?;
        self.pump();
        Ok(changed)
    }

    // ─── Transforms ──────────────────────────────────────────────────────

    /// Validate and build a transform. Returns the request the host must
    /// resolve, or `None` when the plan denies it or it was applied locally.
    pub fn begin_transform(&mut self, op: TransformOp) -> EditorResult<Option<PendingTransform>> {
        if !self.entitlements.has_access(op.tool()) {
            self.upsell(op.tool().label());
            return Ok(None);
        }
        self.ensure_editable()?;

        if let TransformOp::BackgroundColor(color) = op {
            background::set_color(&mut self.canvas, color)?;
            self.pump();
            return Ok(None);
        }

        let (target, source_url, displayed) = if op.targets_image() {
            let image = self
                .canvas
                .active_image()
                .or_else(|| self.scene().first_image().map(|o| o.id))
                .and_then(|id| self.canvas.get(id))
                .ok_or_else(|| EditorError::validation("Please add an image first"))?;
            let src = image.as_image().map(|i| i.src.clone()).unwrap_or_default();
            let size = image.size();
            let displayed = Size::new(
                size.width * image.geometry.scale_x.abs(),
                size.height * image.geometry.scale_y.abs(),
            );
            (Some(image.id), Some(src), displayed)
        } else {
            (None, None, Size::ZERO)
        };

        if matches!(op, TransformOp::Extend { .. }) && self.project.background_removed {
            return Err(EditorError::validation(
                "images with removed backgrounds cannot be extended",
            ));
        }

        let url = transform::build(source_url.as_deref().unwrap_or_default(), &op, displayed)?;
        let ticket = self.next_ticket();
        let request = TransformRequest {
            op,
            target,
            source_url,
            url,
        };
        let message = request.op.progress_message();
        log::debug!("session: transform #{ticket} started: {message}");
        self.context.processing = Some(Processing { ticket, message });
        self.job = Some((ticket, Job::Transform(request.clone())));
        Ok(Some(PendingTransform { ticket, request }))
    }

    /// Splice the pipeline's result and persist provenance.
    ///
    /// A stale ticket, or a target removed in the meantime, leaves the scene
    /// untouched.
    pub fn complete_transform(
        &mut self,
        ticket: Ticket,
        asset: &AssetInfo,
    ) -> EditorResult<Option<ObjectId>> {
        let request = match self.take_job(ticket)? {
            Job::Transform(request) => request,
            Job::Reset => return Err(EditorError::StaleTicket(ticket)),
        };
        if let Some(target) = request.target {
            if self.canvas.get(target).is_none() {
                log::warn!("session: transform #{ticket} target {target} is gone");
                self.notices
                    .push(Notice::Error(request.op.failure_message().to_string()));
                return Err(EditorError::StaleTicket(ticket));
            }
        }
        let new_id = match transform::splice(&mut self.canvas, &request, asset) {
            Ok(id) => id,
            Err(e) => {
                log::error!("session: transform #{ticket} could not be applied: {e}");
                self.notices
                    .push(Notice::Error(request.op.failure_message().to_string()));
                return Err(e);
            }
        };
        self.pump();

        let SavePayload { document, encoded } = self.persisted_payload()?;
        let mut patch = transform::provenance(&request.op, asset);
        patch.canvas_state = Some(document);
        self.enqueue_save(SaveReason::Transform, patch, Some(encoded));
        self.notices
            .push(Notice::Success(request.op.success_message().to_string()));
        Ok(new_id)
    }

    /// The pipeline failed; report it and leave the scene alone.
    pub fn fail_transform(&mut self, ticket: Ticket, error: &ServiceError) -> EditorResult<()> {
        match self.take_job(ticket)? {
            Job::Transform(request) => {
                log::error!("session: transform #{ticket} failed: {error}");
                self.notices
                    .push(Notice::Error(request.op.failure_message().to_string()));
                Ok(())
            }
            Job::Reset => Err(EditorError::StaleTicket(ticket)),
        }
    }

    fn take_job(&mut self, ticket: Ticket) -> EditorResult<Job> {
        match self.job.take() {
            Some((current, job)) if current == ticket => {
                self.context.processing = None;
                Ok(job)
            }
            other => {
                self.job = other;
                Err(EditorError::StaleTicket(ticket))
            }
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back. A no-op while cropping or processing.
    pub fn undo(&mut self) -> EditorResult<bool> {
        if self.is_cropping() || self.is_processing() {
            return Ok(false);
        }
        let changed = self.history.undo(&mut self.canvas)?;
        self.pump();
        Ok(changed)
    }

    /// Step forward. A no-op while cropping or processing.
    pub fn redo(&mut self) -> EditorResult<bool> {
        if self.is_cropping() || self.is_processing() {
            return Ok(false);
        }
        let changed = self.history.redo(&mut self.canvas)?;
        self.pump();
        Ok(changed)
    }

    pub fn can_undo(&self) -> bool {
        !self.is_cropping() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_cropping() && self.history.can_redo()
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Queue a save of the current canvas right now.
    pub fn save_now(&mut self) -> EditorResult<Ticket> {
        self.autosave.cancel();
        let payload = self.persisted_payload()?;
        Ok(self.enqueue_save(
            SaveReason::Manual,
            ProjectPatch::canvas(payload.document),
            Some(payload.encoded),
        ))
    }

    /// Encode the scene for the store. Mid-crop the overlay is dropped and
    /// the target keeps its pre-crop interaction flags.
    fn persisted_payload(&self) -> EditorResult<SavePayload> {
        match self.context.tool_mode.crop() {
            Some(session) => SavePayload::of(&crop::persisted_scene(&self.canvas, session)),
            None => SavePayload::of(self.canvas.scene()),
        }
    }

    fn enqueue_save(
        &mut self,
        reason: SaveReason,
        patch: ProjectPatch,
        encoded: Option<String>,
    ) -> Ticket {
        let ticket = self.next_ticket();
        log::debug!("session: save #{ticket} queued ({reason:?})");
        self.in_flight.push(InFlightSave {
            ticket,
            reason,
            patch: patch.clone(),
            encoded,
        });
        self.outbox.push(SaveRequest {
            ticket,
            project_id: self.project.id.clone(),
            patch,
            reason,
        });
        ticket
    }

    fn take_save(&mut self, ticket: Ticket) -> EditorResult<InFlightSave> {
        let index = self
            .in_flight
            .iter()
            .position(|s| s.ticket == ticket)
            .ok_or(EditorError::StaleTicket(ticket))?;
        Ok(self.in_flight.remove(index))
    }

    /// The store confirmed save `ticket`.
    pub fn save_completed(&mut self, ticket: Ticket) -> EditorResult<()> {
        let save = self.take_save(ticket)?;
        if let Some(encoded) = save.encoded {
            self.autosave.mark_persisted(encoded);
        }
        self.project.apply_patch(&save.patch);
        match save.reason {
            SaveReason::Manual => self
                .notices
                .push(Notice::Success("Project saved successfully!".to_string())),
            SaveReason::Reset => self
                .notices
                .push(Notice::Success("Canvas set to original image.".to_string())),
            _ => {}
        }
        Ok(())
    }

    /// The store rejected save `ticket`. Autosaves are retried after the
    /// next quiet period.
    pub fn save_failed(&mut self, ticket: Ticket, error: &ServiceError) -> EditorResult<()> {
        let save = self.take_save(ticket)?;
        log::error!("session: save #{ticket} ({:?}) failed: {error}", save.reason);
        match save.reason {
            SaveReason::Autosave => self.autosave.schedule(self.now),
            _ => self.notices.push(Notice::Error(
                "Failed to save project. Please try again.".to_string(),
            )),
        }
        Ok(())
    }

    // ─── Reset to original ───────────────────────────────────────────────

    /// Start a reset. The host loads the returned URL and calls
    /// [`Self::complete_reset`].
    pub fn begin_reset(&mut self) -> EditorResult<Option<PendingReset>> {
        self.ensure_idle()?;
        let Some(url) = self.project.original_image_url.clone() else {
            self.notices
                .push(Notice::Error("No original image found to reset to".to_string()));
            return Ok(None);
        };
        if self.is_cropping() {
            self.cancel_crop()?;
        }
        let ticket = self.next_ticket();
        self.context.processing = Some(Processing {
            ticket,
            message: "Resetting to original...".to_string(),
        });
        self.job = Some((ticket, Job::Reset));
        Ok(Some(PendingReset { ticket, url }))
    }

    /// Rebuild the canvas around the original asset and persist it as the
    /// new baseline. History restarts from here.
    pub fn complete_reset(&mut self, ticket: Ticket, asset: &AssetInfo) -> EditorResult<ObjectId> {
        match self.take_job(ticket)? {
            Job::Reset => {}
            Job::Transform(_) => return Err(EditorError::StaleTicket(ticket)),
        }
        let original = self.project.original_image_url.clone();
        let scene = self.canvas.scene();
        let mut fresh = Scene::new(scene.width, scene.height);
        fresh.background = Background::Color {
            color: Color::WHITE,
        };
        let object = fitted_image(asset, fresh.logical_size())?;
        let id = object.id;
        fresh.objects.push(object);

        self.canvas.load_scene(fresh);
        self.canvas.set_active(Some(id));
        self.canvas.take_events();
        self.history.reset(self.canvas.serialize()?);
        self.autosave.cancel();

        let SavePayload { document, encoded } = self.persisted_payload()?;
        let patch = ProjectPatch {
            current_image_url: original,
            active_transformations: Some(None),
            background_removed: Some(false),
            ..ProjectPatch::canvas(document)
        };
        self.enqueue_save(SaveReason::Reset, patch, Some(encoded));
        Ok(id)
    }

    pub fn fail_reset(&mut self, ticket: Ticket, error: &ServiceError) -> EditorResult<()> {
        match self.take_job(ticket)? {
            Job::Reset => {
                log::error!("session: reset #{ticket} failed: {error}");
                self.notices.push(Notice::Error(
                    "Failed to reset canvas. Please try again.".to_string(),
                ));
                Ok(())
            }
            Job::Transform(_) => Err(EditorError::StaleTicket(ticket)),
        }
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Plan an export, or queue an upsell when the monthly quota is spent.
    pub fn plan_export(&mut self, format: &ExportFormat, exports_this_month: u32) -> Option<ExportPlan> {
        if !self.entitlements.can_export(exports_this_month) {
            self.upsell("more exports this month");
            return None;
        }
        let scene = self.canvas.scene();
        Some(ExportPlan {
            format: format.format,
            quality: format.quality,
            width: scene.width,
            height: scene.height,
            view: ViewTransform::default(),
            file_name: format!("{}.{}", self.project.title, format.format.extension()),
        })
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// The on-screen container was measured.
    pub fn set_container(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        self.viewport = Viewport {
            padding: self.config.container_padding,
            ..Viewport::new(width, height).with_device_pixel_ratio(device_pixel_ratio)
        };
    }

    pub fn layout(&self) -> ViewportLayout {
        let scene = self.canvas.scene();
        self.viewport.layout(scene.logical_size(), &scene.view)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let view = ViewTransform {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            ..self.canvas.scene().view
        };
        self.canvas.set_view(view);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let mut view = self.canvas.scene().view;
        view.pan_x += dx;
        view.pan_y += dy;
        self.canvas.set_view(view);
    }

    pub fn reset_view(&mut self) {
        self.canvas.set_view(ViewTransform::default());
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Run a resolved keyboard shortcut. Returns whether it did anything.
    pub fn handle_shortcut(&mut self, action: ShortcutAction) -> EditorResult<bool> {
        match action {
            ShortcutAction::Tool(tool) => self.select_tool(tool),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Save => self.save_now().map(|_| true),
            ShortcutAction::Delete => match self.selected() {
                Some(id) if !self.is_cropping() => self.delete_object(id),
                _ => Ok(false),
            },
            ShortcutAction::Nudge { dx, dy } => match self.selected() {
                Some(id) => self.move_object(id, f64::from(dx), f64::from(dy)),
                None => Ok(false),
            },
            ShortcutAction::Confirm => Ok(self.apply_crop()?.is_some()),
            ShortcutAction::Cancel => {
                if self.is_cropping() {
                    self.cancel_crop()
                } else {
                    let had = self.selected().is_some();
                    self.select(None);
                    Ok(had)
                }
            }
            ShortcutAction::ZoomIn => {
                self.set_zoom(self.scene().view.zoom * ZOOM_STEP);
                Ok(true)
            }
            ShortcutAction::ZoomOut => {
                self.set_zoom(self.scene().view.zoom / ZOOM_STEP);
                Ok(true)
            }
            ShortcutAction::ZoomToFit => {
                self.reset_view();
                Ok(true)
            }
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// End the session: cancel timers and drop any crop in progress.
    pub fn close(&mut self) -> EditorResult<()> {
        if self.is_cropping() {
            self.cancel_crop()?;
        }
        self.history.cancel_pending();
        self.autosave.cancel();
        self.canvas.take_events();
        self.closed = true;
        log::debug!("session: closed project {}", self.project.id);
        Ok(())
    }
}

/// An image scaled to fit inside `canvas`, centred, with a centre origin.
fn fitted_image(asset: &AssetInfo, canvas: Size) -> EditorResult<SceneObject> {
    if asset.width == 0 || asset.height == 0 {
        return Err(EditorError::validation(format!("image {} has no pixels", asset.url)));
    }
    let (w, h) = (f64::from(asset.width), f64::from(asset.height));
    let scale = (canvas.width / w).min(canvas.height / h);
    Ok(SceneObject::new(
        ObjectId::with_prefix("image"),
        ObjectKind::Image(ImageObject::new(asset.url.clone(), w, h)),
        Geometry::centered(canvas.width / 2.0, canvas.height / 2.0).with_scale(scale, scale),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{PlanEntitlements, PlanTier};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project {
            id: "p1".into(),
            title: "Holiday".into(),
            width: 800,
            height: 600,
            original_image_url: Some("https://ik.imagekit.io/px/orig.jpg".into()),
            current_image_url: None,
            thumbnail_url: None,
            canvas_state: None,
            folder_id: None,
            active_transformations: None,
            background_removed: false,
        }
    }

    fn session(tier: PlanTier) -> EditorSession {
        let mut s =
            EditorSession::open(project(), EditorConfig::default(), PlanEntitlements::new(tier))
                .unwrap();
        let url = s.initial_asset_url().unwrap().to_string();
        s.place_initial_image(&AssetInfo::new(url, 1600, 1200)).unwrap();
        s
    }

    #[test]
    fn initial_image_is_fitted() {
        let s = session(PlanTier::Free);
        let obj = &s.scene().objects[0];
        assert_eq!(obj.geometry, Geometry::centered(400.0, 300.0).with_scale(0.5, 0.5));
        assert_eq!(s.history().undo_depth(), 1);
        assert!(s.initial_asset_url().is_none());
        assert!(!s.autosave().is_pending());
    }

    #[test]
    fn edits_schedule_both_timers() {
        let mut s = session(PlanTier::Free);
        s.tick(1_000).unwrap();
        s.add_text("Hello").unwrap();
        assert!(s.history().is_pending());
        assert!(s.autosave().is_pending());
        s.tick(1_300).unwrap();
        assert_eq!(s.history().undo_depth(), 2);
        s.tick(3_000).unwrap();
        let saves = s.take_save_requests();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].reason, SaveReason::Autosave);
        assert_eq!(saves[0].project_id, "p1");
    }

    #[test]
    fn pro_tools_upsell_on_free() {
        let mut s = session(PlanTier::Free);
        assert!(!s.select_tool(ToolId::AiExtender).unwrap());
        assert!(matches!(s.take_notices().as_slice(), [Notice::Upsell(_)]));
        assert_eq!(s.context().active_tool, None);
        assert!(s.begin_transform(TransformOp::RemoveBackground).unwrap().is_none());
        assert!(!s.is_processing());
    }

    #[test]
    fn processing_blocks_edits_but_not_navigation() {
        let mut s = session(PlanTier::Pro);
        let pending = s.begin_transform(TransformOp::RemoveBackground).unwrap().unwrap();
        assert_eq!(s.processing_message(), Some("Removing background with AI..."));
        assert!(matches!(s.add_text("x"), Err(EditorError::Busy(_))));
        assert!(!s.undo().unwrap());
        s.select(None);
        s.set_zoom(2.0);
        assert!(s.select_tool(ToolId::Adjust).unwrap());
        s.fail_transform(pending.ticket, &ServiceError::new("timeout")).unwrap();
        assert!(!s.is_processing());
        assert!(s.add_text("x").is_ok());
    }

    #[test]
    fn crop_cannot_be_picked_while_processing() {
        let mut s = session(PlanTier::Pro);
        assert!(s.select_tool(ToolId::Adjust).unwrap());
        let pending = s.begin_transform(TransformOp::RemoveBackground).unwrap().unwrap();
        assert!(!s.select_tool(ToolId::Crop).unwrap());
        assert!(!s.is_cropping());
        assert_eq!(s.context().active_tool, Some(ToolId::Adjust));

        s.fail_transform(pending.ticket, &ServiceError::new("timeout")).unwrap();
        assert!(s.select_tool(ToolId::Crop).unwrap());
        assert!(s.is_cropping());
        assert_eq!(s.context().active_tool, Some(ToolId::Crop));
    }

    #[test]
    fn stale_tickets_are_rejected() {
        let mut s = session(PlanTier::Pro);
        assert!(matches!(
            s.complete_transform(99, &AssetInfo::new("x", 1, 1)),
            Err(EditorError::StaleTicket(99))
        ));
        assert!(s.save_completed(42).is_err());
    }

    #[test]
    fn export_plan_uses_identity_view() {
        let mut s = session(PlanTier::Free);
        s.set_zoom(3.0);
        let format = &px_core::presets::EXPORT_FORMATS[1];
        let plan = s.plan_export(format, 0).unwrap();
        assert_eq!(plan.file_name, "Holiday.jpg");
        assert_eq!(plan.view, ViewTransform::default());
        assert_eq!((plan.width, plan.height), (800, 600));
        assert!(s.plan_export(format, 20).is_none());
        assert!(matches!(s.take_notices().as_slice(), [Notice::Upsell(_)]));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut s = session(PlanTier::Free);
        s.set_zoom(100.0);
        assert_eq!(s.scene().view.zoom, MAX_ZOOM);
        s.handle_shortcut(ShortcutAction::ZoomToFit).unwrap();
        assert_eq!(s.scene().view, ViewTransform::default());
        s.set_container(1000.0, 800.0, 2.0);
        let layout = s.layout();
        assert_eq!(layout.fit_scale, 1.0);
        assert_eq!(layout.backing_width, 1600);
    }

    #[test]
    fn view_changes_do_not_schedule_saves() {
        let mut s = session(PlanTier::Free);
        s.pan_by(10.0, 5.0);
        s.set_zoom(2.0);
        assert!(!s.autosave().is_pending());
        assert!(!s.history().is_pending());
    }
}
