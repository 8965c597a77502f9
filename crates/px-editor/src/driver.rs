//! Async driver: runs an [`EditorSession`] against real collaborators.
//!
//! The session stays sans-IO; the driver performs the network half of every
//! `begin_*`/`complete_*` pair and flushes queued saves to the store.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::services::{AssetPipeline, Entitlements, ProjectStore};
use crate::session::EditorSession;
use crate::timer::Millis;
use crate::transform::TransformOp;
use px_core::id::ObjectId;

pub struct SessionDriver<S, P> {
    store: S,
    pipeline: P,
    session: EditorSession,
}

impl<S: ProjectStore, P: AssetPipeline> SessionDriver<S, P> {
    /// Load a project and place its image when there is no saved canvas.
    pub async fn open(
        store: S,
        pipeline: P,
        project_id: &str,
        config: EditorConfig,
        entitlements: impl Entitlements + 'static,
    ) -> EditorResult<Self> {
        let project = store
            .load(project_id)
            .await
            .map_err(|e| EditorError::service("loading project", e))?;
        let mut session = EditorSession::open(project, config, entitlements)?;

        if let Some(url) = session.initial_asset_url().map(str::to_string) {
            let asset = pipeline
                .load(&url)
                .await
                .map_err(|e| EditorError::service("loading project image", e))?;
            session.place_initial_image(&asset)?;
        }
        Ok(Self {
            store,
            pipeline,
            session,
        })
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Advance time and write any save that came due.
    pub async fn tick(&mut self, now: Millis) -> EditorResult<()> {
        self.session.tick(now)?;
        self.flush().await
    }

    /// Write every queued save. Store failures become session notices.
    pub async fn flush(&mut self) -> EditorResult<()> {
        for request in self.session.take_save_requests() {
            match self.store.save(&request.project_id, &request.patch).await {
                Ok(()) => self.session.save_completed(request.ticket)?,
                Err(e) => self.session.save_failed(request.ticket, &e)?,
            }
        }
        Ok(())
    }

    pub async fn save_now(&mut self) -> EditorResult<()> {
        self.session.save_now()?;
        self.flush().await
    }

    /// Run a transform end to end. `Ok(None)` means nothing was replaced:
    /// the plan denied it, or it changed the background.
    pub async fn transform(&mut self, op: TransformOp) -> EditorResult<Option<ObjectId>> {
        let Some(pending) = self.session.begin_transform(op)? else {
            return Ok(None);
        };
        let url = pending.request.url.clone().unwrap_or_default();
        let result = match pending.request.op {
            TransformOp::BackgroundImage { .. } => self.pipeline.load(&url).await,
            _ => self.pipeline.transform(&url).await,
        };
        match result {
            Ok(asset) => {
                let id = self.session.complete_transform(pending.ticket, &asset)?;
                self.flush().await?;
                Ok(id)
            }
            Err(e) => {
                self.session.fail_transform(pending.ticket, &e)?;
                Err(EditorError::service("running transform", e))
            }
        }
    }

    /// Throw away every edit and start over from the original upload.
    pub async fn reset_to_original(&mut self) -> EditorResult<Option<ObjectId>> {
        let Some(pending) = self.session.begin_reset()? else {
            return Ok(None);
        };
        match self.pipeline.load(&pending.url).await {
            Ok(asset) => {
                let id = self.session.complete_reset(pending.ticket, &asset)?;
                self.flush().await?;
                Ok(Some(id))
            }
            Err(e) => {
                self.session.fail_reset(pending.ticket, &e)?;
                Err(EditorError::service("loading original image", e))
            }
        }
    }

    /// Upload a file and add it to the canvas.
    pub async fn import_image(&mut self, file_name: &str, bytes: &[u8]) -> EditorResult<ObjectId> {
        let uploaded = self
            .pipeline
            .upload(file_name, bytes)
            .await
            .map_err(|e| EditorError::service("uploading image", e))?;
        let asset = self
            .pipeline
            .load(&uploaded.url)
            .await
            .map_err(|e| EditorError::service("loading uploaded image", e))?;
        self.session.add_image(&asset)
    }

    /// End the session, then flush outstanding saves.
    pub async fn close(mut self) -> EditorResult<EditorSession> {
        self.session.close()?;
        self.flush().await?;
        Ok(self.session)
    }
}
