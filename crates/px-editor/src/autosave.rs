//! Debounced persistence of the scene document.
//!
//! Change events restart a quiet-period timer. When it fires the coordinator
//! encodes the scene and hands back a [`SavePayload`] unless saving is
//! suppressed (the save is then deferred until suppression lifts) or the
//! document is identical to the last one the store confirmed.

use crate::error::EditorResult;
use crate::timer::{DebounceTimer, Millis};
use px_core::model::Scene;
use px_core::snapshot;
use serde_json::Value;

/// An encoded document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePayload {
    pub document: Value,
    /// Canonical text of `document`, used for deduplication.
    pub encoded: String,
}

impl SavePayload {
    pub fn of(scene: &Scene) -> EditorResult<Self> {
        let document = snapshot::to_document(scene)?;
        let encoded = document.to_string();
        Ok(Self { document, encoded })
    }
}

pub struct Autosave {
    timer: DebounceTimer,
    last_persisted: Option<String>,
    deferred: bool,
}

impl Autosave {
    pub fn new(debounce_ms: Millis) -> Self {
        Self {
            timer: DebounceTimer::new(debounce_ms),
            last_persisted: None,
            deferred: false,
        }
    }

    /// Record what the store currently holds.
    pub fn set_baseline(&mut self, encoded: Option<String>) {
        self.last_persisted = encoded;
    }

    pub fn last_persisted(&self) -> Option<&str> {
        self.last_persisted.as_deref()
    }

    pub fn schedule(&mut self, now: Millis) {
        self.timer.schedule(now);
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.deferred = false;
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Suppression lifted: re-arm a save that fired while suppressed.
    pub fn resume(&mut self, now: Millis) {
        if self.deferred {
            self.deferred = false;
            log::debug!("autosave: rescheduling deferred save");
            self.timer.schedule(now);
        }
    }

    /// Fire the timer if due. Returns a payload when something must be written.
    pub fn poll(
        &mut self,
        now: Millis,
        suppressed: bool,
        scene: &Scene,
    ) -> EditorResult<Option<SavePayload>> {
        if !self.timer.poll(now) {
            return Ok(None);
        }
        if suppressed {
            log::debug!("autosave: suppressed, deferring");
            self.deferred = true;
            return Ok(None);
        }
        let payload = SavePayload::of(scene)?;
        if self.last_persisted.as_deref() == Some(payload.encoded.as_str()) {
            log::debug!("autosave: document unchanged, skipping");
            return Ok(None);
        }
        Ok(Some(payload))
    }

    /// The store confirmed a write of `encoded`.
    pub fn mark_persisted(&mut self, encoded: String) {
        self.last_persisted = Some(encoded);
    }
}
