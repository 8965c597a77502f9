//! Snapshot-based undo/redo with debounced capture.
//!
//! The undo stack always holds at least one entry: the state the session
//! started from (or was reset to). Its top mirrors the current scene once the
//! pending capture has fired. Bursts of edits within the debounce window
//! collapse into a single entry captured after the quiet period.

use crate::canvas::Canvas;
use crate::error::EditorResult;
use crate::timer::{DebounceTimer, Millis};
use px_core::snapshot::Snapshot;
use std::collections::VecDeque;

pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    /// Maximum entries per stack.
    limit: usize,
    timer: DebounceTimer,
}

impl History {
    pub fn new(limit: usize, debounce_ms: Millis) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(limit),
            redo_stack: VecDeque::new(),
            limit: limit.max(1),
            timer: DebounceTimer::new(debounce_ms),
        }
    }

    /// Start over from `initial`: both stacks cleared, capture cancelled.
    pub fn reset(&mut self, initial: Snapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push_back(initial);
        self.timer.cancel();
    }

    // ─── Debounced capture ───────────────────────────────────────────────

    /// A change happened; (re)start the quiet period.
    pub fn schedule(&mut self, now: Millis) {
        self.timer.schedule(now);
    }

    pub fn cancel_pending(&mut self) {
        if self.timer.is_pending() {
            log::debug!("history: pending capture cancelled");
        }
        self.timer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// A fresh user edit forks the timeline; the undone branch is gone even
    /// before the edit is captured.
    pub fn discard_redo(&mut self) {
        if !self.redo_stack.is_empty() {
            log::debug!("history: {} redo entries discarded", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    /// Capture the scene if the quiet period has elapsed.
    pub fn poll(&mut self, now: Millis, canvas: &Canvas) -> EditorResult<bool> {
        if !self.timer.poll(now) {
            return Ok(false);
        }
        self.capture(canvas)
    }

    /// Snapshot the canvas now. Ignored while the canvas is replaying.
    pub fn capture(&mut self, canvas: &Canvas) -> EditorResult<bool> {
        if canvas.is_replaying() {
            return Ok(false);
        }
        let snapshot = canvas.serialize()?;
        Ok(self.record_if_changed(snapshot))
    }

    /// Push `snapshot` unless it equals the current top. Clears redo.
    pub fn record_if_changed(&mut self, snapshot: Snapshot) -> bool {
        if self.undo_stack.back() == Some(&snapshot) {
            return false;
        }
        push_bounded(&mut self.undo_stack, snapshot, self.limit);
        self.redo_stack.clear();
        log::debug!("history: recorded entry {}", self.undo_stack.len());
        true
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    /// Step back one entry. No-op at the initial state.
    pub fn undo(&mut self, canvas: &mut Canvas) -> EditorResult<bool> {
        self.timer.cancel();
        let len = self.undo_stack.len();
        if len <= 1 {
            return Ok(false);
        }
        canvas.replay(&self.undo_stack[len - 2])?;
        if let Some(top) = self.undo_stack.pop_back() {
            push_bounded(&mut self.redo_stack, top, self.limit);
        }
        Ok(true)
    }

    /// Re-apply the most recently undone entry. No-op when redo is empty,
    /// in which case a pending capture survives.
    pub fn redo(&mut self, canvas: &mut Canvas) -> EditorResult<bool> {
        let Some(next) = self.redo_stack.back() else {
            return Ok(false);
        };
        self.timer.cancel();
        canvas.replay(next)?;
        if let Some(next) = self.redo_stack.pop_back() {
            push_bounded(&mut self.undo_stack, next, self.limit);
        }
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::SceneMutation;
    use px_core::id::ObjectId;
    use px_core::model::*;

    fn canvas_with_box() -> (Canvas, ObjectId) {
        let mut canvas = Canvas::new(200, 200);
        let id = ObjectId::with_prefix("rect");
        canvas
            .add_object(SceneObject::new(
                id,
                ObjectKind::Shape(ShapeObject {
                    width: 20.0,
                    height: 20.0,
                    fill: None,
                    stroke: None,
                    role: ShapeRole::Decoration,
                }),
                Geometry::at(0.0, 0.0),
            ))
            .unwrap();
        (canvas, id)
    }

    fn move_by(canvas: &mut Canvas, id: ObjectId, dx: f64) {
        canvas.apply(SceneMutation::Move { id, dx, dy: 0.0 }).unwrap();
    }

    fn left(canvas: &Canvas, id: ObjectId) -> f64 {
        canvas.get(id).unwrap().geometry.left
    }

    #[test]
    fn identical_capture_is_deduplicated() {
        let (canvas, _) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        assert!(!history.capture(&canvas).unwrap());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn undo_then_redo_restores_scene() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());

        move_by(&mut canvas, id, 10.0);
        history.capture(&canvas).unwrap();
        let after = canvas.serialize().unwrap();

        assert!(history.undo(&mut canvas).unwrap());
        assert_eq!(left(&canvas, id), 0.0);
        assert!(history.redo(&mut canvas).unwrap());
        assert_eq!(canvas.serialize().unwrap(), after);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_at_initial_state_is_noop() {
        let (mut canvas, _) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        canvas.take_events();
        assert!(!history.undo(&mut canvas).unwrap());
        assert!(!history.redo(&mut canvas).unwrap());
        assert!(!canvas.has_events());
    }

    #[test]
    fn new_record_clears_redo() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        move_by(&mut canvas, id, 1.0);
        history.capture(&canvas).unwrap();
        history.undo(&mut canvas).unwrap();
        assert!(history.can_redo());
        move_by(&mut canvas, id, 5.0);
        history.capture(&canvas).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn fresh_edit_before_capture_blocks_redo() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        move_by(&mut canvas, id, 10.0);
        history.capture(&canvas).unwrap();
        history.undo(&mut canvas).unwrap();

        move_by(&mut canvas, id, 77.0);
        history.schedule(0);
        history.discard_redo();
        assert!(!history.redo(&mut canvas).unwrap());
        assert_eq!(left(&canvas, id), 77.0);
        assert!(history.poll(300, &canvas).unwrap());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn stacks_are_bounded() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(3, 300);
        history.reset(canvas.serialize().unwrap());
        for _ in 0..10 {
            move_by(&mut canvas, id, 1.0);
            history.capture(&canvas).unwrap();
        }
        assert_eq!(history.undo_depth(), 3);
        while history.undo(&mut canvas).unwrap() {}
        assert_eq!(left(&canvas, id), 8.0);
        assert_eq!(history.redo_depth(), 2);
    }

    #[test]
    fn debounce_coalesces_burst() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        for t in [0, 100, 200] {
            move_by(&mut canvas, id, 1.0);
            history.schedule(t);
            assert!(!history.poll(t, &canvas).unwrap());
        }
        assert!(!history.poll(499, &canvas).unwrap());
        assert!(history.poll(500, &canvas).unwrap());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn undo_cancels_pending_capture() {
        let (mut canvas, id) = canvas_with_box();
        let mut history = History::new(20, 300);
        history.reset(canvas.serialize().unwrap());
        move_by(&mut canvas, id, 1.0);
        history.capture(&canvas).unwrap();
        history.schedule(0);
        history.undo(&mut canvas).unwrap();
        assert!(!history.is_pending());
    }
}
