//! Per-frame animation loop
//!
//! A pure timing primitive: it asks the host for frames, turns frame
//! timestamps into deltas and hands back the update function to run. The
//! gameplay state is owned by the caller and passed explicitly, so the driver
//! never holds a borrow of it.

use crate::platform::{FrameId, FrameScheduler};

/// Per-frame update callback, `dt` in seconds
pub type UpdateFn<S> = fn(&mut S, f32);

/// Single continuous render/update loop with start/stop/replace semantics
pub struct AnimationDriver<S> {
    scheduler: Box<dyn FrameScheduler>,
    update: Option<UpdateFn<S>>,
    pending: Option<FrameId>,
    last_timestamp: Option<f64>,
}

impl<S> AnimationDriver<S> {
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            update: None,
            pending: None,
            last_timestamp: None,
        }
    }

    /// Start a loop calling `update` every frame, replacing any running loop
    pub fn start(&mut self, update: UpdateFn<S>) {
        self.stop();
        self.update = Some(update);
        self.last_timestamp = None;
        self.pending = Some(self.scheduler.request_frame());
    }

    /// Cancel the in-flight loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_frame(id);
        }
        self.update = None;
        self.last_timestamp = None;
    }

    pub fn is_running(&self) -> bool {
        self.update.is_some()
    }

    /// Handle a frame callback from the host
    ///
    /// Returns the update to run and its delta time, or `None` for frames
    /// that belong to a cancelled or replaced loop. The next frame is requested
    /// before returning, so an update that calls [`stop`](Self::stop) cancels it.
    pub fn frame(&mut self, id: FrameId, timestamp_ms: f64) -> Option<(UpdateFn<S>, f32)> {
        if self.pending != Some(id) {
            log::trace!("Ignoring stale animation frame {:?}", id);
            return None;
        }
        let update = self.update?;

        // First frame of a loop contributes dt = 0
        let last = self.last_timestamp.unwrap_or(timestamp_ms);
        let dt = ((timestamp_ms - last) / 1000.0).max(0.0) as f32;
        self.last_timestamp = Some(timestamp_ms);

        self.pending = Some(self.scheduler.request_frame());
        Some((update, dt))
    }
}
