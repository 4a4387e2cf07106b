//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame pacing (requestAnimationFrame on web)
//! - Periodic timers (setInterval on web)
//! - Asynchronous prompts (modal dialogs on web)
//! - Page navigation

pub mod navigation;
pub mod prompt;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use navigation::Route;
pub use prompt::{PromptFuture, PromptRequest, PromptResponse, PromptService, PromptTicket};

use std::cell::RefCell;
use std::rc::Rc;

/// Host handle for a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

/// Host handle for a periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// The host's frame-scheduling primitive
pub trait FrameScheduler {
    /// Ask for one frame callback
    fn request_frame(&mut self) -> FrameId;
    /// Cancel a requested frame that has not fired yet
    fn cancel_frame(&mut self, id: FrameId);
}

/// The host's periodic timer primitive
pub trait IntervalScheduler {
    fn start_interval(&mut self, period_ms: u32) -> TimerId;
    fn cancel_interval(&mut self, id: TimerId);
}

#[derive(Debug, Default)]
struct ManualFramesInner {
    next_id: u32,
    pending: Vec<FrameId>,
    cancelled: Vec<FrameId>,
}

/// Frame scheduler driven by hand, for native runs and tests
///
/// Clones share the same queue, so a test can keep one clone while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    inner: Rc<RefCell<ManualFramesInner>>,
}

impl ManualFrames {
    /// Pop the oldest pending frame, as if the host fired it
    pub fn next_frame(&self) -> Option<FrameId> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.is_empty() {
            None
        } else {
            Some(inner.pending.remove(0))
        }
    }

    pub fn last_requested(&self) -> Option<FrameId> {
        let inner = self.inner.borrow();
        inner.next_id.checked_sub(1).map(FrameId)
    }

    pub fn is_cancelled(&self, id: FrameId) -> bool {
        self.inner.borrow().cancelled.contains(&id)
    }

    /// Number of frames requested but neither fired nor cancelled
    pub fn outstanding(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        let id = FrameId(inner.next_id);
        inner.next_id += 1;
        inner.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.retain(|p| *p != id);
        inner.cancelled.push(id);
    }
}

#[derive(Debug, Default)]
struct ManualIntervalsInner {
    next_id: u32,
    active: Vec<TimerId>,
}

/// Interval scheduler driven by hand, for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct ManualIntervals {
    inner: Rc<RefCell<ManualIntervalsInner>>,
}

impl ManualIntervals {
    /// Currently running intervals
    pub fn active(&self) -> Vec<TimerId> {
        self.inner.borrow().active.clone()
    }

    pub fn last_started(&self) -> Option<TimerId> {
        let inner = self.inner.borrow();
        inner.next_id.checked_sub(1).map(TimerId)
    }
}

impl IntervalScheduler for ManualIntervals {
    fn start_interval(&mut self, _period_ms: u32) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.active.push(id);
        id
    }

    fn cancel_interval(&mut self, id: TimerId) {
        self.inner.borrow_mut().active.retain(|t| *t != id);
    }
}
