//! Rendering-tick scheduling.
//!
//! A [`FrameScheduler`] runs a task once, at the next display refresh, and can
//! cancel a task that has not run yet. It is the browser's animation-frame
//! primitive, expressed as a trait so a host can plug in its own render loop.
//!
//! - [`ManualFrameScheduler`] queues tasks and runs them when the host calls
//!   [`run_frame`](ManualFrameScheduler::run_frame). Deterministic, used in tests.
//! - [`FrameClock`] drives a `ManualFrameScheduler` from a tokio interval.

mod frame_clock;
mod manual;

pub use frame_clock::{FrameClock, DEFAULT_FPS};
pub use manual::ManualFrameScheduler;

/// Work to run on the next frame.
pub type FrameTask = Box<dyn FnOnce()>;

/// Identifies a scheduled [`FrameTask`]. Tokens are never reused by a scheduler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    /// Schedules `task` to run once on the next frame.
    fn schedule(&self, task: FrameTask) -> FrameToken;

    /// Prevents a scheduled task from running. Tokens that already ran or were
    /// already cancelled are ignored.
    fn cancel(&self, token: FrameToken);
}
