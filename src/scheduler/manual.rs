use super::{FrameScheduler, FrameTask, FrameToken};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Frame scheduler that runs queued tasks when told to.
///
/// A frame runs every task that was queued before the frame started, in
/// scheduling order. Tasks scheduled while a frame is running wait for the next
/// frame, and a task cancelled mid-frame does not run.
#[derive(Default)]
pub struct ManualFrameScheduler {
    tasks: RefCell<BTreeMap<FrameToken, FrameTask>>,
    next_id: Cell<u64>,
    frames: Cell<u64>,
}

impl Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualFrameScheduler")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one frame and returns how many tasks ran.
    pub fn run_frame(&self) -> usize {
        self.frames.set(self.frames.get() + 1);

        let due: Vec<FrameToken> = self.tasks.borrow().keys().copied().collect();
        let mut ran = 0;

        for token in due {
            // Released before running so the task can schedule or cancel
            let task = self.tasks.borrow_mut().remove(&token);
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }

        ran
    }

    /// Number of tasks waiting for a frame.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Number of frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn schedule(&self, task: FrameTask) -> FrameToken {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let token = FrameToken::new(id);
        self.tasks.borrow_mut().insert(token, task);
        token
    }

    fn cancel(&self, token: FrameToken) {
        let removed = self.tasks.borrow_mut().remove(&token);
        if removed.is_none() {
            log::trace!("frame task {:?} already ran or was cancelled", token);
        }
    }
}
