use super::ManualFrameScheduler;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default refresh rate of a [`FrameClock`].
pub const DEFAULT_FPS: u32 = 60;

/// Drives a [`ManualFrameScheduler`] at a fixed refresh rate.
///
/// The scheduler is single threaded, so the clock must run on the thread that
/// owns it, typically inside a [`tokio::task::LocalSet`]:
///
/// ```no_run
/// use std::rc::Rc;
/// use gosub_lazy::scheduler::{FrameClock, ManualFrameScheduler};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() {
/// let scheduler = Rc::new(ManualFrameScheduler::new());
/// let shutdown = CancellationToken::new();
///
/// let local = tokio::task::LocalSet::new();
/// local.spawn_local(FrameClock::new(scheduler.clone()).run(shutdown.child_token()));
/// # }
/// ```
#[derive(Debug)]
pub struct FrameClock {
    scheduler: Rc<ManualFrameScheduler>,
    frame_interval: Duration,
}

impl FrameClock {
    pub fn new(scheduler: Rc<ManualFrameScheduler>) -> Self {
        Self::with_fps(scheduler, DEFAULT_FPS)
    }

    /// A zero `fps` is treated as 1.
    pub fn with_fps(scheduler: Rc<ManualFrameScheduler>, fps: u32) -> Self {
        Self {
            scheduler,
            frame_interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Runs frames until `shutdown` is cancelled. Ticks that were missed because
    /// the thread was busy are skipped, never replayed in a burst.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let ran = self.scheduler.run_frame();
                    if ran > 0 {
                        log::trace!("frame {} ran {} task(s)", self.scheduler.frames(), ran);
                    }
                }
            }
        }

        log::debug!("frame clock stopped after {} frame(s)", self.scheduler.frames());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FrameScheduler;
    use std::cell::Cell;

    #[test]
    fn interval_follows_fps() {
        let sched = Rc::new(ManualFrameScheduler::new());
        assert_eq!(FrameClock::with_fps(sched.clone(), 50).frame_interval(), Duration::from_millis(20));
        assert_eq!(FrameClock::with_fps(sched, 0).frame_interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn runs_scheduled_tasks_until_shutdown() {
        let sched = Rc::new(ManualFrameScheduler::new());
        let shutdown = CancellationToken::new();
        let hits = Rc::new(Cell::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let clock = tokio::task::spawn_local(
                    FrameClock::with_fps(sched.clone(), 50).run(shutdown.clone()),
                );

                let h = hits.clone();
                sched.schedule(Box::new(move || h.set(h.get() + 1)));
                tokio::time::sleep(Duration::from_millis(45)).await;
                assert_eq!(hits.get(), 1);
                assert_eq!(sched.pending(), 0);

                shutdown.cancel();
                clock.await.unwrap();

                let frames = sched.frames();
                let h = hits.clone();
                sched.schedule(Box::new(move || h.set(h.get() + 1)));
                tokio::time::sleep(Duration::from_millis(100)).await;
                assert_eq!(sched.frames(), frames);
                assert_eq!(hits.get(), 1);
            })
            .await;
    }
}
