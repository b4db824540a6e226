//! Scrolls a simulated viewport over a column of placeholder boxes. A box gets
//! its content when it comes into view and loses it again when it leaves.
//!
//! Run with `RUST_LOG=debug cargo run --example lazy_boxes` to see batches
//! being superseded.

use gosub_lazy::config::ObserverConfig;
use gosub_lazy::observer::InMemoryIntersectionService;
use gosub_lazy::scheduler::{FrameClock, ManualFrameScheduler};
use gosub_lazy::{Rect, RegionId, VisibilityDispatcher, VisibilityEvent};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const BOX_COUNT: usize = 200;
const BOX_HEIGHT: f32 = 120.0;
const CONTENT: &str = "Box to lazy render";

struct Page {
    boxes: Vec<(RegionId, Rect)>,
    visible: HashMap<RegionId, bool>,
}

impl Page {
    fn new() -> Self {
        let boxes = (0..BOX_COUNT)
            .map(|i| (RegionId::new(), Rect::new(0.0, i as f32 * BOX_HEIGHT, 800.0, BOX_HEIGHT)))
            .collect();

        Self {
            boxes,
            visible: HashMap::new(),
        }
    }

    /// Everything whose visibility changed for the given viewport.
    fn changes(&mut self, viewport: Rect, config: &ObserverConfig) -> Vec<VisibilityEvent> {
        let root = config.root_margin.apply_to(viewport);
        let mut events = Vec::new();

        for (region, bounds) in &self.boxes {
            let ratio = bounds
                .intersection(&root)
                .map(|overlap| overlap.area() / bounds.area())
                .unwrap_or(0.0);
            let is_visible = ratio > 0.0 && ratio >= config.threshold;

            let was_visible = self.visible.insert(*region, is_visible).unwrap_or(false);
            if was_visible != is_visible {
                events.push(VisibilityEvent {
                    region: *region,
                    is_visible,
                    intersection_ratio: ratio,
                    bounds: Some(*bounds),
                });
            }
        }

        events
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ObserverConfig::builder().root_margin("120px 0px").build()?;
    let scheduler = Rc::new(ManualFrameScheduler::new());
    let service = InMemoryIntersectionService::new();
    let dispatcher = VisibilityDispatcher::new(config.clone(), scheduler.clone(), service.clone());

    let mut page = Page::new();
    let contents: Rc<RefCell<HashMap<RegionId, String>>> = Rc::new(RefCell::new(HashMap::new()));

    for (region, _) in &page.boxes {
        let contents = contents.clone();
        dispatcher.watch(*region, move |ev: &VisibilityEvent| {
            if ev.is_visible {
                contents.borrow_mut().insert(ev.region, CONTENT.to_string());
            } else {
                contents.borrow_mut().remove(&ev.region);
            }
        });
    }

    let shutdown = CancellationToken::new();
    let local = tokio::task::LocalSet::new();

    local
        .run_until(async {
            let clock = tokio::task::spawn_local(FrameClock::new(scheduler.clone()).run(shutdown.child_token()));

            let mut viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
            for step in 0..60 {
                service.notify(page.changes(viewport, &config));
                tokio::time::sleep(Duration::from_millis(20)).await;

                if step % 10 == 0 {
                    println!(
                        "scroll {:>6}px: {} box(es) rendered",
                        viewport.y,
                        contents.borrow().len()
                    );
                }
                viewport.y += 90.0;
            }

            shutdown.cancel();
            let _ = clock.await;
        })
        .await;

    println!("{:?}", dispatcher.stats());
    Ok(())
}
