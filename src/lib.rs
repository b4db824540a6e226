//! Lazy rendering driven by viewport visibility.
//!
//! Expensive content is only rendered once its placeholder region scrolls into
//! view, and dropped again when it leaves. The host registers regions with a
//! [`VisibilityDispatcher`]; an [`IntersectionService`](observer::IntersectionService)
//! reports visibility changes; the dispatcher coalesces them and calls the
//! region handlers at most once per frame, always with the latest batch.
//!
//! # Modules
//!
//! - [`config`] — Observer configuration (root margin, threshold).
//! - [`dispatcher`] — The coalescing [`VisibilityDispatcher`].
//! - [`observer`] — Intersection service trait and an in-memory implementation.
//! - [`registry`] — Region to change handler mapping.
//! - [`scheduler`] — Frame scheduling, manual or driven by a tokio clock.

pub mod config;
pub mod dispatcher;
pub mod event;
pub mod observer;
pub mod region;
pub mod registry;
pub mod scheduler;

pub use config::{ConfigError, ObserverConfig};
pub use dispatcher::{DispatchStats, VisibilityDispatcher};
pub use event::VisibilityEvent;
pub use region::{Rect, RegionId};
pub use registry::ChangeHandler;
