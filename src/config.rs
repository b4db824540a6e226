//! Observer configuration.
//!
//! [`ObserverConfig`] controls how the intersection service decides that a
//! watched region is visible. It is handed to the service once, when the
//! [`VisibilityDispatcher`](crate::VisibilityDispatcher) connects to it.
//!
//! There are three ways to get one:
//!
//! ## Use defaults
//! ```rust
//! use gosub_lazy::config::{ObserverConfig, DEFAULT_THRESHOLD};
//! let cfg = ObserverConfig::default();
//! assert_eq!(cfg.root_margin.to_string(), "0px");
//! assert_eq!(cfg.threshold, DEFAULT_THRESHOLD);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use gosub_lazy::config::ObserverConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ObserverConfig::builder()
//!     .root_margin("200px 0px")
//!     .threshold(0.25)
//!     .build()?;
//! assert_eq!(cfg.root_margin.to_string(), "200px 0px");
//! # Ok(()) }
//! ```
//!
//! ## Merge JSON options over the defaults
//! ```rust
//! use gosub_lazy::config::ObserverConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ObserverConfig::from_json(r#"{ "threshold": 0.5 }"#)?;
//! assert_eq!(cfg.threshold, 0.5);
//! assert_eq!(cfg.root_margin.to_string(), "0px");
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `root_margin`: CSS margin shorthand grown (or, when negative, shrunk) around
//!   the viewport before intersection is tested (default: `0px`).
//! - `threshold`: Minimum visible fraction of a region, `0.0..=1.0`, before it
//!   counts as visible (default: `0.01`, so the first visible pixels count).
//!
//! # Errors
//!
//! Building or merging returns [`ConfigError`] when the threshold is outside
//! `0.0..=1.0`, the root margin cannot be parsed, or JSON options are malformed.

use crate::region::Rect;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ROOT_MARGIN: &str = "0px";
pub const DEFAULT_THRESHOLD: f32 = 0.01;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("threshold {0} is out of range (expected 0.0..=1.0)")]
    InvalidThreshold(f32),

    #[error("invalid root margin '{margin}': {reason}")]
    InvalidRootMargin { margin: String, reason: String },

    #[error("invalid observer options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single side of a [`RootMargin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    /// Absolute offset in pixels
    Px(f32),
    /// Offset relative to the viewport size on the same axis
    Percent(f32),
}

impl MarginValue {
    /// Resolves the margin to pixels against the viewport extent on its axis.
    pub fn resolve(&self, extent: f32) -> f32 {
        match self {
            MarginValue::Px(px) => *px,
            MarginValue::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl Default for MarginValue {
    fn default() -> Self {
        MarginValue::Px(0.0)
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(px) => write!(f, "{px}px"),
            MarginValue::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

impl FromStr for MarginValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, unit): (&str, fn(f32) -> MarginValue) = if let Some(n) = s.strip_suffix("px") {
            (n, MarginValue::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, MarginValue::Percent)
        } else if s == "0" {
            return Ok(MarginValue::Px(0.0));
        } else {
            return Err(format!("'{s}' must be in pixels or percent"));
        };

        match number.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(unit(v)),
            _ => Err(format!("'{s}' is not a number")),
        }
    }
}

/// Margin around the viewport, in CSS shorthand order (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// Same margin on every side.
    pub fn uniform(value: MarginValue) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Grows `viewport` by the margin. Percentages on top/bottom resolve
    /// against the viewport height, left/right against its width.
    pub fn apply_to(&self, viewport: Rect) -> Rect {
        let top = self.top.resolve(viewport.height);
        let bottom = self.bottom.resolve(viewport.height);
        let left = self.left.resolve(viewport.width);
        let right = self.right.resolve(viewport.width);

        Rect::new(
            viewport.x - left,
            viewport.y - top,
            (viewport.width + left + right).max(0.0),
            (viewport.height + top + bottom).max(0.0),
        )
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidRootMargin {
            margin: s.to_string(),
            reason,
        };

        let values = s
            .split_whitespace()
            .map(MarginValue::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        match values.as_slice() {
            [] => Ok(RootMargin::default()),
            [all] => Ok(RootMargin::uniform(*all)),
            [vertical, horizontal] => Ok(RootMargin {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(RootMargin {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(RootMargin {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(invalid(format!("expected 1 to 4 values, got {}", values.len()))),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shortest CSS shorthand that round-trips
        if self.left == self.right {
            if self.top == self.bottom {
                if self.top == self.left {
                    return write!(f, "{}", self.top);
                }
                return write!(f, "{} {}", self.top, self.right);
            }
            return write!(f, "{} {} {}", self.top, self.right, self.bottom);
        }
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Caller supplied options. Every field that is `None` keeps its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObserverOptions {
    pub root_margin: Option<String>,
    pub threshold: Option<f32>,
}

/// Effective configuration of the intersection service.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig {
    pub root_margin: RootMargin,
    pub threshold: f32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ObserverConfig {
    pub fn builder() -> ObserverConfigBuilder {
        ObserverConfigBuilder::default()
    }

    /// Merges `options` over the defaults, key by key.
    pub fn from_options(options: ObserverOptions) -> Result<Self, ConfigError> {
        let mut config = ObserverConfig::default();

        if let Some(margin) = options.root_margin {
            config.root_margin = margin.parse()?;
        }
        if let Some(threshold) = options.threshold {
            config.threshold = threshold;
        }

        validate(&config)?;
        Ok(config)
    }

    /// Parses JSON options (`{"rootMargin": "...", "threshold": 0.5}`) and merges
    /// them over the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: ObserverOptions = serde_json::from_str(json)?;
        Self::from_options(options)
    }
}

/// Builder for [`ObserverConfig`]. Values are collected as options and merged
/// over the defaults on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ObserverConfigBuilder {
    inner: ObserverOptions,
}

impl ObserverConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ObserverOptions)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn root_margin<S: Into<String>>(self, margin: S) -> Self { self.map(|o| o.root_margin = Some(margin.into())) }
    pub fn threshold(self, threshold: f32) -> Self { self.map(|o| o.threshold = Some(threshold)) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ObserverOptions)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ObserverConfig, ConfigError> {
        ObserverConfig::from_options(self.inner)
    }
}

fn validate(c: &ObserverConfig) -> Result<(), ConfigError> {
    if !c.threshold.is_finite() || !(0.0..=1.0).contains(&c.threshold) {
        return Err(ConfigError::InvalidThreshold(c.threshold));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ObserverConfig::default();
        assert_eq!(cfg.root_margin, DEFAULT_ROOT_MARGIN.parse::<RootMargin>().unwrap());
        assert_eq!(cfg.root_margin.to_string(), "0px");
        assert_eq!(cfg.threshold, 0.01);
    }

    #[test]
    fn empty_options_yield_defaults() {
        let cfg = ObserverConfig::from_options(ObserverOptions::default()).unwrap();
        assert_eq!(cfg, ObserverConfig::default());
    }

    #[test]
    fn threshold_override_keeps_default_margin() {
        let cfg = ObserverConfig::builder().threshold(0.5).build().unwrap();
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.root_margin, RootMargin::default());
    }

    #[test]
    fn margin_override_keeps_default_threshold() {
        let cfg = ObserverConfig::builder().root_margin("10px").build().unwrap();
        assert_eq!(cfg.threshold, DEFAULT_THRESHOLD);
        assert_eq!(cfg.root_margin, RootMargin::uniform(MarginValue::Px(10.0)));
    }

    #[test]
    fn json_options_are_merged() {
        let cfg = ObserverConfig::from_json(r#"{"rootMargin": "50% 0px", "threshold": 0}"#).unwrap();
        assert_eq!(cfg.threshold, 0.0);
        assert_eq!(cfg.root_margin.top, MarginValue::Percent(50.0));
        assert_eq!(cfg.root_margin.left, MarginValue::Px(0.0));

        let cfg = ObserverConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ObserverConfig::default());
    }

    #[test]
    fn unknown_json_keys_are_rejected() {
        let err = ObserverConfig::from_json(r#"{"root": null}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        for bad in [-0.1, 1.5, f32::NAN] {
            let err = ObserverConfig::builder().threshold(bad).build().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidThreshold(_)));
        }
        assert!(ObserverConfig::builder().threshold(1.0).build().is_ok());
    }

    #[test]
    fn shorthand_expansion() {
        let m: RootMargin = "1px 2px 3px".parse().unwrap();
        assert_eq!(m.top, MarginValue::Px(1.0));
        assert_eq!(m.right, MarginValue::Px(2.0));
        assert_eq!(m.bottom, MarginValue::Px(3.0));
        assert_eq!(m.left, MarginValue::Px(2.0));

        let m: RootMargin = "1px 2px 3px 4%".parse().unwrap();
        assert_eq!(m.left, MarginValue::Percent(4.0));
        assert_eq!(m.to_string(), "1px 2px 3px 4%");

        let m: RootMargin = "0".parse().unwrap();
        assert_eq!(m, RootMargin::default());

        let m: RootMargin = "  ".parse().unwrap();
        assert_eq!(m, RootMargin::default());
    }

    #[test]
    fn display_uses_shortest_form() {
        let m: RootMargin = "5px 5px 5px 5px".parse().unwrap();
        assert_eq!(m.to_string(), "5px");

        let m: RootMargin = "5px 10px 5px 10px".parse().unwrap();
        assert_eq!(m.to_string(), "5px 10px");

        let m: RootMargin = "-12.5px 10px 5px".parse().unwrap();
        assert_eq!(m.to_string(), "-12.5px 10px 5px");
    }

    #[test]
    fn invalid_margins() {
        for bad in ["10", "10em", "px", "1px 2px 3px 4px 5px", "abc%"] {
            let err = bad.parse::<RootMargin>().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRootMargin { .. }), "{bad}");
        }
    }

    #[test]
    fn margin_grows_viewport() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);

        let m: RootMargin = "100px 0px".parse().unwrap();
        assert_eq!(m.apply_to(viewport), Rect::new(0.0, -100.0, 800.0, 800.0));

        let m: RootMargin = "10% 25%".parse().unwrap();
        assert_eq!(m.apply_to(viewport), Rect::new(-200.0, -60.0, 1200.0, 720.0));

        let m: RootMargin = "-400px".parse().unwrap();
        assert_eq!(m.apply_to(viewport).height, 0.0);
    }
}
