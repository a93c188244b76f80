#![forbid(unsafe_code)]

//! Min/max delta constraints.
//!
//! # Invariants
//!
//! 1. A clamped value never exceeds a present `max` nor falls below a
//!    present `min` of its axis.
//! 2. When an axis has both bounds and `min > max`, that axis is not clamped
//!    at all. Inverted bounds mean "unconstrained", never an error.
//! 3. With only one bound present, only that side is enforced.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::direction::Axis;

/// Optional per-axis limits on the stored delta.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeltaBounds {
    pub min_delta_x: Option<f64>,
    pub max_delta_x: Option<f64>,
    pub min_delta_y: Option<f64>,
    pub max_delta_y: Option<f64>,
}

impl DeltaBounds {
    /// No limits.
    pub const UNBOUNDED: Self = Self {
        min_delta_x: None,
        max_delta_x: None,
        min_delta_y: None,
        max_delta_y: None,
    };

    /// Horizontal limits only.
    #[must_use]
    pub const fn horizontal(min: f64, max: f64) -> Self {
        Self {
            min_delta_x: Some(min),
            max_delta_x: Some(max),
            ..Self::UNBOUNDED
        }
    }

    /// Vertical limits only.
    #[must_use]
    pub const fn vertical(min: f64, max: f64) -> Self {
        Self {
            min_delta_y: Some(min),
            max_delta_y: Some(max),
            ..Self::UNBOUNDED
        }
    }

    /// `self` with every field present in `overrides` replaced.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            min_delta_x: overrides.min_delta_x.or(self.min_delta_x),
            max_delta_x: overrides.max_delta_x.or(self.max_delta_x),
            min_delta_y: overrides.min_delta_y.or(self.min_delta_y),
            max_delta_y: overrides.max_delta_y.or(self.max_delta_y),
        }
    }

    /// `(min, max)` of one axis.
    #[must_use]
    pub const fn limits(&self, axis: Axis) -> (Option<f64>, Option<f64>) {
        match axis {
            Axis::Horizontal => (self.min_delta_x, self.max_delta_x),
            Axis::Vertical => (self.min_delta_y, self.max_delta_y),
        }
    }

    /// Whether the axis has both bounds and they are inverted.
    #[must_use]
    pub fn is_inverted(&self, axis: Axis) -> bool {
        matches!(self.limits(axis), (Some(min), Some(max)) if min > max)
    }

    /// Clamp `value` on `axis`: max first, then min.
    #[must_use]
    pub fn clamp(&self, axis: Axis, value: f64) -> f64 {
        if self.is_inverted(axis) {
            return value;
        }
        let (min, max) = self.limits(axis);
        let value = max.map_or(value, |max| value.min(max));
        min.map_or(value, |min| value.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_both_sides() {
        let bounds = DeltaBounds::horizontal(-50.0, 100.0);
        assert_eq!(bounds.clamp(Axis::Horizontal, 500.0), 100.0);
        assert_eq!(bounds.clamp(Axis::Horizontal, -500.0), -50.0);
        assert_eq!(bounds.clamp(Axis::Horizontal, 20.0), 20.0);
        assert_eq!(bounds.clamp(Axis::Vertical, 500.0), 500.0);
    }

    #[test]
    fn inverted_axis_is_unclamped() {
        let bounds = DeltaBounds {
            min_delta_x: Some(10.0),
            max_delta_x: Some(-10.0),
            ..DeltaBounds::vertical(0.0, 5.0)
        };
        assert!(bounds.is_inverted(Axis::Horizontal));
        assert_eq!(bounds.clamp(Axis::Horizontal, 999.0), 999.0);
        assert_eq!(bounds.clamp(Axis::Vertical, 999.0), 5.0);
    }

    #[test]
    fn one_sided_bounds() {
        let bounds = DeltaBounds {
            max_delta_y: Some(3.0),
            ..DeltaBounds::UNBOUNDED
        };
        assert_eq!(bounds.clamp(Axis::Vertical, -100.0), -100.0);
        assert_eq!(bounds.clamp(Axis::Vertical, 100.0), 3.0);
    }

    #[test]
    fn merge_prefers_overrides() {
        let merged = DeltaBounds::horizontal(-50.0, 100.0).merge(DeltaBounds {
            max_delta_x: Some(60.0),
            min_delta_y: Some(0.0),
            ..DeltaBounds::UNBOUNDED
        });
        assert_eq!(
            merged,
            DeltaBounds {
                min_delta_x: Some(-50.0),
                max_delta_x: Some(60.0),
                min_delta_y: Some(0.0),
                max_delta_y: None,
            }
        );
    }

    proptest! {
        #[test]
        fn clamped_value_respects_ordered_bounds(
            a in -1000.0f64..1000.0,
            b in -1000.0f64..1000.0,
            value in -5000.0f64..5000.0,
        ) {
            let (min, max) = if a <= b { (a, b) } else { (b, a) };
            let clamped = DeltaBounds::horizontal(min, max).clamp(Axis::Horizontal, value);
            prop_assert!(clamped >= min && clamped <= max);
            if value >= min && value <= max {
                prop_assert_eq!(clamped, value);
            }
        }

        #[test]
        fn inverted_bounds_pass_through(
            min in 1.0f64..1000.0,
            gap in 0.001f64..1000.0,
            value in -5000.0f64..5000.0,
        ) {
            let bounds = DeltaBounds::vertical(min, min - gap);
            prop_assert_eq!(bounds.clamp(Axis::Vertical, value), value);
        }
    }
}
