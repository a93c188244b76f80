#![forbid(unsafe_code)]

//! Which edge a handle sits on, and what that means for pointer deltas.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis a handle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// `delta_x`.
    Horizontal,
    /// `delta_y`.
    Vertical,
}

/// Edge of the resized element the handle belongs to.
///
/// `Left` and `Top` invert the raw pointer delta, so dragging away from the
/// element grows the result on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ResizeDirection {
    #[default]
    Left,
    Top,
    Right,
    Bottom,
}

impl ResizeDirection {
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Top | Self::Bottom => Axis::Vertical,
        }
    }

    /// Multiplier applied to the raw pointer delta.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left | Self::Top => -1.0,
            Self::Right | Self::Bottom => 1.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
        }
    }
}

impl std::fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
