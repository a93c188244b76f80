#![forbid(unsafe_code)]

//! Drag visual-feedback modes.

use std::fmt;

/// Visual feedback the proxy should show during a drag.
///
/// Written to the proxy as an attribute so styling can react to transitions
/// without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DragEffect {
    /// No drag feedback (initial and reset state).
    #[default]
    None,
    /// Pointer is over neither the source nor an entered drop zone.
    Disabled,
    /// Pointer is inside a drop zone that accepted entry.
    Drop,
    /// Pointer is back over the source element.
    Auto,
}

impl DragEffect {
    /// Attribute value written to the proxy.
    #[must_use]
    pub const fn as_attribute(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Disabled => "disabled",
            Self::Drop => "drop",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for DragEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            other => other.as_attribute(),
        })
    }
}
