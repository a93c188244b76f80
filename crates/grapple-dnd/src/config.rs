#![forbid(unsafe_code)]

//! Drag engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default base class of the floating proxy container.
pub const DEFAULT_PROXY_CLASS: &str = "grapple-drag-proxy";

/// Default attribute the effect mode is written to.
pub const DEFAULT_EFFECT_ATTRIBUTE: &str = "effect";

/// Tunables for the drag engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragConfig {
    /// Base class of the floating proxy; a caller class is appended after it.
    pub proxy_class: String,
    /// Proxy attribute carrying the current [`DragEffect`](crate::DragEffect).
    pub effect_attribute: String,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            proxy_class: DEFAULT_PROXY_CLASS.to_string(),
            effect_attribute: DEFAULT_EFFECT_ATTRIBUTE.to_string(),
        }
    }
}

impl DragConfig {
    /// Proxy class list: base class plus the optional caller class.
    #[must_use]
    pub fn proxy_class_name(&self, extra: Option<&str>) -> String {
        match extra.map(str::trim).filter(|extra| !extra.is_empty()) {
            Some(extra) if self.proxy_class.is_empty() => extra.to_string(),
            Some(extra) => format!("{} {extra}", self.proxy_class),
            None => self.proxy_class.clone(),
        }
    }

    /// Validation problems, empty when the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.effect_attribute.trim().is_empty() {
            errors.push("drag.effect_attribute must not be empty".into());
        }
        if self.proxy_class.chars().any(char::is_whitespace) {
            errors.push(format!(
                "drag.proxy_class must be a single class, got {:?}",
                self.proxy_class
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_composition() {
        let config = DragConfig::default();
        assert_eq!(config.proxy_class_name(None), "grapple-drag-proxy");
        assert_eq!(
            config.proxy_class_name(Some("card-ghost")),
            "grapple-drag-proxy card-ghost"
        );
        assert_eq!(config.proxy_class_name(Some("  ")), "grapple-drag-proxy");
    }

    #[test]
    fn empty_base_class_uses_caller_class_only() {
        let config = DragConfig {
            proxy_class: String::new(),
            ..DragConfig::default()
        };
        assert_eq!(config.proxy_class_name(Some("ghost")), "ghost");
    }

    #[test]
    fn validate_flags_bad_values() {
        assert!(DragConfig::default().validate().is_empty());
        let config = DragConfig {
            proxy_class: "a b".into(),
            effect_attribute: " ".into(),
        };
        assert_eq!(config.validate().len(), 2);
    }
}
