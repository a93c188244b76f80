#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! [`GrappleConfig`] gathers the drag engine's naming conventions and the
//! default resize-handle settings so a host can load them at startup.
//!
//! # Loading
//!
//! ```toml
//! # grapple.toml
//! [drag]
//! proxy_class = "app-drag-ghost"
//! effect_attribute = "data-effect"
//!
//! [resize]
//! direction = "right"
//!
//! [resize.bounds]
//! min_delta_x = -200.0
//! max_delta_x = 400.0
//! ```
//!
//! ```rust,ignore
//! let config = GrappleConfig::from_toml_file("grapple.toml")?.into_validated()?;
//! ```
//!
//! # Defaults
//!
//! `GrappleConfig::default()` matches the built-in constants, so omitting a
//! file or any field changes nothing.

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use grapple_dnd::config::DragConfig;
use grapple_resize::bounds::DeltaBounds;
use grapple_resize::direction::{Axis, ResizeDirection};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct GrappleConfig {
    /// Proxy class and effect attribute.
    pub drag: DragConfig,
    /// Seed values for [`Grapple::resize_config`](crate::Grapple::resize_config).
    pub resize: ResizeDefaults,
}

/// Defaults applied to resize handles built from the facade.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ResizeDefaults {
    pub direction: ResizeDirection,
    pub bounds: DeltaBounds,
    pub first_update: bool,
}

impl Default for ResizeDefaults {
    fn default() -> Self {
        Self {
            direction: ResizeDirection::default(),
            bounds: DeltaBounds::UNBOUNDED,
            first_update: true,
        }
    }
}

impl GrappleConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config_file(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config_file(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Problems that make the config unusable. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.drag.validate();
        let bounds = self.resize.bounds;
        for (name, value) in [
            ("min_delta_x", bounds.min_delta_x),
            ("max_delta_x", bounds.max_delta_x),
            ("min_delta_y", bounds.min_delta_y),
            ("max_delta_y", bounds.max_delta_y),
        ] {
            if value.is_some_and(f64::is_nan) {
                errors.push(format!("resize.bounds.{name} must be a number"));
            }
        }
        errors
    }

    /// Legal but probably unintended settings.
    ///
    /// Inverted bounds disable clamping on their axis instead of failing.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let bounds = self.resize.bounds;
        [(Axis::Horizontal, "x"), (Axis::Vertical, "y")]
            .into_iter()
            .filter(|(axis, _)| bounds.is_inverted(*axis))
            .map(|(_, name)| {
                format!("resize.bounds: min_delta_{name} > max_delta_{name}, clamping on {name} is disabled")
            })
            .collect()
    }

    /// `self` if [`validate`](Self::validate) finds nothing.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(feature = "config-file")]
fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A config file could not be read.
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read grapple config {}: {source}", path.display())
            }
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "grapple config is not valid TOML: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "grapple config is not valid JSON: {e}"),
            Self::Validation(errors) => {
                write!(f, "invalid grapple config: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_quiet() {
        let config = GrappleConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.warnings().is_empty());
        assert_eq!(config.drag.proxy_class, "grapple-drag-proxy");
        assert_eq!(config.resize.direction, ResizeDirection::Left);
        assert!(config.resize.first_update);
    }

    #[test]
    fn inverted_bounds_warn_but_validate() {
        let mut config = GrappleConfig::default();
        config.resize.bounds = DeltaBounds::horizontal(10.0, -10.0);
        assert!(config.validate().is_empty());
        assert_eq!(config.warnings().len(), 1);
        assert!(config.warnings()[0].contains("min_delta_x > max_delta_x"));
    }

    #[test]
    fn nan_bound_is_an_error() {
        let mut config = GrappleConfig::default();
        config.resize.bounds.max_delta_y = Some(f64::NAN);
        config.drag.effect_attribute.clear();
        let err = config.into_validated().expect_err("two problems");
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("invalid grapple config: "));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn loads_partial_toml() {
        let config = GrappleConfig::from_toml_str(
            r#"
            [drag]
            proxy_class = "ghost"

            [resize]
            direction = "bottom"

            [resize.bounds]
            max_delta_y = 120.0
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.drag.proxy_class, "ghost");
        assert_eq!(config.drag.effect_attribute, "effect");
        assert_eq!(config.resize.direction, ResizeDirection::Bottom);
        assert_eq!(config.resize.bounds.max_delta_y, Some(120.0));
        assert_eq!(config.resize.bounds.min_delta_y, None);
        assert!(config.resize.first_update);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn loads_json_and_rejects_garbage() {
        let config = GrappleConfig::from_json_str(r#"{"resize": {"first_update": false}}"#)
            .expect("valid json");
        assert!(!config.resize.first_update);
        assert!(matches!(
            GrappleConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            GrappleConfig::from_toml_str("drag = 3"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn missing_file_is_io_error_naming_the_path() {
        let err = GrappleConfig::from_toml_file("/nonexistent/grapple.toml")
            .expect_err("file does not exist");
        assert!(matches!(&err, ConfigError::Io { path, .. } if path.ends_with("grapple.toml")));
        assert!(
            err.to_string()
                .starts_with("cannot read grapple config /nonexistent/grapple.toml: ")
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
