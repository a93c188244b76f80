#![forbid(unsafe_code)]

//! Logging setup.
//!
//! Every crate in the workspace logs through `tracing` directly. Installing a
//! subscriber is the host's job; this module offers the production default
//! behind the `tracing-json` feature.

/// Install a JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_FILTER`] when `RUST_LOG` is unset or invalid.
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}

/// Directive used when `RUST_LOG` is absent: info for every grapple crate.
pub const DEFAULT_FILTER: &str = "grapple=info,grapple_core=info,grapple_dnd=info,grapple_resize=info";

#[cfg(all(test, feature = "tracing-json"))]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _first = init_json_logging();
        assert!(!init_json_logging());
    }
}
