//! Environment-driven settings and logging bootstrap.
//!
//! Variables:
//! - `COLSET_ROUTINE_PREFIX`: prefix of generated routine names (default `get_`)
//! - `COLSET_VAR_PREFIX`: prefix of unique variable names handed out by a `UnitContext` (default `v`)
//! - `COLSET_LOG`: fallback log filter when `RUST_LOG` is unset (default `info`)

use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_ROUTINE_PREFIX: &str = "get_";
pub const DEFAULT_VAR_PREFIX: &str = "v";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColsetConfig {
    pub routine_prefix: String,
    pub var_prefix: String,
    pub log_filter: String,
}

impl Default for ColsetConfig {
    fn default() -> Self {
        Self {
            routine_prefix: DEFAULT_ROUTINE_PREFIX.to_string(),
            var_prefix: DEFAULT_VAR_PREFIX.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ColsetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; empty values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let pick = |key: &str, default: &str| {
            get(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
        };
        Self {
            routine_prefix: pick("COLSET_ROUTINE_PREFIX", DEFAULT_ROUTINE_PREFIX),
            var_prefix: pick("COLSET_VAR_PREFIX", DEFAULT_VAR_PREFIX),
            log_filter: pick("COLSET_LOG", DEFAULT_LOG_FILTER),
        }
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured filter.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(cfg: &ColsetConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
