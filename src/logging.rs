//! Optional `tracing` subscriber setup.
//!
//! The crate itself only emits `tracing` events: `debug` for task creation,
//! actions and poll cycles, `trace` for individual HTTP requests. Applications
//! that do not install their own subscriber can call [`init_logging`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already installed.
///
/// ```no_run
/// octopus_client::logging::init_logging();
/// tracing::info!("ready");
/// ```
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let _ = init_logging();
        assert!(!init_logging());
    }
}
