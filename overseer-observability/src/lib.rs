//! Structured logging setup.
//!
//! `run.logger` (§6) is consumed as a `RUST_LOG`-style filter string and
//! handed straight to `tracing_subscriber::EnvFilter` — no distributed
//! tracing, no OTLP export, just the local `fmt` layer every controller
//! action and request state transition logs through via `tracing`.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber. `filter` is typically the
/// configuration's `run.logger` value; pass `"info"` for a sane default.
///
/// Panics if a subscriber is already installed (matches
/// `tracing::subscriber::set_global_default`'s own contract) — callers
/// should call this exactly once, from `main`.
pub fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_filter_falls_back_to_info() {
        // EnvFilter::try_new rejects this directive outright; init_tracing
        // must not panic on it.
        assert!(EnvFilter::try_new("!!!not-a-filter!!!").is_err());
        let _ = filter_or_default("!!!not-a-filter!!!");
    }

    fn filter_or_default(filter: &str) -> EnvFilter {
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
